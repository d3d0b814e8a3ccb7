//! Domain DTOs for the Taiga epics and user stories API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! the integration tests catch any schema drift between the two crates.
//!
//! Server-assigned fields (`id`, `ref`, `version`) only exist on the read
//! types. The create payloads have no slot for them, and edits go through
//! [`EntityPatch`], which carries just the mutable fields that changed.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

macro_rules! int_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

int_id! {
    /// Identifies a project, the container that scopes epics, stories and refs.
    ProjectId
}

int_id! {
    /// Globally unique, server-assigned epic identifier.
    EpicId
}

int_id! {
    /// Globally unique, server-assigned user story identifier.
    UserStoryId
}

int_id! {
    /// Project-scoped sequential reference number. Only unique together with
    /// the owning [`ProjectId`].
    Ref
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// An epic as returned by the API. A detached snapshot of server state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Epic {
    pub id: EpicId,
    #[serde(rename = "ref")]
    pub reference: Ref,
    pub project: ProjectId,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: u32,
}

/// A user story as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserStory {
    pub id: UserStoryId,
    #[serde(rename = "ref")]
    pub reference: Ref,
    pub project: ProjectId,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: u32,
}

/// Link between an epic and a user story, as returned when the link is
/// created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelatedUserStory {
    pub epic: EpicId,
    pub user_story: UserStoryId,
    #[serde(default)]
    pub order: u32,
}

/// Request payload for creating a new epic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEpic {
    pub project: ProjectId,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateEpic {
    pub fn new(project: ProjectId, subject: impl Into<String>) -> Self {
        Self {
            project,
            subject: subject.into(),
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Request payload for creating a new user story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserStory {
    pub project: ProjectId,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateUserStory {
    pub fn new(project: ProjectId, subject: impl Into<String>) -> Self {
        Self {
            project,
            subject: subject.into(),
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Body of the relation-creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRelation {
    pub epic: EpicId,
    pub user_story: UserStoryId,
}

// ---------------------------------------------------------------------------
// Partial updates
// ---------------------------------------------------------------------------

/// Read access to the mutable fields shared by epics and user stories.
pub trait Editable {
    fn subject(&self) -> &str;
    fn description(&self) -> &str;
}

impl Editable for Epic {
    fn subject(&self) -> &str {
        &self.subject
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl Editable for UserStory {
    fn subject(&self) -> &str {
        &self.subject
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Request payload for a partial update. Only the fields present in the JSON
/// are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

pub type EpicPatch = EntityPatch;
pub type UserStoryPatch = EntityPatch;

impl EntityPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Collect the mutable fields that differ between two snapshots of the
    /// same entity. Identity fields are never part of a patch.
    pub fn diff<E: Editable>(before: &E, after: &E) -> Self {
        let changed = |old: &str, new: &str| (old != new).then(|| new.to_string());
        Self {
            subject: changed(before.subject(), after.subject()),
            description: changed(before.description(), after.description()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subject.is_none() && self.description.is_none()
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Filter for list endpoints. Rendered as a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub project: Option<ProjectId>,
}

pub type EpicListQuery = ListQuery;
pub type UserStoryListQuery = ListQuery;

impl ListQuery {
    pub fn project(project: ProjectId) -> Self {
        Self {
            project: Some(project),
        }
    }

    /// `?project=N`, or the empty string when no filter is set.
    pub fn to_query_string(&self) -> String {
        match self.project {
            Some(project) => format!("?project={project}"),
            None => String::new(),
        }
    }
}
