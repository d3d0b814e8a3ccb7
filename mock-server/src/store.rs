//! In-memory state behind the mock Taiga API.
//!
//! Ids come from one counter per entity kind. Refs come from one counter per
//! project, shared by epics and user stories, so a ref is unique within its
//! project and never reused after a delete.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epic {
    pub id: u64,
    #[serde(rename = "ref")]
    pub reference: u64,
    pub project: u64,
    pub subject: String,
    pub description: String,
    pub version: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStory {
    pub id: u64,
    #[serde(rename = "ref")]
    pub reference: u64,
    pub project: u64,
    pub subject: String,
    pub description: String,
    pub version: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub epic: u64,
    pub user_story: u64,
    pub order: u32,
}

/// Create payload shared by epics and user stories. Fields are optional here
/// so missing values produce a field-level 400 instead of a decode failure.
#[derive(Debug, Default, Deserialize)]
pub struct CreateItem {
    pub project: Option<u64>,
    pub subject: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PatchItem {
    pub subject: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateRelation {
    /// Must match the epic in the path when present.
    pub epic: Option<u64>,
    pub user_story: Option<u64>,
}

#[derive(Debug, PartialEq)]
pub enum StoreError {
    NotFound,
    /// Field name to messages, Taiga style.
    Invalid(Value),
    Conflict(String),
}

fn field_error(field: &str, message: &str) -> StoreError {
    let mut errors = Map::new();
    errors.insert(field.to_string(), json!([message]));
    StoreError::Invalid(Value::Object(errors))
}

const REQUIRED: &str = "This field is required.";

#[derive(Debug, Default)]
pub struct Store {
    projects: BTreeMap<u64, Project>,
    epics: BTreeMap<u64, Epic>,
    stories: BTreeMap<u64, UserStory>,
    relations: Vec<Relation>,
    next_epic_id: u64,
    next_story_id: u64,
    next_ref: HashMap<u64, u64>,
}

impl Store {
    pub fn with_projects(ids: &[u64]) -> Self {
        let mut store = Self::default();
        for &id in ids {
            store.projects.insert(
                id,
                Project {
                    id,
                    name: format!("Project {id}"),
                    slug: format!("project-{id}"),
                },
            );
        }
        store
    }

    pub fn projects(&self) -> Vec<Project> {
        self.projects.values().cloned().collect()
    }

    pub fn project(&self, id: u64) -> Result<Project, StoreError> {
        self.projects.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    fn validate_create(&self, input: CreateItem) -> Result<(u64, String, String), StoreError> {
        let project = input.project.ok_or_else(|| field_error("project", REQUIRED))?;
        if !self.projects.contains_key(&project) {
            return Err(field_error("project", "Invalid pk - object does not exist."));
        }
        let subject = input
            .subject
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| field_error("subject", REQUIRED))?;
        Ok((project, subject, input.description.unwrap_or_default()))
    }

    fn allocate_ref(&mut self, project: u64) -> u64 {
        let next = self.next_ref.entry(project).or_insert(0);
        *next += 1;
        *next
    }

    // --- epics ---

    pub fn list_epics(&self, project: Option<u64>) -> Vec<Epic> {
        self.epics
            .values()
            .filter(|e| project.map_or(true, |p| e.project == p))
            .cloned()
            .collect()
    }

    pub fn create_epic(&mut self, input: CreateItem) -> Result<Epic, StoreError> {
        let (project, subject, description) = self.validate_create(input)?;
        self.next_epic_id += 1;
        let epic = Epic {
            id: self.next_epic_id,
            reference: self.allocate_ref(project),
            project,
            subject,
            description,
            version: 1,
        };
        self.epics.insert(epic.id, epic.clone());
        Ok(epic)
    }

    pub fn get_epic(&self, id: u64) -> Result<Epic, StoreError> {
        self.epics.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    pub fn epic_by_ref(&self, reference: u64, project: u64) -> Result<Epic, StoreError> {
        self.epics
            .values()
            .find(|e| e.reference == reference && e.project == project)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    pub fn patch_epic(&mut self, id: u64, patch: PatchItem) -> Result<Epic, StoreError> {
        let epic = self.epics.get_mut(&id).ok_or(StoreError::NotFound)?;
        apply_patch(&mut epic.subject, &mut epic.description, &mut epic.version, patch)?;
        Ok(epic.clone())
    }

    pub fn delete_epic(&mut self, id: u64) -> Result<(), StoreError> {
        self.epics.remove(&id).ok_or(StoreError::NotFound)?;
        self.relations.retain(|r| r.epic != id);
        Ok(())
    }

    // --- relations ---

    pub fn relate(&mut self, epic: u64, input: CreateRelation) -> Result<Relation, StoreError> {
        let user_story = input
            .user_story
            .ok_or_else(|| field_error("user_story", REQUIRED))?;
        if input.epic.is_some_and(|body_epic| body_epic != epic) {
            return Err(field_error("epic", "Does not match the epic in the URL."));
        }
        if !self.epics.contains_key(&epic) {
            return Err(field_error("epic", "Invalid pk - object does not exist."));
        }
        if !self.stories.contains_key(&user_story) {
            return Err(field_error("user_story", "Invalid pk - object does not exist."));
        }
        if self
            .relations
            .iter()
            .any(|r| r.epic == epic && r.user_story == user_story)
        {
            return Err(StoreError::Conflict(format!(
                "user story {user_story} is already related to epic {epic}"
            )));
        }
        let order = self
            .relations
            .iter()
            .filter(|r| r.epic == epic)
            .map(|r| r.order)
            .max()
            .unwrap_or(0)
            + 1;
        let relation = Relation {
            epic,
            user_story,
            order,
        };
        self.relations.push(relation.clone());
        Ok(relation)
    }

    pub fn related_stories(&self, epic: u64) -> Result<Vec<UserStory>, StoreError> {
        if !self.epics.contains_key(&epic) {
            return Err(StoreError::NotFound);
        }
        let mut linked: Vec<&Relation> =
            self.relations.iter().filter(|r| r.epic == epic).collect();
        linked.sort_by_key(|r| r.order);
        Ok(linked
            .into_iter()
            .filter_map(|r| self.stories.get(&r.user_story).cloned())
            .collect())
    }

    // --- user stories ---

    pub fn list_stories(&self, project: Option<u64>) -> Vec<UserStory> {
        self.stories
            .values()
            .filter(|s| project.map_or(true, |p| s.project == p))
            .cloned()
            .collect()
    }

    pub fn create_story(&mut self, input: CreateItem) -> Result<UserStory, StoreError> {
        let (project, subject, description) = self.validate_create(input)?;
        self.next_story_id += 1;
        let story = UserStory {
            id: self.next_story_id,
            reference: self.allocate_ref(project),
            project,
            subject,
            description,
            version: 1,
        };
        self.stories.insert(story.id, story.clone());
        Ok(story)
    }

    pub fn get_story(&self, id: u64) -> Result<UserStory, StoreError> {
        self.stories.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    pub fn story_by_ref(&self, reference: u64, project: u64) -> Result<UserStory, StoreError> {
        self.stories
            .values()
            .find(|s| s.reference == reference && s.project == project)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    pub fn patch_story(&mut self, id: u64, patch: PatchItem) -> Result<UserStory, StoreError> {
        let story = self.stories.get_mut(&id).ok_or(StoreError::NotFound)?;
        apply_patch(&mut story.subject, &mut story.description, &mut story.version, patch)?;
        Ok(story.clone())
    }

    pub fn delete_story(&mut self, id: u64) -> Result<(), StoreError> {
        self.stories.remove(&id).ok_or(StoreError::NotFound)?;
        self.relations.retain(|r| r.user_story != id);
        Ok(())
    }
}

/// Last write wins; there is no version check.
fn apply_patch(
    subject: &mut String,
    description: &mut String,
    version: &mut u32,
    patch: PatchItem,
) -> Result<(), StoreError> {
    if let Some(s) = &patch.subject {
        if s.trim().is_empty() {
            return Err(field_error("subject", "This field may not be blank."));
        }
    }
    if let Some(s) = patch.subject {
        *subject = s;
    }
    if let Some(d) = patch.description {
        *description = d;
    }
    *version += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(project: u64, subject: &str) -> CreateItem {
        CreateItem {
            project: Some(project),
            subject: Some(subject.to_string()),
            description: None,
        }
    }

    fn relation_to(user_story: u64) -> CreateRelation {
        CreateRelation {
            epic: None,
            user_story: Some(user_story),
        }
    }

    #[test]
    fn refs_are_shared_across_kinds_within_a_project() {
        let mut store = Store::with_projects(&[1, 2]);
        let e1 = store.create_epic(item(1, "E1")).unwrap();
        let us = store.create_story(item(1, "US")).unwrap();
        let e2 = store.create_epic(item(1, "E2")).unwrap();
        let other = store.create_epic(item(2, "Other")).unwrap();
        assert_eq!((e1.reference, us.reference, e2.reference), (1, 2, 3));
        assert_eq!(other.reference, 1);
    }

    #[test]
    fn refs_are_not_reused_after_delete() {
        let mut store = Store::with_projects(&[1]);
        let e1 = store.create_epic(item(1, "E1")).unwrap();
        store.delete_epic(e1.id).unwrap();
        let e2 = store.create_epic(item(1, "E2")).unwrap();
        assert_eq!(e2.reference, 2);
        assert!(store.epic_by_ref(1, 1).is_err());
    }

    #[test]
    fn create_requires_subject_and_known_project() {
        let mut store = Store::with_projects(&[1]);
        assert!(matches!(store.create_epic(item(1, "  ")), Err(StoreError::Invalid(_))));
        assert!(matches!(store.create_epic(item(9, "S")), Err(StoreError::Invalid(_))));
        assert!(matches!(
            store.create_epic(CreateItem::default()),
            Err(StoreError::Invalid(_))
        ));
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let mut store = Store::with_projects(&[1]);
        let e = store.create_epic(item(1, "S")).unwrap();
        let patched = store
            .patch_epic(
                e.id,
                PatchItem {
                    subject: None,
                    description: Some("D".to_string()),
                },
            )
            .unwrap();
        assert_eq!(patched.subject, "S");
        assert_eq!(patched.description, "D");
        assert_eq!(patched.version, 2);
    }

    #[test]
    fn duplicate_relation_conflicts() {
        let mut store = Store::with_projects(&[1]);
        let e = store.create_epic(item(1, "E")).unwrap();
        let us = store.create_story(item(1, "US")).unwrap();
        let rel = relation_to(us.id);
        assert_eq!(store.relate(e.id, rel).unwrap().order, 1);
        let again = relation_to(us.id);
        assert!(matches!(store.relate(e.id, again), Err(StoreError::Conflict(_))));
    }

    #[test]
    fn deleting_an_epic_drops_its_relations() {
        let mut store = Store::with_projects(&[1]);
        let e = store.create_epic(item(1, "E")).unwrap();
        let us = store.create_story(item(1, "US")).unwrap();
        store.relate(e.id, relation_to(us.id)).unwrap();
        store.delete_epic(e.id).unwrap();
        assert_eq!(store.related_stories(e.id), Err(StoreError::NotFound));
        assert!(store.relations.is_empty());
    }

    #[test]
    fn relation_order_stays_unique_after_a_story_is_deleted() {
        let mut store = Store::with_projects(&[1]);
        let e = store.create_epic(item(1, "E")).unwrap();
        let s1 = store.create_story(item(1, "S1")).unwrap();
        let s2 = store.create_story(item(1, "S2")).unwrap();
        let s3 = store.create_story(item(1, "S3")).unwrap();
        store.relate(e.id, relation_to(s1.id)).unwrap();
        let r2 = store.relate(e.id, relation_to(s2.id)).unwrap();
        store.delete_story(s1.id).unwrap();
        let r3 = store.relate(e.id, relation_to(s3.id)).unwrap();

        assert_eq!(r2.order, 2);
        assert_eq!(r3.order, 3);
        let related: Vec<u64> = store.related_stories(e.id).unwrap().iter().map(|s| s.id).collect();
        assert_eq!(related, vec![s2.id, s3.id]);
    }

    #[test]
    fn relation_body_epic_must_match_path() {
        let mut store = Store::with_projects(&[1]);
        let e = store.create_epic(item(1, "E")).unwrap();
        let other = store.create_epic(item(1, "Other")).unwrap();
        let us = store.create_story(item(1, "US")).unwrap();

        let mismatched = CreateRelation {
            epic: Some(other.id),
            user_story: Some(us.id),
        };
        let err = store.relate(e.id, mismatched).unwrap_err();
        assert!(matches!(err, StoreError::Invalid(ref errors) if errors.get("epic").is_some()));

        let matching = CreateRelation {
            epic: Some(e.id),
            user_story: Some(us.id),
        };
        assert_eq!(store.relate(e.id, matching).unwrap().epic, e.id);
    }
}
