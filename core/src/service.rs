//! One-call entity operations on top of `TaigaClient` and a `Transport`.
//!
//! Each method is `build_*`, `execute`, `parse_*` in sequence. No state is
//! kept between calls and failures surface immediately.

use crate::client::TaigaClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    CreateEpic, CreateUserStory, Epic, EpicId, EpicListQuery, EpicPatch, ProjectId, Ref,
    RelatedUserStory, UserStory, UserStoryId, UserStoryListQuery, UserStoryPatch,
};

/// A `TaigaClient` paired with the transport that executes its requests.
#[derive(Debug, Clone)]
pub struct Taiga<T> {
    client: TaigaClient,
    transport: T,
}

impl Taiga<UreqTransport> {
    /// Blocking `ureq`-backed API handle built from `config`.
    pub fn connect(config: &ClientConfig) -> Self {
        Self::new(TaigaClient::from_config(config), UreqTransport::from_config(config))
    }
}

impl<T: Transport> Taiga<T> {
    pub fn new(client: TaigaClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &TaigaClient {
        &self.client
    }

    pub fn epics(&self) -> Epics<'_, T> {
        Epics { api: self }
    }

    pub fn user_stories(&self) -> UserStories<'_, T> {
        UserStories { api: self }
    }
}

/// Epic operations, borrowed from a [`Taiga`] handle.
#[derive(Debug)]
pub struct Epics<'a, T> {
    api: &'a Taiga<T>,
}

impl<T: Transport> Epics<'_, T> {
    pub fn list(&self, query: &EpicListQuery) -> Result<Vec<Epic>, ApiError> {
        let c = &self.api.client;
        c.parse_list_epics(self.api.transport.execute(c.build_list_epics(query))?)
    }

    pub fn create(&self, input: &CreateEpic) -> Result<Epic, ApiError> {
        let c = &self.api.client;
        c.parse_create_epic(self.api.transport.execute(c.build_create_epic(input)?)?)
    }

    pub fn edit(&self, id: EpicId, patch: &EpicPatch) -> Result<Epic, ApiError> {
        let c = &self.api.client;
        c.parse_edit_epic(self.api.transport.execute(c.build_edit_epic(id, patch)?)?)
    }

    pub fn get(&self, id: EpicId) -> Result<Epic, ApiError> {
        let c = &self.api.client;
        c.parse_get_epic(self.api.transport.execute(c.build_get_epic(id))?)
    }

    pub fn get_by_ref(&self, reference: Ref, project: ProjectId) -> Result<Epic, ApiError> {
        let c = &self.api.client;
        c.parse_get_epic_by_ref(
            self.api
                .transport
                .execute(c.build_get_epic_by_ref(reference, project))?,
        )
    }

    pub fn delete(&self, id: EpicId) -> Result<(), ApiError> {
        let c = &self.api.client;
        c.parse_delete_epic(self.api.transport.execute(c.build_delete_epic(id))?)
    }

    pub fn create_related_user_story(
        &self,
        epic: EpicId,
        user_story: UserStoryId,
    ) -> Result<RelatedUserStory, ApiError> {
        let c = &self.api.client;
        let req = c.build_create_related_user_story(epic, user_story)?;
        c.parse_create_related_user_story(self.api.transport.execute(req)?)
    }

    pub fn list_related_user_stories(&self, epic: EpicId) -> Result<Vec<UserStory>, ApiError> {
        let c = &self.api.client;
        c.parse_list_related_user_stories(
            self.api
                .transport
                .execute(c.build_list_related_user_stories(epic))?,
        )
    }
}

/// User story operations, borrowed from a [`Taiga`] handle.
#[derive(Debug)]
pub struct UserStories<'a, T> {
    api: &'a Taiga<T>,
}

impl<T: Transport> UserStories<'_, T> {
    pub fn list(&self, query: &UserStoryListQuery) -> Result<Vec<UserStory>, ApiError> {
        let c = &self.api.client;
        c.parse_list_user_stories(self.api.transport.execute(c.build_list_user_stories(query))?)
    }

    pub fn create(&self, input: &CreateUserStory) -> Result<UserStory, ApiError> {
        let c = &self.api.client;
        c.parse_create_user_story(self.api.transport.execute(c.build_create_user_story(input)?)?)
    }

    pub fn edit(&self, id: UserStoryId, patch: &UserStoryPatch) -> Result<UserStory, ApiError> {
        let c = &self.api.client;
        c.parse_edit_user_story(self.api.transport.execute(c.build_edit_user_story(id, patch)?)?)
    }

    pub fn get(&self, id: UserStoryId) -> Result<UserStory, ApiError> {
        let c = &self.api.client;
        c.parse_get_user_story(self.api.transport.execute(c.build_get_user_story(id))?)
    }

    pub fn get_by_ref(&self, reference: Ref, project: ProjectId) -> Result<UserStory, ApiError> {
        let c = &self.api.client;
        c.parse_get_user_story_by_ref(
            self.api
                .transport
                .execute(c.build_get_user_story_by_ref(reference, project))?,
        )
    }

    pub fn delete(&self, id: UserStoryId) -> Result<(), ApiError> {
        let c = &self.api.client;
        c.parse_delete_user_story(self.api.transport.execute(c.build_delete_user_story(id))?)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Replays canned responses and records the requests it saw.
    struct Scripted {
        responses: RefCell<Vec<Result<HttpResponse, ApiError>>>,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl Scripted {
        fn new(mut responses: Vec<Result<HttpResponse, ApiError>>) -> Self {
            responses.reverse();
            Self {
                responses: RefCell::new(responses),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for Scripted {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.borrow_mut().push(request);
            self.responses
                .borrow_mut()
                .pop()
                .expect("no scripted response left")
        }
    }

    fn api(responses: Vec<Result<HttpResponse, ApiError>>) -> Taiga<Scripted> {
        Taiga::new(TaigaClient::new("http://taiga"), Scripted::new(responses))
    }

    #[test]
    fn get_runs_one_round_trip() {
        let api = api(vec![Ok(HttpResponse::new(
            200,
            r#"{"id":3,"ref":9,"project":1,"subject":"E"}"#,
        ))]);
        let epic = api.epics().get(EpicId::new(3)).unwrap();
        assert_eq!(epic.reference, Ref::new(9));

        let seen = api.transport.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, HttpMethod::Get);
        assert_eq!(seen[0].path, "http://taiga/api/v1/epics/3");
    }

    #[test]
    fn transport_failure_surfaces_without_retry() {
        let api = api(vec![Err(ApiError::Transport {
            status: None,
            message: "connection refused".to_string(),
        })]);
        let err = api.epics().list(&EpicListQuery::default()).unwrap_err();
        assert!(matches!(err, ApiError::Transport { status: None, .. }));
        assert_eq!(api.transport.seen.borrow().len(), 1);
    }

    #[test]
    fn duplicate_relation_maps_to_conflict() {
        let api = api(vec![Ok(HttpResponse::new(409, "already related"))]);
        let err = api
            .epics()
            .create_related_user_story(EpicId::new(1), UserStoryId::new(2))
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict { .. }));
    }

    #[test]
    fn user_story_delete_expects_no_content() {
        let api = api(vec![Ok(HttpResponse::new(204, ""))]);
        api.user_stories().delete(UserStoryId::new(4)).unwrap();
        assert_eq!(
            api.transport.seen.borrow()[0].method,
            HttpMethod::Delete
        );
    }
}
