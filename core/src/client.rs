//! Stateless HTTP request builder and response parser for the Taiga API.
//!
//! # Design
//! `TaigaClient` holds only a `base_url` and an optional bearer token and
//! carries no mutable state between calls. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse`. The caller (usually a [`crate::Transport`])
//! executes the actual HTTP round-trip, keeping the core deterministic and
//! free of I/O.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    CreateEpic, CreateRelation, CreateUserStory, Epic, EpicId, EpicListQuery, EpicPatch,
    ProjectId, Ref, RelatedUserStory, UserStory, UserStoryId, UserStoryListQuery,
    UserStoryPatch,
};

const API_PREFIX: &str = "/api/v1";

/// Synchronous, stateless client for the Taiga epics and user stories API.
#[derive(Debug, Clone)]
pub struct TaigaClient {
    base_url: String,
    auth_token: Option<String>,
}

impl TaigaClient {
    /// `base_url` is the service root, without the `/api/v1` prefix.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let client = Self::new(&config.base_url);
        match &config.auth_token {
            Some(token) => client.with_auth_token(token),
            None => client,
        }
    }

    /// Attach an already-issued token; every built request carries it as a
    /// bearer `authorization` header.
    pub fn with_auth_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_string());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Epics
    // -----------------------------------------------------------------------

    pub fn build_list_epics(&self, query: &EpicListQuery) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            format!("/epics{}", query.to_query_string()),
        )
    }

    pub fn build_create_epic(&self, input: &CreateEpic) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/epics".to_string(), input)
    }

    pub fn build_edit_epic(&self, id: EpicId, patch: &EpicPatch) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Patch, format!("/epics/{id}"), patch)
    }

    pub fn build_get_epic(&self, id: EpicId) -> HttpRequest {
        self.request(HttpMethod::Get, format!("/epics/{id}"))
    }

    pub fn build_get_epic_by_ref(&self, reference: Ref, project: ProjectId) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            format!("/epics/by_ref?ref={reference}&project={project}"),
        )
    }

    pub fn build_delete_epic(&self, id: EpicId) -> HttpRequest {
        self.request(HttpMethod::Delete, format!("/epics/{id}"))
    }

    pub fn parse_list_epics(&self, response: HttpResponse) -> Result<Vec<Epic>, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_create_epic(&self, response: HttpResponse) -> Result<Epic, ApiError> {
        parse_json(response, 201)
    }

    pub fn parse_edit_epic(&self, response: HttpResponse) -> Result<Epic, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_get_epic(&self, response: HttpResponse) -> Result<Epic, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_get_epic_by_ref(&self, response: HttpResponse) -> Result<Epic, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_delete_epic(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)
    }

    // -----------------------------------------------------------------------
    // Epic / user story relations
    // -----------------------------------------------------------------------

    pub fn build_create_related_user_story(
        &self,
        epic: EpicId,
        user_story: UserStoryId,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Post,
            format!("/epics/{epic}/related_userstories"),
            &CreateRelation { epic, user_story },
        )
    }

    pub fn build_list_related_user_stories(&self, epic: EpicId) -> HttpRequest {
        self.request(HttpMethod::Get, format!("/epics/{epic}/related_userstories"))
    }

    pub fn parse_create_related_user_story(
        &self,
        response: HttpResponse,
    ) -> Result<RelatedUserStory, ApiError> {
        parse_json(response, 201)
    }

    pub fn parse_list_related_user_stories(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<UserStory>, ApiError> {
        parse_json(response, 200)
    }

    // -----------------------------------------------------------------------
    // User stories
    // -----------------------------------------------------------------------

    pub fn build_list_user_stories(&self, query: &UserStoryListQuery) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            format!("/userstories{}", query.to_query_string()),
        )
    }

    pub fn build_create_user_story(
        &self,
        input: &CreateUserStory,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/userstories".to_string(), input)
    }

    pub fn build_edit_user_story(
        &self,
        id: UserStoryId,
        patch: &UserStoryPatch,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Patch, format!("/userstories/{id}"), patch)
    }

    pub fn build_get_user_story(&self, id: UserStoryId) -> HttpRequest {
        self.request(HttpMethod::Get, format!("/userstories/{id}"))
    }

    pub fn build_get_user_story_by_ref(&self, reference: Ref, project: ProjectId) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            format!("/userstories/by_ref?ref={reference}&project={project}"),
        )
    }

    pub fn build_delete_user_story(&self, id: UserStoryId) -> HttpRequest {
        self.request(HttpMethod::Delete, format!("/userstories/{id}"))
    }

    pub fn parse_list_user_stories(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<UserStory>, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_create_user_story(&self, response: HttpResponse) -> Result<UserStory, ApiError> {
        parse_json(response, 201)
    }

    pub fn parse_edit_user_story(&self, response: HttpResponse) -> Result<UserStory, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_get_user_story(&self, response: HttpResponse) -> Result<UserStory, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_get_user_story_by_ref(
        &self,
        response: HttpResponse,
    ) -> Result<UserStory, ApiError> {
        parse_json(response, 200)
    }

    pub fn parse_delete_user_story(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)
    }

    // -----------------------------------------------------------------------
    // Request plumbing
    // -----------------------------------------------------------------------

    fn request(&self, method: HttpMethod, path: String) -> HttpRequest {
        let path = format!("{}{API_PREFIX}{path}", self.base_url);
        debug!(%method, %path, "built request");
        HttpRequest {
            method,
            path,
            headers: self.auth_headers(),
            body: None,
        }
    }

    fn json_request<B: Serialize>(
        &self,
        method: HttpMethod,
        path: String,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut req = self.request(method, path);
        req.headers
            .push(("content-type".to_string(), "application/json".to_string()));
        req.body = Some(body);
        Ok(req)
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        match &self.auth_token {
            Some(token) => vec![("authorization".to_string(), format!("Bearer {token}"))],
            None => Vec::new(),
        }
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    let err = ApiError::from_status(response.status, &response.body);
    warn!(status = response.status, expected, error = %err, "unexpected response status");
    Err(err)
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse, expected: u16) -> Result<T, ApiError> {
    check_status(&response, expected)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}
