//! In-memory mock of the Taiga `/api/v1` epics and user stories endpoints.

pub mod store;

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

pub use store::{Epic, Project, Relation, Store, StoreError, UserStory};
use store::{CreateItem, CreateRelation, PatchItem};

pub type Db = Arc<RwLock<Store>>;

/// Project seeded by [`app`].
pub const DEFAULT_PROJECT_ID: u64 = 1;

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        match self {
            StoreError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "_error_message": "No matching object found.",
                    "_error_type": "taiga.base.exceptions.NotFound"
                })),
            )
                .into_response(),
            StoreError::Invalid(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            StoreError::Conflict(message) => (
                StatusCode::CONFLICT,
                Json(json!({"_error_message": message})),
            )
                .into_response(),
        }
    }
}

#[derive(Deserialize)]
pub struct ListParams {
    pub project: Option<u64>,
}

#[derive(Deserialize)]
pub struct ByRefParams {
    #[serde(rename = "ref")]
    pub reference: u64,
    pub project: u64,
}

pub fn app() -> Router {
    app_with_projects(&[DEFAULT_PROJECT_ID])
}

pub fn app_with_projects(projects: &[u64]) -> Router {
    let db: Db = Arc::new(RwLock::new(Store::with_projects(projects)));
    Router::new()
        .route("/api/v1/projects", get(list_projects))
        .route("/api/v1/projects/{id}", get(get_project))
        .route("/api/v1/epics", get(list_epics).post(create_epic))
        .route("/api/v1/epics/by_ref", get(epic_by_ref))
        .route(
            "/api/v1/epics/{id}",
            get(get_epic).patch(patch_epic).delete(delete_epic),
        )
        .route(
            "/api/v1/epics/{id}/related_userstories",
            get(list_related).post(create_related),
        )
        .route("/api/v1/userstories", get(list_stories).post(create_story))
        .route("/api/v1/userstories/by_ref", get(story_by_ref))
        .route(
            "/api/v1/userstories/{id}",
            get(get_story).patch(patch_story).delete(delete_story),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// --- projects ---

async fn list_projects(State(db): State<Db>) -> Json<Vec<Project>> {
    Json(db.read().await.projects())
}

async fn get_project(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<Project>, StoreError> {
    db.read().await.project(id).map(Json)
}

// --- epics ---

async fn list_epics(State(db): State<Db>, Query(params): Query<ListParams>) -> Json<Vec<Epic>> {
    Json(db.read().await.list_epics(params.project))
}

async fn create_epic(
    State(db): State<Db>,
    Json(input): Json<CreateItem>,
) -> Result<(StatusCode, Json<Epic>), StoreError> {
    let epic = db.write().await.create_epic(input)?;
    info!(id = epic.id, reference = epic.reference, project = epic.project, "epic created");
    Ok((StatusCode::CREATED, Json(epic)))
}

async fn get_epic(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Epic>, StoreError> {
    db.read().await.get_epic(id).map(Json)
}

async fn epic_by_ref(
    State(db): State<Db>,
    Query(params): Query<ByRefParams>,
) -> Result<Json<Epic>, StoreError> {
    db.read()
        .await
        .epic_by_ref(params.reference, params.project)
        .map(Json)
}

async fn patch_epic(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(patch): Json<PatchItem>,
) -> Result<Json<Epic>, StoreError> {
    let epic = db.write().await.patch_epic(id, patch)?;
    debug!(id, version = epic.version, "epic patched");
    Ok(Json(epic))
}

async fn delete_epic(State(db): State<Db>, Path(id): Path<u64>) -> Result<StatusCode, StoreError> {
    db.write().await.delete_epic(id)?;
    info!(id, "epic deleted");
    Ok(StatusCode::NO_CONTENT)
}

// --- relations ---

async fn list_related(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<UserStory>>, StoreError> {
    db.read().await.related_stories(id).map(Json)
}

async fn create_related(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<CreateRelation>,
) -> Result<(StatusCode, Json<Relation>), StoreError> {
    let relation = db.write().await.relate(id, input)?;
    info!(epic = relation.epic, user_story = relation.user_story, "user story related");
    Ok((StatusCode::CREATED, Json(relation)))
}

// --- user stories ---

async fn list_stories(
    State(db): State<Db>,
    Query(params): Query<ListParams>,
) -> Json<Vec<UserStory>> {
    Json(db.read().await.list_stories(params.project))
}

async fn create_story(
    State(db): State<Db>,
    Json(input): Json<CreateItem>,
) -> Result<(StatusCode, Json<UserStory>), StoreError> {
    let story = db.write().await.create_story(input)?;
    info!(
        id = story.id,
        reference = story.reference,
        project = story.project,
        "user story created"
    );
    Ok((StatusCode::CREATED, Json(story)))
}

async fn get_story(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<UserStory>, StoreError> {
    db.read().await.get_story(id).map(Json)
}

async fn story_by_ref(
    State(db): State<Db>,
    Query(params): Query<ByRefParams>,
) -> Result<Json<UserStory>, StoreError> {
    db.read()
        .await
        .story_by_ref(params.reference, params.project)
        .map(Json)
}

async fn patch_story(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(patch): Json<PatchItem>,
) -> Result<Json<UserStory>, StoreError> {
    let story = db.write().await.patch_story(id, patch)?;
    debug!(id, version = story.version, "user story patched");
    Ok(Json(story))
}

async fn delete_story(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<StatusCode, StoreError> {
    db.write().await.delete_story(id)?;
    info!(id, "user story deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epic_serializes_ref_field() {
        let epic = Epic {
            id: 1,
            reference: 2,
            project: 3,
            subject: "Test".to_string(),
            description: String::new(),
            version: 1,
        };
        let json = serde_json::to_value(&epic).unwrap();
        assert_eq!(json["ref"], 2);
        assert_eq!(json["subject"], "Test");
        assert!(json.get("reference").is_none());
    }

    #[test]
    fn create_item_tolerates_missing_fields() {
        let input: CreateItem = serde_json::from_str(r#"{"project":1}"#).unwrap();
        assert_eq!(input.project, Some(1));
        assert!(input.subject.is_none());
    }

    #[test]
    fn patch_item_all_fields_optional() {
        let input: PatchItem = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.subject.is_none());
        assert!(input.description.is_none());
    }

    #[test]
    fn by_ref_params_read_ref_key() {
        let params: ByRefParams = serde_json::from_str(r#"{"ref":4,"project":1}"#).unwrap();
        assert_eq!(params.reference, 4);
        assert_eq!(params.project, 1);
    }
}
