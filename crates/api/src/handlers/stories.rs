//! Handlers for the `/stories` resource. Every operation is scoped to the
//! authenticated caller.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use storyloom_core::error::ValidationError;
use storyloom_core::store::{StoryRecord, StorySummary};
use storyloom_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::auth::Caller;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /stories`.
#[derive(Debug, Deserialize)]
pub struct SaveStoryRequest {
    pub title: String,
    pub content: String,
}

/// Response body for `POST /stories`.
#[derive(Debug, Serialize)]
pub struct SavedStory {
    pub id: DbId,
}

/// POST /api/v1/stories
pub async fn save_story(
    caller: Caller,
    State(state): State<AppState>,
    Json(input): Json<SaveStoryRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SavedStory>>)> {
    if input.title.trim().is_empty() {
        return Err(ValidationError::new("title", "must not be blank").into());
    }

    let id = state
        .stories
        .save(caller.id, input.title.trim(), &input.content)
        .await?;
    tracing::info!(caller = caller.id, story_id = id, "Story saved");

    Ok((StatusCode::CREATED, Json(DataResponse { data: SavedStory { id } })))
}

/// GET /api/v1/stories
pub async fn list_stories(
    caller: Caller,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<StorySummary>>>> {
    let stories = state.stories.list(caller.id).await?;
    Ok(Json(DataResponse { data: stories }))
}

/// GET /api/v1/stories/{id}
pub async fn get_story(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<StoryRecord>>> {
    let story = state.stories.get(caller.id, id).await?;
    Ok(Json(DataResponse { data: story }))
}

/// DELETE /api/v1/stories/{id}
pub async fn delete_story(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.stories.delete(caller.id, id).await?;
    tracing::info!(caller = caller.id, story_id = id, "Story deleted");
    Ok(StatusCode::NO_CONTENT)
}
