//! Route definitions for the `/stories` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{generation, stories};
use crate::state::AppState;

/// Routes mounted at `/stories`. All require authentication.
///
/// ```text
/// POST   /          -> save_story
/// GET    /          -> list_stories
/// POST   /generate  -> generate_story
/// GET    /{id}      -> get_story
/// DELETE /{id}      -> delete_story
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(stories::save_story).get(stories::list_stories))
        .route("/generate", post(generation::generate_story))
        .route("/{id}", get(stories::get_story).delete(stories::delete_story))
}
