pub mod auth;
pub mod generation;
pub mod health;
pub mod stories;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/register             POST
/// /auth/login                POST
///
/// /stories                   POST (save), GET (list)
/// /stories/generate          POST
/// /stories/{id}              GET, DELETE
///
/// /images/generate           POST
/// /documents                 POST
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/stories", stories::router())
        .nest("/images", generation::images_router())
        .nest("/documents", generation::documents_router())
}
