//! Route definitions for image generation and document composition.

use axum::routing::post;
use axum::Router;

use crate::handlers::generation;
use crate::state::AppState;

/// Routes mounted at `/images`.
///
/// ```text
/// POST /generate -> generate_image
/// ```
pub fn images_router() -> Router<AppState> {
    Router::new().route("/generate", post(generation::generate_image))
}

/// Routes mounted at `/documents`.
///
/// ```text
/// POST / -> create_document
/// ```
pub fn documents_router() -> Router<AppState> {
    Router::new().route("/", post(generation::create_document))
}
