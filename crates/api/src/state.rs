use std::sync::Arc;

use storyloom_core::store::{StoryStore, UserDirectory};
use storyloom_pipeline::StoryPipeline;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind an `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Saved stories, scoped per user.
    pub stories: Arc<dyn StoryStore>,
    /// Registered users.
    pub users: Arc<dyn UserDirectory>,
    /// The text → image → document pipeline.
    pub pipeline: Arc<StoryPipeline>,
    /// Database pool, when the stores are PostgreSQL-backed.
    pub pool: Option<storyloom_db::DbPool>,
}
