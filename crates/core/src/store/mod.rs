//! Story Store and user directory contracts.
//!
//! The pipeline only ever writes through [`StoryStore::save`]; listing,
//! fetching and deleting are exposed to the HTTP layer. Every operation is
//! scoped to the owning user, so one user can never see another's stories.

pub mod memory;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

pub use memory::InMemoryStore;

/// Entry in a user's story list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorySummary {
    pub id: DbId,
    pub title: String,
}

/// A saved story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryRecord {
    pub id: DbId,
    pub title: String,
    pub content: String,
    pub created_at: Timestamp,
}

/// A registered user. Never serialize this; it carries the password hash.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: DbId,
    pub username: String,
    pub password_hash: String,
    pub created_at: Timestamp,
}

/// Per-user story persistence.
#[async_trait]
pub trait StoryStore: Send + Sync {
    /// Persist a story and return its id.
    async fn save(&self, user_id: DbId, title: &str, content: &str) -> Result<DbId, CoreError>;

    /// List the user's stories, oldest first.
    async fn list(&self, user_id: DbId) -> Result<Vec<StorySummary>, CoreError>;

    /// Fetch one of the user's stories. [`CoreError::NotFound`] when it does
    /// not exist or belongs to someone else.
    async fn get(&self, user_id: DbId, id: DbId) -> Result<StoryRecord, CoreError>;

    /// Delete one of the user's stories. [`CoreError::NotFound`] when nothing
    /// was deleted.
    async fn delete(&self, user_id: DbId, id: DbId) -> Result<(), CoreError>;
}

/// Registered users, looked up by the auth layer.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Register a user. [`CoreError::Conflict`] when the username is taken.
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<UserRecord, CoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, CoreError>;
}
