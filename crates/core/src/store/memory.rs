//! Process-local [`StoryStore`] and [`UserDirectory`].
//!
//! Used when no database is configured and by the HTTP integration tests.
//! Contents are lost on restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{StoryRecord, StoryStore, StorySummary, UserDirectory, UserRecord};
use crate::error::CoreError;
use crate::types::DbId;

#[derive(Default)]
struct State {
    next_story_id: DbId,
    next_user_id: DbId,
    /// story id -> (owner id, record)
    stories: BTreeMap<DbId, (DbId, StoryRecord)>,
    users: Vec<UserRecord>,
}

/// In-memory store backed by a single `RwLock`.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoryStore for InMemoryStore {
    async fn save(&self, user_id: DbId, title: &str, content: &str) -> Result<DbId, CoreError> {
        let mut state = self.state.write().await;
        state.next_story_id += 1;
        let id = state.next_story_id;
        let record = StoryRecord {
            id,
            title: title.to_string(),
            content: content.to_string(),
            created_at: chrono::Utc::now(),
        };
        state.stories.insert(id, (user_id, record));
        Ok(id)
    }

    async fn list(&self, user_id: DbId) -> Result<Vec<StorySummary>, CoreError> {
        let state = self.state.read().await;
        Ok(state
            .stories
            .values()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, story)| StorySummary {
                id: story.id,
                title: story.title.clone(),
            })
            .collect())
    }

    async fn get(&self, user_id: DbId, id: DbId) -> Result<StoryRecord, CoreError> {
        let state = self.state.read().await;
        match state.stories.get(&id) {
            Some((owner, story)) if *owner == user_id => Ok(story.clone()),
            _ => Err(CoreError::NotFound { entity: "Story", id }),
        }
    }

    async fn delete(&self, user_id: DbId, id: DbId) -> Result<(), CoreError> {
        let mut state = self.state.write().await;
        match state.stories.get(&id) {
            Some((owner, _)) if *owner == user_id => {
                state.stories.remove(&id);
                Ok(())
            }
            _ => Err(CoreError::NotFound { entity: "Story", id }),
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<UserRecord, CoreError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.username == username) {
            return Err(CoreError::Conflict(format!(
                "Username '{username}' is already taken"
            )));
        }
        state.next_user_id += 1;
        let user = UserRecord {
            id: state.next_user_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: chrono::Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, CoreError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }
}
