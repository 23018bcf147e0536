//! Saved story model.

use sqlx::FromRow;
use storyloom_core::store::{StoryRecord, StorySummary};
use storyloom_core::types::{DbId, Timestamp};

/// Full row from the `stories` table.
#[derive(Debug, Clone, FromRow)]
pub struct Story {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub content: String,
    pub created_at: Timestamp,
}

/// `id, title` projection used for listings.
#[derive(Debug, Clone, FromRow)]
pub struct StoryListItem {
    pub id: DbId,
    pub title: String,
}

impl From<Story> for StoryRecord {
    fn from(story: Story) -> Self {
        Self {
            id: story.id,
            title: story.title,
            content: story.content,
            created_at: story.created_at,
        }
    }
}

impl From<StoryListItem> for StorySummary {
    fn from(item: StoryListItem) -> Self {
        Self {
            id: item.id,
            title: item.title,
        }
    }
}
