//! Repository for the `stories` table. Every query is scoped to its owner.

use sqlx::PgPool;
use storyloom_core::types::DbId;

use crate::models::story::{Story, StoryListItem};

const COLUMNS: &str = "id, user_id, title, content, created_at";

/// Provides per-user CRUD for saved stories.
pub struct StoryRepo;

impl StoryRepo {
    /// Insert a story and return its id.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        title: &str,
        content: &str,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO stories (user_id, title, content)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(user_id)
        .bind(title)
        .bind(content)
        .fetch_one(pool)
        .await
    }

    /// List a user's stories, oldest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<StoryListItem>, sqlx::Error> {
        sqlx::query_as::<_, StoryListItem>(
            "SELECT id, title FROM stories WHERE user_id = $1 ORDER BY id ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Find one of a user's stories.
    pub async fn find_for_user(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<Story>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stories WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Story>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete one of a user's stories. Returns `true` if a row was removed.
    pub async fn delete_for_user(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM stories WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
