//! [`StoryStore`] and [`UserDirectory`] over PostgreSQL.

use async_trait::async_trait;
use storyloom_core::error::CoreError;
use storyloom_core::store::{StoryRecord, StoryStore, StorySummary, UserDirectory, UserRecord};
use storyloom_core::types::DbId;

use crate::repositories::{StoryRepo, UserRepo};
use crate::DbPool;

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Database-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn internal(err: sqlx::Error) -> CoreError {
    tracing::error!(error = %err, "Database error");
    CoreError::Internal(err.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION)
    )
}

#[async_trait]
impl StoryStore for PgStore {
    async fn save(&self, user_id: DbId, title: &str, content: &str) -> Result<DbId, CoreError> {
        StoryRepo::create(&self.pool, user_id, title, content)
            .await
            .map_err(internal)
    }

    async fn list(&self, user_id: DbId) -> Result<Vec<StorySummary>, CoreError> {
        let rows = StoryRepo::list_for_user(&self.pool, user_id)
            .await
            .map_err(internal)?;
        Ok(rows.into_iter().map(StorySummary::from).collect())
    }

    async fn get(&self, user_id: DbId, id: DbId) -> Result<StoryRecord, CoreError> {
        StoryRepo::find_for_user(&self.pool, user_id, id)
            .await
            .map_err(internal)?
            .map(StoryRecord::from)
            .ok_or(CoreError::NotFound { entity: "Story", id })
    }

    async fn delete(&self, user_id: DbId, id: DbId) -> Result<(), CoreError> {
        let deleted = StoryRepo::delete_for_user(&self.pool, user_id, id)
            .await
            .map_err(internal)?;
        if deleted {
            Ok(())
        } else {
            Err(CoreError::NotFound { entity: "Story", id })
        }
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<UserRecord, CoreError> {
        match UserRepo::create(&self.pool, username, password_hash).await {
            Ok(user) => Ok(user.into()),
            Err(e) if is_unique_violation(&e) => Err(CoreError::Conflict(format!(
                "Username '{username}' is already taken"
            ))),
            Err(e) => Err(internal(e)),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, CoreError> {
        let user = UserRepo::find_by_username(&self.pool, username)
            .await
            .map_err(internal)?;
        Ok(user.map(UserRecord::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
    }

    #[test]
    fn internal_keeps_message() {
        let err = internal(sqlx::Error::PoolClosed);
        assert!(matches!(err, CoreError::Internal(ref m) if m.contains("closed")));
    }
}
