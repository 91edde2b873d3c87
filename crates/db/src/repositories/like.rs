//! Like repository.

use std::sync::Arc;

use crate::entities::{Like, like, like::LikeTarget};
use crate::repositories::write_err;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use vidtube_common::{AppError, AppResult};

/// Like repository for database operations.
#[derive(Clone)]
pub struct LikeRepository {
    db: Arc<DatabaseConnection>,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the like `user_id` gave to `target`.
    pub async fn find(&self, user_id: &str, target: &LikeTarget) -> AppResult<Option<like::Model>> {
        Like::find()
            .filter(like::Column::LikedBy.eq(user_id))
            .filter(target.column().eq(target.id()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a like.
    ///
    /// Fails with [`AppError::Conflict`] if the user already likes the target.
    pub async fn create(&self, model: like::ActiveModel) -> AppResult<like::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| write_err(e, "Already liked"))
    }

    /// Delete a like.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Like::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, Set};

    fn create_test_like(id: &str, user_id: &str, target: &LikeTarget) -> like::Model {
        like::Model {
            id: id.to_string(),
            video_id: matches!(target, LikeTarget::Video(_)).then(|| target.id().to_string()),
            comment_id: matches!(target, LikeTarget::Comment(_)).then(|| target.id().to_string()),
            tweet_id: matches!(target, LikeTarget::Tweet(_)).then(|| target.id().to_string()),
            liked_by: user_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_existing_like() {
        let target = LikeTarget::Tweet("t1".to_string());
        let like = create_test_like("l1", "u1", &target);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[like]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let found = repo.find("u1", &target).await.unwrap().unwrap();
        assert_eq!(found.target(), Some(target));
    }

    #[tokio::test]
    async fn test_create_like() {
        let target = LikeTarget::Comment("c1".to_string());
        let like = create_test_like("l1", "u1", &target);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[like.clone()]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let created = repo
            .create(like::ActiveModel {
                id: Set("l1".to_string()),
                video_id: Set(None),
                comment_id: Set(Some("c1".to_string())),
                tweet_id: Set(None),
                liked_by: Set("u1".to_string()),
                created_at: Set(like.created_at),
            })
            .await
            .unwrap();

        assert_eq!(created.comment_id.as_deref(), Some("c1"));
    }
}
