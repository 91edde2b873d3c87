//! Tweet repository.

use std::sync::Arc;

use crate::entities::{Tweet, tweet};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use vidtube_common::{AppError, AppResult, Page, PageQuery};

/// Tweet repository for database operations.
#[derive(Clone)]
pub struct TweetRepository {
    db: Arc<DatabaseConnection>,
}

impl TweetRepository {
    /// Create a new tweet repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a tweet by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<tweet::Model>> {
        Tweet::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new tweet.
    pub async fn create(&self, model: tweet::ActiveModel) -> AppResult<tweet::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a tweet.
    pub async fn update(&self, model: tweet::ActiveModel) -> AppResult<tweet::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a tweet.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Tweet::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Tweets of a user, newest first.
    pub async fn find_by_owner(
        &self,
        owner_id: &str,
        page: &PageQuery,
    ) -> AppResult<Page<tweet::Model>> {
        let query = Tweet::find()
            .filter(tweet::Column::OwnerId.eq(owner_id))
            .order_by_desc(tweet::Column::CreatedAt)
            .order_by_desc(tweet::Column::Id);

        let total = query
            .clone()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let tweets = query
            .offset(page.offset())
            .limit(page.limit())
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Page::new(tweets, total, page))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, Set};

    fn create_test_tweet(id: &str, owner_id: &str, content: &str) -> tweet::Model {
        tweet::Model {
            id: id.to_string(),
            content: content.to_string(),
            owner_id: owner_id.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<tweet::Model>::new()])
                .into_connection(),
        );

        let repo = TweetRepository::new(db);
        assert!(repo.find_by_id("t1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_content() {
        let tweet = create_test_tweet("t1", "u1", "hello");
        let updated = tweet::Model {
            content: "bye".to_string(),
            ..tweet.clone()
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[updated]])
                .into_connection(),
        );

        let repo = TweetRepository::new(db);
        let mut active: tweet::ActiveModel = tweet.into();
        active.content = Set("bye".to_string());
        let result = repo.update(active).await.unwrap();

        assert_eq!(result.content, "bye");
    }

    #[tokio::test]
    async fn test_find_by_owner_paginates() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3))
                }]])
                .append_query_results([[
                    create_test_tweet("t3", "u1", "third"),
                    create_test_tweet("t2", "u1", "second"),
                ]])
                .into_connection(),
        );

        let repo = TweetRepository::new(db);
        let page = repo
            .find_by_owner("u1", &PageQuery::new(1, 2))
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].content, "third");
    }
}
