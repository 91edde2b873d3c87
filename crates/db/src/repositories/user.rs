//! User repository.

use std::sync::Arc;

use crate::entities::{Subscription, User, subscription, user};
use crate::repositories::write_err;
use crate::views::ChannelProfile;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter,
};
use vidtube_common::{AppError, AppResult};

const DUPLICATE_USER: &str = "User with email or username already exists";

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Find a user by username (case-insensitive).
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Username.eq(username.trim().to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by username or email (case-insensitive), for login.
    pub async fn find_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<Option<user::Model>> {
        let mut condition = Condition::any();
        if let Some(username) = username {
            condition = condition.add(user::Column::Username.eq(username.trim().to_lowercase()));
        }
        if let Some(email) = email {
            condition = condition.add(user::Column::Email.eq(email.trim().to_lowercase()));
        }
        if condition.is_empty() {
            return Ok(None);
        }

        User::find()
            .filter(condition)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by access token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    ///
    /// Fails with [`AppError::Conflict`] on a duplicate username or email.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| write_err(e, DUPLICATE_USER))
    }

    /// Update a user.
    ///
    /// Fails with [`AppError::Conflict`] on a duplicate username or email.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| write_err(e, DUPLICATE_USER))
    }

    /// Public channel page for `username`, as seen by `viewer_id`.
    pub async fn find_channel_profile(
        &self,
        username: &str,
        viewer_id: Option<&str>,
    ) -> AppResult<Option<ChannelProfile>> {
        let Some(user) = self.find_by_username(username).await? else {
            return Ok(None);
        };

        let subscribers_count = Subscription::find()
            .filter(subscription::Column::ChannelId.eq(user.id.as_str()))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let subscribed_to_count = Subscription::find()
            .filter(subscription::Column::SubscriberId.eq(user.id.as_str()))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let is_subscribed = match viewer_id {
            Some(viewer_id) => Subscription::find()
                .filter(subscription::Column::SubscriberId.eq(viewer_id))
                .filter(subscription::Column::ChannelId.eq(user.id.as_str()))
                .one(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .is_some(),
            None => false,
        };

        Ok(Some(ChannelProfile {
            user,
            subscribers_count,
            subscribed_to_count,
            is_subscribed,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            full_name: format!("{username} full"),
            password_hash: "hash".to_string(),
            avatar_url: format!("memory://media/avatars/{id}.png"),
            cover_image_url: None,
            token: Some(format!("token-{id}")),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let user = create_test_user("u1", "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let found = repo.find_by_id("u1").await.unwrap().unwrap();
        assert_eq!(found.username, "alice");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let err = repo.get_by_id("missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_by_login_without_identifiers() {
        // No query is issued.
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = UserRepository::new(db);
        assert!(repo.find_by_login(None, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_token() {
        let user = create_test_user("u1", "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let found = repo.find_by_token("token-u1").await.unwrap().unwrap();
        assert_eq!(found.id, "u1");
    }

    #[tokio::test]
    async fn test_channel_profile_for_viewer() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("c1", "channel")]])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(4))
                }]])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2))
                }]])
                .append_query_results([[subscription::Model {
                    id: "s1".to_string(),
                    subscriber_id: "u1".to_string(),
                    channel_id: "c1".to_string(),
                    created_at: Utc::now().into(),
                }]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let profile = repo
            .find_channel_profile("Channel", Some("u1"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(profile.user.id, "c1");
        assert_eq!(profile.subscribers_count, 4);
        assert_eq!(profile.subscribed_to_count, 2);
        assert!(profile.is_subscribed);
    }

    #[tokio::test]
    async fn test_channel_profile_anonymous() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("c1", "channel")]])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0))
                }]])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0))
                }]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let profile = repo
            .find_channel_profile("channel", None)
            .await
            .unwrap()
            .unwrap();

        assert!(!profile.is_subscribed);
    }
}
