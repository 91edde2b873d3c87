//! Subscription service: following channels.

use chrono::Utc;
use sea_orm::Set;
use tracing::info;
use vidtube_common::{AppError, AppResult, IdGenerator, Page, PageQuery};
use vidtube_db::{
    entities::subscription,
    repositories::{SubscriptionRepository, UserRepository},
    views::SubscriptionWithUser,
};

use super::ToggleOutcome;

/// Subscription service for business logic.
#[derive(Clone)]
pub struct SubscriptionService {
    subscription_repo: SubscriptionRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Result of toggling a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionToggle {
    pub outcome: ToggleOutcome,
    /// Subscriber count of the channel after the toggle
    pub subscribers_count: u64,
}

impl SubscriptionService {
    /// Create a new subscription service.
    #[must_use]
    pub const fn new(subscription_repo: SubscriptionRepository, user_repo: UserRepository) -> Self {
        Self {
            subscription_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Subscribe `subscriber_id` to `channel_id`, or unsubscribe if already subscribed.
    pub async fn toggle(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> AppResult<SubscriptionToggle> {
        if subscriber_id == channel_id {
            return Err(AppError::invalid("channelId: cannot subscribe to yourself"));
        }

        if self.user_repo.find_by_id(channel_id).await?.is_none() {
            return Err(AppError::NotFound("Channel not found".to_string()));
        }

        let outcome = match self.subscription_repo.find(subscriber_id, channel_id).await? {
            Some(existing) => {
                self.subscription_repo.delete(&existing.id).await?;
                ToggleOutcome::Removed
            }
            None => {
                let model = subscription::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    subscriber_id: Set(subscriber_id.to_string()),
                    channel_id: Set(channel_id.to_string()),
                    created_at: Set(Utc::now().into()),
                };
                match self.subscription_repo.create(model).await {
                    Ok(_) | Err(AppError::Conflict(_)) => ToggleOutcome::Created,
                    Err(e) => return Err(e),
                }
            }
        };

        let subscribers_count = self.subscription_repo.count_subscribers(channel_id).await?;
        info!(
            subscriber_id,
            channel_id,
            subscribed = outcome.is_active(),
            "Toggled subscription"
        );

        Ok(SubscriptionToggle {
            outcome,
            subscribers_count,
        })
    }

    /// Subscribers of `channel_id`, newest first.
    pub async fn subscribers(
        &self,
        channel_id: &str,
        page: &PageQuery,
    ) -> AppResult<Page<SubscriptionWithUser>> {
        self.user_repo.get_by_id(channel_id).await?;
        self.subscription_repo.find_subscribers(channel_id, page).await
    }

    /// Channels `subscriber_id` subscribes to, newest first.
    pub async fn channels(
        &self,
        subscriber_id: &str,
        page: &PageQuery,
    ) -> AppResult<Page<SubscriptionWithUser>> {
        self.user_repo.get_by_id(subscriber_id).await?;
        self.subscription_repo.find_channels(subscriber_id, page).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;
    use vidtube_db::entities::user;

    fn create_test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user_{id}"),
            email: format!("{id}@example.com"),
            full_name: "Test User".to_string(),
            password_hash: "hash".to_string(),
            avatar_url: "memory://media/avatars/a.png".to_string(),
            cover_image_url: None,
            token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_subscription(id: &str) -> subscription::Model {
        subscription::Model {
            id: id.to_string(),
            subscriber_id: "u1".to_string(),
            channel_id: "c1".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn count_row(n: i64) -> [std::collections::BTreeMap<&'static str, sea_orm::Value>; 1] {
        [maplit::btreemap! {
            "num_items" => sea_orm::Value::BigInt(Some(n))
        }]
    }

    fn service(db: DatabaseConnection) -> SubscriptionService {
        let db = Arc::new(db);
        SubscriptionService::new(SubscriptionRepository::new(db.clone()), UserRepository::new(db))
    }

    #[tokio::test]
    async fn test_self_subscription_is_invalid_without_lookup() {
        // No query results: any database access would fail differently.
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = service(db).toggle("u1", "u1").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_subscribe() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user("c1")]])
            .append_query_results([Vec::<subscription::Model>::new()])
            .append_query_results([[create_test_subscription("s1")]])
            .append_query_results([count_row(1)])
            .into_connection();

        let toggle = service(db).toggle("u1", "c1").await.unwrap();

        assert_eq!(
            toggle,
            SubscriptionToggle {
                outcome: ToggleOutcome::Created,
                subscribers_count: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_unsubscribe() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_user("c1")]])
            .append_query_results([[create_test_subscription("s1")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([count_row(0)])
            .into_connection();

        let toggle = service(db).toggle("u1", "c1").await.unwrap();

        assert_eq!(toggle.outcome, ToggleOutcome::Removed);
        assert_eq!(toggle.subscribers_count, 0);
    }

    #[tokio::test]
    async fn test_toggle_missing_channel_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let err = service(db).toggle("u1", "c1").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
