//! Subscription repository.

use std::sync::Arc;

use crate::entities::{Subscription, subscription};
use crate::repositories::write_err;
use crate::views::{SubscriptionWithUser, user_summaries};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use vidtube_common::{AppError, AppResult, Page, PageQuery};

/// Which side of a subscription a listing is keyed on.
#[derive(Clone, Copy)]
enum Side {
    /// List a channel's subscribers.
    Subscribers,
    /// List a subscriber's channels.
    Channels,
}

/// Subscription repository for database operations.
#[derive(Clone)]
pub struct SubscriptionRepository {
    db: Arc<DatabaseConnection>,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the subscription of `subscriber_id` to `channel_id`.
    pub async fn find(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> AppResult<Option<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .filter(subscription::Column::ChannelId.eq(channel_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a subscription.
    ///
    /// Fails with [`AppError::Conflict`] if it already exists.
    pub async fn create(
        &self,
        model: subscription::ActiveModel,
    ) -> AppResult<subscription::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| write_err(e, "Already subscribed"))
    }

    /// Delete a subscription.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Subscription::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count subscribers of a channel.
    pub async fn count_subscribers(&self, channel_id: &str) -> AppResult<u64> {
        Subscription::find()
            .filter(subscription::Column::ChannelId.eq(channel_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Subscribers of a channel, newest first, joined with the subscriber.
    pub async fn find_subscribers(
        &self,
        channel_id: &str,
        page: &PageQuery,
    ) -> AppResult<Page<SubscriptionWithUser>> {
        self.find_page(Side::Subscribers, channel_id, page).await
    }

    /// Channels a user subscribes to, newest first, joined with the channel.
    pub async fn find_channels(
        &self,
        subscriber_id: &str,
        page: &PageQuery,
    ) -> AppResult<Page<SubscriptionWithUser>> {
        self.find_page(Side::Channels, subscriber_id, page).await
    }

    async fn find_page(
        &self,
        side: Side,
        key: &str,
        page: &PageQuery,
    ) -> AppResult<Page<SubscriptionWithUser>> {
        let key_column = match side {
            Side::Subscribers => subscription::Column::ChannelId,
            Side::Channels => subscription::Column::SubscriberId,
        };

        let query = Subscription::find()
            .filter(key_column.eq(key))
            .order_by_desc(subscription::Column::CreatedAt)
            .order_by_desc(subscription::Column::Id);

        let total = query
            .clone()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let rows = query
            .offset(page.offset())
            .limit(page.limit())
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let other_side = |s: &subscription::Model| match side {
            Side::Subscribers => s.subscriber_id.clone(),
            Side::Channels => s.channel_id.clone(),
        };

        let users = user_summaries(self.db.as_ref(), rows.iter().map(other_side).collect()).await?;

        let results = rows
            .into_iter()
            .filter_map(|subscription| {
                users
                    .get(&other_side(&subscription))
                    .cloned()
                    .map(|user| SubscriptionWithUser { subscription, user })
            })
            .collect();

        Ok(Page::new(results, total, page))
    }
}
