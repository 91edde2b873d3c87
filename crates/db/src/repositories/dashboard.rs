//! Dashboard repository: channel-wide aggregates.

use std::sync::Arc;

use crate::entities::{Like, Subscription, Video, like, subscription, video};
use crate::views::ChannelStats;
use sea_orm::sea_query::Alias;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QuerySelect, QueryTrait,
};
use vidtube_common::{AppError, AppResult};

/// Dashboard repository for database operations.
#[derive(Clone)]
pub struct DashboardRepository {
    db: Arc<DatabaseConnection>,
}

impl DashboardRepository {
    /// Create a new dashboard repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Aggregate statistics for the channel of `owner_id`.
    pub async fn find_channel_stats(&self, owner_id: &str) -> AppResult<ChannelStats> {
        #[derive(FromQueryResult)]
        struct SumResult {
            total: Option<i64>,
        }

        let total_videos = Video::find()
            .filter(video::Column::OwnerId.eq(owner_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // SUM(bigint) is numeric in PostgreSQL
        let total_views = Video::find()
            .filter(video::Column::OwnerId.eq(owner_id))
            .select_only()
            .column_as(
                video::Column::Views.sum().cast_as(Alias::new("bigint")),
                "total",
            )
            .into_model::<SumResult>()
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .and_then(|r| r.total)
            .unwrap_or(0);

        let total_subscribers = Subscription::find()
            .filter(subscription::Column::ChannelId.eq(owner_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let channel_videos = Video::find()
            .select_only()
            .column(video::Column::Id)
            .filter(video::Column::OwnerId.eq(owner_id))
            .into_query();

        let total_likes = Like::find()
            .filter(like::Column::VideoId.in_subquery(channel_videos))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(ChannelStats {
            total_videos,
            total_views,
            total_subscribers,
            total_likes,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn count_row(n: i64) -> [std::collections::BTreeMap<&'static str, sea_orm::Value>; 1] {
        [maplit::btreemap! {
            "num_items" => sea_orm::Value::BigInt(Some(n))
        }]
    }

    #[tokio::test]
    async fn test_channel_stats() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([count_row(3)])
                .append_query_results([[maplit::btreemap! {
                    "total" => sea_orm::Value::BigInt(Some(150))
                }]])
                .append_query_results([count_row(8)])
                .append_query_results([count_row(21)])
                .into_connection(),
        );

        let repo = DashboardRepository::new(db);
        let stats = repo.find_channel_stats("u1").await.unwrap();

        assert_eq!(
            stats,
            ChannelStats {
                total_videos: 3,
                total_views: 150,
                total_subscribers: 8,
                total_likes: 21,
            }
        );
    }

    #[tokio::test]
    async fn test_channel_stats_without_videos() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([count_row(0)])
                .append_query_results([[maplit::btreemap! {
                    "total" => sea_orm::Value::BigInt(None)
                }]])
                .append_query_results([count_row(0)])
                .append_query_results([count_row(0)])
                .into_connection(),
        );

        let repo = DashboardRepository::new(db);
        let stats = repo.find_channel_stats("u1").await.unwrap();

        assert_eq!(stats, ChannelStats::default());
    }
}
