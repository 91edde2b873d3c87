//! Dashboard service: a channel owner's view of their own channel.

use vidtube_common::{AppResult, Page, PageQuery};
use vidtube_db::{
    entities::video,
    repositories::{DashboardRepository, VideoRepository},
    views::ChannelStats,
};

/// Dashboard service for business logic.
#[derive(Clone)]
pub struct DashboardService {
    dashboard_repo: DashboardRepository,
    video_repo: VideoRepository,
}

impl DashboardService {
    /// Create a new dashboard service.
    #[must_use]
    pub const fn new(dashboard_repo: DashboardRepository, video_repo: VideoRepository) -> Self {
        Self {
            dashboard_repo,
            video_repo,
        }
    }

    /// Totals for the channel of `user_id`.
    pub async fn stats(&self, user_id: &str) -> AppResult<ChannelStats> {
        self.dashboard_repo.find_channel_stats(user_id).await
    }

    /// All videos of `user_id`, drafts included, newest first.
    pub async fn videos(&self, user_id: &str, page: &PageQuery) -> AppResult<Page<video::Model>> {
        self.video_repo.find_by_owner(user_id, page).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_video(n: usize) -> video::Model {
        video::Model {
            id: format!("v{n:02}"),
            title: format!("Video {n}"),
            description: "Description".to_string(),
            video_url: "memory://media/videos/v.mp4".to_string(),
            thumbnail_url: "memory://media/thumbnails/v.png".to_string(),
            duration: 10,
            views: 0,
            is_published: n % 2 == 0,
            owner_id: "u1".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_second_page_of_five() {
        // Twelve videos in total; the database returns rows 6-10 for page 2.
        let page_rows: Vec<video::Model> = (6..=10).map(create_test_video).collect();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(12))
                }]])
                .append_query_results([page_rows])
                .into_connection(),
        );

        let service = DashboardService::new(
            DashboardRepository::new(db.clone()),
            VideoRepository::new(db),
        );
        let page = service
            .videos("u1", &PageQuery::new(2, 5))
            .await
            .unwrap();

        assert_eq!(page.total, 12);
        assert_eq!(page.page, 2);
        assert_eq!(page.limit, 5);
        let ids: Vec<&str> = page.results.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["v06", "v07", "v08", "v09", "v10"]);
    }
}
