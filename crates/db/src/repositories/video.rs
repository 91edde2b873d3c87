//! Video repository.

use std::sync::Arc;

use crate::entities::{Like, Video, like, video};
use crate::repositories::like_pattern;
use crate::views::{VideoWithOwner, attach_video_owners};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, Select,
};
use vidtube_common::{AppError, AppResult, Page, PageQuery, SortDirection};

/// Sortable video columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VideoSortField {
    #[default]
    CreatedAt,
    Views,
    Duration,
    Title,
}

impl VideoSortField {
    /// Parse the `sortBy` query value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "createdAt" => Some(Self::CreatedAt),
            "views" => Some(Self::Views),
            "duration" => Some(Self::Duration),
            "title" => Some(Self::Title),
            _ => None,
        }
    }

    const fn column(self) -> video::Column {
        match self {
            Self::CreatedAt => video::Column::CreatedAt,
            Self::Views => video::Column::Views,
            Self::Duration => video::Column::Duration,
            Self::Title => video::Column::Title,
        }
    }
}

/// Filters and ordering for the public video listing.
#[derive(Debug, Clone, Default)]
pub struct VideoSearch {
    /// Case-insensitive substring of the title or description.
    pub query: Option<String>,
    /// Only videos owned by this user.
    pub owner_id: Option<String>,
    pub sort_by: VideoSortField,
    pub direction: SortDirection,
}

const fn order_of(direction: SortDirection) -> Order {
    match direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    }
}

/// Video repository for database operations.
#[derive(Clone)]
pub struct VideoRepository {
    db: Arc<DatabaseConnection>,
}

impl VideoRepository {
    /// Create a new video repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a video by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<video::Model>> {
        Video::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a video by ID together with its owner.
    pub async fn find_with_owner(&self, id: &str) -> AppResult<Option<VideoWithOwner>> {
        let Some(video) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        Ok(attach_video_owners(self.db.as_ref(), vec![video])
            .await?
            .into_iter()
            .next())
    }

    /// Create a new video.
    pub async fn create(&self, model: video::ActiveModel) -> AppResult<video::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a video.
    pub async fn update(&self, model: video::ActiveModel) -> AppResult<video::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a video row.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Video::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment the view counter atomically (single UPDATE query, no fetch).
    pub async fn increment_views(&self, id: &str) -> AppResult<()> {
        Video::update_many()
            .col_expr(video::Column::Views, Expr::col(video::Column::Views).add(1))
            .filter(video::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Published videos matching `search`, joined with their owners.
    pub async fn search(
        &self,
        search: &VideoSearch,
        page: &PageQuery,
    ) -> AppResult<Page<VideoWithOwner>> {
        let mut query = Video::find().filter(video::Column::IsPublished.eq(true));

        if let Some(q) = search.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = like_pattern(&q.to_lowercase());
            query = query.filter(
                Condition::any()
                    .add(Expr::expr(Func::lower(Expr::col(video::Column::Title))).like(&pattern))
                    .add(
                        Expr::expr(Func::lower(Expr::col(video::Column::Description)))
                            .like(&pattern),
                    ),
            );
        }

        if let Some(owner_id) = &search.owner_id {
            query = query.filter(video::Column::OwnerId.eq(owner_id.as_str()));
        }

        let order = order_of(search.direction);
        let query = query
            .order_by(search.sort_by.column(), order.clone())
            .order_by(video::Column::Id, order);

        self.fetch_page(query, page).await
    }

    /// Every video of `owner_id`, drafts included, newest first.
    pub async fn find_by_owner(
        &self,
        owner_id: &str,
        page: &PageQuery,
    ) -> AppResult<Page<video::Model>> {
        let query = Video::find()
            .filter(video::Column::OwnerId.eq(owner_id))
            .order_by_desc(video::Column::CreatedAt)
            .order_by_desc(video::Column::Id);

        let total = query
            .clone()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let videos = query
            .offset(page.offset())
            .limit(page.limit())
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Page::new(videos, total, page))
    }

    /// Videos liked by `user_id` that the user may see, newest first.
    pub async fn find_liked_by(
        &self,
        user_id: &str,
        page: &PageQuery,
    ) -> AppResult<Page<VideoWithOwner>> {
        let liked_ids = Like::find()
            .select_only()
            .column(like::Column::VideoId)
            .filter(like::Column::LikedBy.eq(user_id))
            .filter(like::Column::VideoId.is_not_null())
            .into_query();

        let query = Video::find()
            .filter(video::Column::Id.in_subquery(liked_ids))
            .filter(
                Condition::any()
                    .add(video::Column::IsPublished.eq(true))
                    .add(video::Column::OwnerId.eq(user_id)),
            )
            .order_by_desc(video::Column::CreatedAt)
            .order_by_desc(video::Column::Id);

        self.fetch_page(query, page).await
    }

    async fn fetch_page(
        &self,
        query: Select<Video>,
        page: &PageQuery,
    ) -> AppResult<Page<VideoWithOwner>> {
        let total = query
            .clone()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let videos = query
            .offset(page.offset())
            .limit(page.limit())
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let results = attach_video_owners(self.db.as_ref(), videos).await?;
        Ok(Page::new(results, total, page))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::user;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_video(id: &str, owner_id: &str) -> video::Model {
        video::Model {
            id: id.to_string(),
            title: format!("Video {id}"),
            description: "A test video".to_string(),
            video_url: format!("memory://media/videos/{id}.mp4"),
            thumbnail_url: format!("memory://media/thumbnails/{id}.png"),
            duration: 42,
            views: 0,
            is_published: true,
            owner_id: owner_id.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            full_name: username.to_uppercase(),
            password_hash: "hash".to_string(),
            avatar_url: format!("memory://media/avatars/{id}.png"),
            cover_image_url: None,
            token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_sort_field_parse() {
        assert_eq!(VideoSortField::parse("views"), Some(VideoSortField::Views));
        assert_eq!(
            VideoSortField::parse("createdAt"),
            Some(VideoSortField::CreatedAt)
        );
        assert_eq!(VideoSortField::parse("likes"), None);
    }

    #[tokio::test]
    async fn test_find_with_owner() {
        let video = create_test_video("v1", "u1");
        let owner = create_test_user("u1", "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[video.clone()]])
                .append_query_results([[owner]])
                .into_connection(),
        );

        let repo = VideoRepository::new(db);
        let found = repo.find_with_owner("v1").await.unwrap().unwrap();

        assert_eq!(found.video.id, "v1");
        assert_eq!(found.owner.username, "alice");
    }

    #[tokio::test]
    async fn test_find_with_owner_missing_video() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<video::Model>::new()])
                .into_connection(),
        );

        let repo = VideoRepository::new(db);
        assert!(repo.find_with_owner("v1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_second_page() {
        // 12 published videos, page 2 of size 5 holds videos 6..=10
        let page_rows: Vec<video::Model> = (6..=10)
            .map(|n| create_test_video(&format!("v{n}"), "u1"))
            .collect();

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(12))
                }]])
                .append_query_results([page_rows])
                .append_query_results([[create_test_user("u1", "alice")]])
                .into_connection(),
        );

        let repo = VideoRepository::new(Arc::clone(&db));
        let page = repo
            .search(&VideoSearch::default(), &PageQuery::new(2, 5))
            .await
            .unwrap();

        assert_eq!(page.total, 12);
        assert_eq!(page.page, 2);
        assert_eq!(page.limit, 5);
        let ids: Vec<_> = page.results.iter().map(|r| r.video.id.as_str()).collect();
        assert_eq!(ids, vec!["v6", "v7", "v8", "v9", "v10"]);

        // The row query skips the first page and is ordered newest first
        drop(repo);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 3);
        let rows = format!("{:?}", log[1]);
        assert!(rows.contains(r#"ORDER BY \"video\".\"created_at\" DESC"#), "{rows}");
        assert!(rows.contains("LIMIT") && rows.contains("OFFSET"), "{rows}");
        assert_eq!(rows.matches("BigUnsigned(Some(5))").count(), 2, "{rows}");
    }

    #[tokio::test]
    async fn test_search_empty_page_skips_owner_lookup() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0))
                }]])
                .append_query_results([Vec::<video::Model>::new()])
                .into_connection(),
        );

        let repo = VideoRepository::new(db);
        let search = VideoSearch {
            query: Some("nothing_here".to_string()),
            ..VideoSearch::default()
        };
        let page = repo.search(&search, &PageQuery::default()).await.unwrap();

        assert_eq!(page.total, 0);
        assert!(page.results.is_empty());
    }

    #[tokio::test]
    async fn test_increment_views() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = VideoRepository::new(db);
        assert!(repo.increment_views("v1").await.is_ok());
    }
}
