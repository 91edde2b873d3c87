//! Comment service.

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;
use vidtube_common::{AppError, AppResult, IdGenerator, Page, PageQuery};
use vidtube_db::{
    entities::comment,
    repositories::{CommentRepository, VideoRepository},
    views::CommentWithOwner,
};

use super::{ensure_owner, not_blank};

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    video_repo: VideoRepository,
    id_gen: IdGenerator,
}

/// Body of a new or edited comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CommentInput {
    #[validate(custom(function = "not_blank"), length(max = 2000))]
    pub content: String,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(comment_repo: CommentRepository, video_repo: VideoRepository) -> Self {
        Self {
            comment_repo,
            video_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Comments on `video_id`, newest first.
    ///
    /// A draft's comments are visible to its owner only.
    pub async fn list(
        &self,
        video_id: &str,
        viewer_id: Option<&str>,
        page: &PageQuery,
    ) -> AppResult<Page<CommentWithOwner>> {
        self.ensure_video(video_id, viewer_id).await?;
        self.comment_repo.find_by_video(video_id, page).await
    }

    /// Comment on `video_id` as `user_id`.
    pub async fn add(
        &self,
        video_id: &str,
        user_id: &str,
        input: CommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;
        self.ensure_video(video_id, Some(user_id)).await?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            content: Set(input.content.trim().to_string()),
            video_id: Set(video_id.to_string()),
            owner_id: Set(user_id.to_string()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let comment = self.comment_repo.create(model).await?;
        info!(comment_id = %comment.id, video_id, "Added comment");
        Ok(comment)
    }

    /// Edit a comment. Only its author may do so.
    pub async fn update(
        &self,
        id: &str,
        user_id: &str,
        input: CommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;
        let comment = self.get_owned(id, user_id).await?;

        let mut active: comment::ActiveModel = comment.into();
        active.content = Set(input.content.trim().to_string());
        active.updated_at = Set(Some(Utc::now().into()));

        self.comment_repo.update(active).await
    }

    /// Delete a comment. Only its author may do so.
    pub async fn delete(&self, id: &str, user_id: &str) -> AppResult<()> {
        self.get_owned(id, user_id).await?;
        self.comment_repo.delete(id).await?;

        info!(comment_id = id, user_id, "Deleted comment");
        Ok(())
    }

    async fn ensure_video(&self, video_id: &str, viewer_id: Option<&str>) -> AppResult<()> {
        self.video_repo
            .find_by_id(video_id)
            .await?
            .filter(|v| v.is_published || viewer_id == Some(v.owner_id.as_str()))
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))
    }

    async fn get_owned(&self, id: &str, user_id: &str) -> AppResult<comment::Model> {
        let comment = self
            .comment_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
        ensure_owner(&comment.owner_id, user_id, "comment")?;
        Ok(comment)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;
    use vidtube_db::entities::video;

    fn create_test_comment(id: &str, owner_id: &str) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            content: "Nice one".to_string(),
            video_id: "v1".to_string(),
            owner_id: owner_id.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_draft(id: &str) -> video::Model {
        video::Model {
            is_published: false,
            ..create_test_video(id)
        }
    }

    fn create_test_video(id: &str) -> video::Model {
        video::Model {
            id: id.to_string(),
            title: "Video".to_string(),
            description: "Description".to_string(),
            video_url: "memory://media/videos/v.mp4".to_string(),
            thumbnail_url: "memory://media/thumbnails/v.png".to_string(),
            duration: 10,
            views: 0,
            is_published: true,
            owner_id: "u9".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(db: DatabaseConnection) -> CommentService {
        let db = Arc::new(db);
        CommentService::new(
            CommentRepository::new(db.clone()),
            VideoRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_add_comment() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_video("v1")]])
            .append_query_results([[create_test_comment("c1", "u1")]])
            .into_connection();

        let comment = service(db)
            .add(
                "v1",
                "u1",
                CommentInput {
                    content: " Nice one ".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(comment.id, "c1");
    }

    #[tokio::test]
    async fn test_add_to_missing_video_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<video::Model>::new()])
            .into_connection();

        let err = service(db)
            .add(
                "v1",
                "u1",
                CommentInput {
                    content: "hello".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_blank_comment_is_invalid() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = service(db)
            .add(
                "v1",
                "u1",
                CommentInput {
                    content: "\n\t ".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_forbidden() {
        // Only the lookup is answered; an update would find no result.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_comment("c1", "u1")]])
            .into_connection();

        let err = service(db)
            .update(
                "c1",
                "u2",
                CommentInput {
                    content: "edited".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_is_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_comment("c1", "u1")]])
            .into_connection();

        let err = service(db).delete("c1", "u2").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_list_of_missing_video_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<video::Model>::new()])
            .into_connection();

        let err = service(db)
            .list("v1", None, &PageQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_comments_on_someone_elses_draft_are_hidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_draft("v1")]])
            .append_query_results([[create_test_draft("v1")]])
            .append_query_results([[create_test_draft("v1")]])
            .into_connection();
        let service = service(db);

        let err = service
            .list("v1", None, &PageQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = service
            .list("v1", Some("u1"), &PageQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = service
            .add(
                "v1",
                "u1",
                CommentInput {
                    content: "first".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_owner_can_comment_on_own_draft() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_draft("v1")]])
            .append_query_results([[create_test_comment("c1", "u9")]])
            .into_connection();

        let comment = service(db)
            .add(
                "v1",
                "u9",
                CommentInput {
                    content: "note to self".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(comment.owner_id, "u9");
    }
}
