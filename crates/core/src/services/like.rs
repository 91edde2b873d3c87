//! Like service: toggling likes on videos, comments and tweets.

use chrono::Utc;
use sea_orm::Set;
use tracing::info;
use vidtube_common::{AppError, AppResult, IdGenerator, Page, PageQuery};
use vidtube_db::{
    entities::{like, like::LikeTarget},
    repositories::{CommentRepository, LikeRepository, TweetRepository, VideoRepository},
    views::VideoWithOwner,
};

use super::ToggleOutcome;

/// Like service for business logic.
#[derive(Clone)]
pub struct LikeService {
    like_repo: LikeRepository,
    video_repo: VideoRepository,
    comment_repo: CommentRepository,
    tweet_repo: TweetRepository,
    id_gen: IdGenerator,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub const fn new(
        like_repo: LikeRepository,
        video_repo: VideoRepository,
        comment_repo: CommentRepository,
        tweet_repo: TweetRepository,
    ) -> Self {
        Self {
            like_repo,
            video_repo,
            comment_repo,
            tweet_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Like `target` as `user_id`, or take the like back if it exists.
    pub async fn toggle(&self, user_id: &str, target: LikeTarget) -> AppResult<ToggleOutcome> {
        self.ensure_target(user_id, &target).await?;

        if let Some(existing) = self.like_repo.find(user_id, &target).await? {
            self.like_repo.delete(&existing.id).await?;
            info!(user_id, target = target.kind(), target_id = target.id(), "Removed like");
            return Ok(ToggleOutcome::Removed);
        }

        let id = target.id().to_string();
        let (video_id, comment_id, tweet_id) = match &target {
            LikeTarget::Video(_) => (Some(id), None, None),
            LikeTarget::Comment(_) => (None, Some(id), None),
            LikeTarget::Tweet(_) => (None, None, Some(id)),
        };

        let model = like::ActiveModel {
            id: Set(self.id_gen.generate()),
            video_id: Set(video_id),
            comment_id: Set(comment_id),
            tweet_id: Set(tweet_id),
            liked_by: Set(user_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        match self.like_repo.create(model).await {
            // A concurrent request liked it first
            Ok(_) | Err(AppError::Conflict(_)) => {
                info!(user_id, target = target.kind(), target_id = target.id(), "Added like");
                Ok(ToggleOutcome::Created)
            }
            Err(e) => Err(e),
        }
    }

    /// Videos liked by `user_id`, newest first.
    pub async fn liked_videos(
        &self,
        user_id: &str,
        page: &PageQuery,
    ) -> AppResult<Page<VideoWithOwner>> {
        self.video_repo.find_liked_by(user_id, page).await
    }

    async fn ensure_target(&self, user_id: &str, target: &LikeTarget) -> AppResult<()> {
        let found = match target {
            LikeTarget::Video(id) => self
                .video_repo
                .find_by_id(id)
                .await?
                .is_some_and(|v| v.is_published || v.owner_id == user_id),
            LikeTarget::Comment(id) => self.comment_repo.find_by_id(id).await?.is_some(),
            LikeTarget::Tweet(id) => self.tweet_repo.find_by_id(id).await?.is_some(),
        };

        if found {
            Ok(())
        } else {
            let kind = target.kind();
            let mut name = kind[..1].to_uppercase();
            name.push_str(&kind[1..]);
            Err(AppError::NotFound(format!("{name} not found")))
        }
    }
}
