//! Tweet service: short text posts on a channel.

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;
use vidtube_common::{AppError, AppResult, IdGenerator, Page, PageQuery};
use vidtube_db::{
    entities::tweet,
    repositories::{TweetRepository, UserRepository},
};

use super::{ensure_owner, not_blank};

/// Tweet service for business logic.
#[derive(Clone)]
pub struct TweetService {
    tweet_repo: TweetRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Body of a new or edited tweet.
#[derive(Debug, Deserialize, Validate)]
pub struct TweetInput {
    #[validate(custom(function = "not_blank"), length(max = 280))]
    pub content: String,
}

impl TweetService {
    /// Create a new tweet service.
    #[must_use]
    pub const fn new(tweet_repo: TweetRepository, user_repo: UserRepository) -> Self {
        Self {
            tweet_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Post a tweet as `user_id`.
    pub async fn create(&self, user_id: &str, input: TweetInput) -> AppResult<tweet::Model> {
        input.validate()?;

        let model = tweet::ActiveModel {
            id: Set(self.id_gen.generate()),
            content: Set(input.content.trim().to_string()),
            owner_id: Set(user_id.to_string()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let tweet = self.tweet_repo.create(model).await?;
        info!(tweet_id = %tweet.id, user_id, "Posted tweet");
        Ok(tweet)
    }

    /// Tweets of `user_id`, newest first.
    pub async fn list_by_user(
        &self,
        user_id: &str,
        page: &PageQuery,
    ) -> AppResult<Page<tweet::Model>> {
        self.user_repo.get_by_id(user_id).await?;
        self.tweet_repo.find_by_owner(user_id, page).await
    }

    /// Edit a tweet. Only its author may do so.
    pub async fn update(
        &self,
        id: &str,
        user_id: &str,
        input: TweetInput,
    ) -> AppResult<tweet::Model> {
        input.validate()?;
        let tweet = self.get_owned(id, user_id).await?;

        let mut active: tweet::ActiveModel = tweet.into();
        active.content = Set(input.content.trim().to_string());
        active.updated_at = Set(Some(Utc::now().into()));

        self.tweet_repo.update(active).await
    }

    /// Delete a tweet. Only its author may do so.
    pub async fn delete(&self, id: &str, user_id: &str) -> AppResult<()> {
        self.get_owned(id, user_id).await?;
        self.tweet_repo.delete(id).await?;

        info!(tweet_id = id, user_id, "Deleted tweet");
        Ok(())
    }

    async fn get_owned(&self, id: &str, user_id: &str) -> AppResult<tweet::Model> {
        let tweet = self
            .tweet_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Tweet not found".to_string()))?;
        ensure_owner(&tweet.owner_id, user_id, "tweet")?;
        Ok(tweet)
    }
}
