//! Typed projections returned by join queries.

use std::collections::HashMap;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use vidtube_common::{AppError, AppResult};

use crate::entities::{User, comment, subscription, user, video};

/// Public projection of a user attached to other records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
}

impl From<&user::Model> for UserSummary {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

/// A video joined with its owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoWithOwner {
    pub video: video::Model,
    pub owner: UserSummary,
}

/// A comment joined with its author.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentWithOwner {
    pub comment: comment::Model,
    pub owner: UserSummary,
}

/// A subscription joined with the user on the other side.
///
/// `user` is the subscriber when listing a channel's subscribers and the
/// channel when listing a subscriber's channels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionWithUser {
    pub subscription: subscription::Model,
    pub user: UserSummary,
}

/// Aggregates over a channel's content and audience.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_videos: u64,
    pub total_views: i64,
    pub total_subscribers: u64,
    /// Likes received on the channel's videos
    pub total_likes: u64,
}

/// A user's public channel page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelProfile {
    pub user: user::Model,
    pub subscribers_count: u64,
    pub subscribed_to_count: u64,
    /// Whether the viewing user subscribes to this channel
    pub is_subscribed: bool,
}

/// Loads user summaries for `ids`, keyed by user ID.
///
/// Issues no query when `ids` is empty.
pub(crate) async fn user_summaries(
    db: &DatabaseConnection,
    ids: Vec<String>,
) -> AppResult<HashMap<String, UserSummary>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut ids = ids;
    ids.sort();
    ids.dedup();

    let users = User::find()
        .filter(user::Column::Id.is_in(ids))
        .all(db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(users
        .iter()
        .map(|u| (u.id.clone(), UserSummary::from(u)))
        .collect())
}

/// Attaches owners to videos, dropping videos whose owner is gone.
pub(crate) async fn attach_video_owners(
    db: &DatabaseConnection,
    videos: Vec<video::Model>,
) -> AppResult<Vec<VideoWithOwner>> {
    let owners = user_summaries(db, videos.iter().map(|v| v.owner_id.clone()).collect()).await?;

    Ok(videos
        .into_iter()
        .filter_map(|video| {
            owners
                .get(&video.owner_id)
                .cloned()
                .map(|owner| VideoWithOwner { video, owner })
        })
        .collect())
}
