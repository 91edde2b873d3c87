//! Like entity.
//!
//! A like points at exactly one of a video, a comment or a tweet.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "like")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(nullable)]
    pub video_id: Option<String>,

    #[sea_orm(nullable)]
    pub comment_id: Option<String>,

    #[sea_orm(nullable)]
    pub tweet_id: Option<String>,

    /// The user who liked
    pub liked_by: String,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// The liked target.
    #[must_use]
    pub fn target(&self) -> Option<LikeTarget> {
        match (&self.video_id, &self.comment_id, &self.tweet_id) {
            (Some(id), None, None) => Some(LikeTarget::Video(id.clone())),
            (None, Some(id), None) => Some(LikeTarget::Comment(id.clone())),
            (None, None, Some(id)) => Some(LikeTarget::Tweet(id.clone())),
            _ => None,
        }
    }
}

/// What a like points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LikeTarget {
    Video(String),
    Comment(String),
    Tweet(String),
}

impl LikeTarget {
    /// Target ID.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Video(id) | Self::Comment(id) | Self::Tweet(id) => id,
        }
    }

    /// Column holding this kind of target.
    #[must_use]
    pub const fn column(&self) -> Column {
        match self {
            Self::Video(_) => Column::VideoId,
            Self::Comment(_) => Column::CommentId,
            Self::Tweet(_) => Column::TweetId,
        }
    }

    /// Lowercase name of the target kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Video(_) => "video",
            Self::Comment(_) => "comment",
            Self::Tweet(_) => "tweet",
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::LikedBy",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_target_requires_single_column() {
        let mut like = Model {
            id: "l1".to_string(),
            video_id: Some("v1".to_string()),
            comment_id: None,
            tweet_id: None,
            liked_by: "u1".to_string(),
            created_at: Utc::now().into(),
        };
        assert_eq!(like.target(), Some(LikeTarget::Video("v1".to_string())));

        like.tweet_id = Some("t1".to_string());
        assert_eq!(like.target(), None);
    }
}
