//! Repositories: typed query methods over the entities.

pub mod comment;
pub mod dashboard;
pub mod like;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

pub use comment::CommentRepository;
pub use dashboard::DashboardRepository;
pub use like::LikeRepository;
pub use playlist::PlaylistRepository;
pub use subscription::SubscriptionRepository;
pub use tweet::TweetRepository;
pub use user::UserRepository;
pub use video::{VideoRepository, VideoSearch, VideoSortField};

use sea_orm::{DbErr, SqlErr};
use vidtube_common::AppError;

/// Maps a failed insert or update, turning unique index hits into
/// [`AppError::Conflict`] with `conflict_message`.
pub(crate) fn write_err(err: DbErr, conflict_message: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict(conflict_message.to_string())
        }
        _ => AppError::Database(err.to_string()),
    }
}

/// Escapes `%` and `_` for use inside a LIKE pattern.
pub(crate) fn like_pattern(query: &str) -> String {
    format!(
        "%{}%",
        query
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
    }

    #[test]
    fn test_write_err_without_sql_error_is_database() {
        let err = write_err(DbErr::Custom("boom".to_string()), "dup");
        assert!(matches!(err, AppError::Database(_)));
    }
}
