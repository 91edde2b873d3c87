//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod dashboard;
pub mod health;
pub mod like;
pub mod media;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

pub use comment::{CommentInput, CommentService};
pub use dashboard::DashboardService;
pub use health::{DbStatus, HealthReport, HealthService};
pub use like::LikeService;
pub use media::{MediaService, MediaUpload};
pub use playlist::{CreatePlaylistInput, PlaylistDetails, PlaylistService, UpdatePlaylistInput};
pub use subscription::{SubscriptionService, SubscriptionToggle};
pub use tweet::{TweetInput, TweetService};
pub use user::{
    ChangePasswordInput, LoginInput, RegisterInput, UpdateAccountInput, UserService,
};
pub use video::{PublishVideoInput, UpdateVideoInput, VideoListQuery, VideoService};

use std::borrow::Cow;

use validator::{Validate, ValidationError, ValidationErrors};
use vidtube_common::{AppError, AppResult};

/// Result of a toggle: whether the association now exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Created,
    Removed,
}

impl ToggleOutcome {
    /// Whether the association exists after the toggle.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Created)
    }
}

/// Rejects empty and whitespace-only strings.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some(Cow::Borrowed("is required"));
        return Err(err);
    }
    Ok(())
}

/// Validates `input` and the presence of required files in a single pass.
pub(crate) fn validate_with_files(
    input: &impl Validate,
    files: &[(&'static str, bool)],
) -> AppResult<()> {
    let mut errors = input.validate().err().unwrap_or_else(ValidationErrors::new);

    for &(field, present) in files {
        if !present {
            let mut err = ValidationError::new("required");
            err.message = Some(Cow::Borrowed("file is required"));
            errors.add(field, err);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.into())
    }
}

/// Fails with [`AppError::Forbidden`] unless `user_id` owns the record.
pub(crate) fn ensure_owner(owner_id: &str, user_id: &str, what: &str) -> AppResult<()> {
    if owner_id != user_id {
        return Err(AppError::Forbidden(format!(
            "You are not the owner of this {what}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Titled {
        #[validate(custom(function = "not_blank"))]
        title: String,
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("hello").is_ok());
        assert!(not_blank("   ").is_err());
        assert!(not_blank("").is_err());
    }

    #[test]
    fn test_validate_with_files_collects_everything() {
        let input = Titled {
            title: " ".to_string(),
        };

        let err = validate_with_files(&input, &[("videoFile", false), ("thumbnail", true)])
            .unwrap_err();

        match err {
            AppError::Validation(violations) => {
                assert_eq!(
                    violations,
                    vec![
                        "title: is required".to_string(),
                        "videoFile: file is required".to_string(),
                    ]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_ensure_owner() {
        assert!(ensure_owner("u1", "u1", "tweet").is_ok());
        assert!(matches!(
            ensure_owner("u1", "u2", "tweet"),
            Err(AppError::Forbidden(_))
        ));
    }
}
