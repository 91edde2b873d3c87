//! User service: accounts, sessions and channel pages.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::{Validate, ValidationError};
use vidtube_common::{AppError, AppResult, IdGenerator, MediaKind};
use vidtube_db::{entities::user, repositories::UserRepository, views::ChannelProfile};

use super::{
    media::{MediaService, MediaUpload},
    not_blank, validate_with_files,
};

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    media: MediaService,
    id_gen: IdGenerator,
}

/// Input for registering a new account.
#[derive(Debug, Validate)]
pub struct RegisterInput {
    #[validate(custom(function = "valid_username"))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(custom(function = "not_blank"), length(max = 128))]
    pub full_name: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    pub avatar: Option<MediaUpload>,
    pub cover_image: Option<MediaUpload>,
}

/// Login credentials. Either `username` or `email` identifies the account.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    pub username: Option<String>,
    pub email: Option<String>,

    #[validate(custom(function = "not_blank"))]
    pub password: String,
}

/// Input for updating account details.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountInput {
    #[validate(custom(function = "not_blank"), length(max = 128))]
    pub full_name: Option<String>,

    #[validate(email)]
    pub email: Option<String>,
}

/// Input for changing the password.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordInput {
    #[validate(custom(function = "not_blank"))]
    pub old_password: String,

    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

// Length is checked on the trimmed name, which is what gets stored.
fn valid_username(username: &str) -> Result<(), ValidationError> {
    let username = username.trim();
    let message = if !(3..=30).contains(&username.chars().count()) {
        "must be 3 to 30 characters"
    } else if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        "may only contain letters, digits, '_', '.' and '-'"
    } else {
        return Ok(());
    };

    let mut err = ValidationError::new("username");
    err.message = Some(message.into());
    Err(err)
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, media: MediaService) -> Self {
        Self {
            user_repo,
            media,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account with its avatar and optional cover image.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        validate_with_files(
            &input,
            &[(MediaKind::Avatar.field_name(), input.avatar.is_some())],
        )?;

        let username = input.username.trim().to_lowercase();
        let email = input.email.trim().to_lowercase();

        if self
            .user_repo
            .find_by_login(Some(&username), Some(&email))
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "User with email or username already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;
        let user_id = self.id_gen.generate();

        let Some(avatar_file) = input.avatar.as_ref() else {
            return Err(AppError::invalid("avatar: file is required"));
        };
        let avatar = self
            .media
            .upload(MediaKind::Avatar, &user_id, avatar_file)
            .await?;

        let cover_url = match input.cover_image.as_ref() {
            Some(file) => match self.media.upload(MediaKind::CoverImage, &user_id, file).await {
                Ok(cover) => Some(cover.url),
                Err(e) => {
                    self.media.discard(&avatar.url).await;
                    return Err(e);
                }
            },
            None => None,
        };

        let model = user::ActiveModel {
            id: Set(user_id),
            username: Set(username),
            email: Set(email),
            full_name: Set(input.full_name.trim().to_string()),
            password_hash: Set(password_hash),
            avatar_url: Set(avatar.url.clone()),
            cover_image_url: Set(cover_url.clone()),
            token: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        match self.user_repo.create(model).await {
            Ok(user) => {
                info!(user_id = %user.id, username = %user.username, "Registered user");
                Ok(user)
            }
            Err(e) => {
                self.media.discard(&avatar.url).await;
                if let Some(url) = cover_url {
                    self.media.discard(&url).await;
                }
                Err(e)
            }
        }
    }

    /// Check credentials and open a session, returning the user and its token.
    pub async fn login(&self, input: LoginInput) -> AppResult<(user::Model, String)> {
        input.validate()?;

        let username = input.username.as_deref().filter(|s| !s.trim().is_empty());
        let email = input.email.as_deref().filter(|s| !s.trim().is_empty());
        if username.is_none() && email.is_none() {
            return Err(AppError::invalid("username or email is required"));
        }

        let user = self
            .user_repo
            .find_by_login(username, email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let token = self.id_gen.generate_token();
        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(token.clone()));
        let user = self.user_repo.update(active).await?;

        info!(user_id = %user.id, "User logged in");
        Ok((user, token))
    }

    /// Revoke the session of `user_id`.
    pub async fn logout(&self, user_id: &str) -> AppResult<()> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();
        active.token = Set(None);
        self.user_repo.update(active).await?;
        Ok(())
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Update the full name and/or email of `user_id`.
    pub async fn update_account(
        &self,
        user_id: &str,
        input: UpdateAccountInput,
    ) -> AppResult<user::Model> {
        input.validate()?;
        if input.full_name.is_none() && input.email.is_none() {
            return Err(AppError::invalid("fullName or email is required"));
        }

        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();

        if let Some(full_name) = input.full_name {
            active.full_name = Set(full_name.trim().to_string());
        }
        if let Some(email) = input.email {
            active.email = Set(email.trim().to_lowercase());
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Replace the password after checking the current one.
    pub async fn change_password(
        &self,
        user_id: &str,
        input: ChangePasswordInput,
    ) -> AppResult<()> {
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;
        if !verify_password(&input.old_password, &user.password_hash)? {
            return Err(AppError::BadRequest("Invalid old password".to_string()));
        }

        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(hash_password(&input.new_password)?);
        active.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update(active).await?;

        info!(user_id, "Password changed");
        Ok(())
    }

    /// Replace the avatar of `user_id`.
    pub async fn update_avatar(
        &self,
        user_id: &str,
        file: Option<MediaUpload>,
    ) -> AppResult<user::Model> {
        let file = required_file(file, MediaKind::Avatar)?;
        let user = self.user_repo.get_by_id(user_id).await?;
        let old_url = user.avatar_url.clone();

        let uploaded = self.media.upload(MediaKind::Avatar, user_id, &file).await?;
        let mut active: user::ActiveModel = user.into();
        active.avatar_url = Set(uploaded.url.clone());
        active.updated_at = Set(Some(Utc::now().into()));

        let user = match self.user_repo.update(active).await {
            Ok(user) => user,
            Err(e) => {
                self.media.discard(&uploaded.url).await;
                return Err(e);
            }
        };

        self.media.discard(&old_url).await;
        Ok(user)
    }

    /// Replace the cover image of `user_id`.
    pub async fn update_cover(
        &self,
        user_id: &str,
        file: Option<MediaUpload>,
    ) -> AppResult<user::Model> {
        let file = required_file(file, MediaKind::CoverImage)?;
        let user = self.user_repo.get_by_id(user_id).await?;
        let old_url = user.cover_image_url.clone();

        let uploaded = self
            .media
            .upload(MediaKind::CoverImage, user_id, &file)
            .await?;
        let mut active: user::ActiveModel = user.into();
        active.cover_image_url = Set(Some(uploaded.url.clone()));
        active.updated_at = Set(Some(Utc::now().into()));

        let user = match self.user_repo.update(active).await {
            Ok(user) => user,
            Err(e) => {
                self.media.discard(&uploaded.url).await;
                return Err(e);
            }
        };

        if let Some(old_url) = old_url {
            self.media.discard(&old_url).await;
        }
        Ok(user)
    }

    /// Channel page of `username` as seen by `viewer_id`.
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer_id: Option<&str>,
    ) -> AppResult<ChannelProfile> {
        if username.trim().is_empty() {
            return Err(AppError::invalid("username: is required"));
        }

        self.user_repo
            .find_channel_profile(username, viewer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Channel does not exist".to_string()))
    }
}

fn required_file(file: Option<MediaUpload>, kind: MediaKind) -> AppResult<MediaUpload> {
    file.ok_or_else(|| AppError::invalid(format!("{}: file is required", kind.field_name())))
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
