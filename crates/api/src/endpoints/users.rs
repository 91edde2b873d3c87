//! User endpoints: accounts, sessions and channel pages.

use axum::{
    Router,
    extract::State,
    routing::{get, patch, post},
};
use serde::Serialize;
use vidtube_common::AppResult;
use vidtube_core::{ChangePasswordInput, LoginInput, RegisterInput, UpdateAccountInput};
use vidtube_db::{entities::user, views::ChannelProfile};

use crate::{
    extractors::{ApiJson, ApiPath, AuthUser, MaybeAuthUser},
    middleware::AppState,
    multipart::MultipartForm,
    response::ApiResponse,
};

// ==================== Request/Response Types ====================

/// User response. Never carries the password hash or session token.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            full_name: u.full_name,
            avatar_url: u.avatar_url,
            cover_image_url: u.cover_image_url,
            created_at: u.created_at.to_rfc3339(),
            updated_at: u.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Login response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
}

/// Channel page response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResponse {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub subscribers_count: u64,
    pub subscribed_to_count: u64,
    pub is_subscribed: bool,
}

impl From<ChannelProfile> for ChannelResponse {
    fn from(p: ChannelProfile) -> Self {
        Self {
            id: p.user.id,
            username: p.user.username,
            full_name: p.user.full_name,
            avatar_url: p.user.avatar_url,
            cover_image_url: p.user.cover_image_url,
            subscribers_count: p.subscribers_count,
            subscribed_to_count: p.subscribed_to_count,
            is_subscribed: p.is_subscribed,
        }
    }
}

// ==================== Handlers ====================

/// Register a new account.
async fn register(
    State(state): State<AppState>,
    mut form: MultipartForm,
) -> AppResult<ApiResponse<UserResponse>> {
    let input = RegisterInput {
        username: form.take_text_or_empty("username"),
        email: form.take_text_or_empty("email"),
        full_name: form.take_text_or_empty("fullName"),
        password: form.take_text_or_empty("password"),
        avatar: form.take_file("avatar"),
        cover_image: form.take_file("coverImage"),
    };

    let user = state.user_service.register(input).await?;

    Ok(ApiResponse::created(user.into()).message("User registered successfully"))
}

/// Log in with username or email and password.
async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginInput>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let (user, access_token) = state.user_service.login(req).await?;

    Ok(ApiResponse::ok(LoginResponse {
        user: user.into(),
        access_token,
    })
    .message("User logged in successfully"))
}

/// Revoke the current session.
async fn logout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<()>> {
    state.user_service.logout(&user.id).await?;

    Ok(ApiResponse::ok(()).message("User logged out"))
}

/// Get the current user.
async fn me(AuthUser(user): AuthUser) -> ApiResponse<UserResponse> {
    ApiResponse::ok(user.into())
}

/// Update full name and/or email.
async fn update_account(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpdateAccountInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.update_account(&user.id, req).await?;

    Ok(ApiResponse::ok(user.into()).message("Account details updated"))
}

/// Change the password.
async fn change_password(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ChangePasswordInput>,
) -> AppResult<ApiResponse<()>> {
    state.user_service.change_password(&user.id, req).await?;

    Ok(ApiResponse::ok(()).message("Password changed successfully"))
}

/// Replace the avatar.
async fn update_avatar(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut form: MultipartForm,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state
        .user_service
        .update_avatar(&user.id, form.take_file("avatar"))
        .await?;

    Ok(ApiResponse::ok(user.into()).message("Avatar updated"))
}

/// Replace the cover image.
async fn update_cover(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut form: MultipartForm,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state
        .user_service
        .update_cover(&user.id, form.take_file("coverImage"))
        .await?;

    Ok(ApiResponse::ok(user.into()).message("Cover image updated"))
}

/// Public channel page.
async fn channel(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
) -> AppResult<ApiResponse<ChannelResponse>> {
    let profile = state
        .user_service
        .channel_profile(&username, viewer.id())
        .await?;

    Ok(ApiResponse::ok(profile.into()))
}

// ==================== Router ====================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me).patch(update_account))
        .route("/me/password", post(change_password))
        .route("/me/avatar", patch(update_avatar))
        .route("/me/cover", patch(update_cover))
        .route("/channel/{username}", get(channel))
}
