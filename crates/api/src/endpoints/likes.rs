//! Like endpoints.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;
use vidtube_common::{AppResult, Page, PageQuery, ensure_valid_id};
use vidtube_core::ToggleOutcome;
use vidtube_db::entities::like::LikeTarget;

use super::videos::VideoResponse;
use crate::{
    extractors::{ApiPath, ApiQuery, AuthUser},
    middleware::AppState,
    response::ApiResponse,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatusResponse {
    pub is_liked: bool,
}

async fn toggle(
    state: &AppState,
    user_id: &str,
    target: LikeTarget,
) -> AppResult<ApiResponse<LikeStatusResponse>> {
    let outcome = state.like_service.toggle(user_id, target).await?;

    Ok(match outcome {
        ToggleOutcome::Created => {
            ApiResponse::created(LikeStatusResponse { is_liked: true }).message("Liked")
        }
        ToggleOutcome::Removed => {
            ApiResponse::ok(LikeStatusResponse { is_liked: false }).message("Like removed")
        }
    })
}

/// Like or unlike a video.
async fn toggle_video(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> AppResult<ApiResponse<LikeStatusResponse>> {
    let id = ensure_valid_id(&id, "video")?;
    toggle(&state, &user.id, LikeTarget::Video(id)).await
}

/// Like or unlike a comment.
async fn toggle_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> AppResult<ApiResponse<LikeStatusResponse>> {
    let id = ensure_valid_id(&id, "comment")?;
    toggle(&state, &user.id, LikeTarget::Comment(id)).await
}

/// Like or unlike a tweet.
async fn toggle_tweet(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> AppResult<ApiResponse<LikeStatusResponse>> {
    let id = ensure_valid_id(&id, "tweet")?;
    toggle(&state, &user.id, LikeTarget::Tweet(id)).await
}

/// Videos the current user liked.
async fn liked_videos(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> AppResult<ApiResponse<Page<VideoResponse>>> {
    let videos = state.like_service.liked_videos(&user.id, &page).await?;

    Ok(ApiResponse::ok(videos.map(Into::into)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/video/{id}/toggle", post(toggle_video))
        .route("/comment/{id}/toggle", post(toggle_comment))
        .route("/tweet/{id}/toggle", post(toggle_tweet))
        .route("/videos", get(liked_videos))
}
