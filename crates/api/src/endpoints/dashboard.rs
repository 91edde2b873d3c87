//! Channel dashboard endpoints for the current user.

use axum::{Router, extract::State, routing::get};
use vidtube_common::{AppResult, Page, PageQuery};
use vidtube_db::views::ChannelStats;

use super::videos::VideoResponse;
use crate::{
    extractors::{ApiQuery, AuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Totals over the channel's videos, views, subscribers and likes.
async fn stats(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ChannelStats>> {
    let stats = state.dashboard_service.stats(&user.id).await?;

    Ok(ApiResponse::ok(stats))
}

/// All of the channel's videos, drafts included.
async fn videos(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> AppResult<ApiResponse<Page<VideoResponse>>> {
    let videos = state.dashboard_service.videos(&user.id, &page).await?;

    Ok(ApiResponse::ok(videos.map(Into::into)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/videos", get(videos))
}
