//! Video endpoints.

use axum::{
    Router,
    extract::State,
    routing::{get, patch},
};
use serde::Serialize;
use vidtube_common::{AppResult, Page, ensure_valid_id};
use vidtube_core::{PublishVideoInput, UpdateVideoInput, VideoListQuery};
use vidtube_db::{
    entities::video,
    views::{UserSummary, VideoWithOwner},
};

use crate::{
    extractors::{ApiPath, ApiQuery, AuthUser, MaybeAuthUser},
    middleware::AppState,
    multipart::MultipartForm,
    response::ApiResponse,
};

// ==================== Request/Response Types ====================

/// Video response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: i32,
    pub views: i64,
    pub is_published: bool,
    pub owner_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserSummary>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<video::Model> for VideoResponse {
    fn from(v: video::Model) -> Self {
        Self {
            id: v.id,
            title: v.title,
            description: v.description,
            video_url: v.video_url,
            thumbnail_url: v.thumbnail_url,
            duration: v.duration,
            views: v.views,
            is_published: v.is_published,
            owner_id: v.owner_id,
            owner: None,
            created_at: v.created_at.to_rfc3339(),
            updated_at: v.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

impl From<VideoWithOwner> for VideoResponse {
    fn from(v: VideoWithOwner) -> Self {
        Self {
            owner: Some(v.owner),
            ..v.video.into()
        }
    }
}

// ==================== Handlers ====================

/// Publish a video.
async fn publish(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut form: MultipartForm,
) -> AppResult<ApiResponse<VideoResponse>> {
    let input = PublishVideoInput {
        title: form.take_text_or_empty("title"),
        description: form.take_text_or_empty("description"),
        duration: form.take_text_or_empty("duration"),
        video_file: form.take_file("videoFile"),
        thumbnail: form.take_file("thumbnail"),
    };

    let video = state.video_service.publish(&user.id, input).await?;

    Ok(ApiResponse::created(video.into()).message("Video published successfully"))
}

/// List published videos.
async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<VideoListQuery>,
) -> AppResult<ApiResponse<Page<VideoResponse>>> {
    let page = state.video_service.list(&query).await?;

    Ok(ApiResponse::ok(page.map(Into::into)))
}

/// Show a video and count the view.
async fn show(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> AppResult<ApiResponse<VideoResponse>> {
    let id = ensure_valid_id(&id, "video")?;
    let video = state.video_service.get(&id, viewer.id()).await?;

    Ok(ApiResponse::ok(video.into()))
}

/// Update title, description and/or thumbnail.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    mut form: MultipartForm,
) -> AppResult<ApiResponse<VideoResponse>> {
    let id = ensure_valid_id(&id, "video")?;
    let input = UpdateVideoInput {
        title: form.take_text("title"),
        description: form.take_text("description"),
        thumbnail: form.take_file("thumbnail"),
    };

    let video = state.video_service.update(&id, &user.id, input).await?;

    Ok(ApiResponse::ok(video.into()).message("Video updated successfully"))
}

/// Delete a video.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> AppResult<ApiResponse<()>> {
    let id = ensure_valid_id(&id, "video")?;
    state.video_service.delete(&id, &user.id).await?;

    Ok(ApiResponse::ok(()).message("Video deleted successfully"))
}

/// Publish a draft or unpublish a video.
async fn toggle_publish(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> AppResult<ApiResponse<VideoResponse>> {
    let id = ensure_valid_id(&id, "video")?;
    let video = state.video_service.toggle_publish(&id, &user.id).await?;

    Ok(ApiResponse::ok(video.into()).message("Publish status toggled"))
}

// ==================== Router ====================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(publish))
        .route("/{id}", get(show).patch(update).delete(delete))
        .route("/{id}/toggle-publish", patch(toggle_publish))
}
