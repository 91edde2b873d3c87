//! Playlist endpoints.

use axum::{
    Router,
    extract::State,
    routing::{get, patch, post},
};
use serde::Serialize;
use vidtube_common::{AppResult, ensure_valid_id};
use vidtube_core::{CreatePlaylistInput, PlaylistDetails, UpdatePlaylistInput};
use vidtube_db::entities::playlist;

use super::videos::VideoResponse;
use crate::{
    extractors::{ApiJson, ApiPath, AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

// ==================== Request/Response Types ====================

/// Playlist response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<playlist::Model> for PlaylistResponse {
    fn from(p: playlist::Model) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            owner_id: p.owner_id,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Playlist with its videos in order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetailsResponse {
    #[serde(flatten)]
    pub playlist: PlaylistResponse,
    pub videos: Vec<VideoResponse>,
}

impl From<PlaylistDetails> for PlaylistDetailsResponse {
    fn from(d: PlaylistDetails) -> Self {
        Self {
            playlist: d.playlist.into(),
            videos: d.videos.into_iter().map(Into::into).collect(),
        }
    }
}

// ==================== Handlers ====================

/// Create a playlist.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreatePlaylistInput>,
) -> AppResult<ApiResponse<PlaylistResponse>> {
    let playlist = state.playlist_service.create(&user.id, req).await?;

    Ok(ApiResponse::created(playlist.into()).message("Playlist created successfully"))
}

/// Playlists of a user.
async fn list_by_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
) -> AppResult<ApiResponse<Vec<PlaylistResponse>>> {
    let user_id = ensure_valid_id(&user_id, "user")?;
    let playlists = state.playlist_service.list_by_user(&user_id).await?;

    Ok(ApiResponse::ok(
        playlists.into_iter().map(Into::into).collect(),
    ))
}

/// Show a playlist with the videos the caller may see.
async fn show(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> AppResult<ApiResponse<PlaylistDetailsResponse>> {
    let id = ensure_valid_id(&id, "playlist")?;
    let details = state.playlist_service.get(&id, viewer.id()).await?;

    Ok(ApiResponse::ok(details.into()))
}

async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<UpdatePlaylistInput>,
) -> AppResult<ApiResponse<PlaylistResponse>> {
    let id = ensure_valid_id(&id, "playlist")?;
    let playlist = state.playlist_service.update(&id, &user.id, req).await?;

    Ok(ApiResponse::ok(playlist.into()).message("Playlist updated successfully"))
}

async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> AppResult<ApiResponse<()>> {
    let id = ensure_valid_id(&id, "playlist")?;
    state.playlist_service.delete(&id, &user.id).await?;

    Ok(ApiResponse::ok(()).message("Playlist deleted successfully"))
}

/// Add a video to a playlist.
async fn add_video(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiPath((id, video_id)): ApiPath<(String, String)>,
) -> AppResult<ApiResponse<PlaylistResponse>> {
    let id = ensure_valid_id(&id, "playlist")?;
    let video_id = ensure_valid_id(&video_id, "video")?;
    let playlist = state
        .playlist_service
        .add_video(&id, &video_id, &user.id)
        .await?;

    Ok(ApiResponse::ok(playlist.into()).message("Video added to playlist"))
}

/// Remove a video from a playlist.
async fn remove_video(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiPath((id, video_id)): ApiPath<(String, String)>,
) -> AppResult<ApiResponse<PlaylistResponse>> {
    let id = ensure_valid_id(&id, "playlist")?;
    let video_id = ensure_valid_id(&video_id, "video")?;
    let playlist = state
        .playlist_service
        .remove_video(&id, &video_id, &user.id)
        .await?;

    Ok(ApiResponse::ok(playlist.into()).message("Video removed from playlist"))
}

// ==================== Router ====================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/user/{id}", get(list_by_user))
        .route("/{id}", get(show).patch(update).delete(delete))
        .route("/{id}/videos/{video_id}", patch(add_video).delete(remove_video))
}
