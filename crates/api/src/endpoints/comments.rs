//! Comment endpoints.
//!
//! `GET` and `POST` take a video ID; `PATCH` and `DELETE` take a comment ID.

use axum::{Router, extract::State, routing::get};
use serde::Serialize;
use vidtube_common::{AppResult, Page, PageQuery, ensure_valid_id};
use vidtube_core::CommentInput;
use vidtube_db::{
    entities::comment,
    views::{CommentWithOwner, UserSummary},
};

use crate::{
    extractors::{ApiJson, ApiPath, ApiQuery, AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Comment response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub content: String,
    pub video_id: String,
    pub owner_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserSummary>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<comment::Model> for CommentResponse {
    fn from(c: comment::Model) -> Self {
        Self {
            id: c.id,
            content: c.content,
            video_id: c.video_id,
            owner_id: c.owner_id,
            owner: None,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

impl From<CommentWithOwner> for CommentResponse {
    fn from(c: CommentWithOwner) -> Self {
        Self {
            owner: Some(c.owner),
            ..c.comment.into()
        }
    }
}

/// Comments on a video, newest first.
async fn list(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    ApiPath(video_id): ApiPath<String>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> AppResult<ApiResponse<Page<CommentResponse>>> {
    let video_id = ensure_valid_id(&video_id, "video")?;
    let comments = state
        .comment_service
        .list(&video_id, viewer.id(), &page)
        .await?;

    Ok(ApiResponse::ok(comments.map(Into::into)))
}

/// Comment on a video.
async fn add(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiPath(video_id): ApiPath<String>,
    ApiJson(req): ApiJson<CommentInput>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let video_id = ensure_valid_id(&video_id, "video")?;
    let comment = state.comment_service.add(&video_id, &user.id, req).await?;

    Ok(ApiResponse::ok(comment.into()).message("Comment added successfully"))
}

/// Edit a comment.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<CommentInput>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let id = ensure_valid_id(&id, "comment")?;
    let comment = state.comment_service.update(&id, &user.id, req).await?;

    Ok(ApiResponse::ok(comment.into()).message("Comment updated successfully"))
}

/// Delete a comment.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> AppResult<ApiResponse<()>> {
    let id = ensure_valid_id(&id, "comment")?;
    state.comment_service.delete(&id, &user.id).await?;

    Ok(ApiResponse::ok(()).message("Comment deleted successfully"))
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{id}",
        get(list).post(add).patch(update).delete(delete),
    )
}
