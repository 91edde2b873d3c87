//! Tweet endpoints.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;
use vidtube_common::{AppResult, Page, PageQuery, ensure_valid_id};
use vidtube_core::TweetInput;
use vidtube_db::entities::tweet;

use crate::{
    extractors::{ApiJson, ApiPath, ApiQuery, AuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Tweet response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetResponse {
    pub id: String,
    pub content: String,
    pub owner_id: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<tweet::Model> for TweetResponse {
    fn from(t: tweet::Model) -> Self {
        Self {
            id: t.id,
            content: t.content,
            owner_id: t.owner_id,
            created_at: t.created_at.to_rfc3339(),
            updated_at: t.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Post a tweet.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TweetInput>,
) -> AppResult<ApiResponse<TweetResponse>> {
    let tweet = state.tweet_service.create(&user.id, req).await?;

    Ok(ApiResponse::ok(tweet.into()).message("Tweet created successfully"))
}

/// Tweets of a user.
async fn list_by_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> AppResult<ApiResponse<Page<TweetResponse>>> {
    let user_id = ensure_valid_id(&user_id, "user")?;
    let tweets = state.tweet_service.list_by_user(&user_id, &page).await?;

    Ok(ApiResponse::ok(tweets.map(Into::into)))
}

async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<TweetInput>,
) -> AppResult<ApiResponse<TweetResponse>> {
    let id = ensure_valid_id(&id, "tweet")?;
    let tweet = state.tweet_service.update(&id, &user.id, req).await?;

    Ok(ApiResponse::ok(tweet.into()).message("Tweet updated successfully"))
}

async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> AppResult<ApiResponse<()>> {
    let id = ensure_valid_id(&id, "tweet")?;
    state.tweet_service.delete(&id, &user.id).await?;

    Ok(ApiResponse::ok(()).message("Tweet deleted successfully"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/{id}", get(list_by_user).patch(update).delete(delete))
}
