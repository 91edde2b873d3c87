//! Subscription endpoints.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;
use vidtube_common::{AppResult, Page, PageQuery, ensure_valid_id};
use vidtube_core::SubscriptionToggle;
use vidtube_db::views::{SubscriptionWithUser, UserSummary};

use crate::{
    extractors::{ApiPath, ApiQuery, AuthUser},
    middleware::AppState,
    response::ApiResponse,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusResponse {
    pub is_subscribed: bool,
    pub subscribers_count: u64,
}

impl From<SubscriptionToggle> for SubscriptionStatusResponse {
    fn from(t: SubscriptionToggle) -> Self {
        Self {
            is_subscribed: t.outcome.is_active(),
            subscribers_count: t.subscribers_count,
        }
    }
}

/// The user on the other side of a subscription.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub id: String,
    pub user: UserSummary,
    pub subscribed_at: String,
}

impl From<SubscriptionWithUser> for SubscriptionResponse {
    fn from(s: SubscriptionWithUser) -> Self {
        Self {
            id: s.subscription.id,
            user: s.user,
            subscribed_at: s.subscription.created_at.to_rfc3339(),
        }
    }
}

/// Subscribe to a channel, or unsubscribe.
async fn toggle(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ApiPath(channel_id): ApiPath<String>,
) -> AppResult<ApiResponse<SubscriptionStatusResponse>> {
    let channel_id = ensure_valid_id(&channel_id, "channel")?;
    let toggled = state
        .subscription_service
        .toggle(&user.id, &channel_id)
        .await?;

    let message = if toggled.outcome.is_active() {
        "Subscribed"
    } else {
        "Unsubscribed"
    };
    Ok(ApiResponse::ok(toggled.into()).message(message))
}

/// Who subscribes to a channel.
async fn subscribers(
    State(state): State<AppState>,
    ApiPath(channel_id): ApiPath<String>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> AppResult<ApiResponse<Page<SubscriptionResponse>>> {
    let channel_id = ensure_valid_id(&channel_id, "channel")?;
    let subscribers = state
        .subscription_service
        .subscribers(&channel_id, &page)
        .await?;

    Ok(ApiResponse::ok(subscribers.map(Into::into)))
}

/// Which channels a user subscribes to.
async fn channels(
    State(state): State<AppState>,
    ApiPath(subscriber_id): ApiPath<String>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> AppResult<ApiResponse<Page<SubscriptionResponse>>> {
    let subscriber_id = ensure_valid_id(&subscriber_id, "subscriber")?;
    let channels = state
        .subscription_service
        .channels(&subscriber_id, &page)
        .await?;

    Ok(ApiResponse::ok(channels.map(Into::into)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/toggle", post(toggle))
        .route("/{id}/subscribers", get(subscribers))
        .route("/{id}/channels", get(channels))
}
