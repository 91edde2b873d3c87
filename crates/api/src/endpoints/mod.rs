//! API endpoints.

mod comments;
mod dashboard;
mod health;
mod likes;
mod playlists;
mod subscriptions;
mod tweets;
mod users;
mod videos;

use axum::{Router, middleware};
use vidtube_common::AppError;

use crate::middleware::{AppState, auth_middleware};

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/videos", videos::router())
        .nest("/comments", comments::router())
        .nest("/likes", likes::router())
        .nest("/tweets", tweets::router())
        .nest("/playlists", playlists::router())
        .nest("/subscriptions", subscriptions::router())
        .nest("/dashboard", dashboard::router())
        .nest("/health", health::router())
}

/// The API mounted under `/api/v1`, with the caller resolved per request.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", router())
        .fallback(|| async { AppError::NotFound("Route not found".to_string()) })
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}
