//! Health check endpoint.

use axum::{Router, extract::State, routing::get};
use vidtube_core::HealthReport;

use crate::{middleware::AppState, response::ApiResponse};

/// Liveness plus database connectivity. Always answers 200.
async fn health(State(state): State<AppState>) -> ApiResponse<HealthReport> {
    ApiResponse::ok(state.health_service.check().await).message("Health check passed")
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health))
}
