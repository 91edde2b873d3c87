//! HTTP API layer for vidtube.
//!
//! - **Endpoints**: JSON and multipart routes under `/api/v1`
//! - **Extractors**: authentication, JSON/query/path input, multipart forms
//! - **Middleware**: bearer token authentication
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod multipart;
pub mod response;

pub use endpoints::{app, router};
pub use middleware::AppState;
