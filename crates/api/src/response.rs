//! Success envelope.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Standard success envelope: `{statusCode, data, message, success}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip)]
    status: StatusCode,
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 response.
    pub fn ok(data: T) -> Self {
        Self::with_status(StatusCode::OK, data)
    }

    /// 201 response.
    pub fn created(data: T) -> Self {
        Self::with_status(StatusCode::CREATED, data)
    }

    /// Response with an explicit status.
    pub fn with_status(status: StatusCode, data: T) -> Self {
        Self {
            status,
            status_code: status.as_u16(),
            data,
            message: "Success".to_string(),
            success: true,
        }
    }

    /// Replace the default message.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::created(vec![1, 2]).message("Made")).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "statusCode": 201,
                "data": [1, 2],
                "message": "Made",
                "success": true,
            })
        );
    }

    #[test]
    fn test_status_is_used_for_response() {
        let response = ApiResponse::ok(()).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
