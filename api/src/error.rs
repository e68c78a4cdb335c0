//! HTTP error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::GatewayError;
use thiserror::Error;

/// Errors returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request parameters are invalid.
    #[error("{0}")]
    BadRequest(String),

    /// The gateway failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type.
    pub error: String,
    /// Detailed error message.
    pub message: String,
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl ApiError {
    fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) | Self::Gateway(GatewayError::InvalidRequest(_)) => {
                (StatusCode::BAD_REQUEST, "invalid_request")
            }
            Self::Gateway(GatewayError::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Gateway(GatewayError::Execution(_) | GatewayError::Incomplete { .. }) => {
                (StatusCode::BAD_GATEWAY, "execution_error")
            }
            Self::Gateway(GatewayError::Decode { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "decode_error")
            }
            Self::Gateway(GatewayError::Lock(_)) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::BadRequest("x".to_string()), StatusCode::BAD_REQUEST),
            (
                ApiError::from(GatewayError::InvalidRequest("x".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(GatewayError::NotFound("x".to_string())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(GatewayError::Execution("x".to_string())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::from(GatewayError::Incomplete {
                    rows_read: 1,
                    message: "x".to_string(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::from(GatewayError::decode("c", "x")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status_and_type().0, expected, "{error}");
        }
    }

    #[test]
    fn test_response_status() {
        let response = ApiError::from(GatewayError::NotFound("instance ch/x".to_string()))
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
