//! Universal error handling for the API

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use campaign_storage::CampaignStorageError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API error response envelope
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Whether the client should retry the request
    pub allow_retry: bool,
    /// Error details
    pub error: ErrorBody,
}

/// Error body containing code and message
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub fn new(status: StatusCode, code: &str, msg: impl Into<String>, retry: bool) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                allow_retry: retry,
                error: ErrorBody {
                    code: code.to_string(),
                    message: msg.into(),
                },
            },
        }
    }

    /// HTTP status of the error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.status.as_u16() {
            400..=499 => tracing::warn!(
                "Client error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            500..=599 => tracing::error!(
                "Server error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

/// Convert campaign storage errors to application errors
impl From<CampaignStorageError> for AppError {
    fn from(err: CampaignStorageError) -> Self {
        use CampaignStorageError::{
            BackendUnavailable, Conflict, InvalidCursor, InvalidFilter, InvalidInput, NotFound,
            SerializationError,
        };

        match &err {
            InvalidCursor(msg) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_cursor", msg.as_str(), false)
            }
            InvalidFilter(msg) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_filter", msg.as_str(), false)
            }
            InvalidInput(msg) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_input", msg.as_str(), false)
            }
            NotFound(msg) => Self::new(StatusCode::NOT_FOUND, "not_found", msg.as_str(), false),
            Conflict(msg) => Self::new(StatusCode::CONFLICT, "conflict", msg.as_str(), true),
            BackendUnavailable { .. } if err.is_upstream_error() => {
                tracing::error!("Store upstream error: {err}");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "upstream_error",
                    "Storage service temporarily unavailable",
                    true,
                )
            }
            BackendUnavailable { .. } => {
                tracing::error!("Store error: {err}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                    true,
                )
            }
            SerializationError(msg) => {
                tracing::error!("Record serialization error: {msg}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                    false,
                )
            }
        }
    }
}

impl OperationOutput for AppError {
    type Inner = ApiErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ApiErrorResponse>::operation_response(ctx, operation)
    }
}
