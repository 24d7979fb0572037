//! Custom extractors for list filters

use aide::openapi::ReferenceOr;
use aide::operation::OperationInput;
use aide::OperationOutput;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use crate::types::error::AppError;

/// Optional JSON filter body
///
/// An empty body extracts as `None`. Any other body must be a JSON payload
/// of `T`; malformed payloads are rejected as `400 invalid_filter`.
pub struct FilterJson<T>(pub Option<T>);

impl<T, S> FromRequest<S> for FilterJson<T>
where
    T: DeserializeOwned + JsonSchema,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json_content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        let body = Bytes::from_request(req, state).await.map_err(|_| {
            AppError::new(
                StatusCode::BAD_REQUEST,
                "invalid_filter",
                "Unreadable request body",
                false,
            )
        })?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(None));
        }

        if !json_content_type {
            return Err(AppError::new(
                StatusCode::BAD_REQUEST,
                "invalid_content_type",
                "Missing Content-Type: application/json header",
                false,
            ));
        }

        let Json(payload) = Json::<T>::from_bytes(&body).map_err(|err| match err {
            JsonRejection::JsonDataError(err) => AppError::new(
                StatusCode::BAD_REQUEST,
                "invalid_filter",
                err.body_text(),
                false,
            ),
            _ => AppError::new(
                StatusCode::BAD_REQUEST,
                "invalid_filter",
                "Invalid JSON payload",
                false,
            ),
        })?;

        Ok(Self(Some(payload)))
    }
}

impl<T> OperationInput for FilterJson<T>
where
    T: JsonSchema,
{
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        Json::<T>::operation_input(ctx, operation);

        if let Some(ReferenceOr::Item(body)) = &mut operation.request_body {
            body.required = false;
        }
    }

    fn inferred_early_responses(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Vec<(Option<u16>, aide::openapi::Response)> {
        AppError::inferred_responses(ctx, operation)
    }
}
