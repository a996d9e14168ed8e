//! Mapping from domain failures to HTTP responses.

use axum::extract::rejection::JsonRejection;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::domain::DomainError;

pub const LOCAL_RATE_LIMIT_MESSAGE: &str =
    "Too many requests from this IP, please try again after a minute.";
pub const PROVIDER_RATE_LIMIT_MESSAGE: &str =
    "Rate limit exceeded. Please wait and try again later.";
pub const PROVIDER_ERROR_MESSAGE: &str = "An error occurred while generating the chart.";
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred.";
pub const BAD_JSON_MESSAGE: &str = "Bad JSON format";
pub const INVALID_BODY_MESSAGE: &str = "Invalid request body";

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: impl Into<Value>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Error returned by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The request body was not parseable JSON.
    #[error("bad JSON: {0}")]
    BadJson(String),

    /// JSON that does not match the expected shape, or a wrong content type.
    #[error("invalid body: {0}")]
    InvalidBody(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonSyntaxError(e) => Self::BadJson(e.body_text()),
            other => Self::InvalidBody(other.body_text()),
        }
    }
}

impl ApiError {
    fn status_and_body(&self) -> (StatusCode, ErrorBody) {
        match self {
            ApiError::BadJson(_) => (StatusCode::BAD_REQUEST, ErrorBody::new(BAD_JSON_MESSAGE)),
            ApiError::InvalidBody(detail) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new(INVALID_BODY_MESSAGE).with_details(detail.clone()),
            ),
            ApiError::Domain(err) => match err {
                DomainError::Config(msg) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new(format!("Server configuration error: {msg}")),
                ),
                DomainError::RateLimited { .. } => (
                    StatusCode::TOO_MANY_REQUESTS,
                    ErrorBody::new(LOCAL_RATE_LIMIT_MESSAGE),
                ),
                DomainError::Provider { status: 429, details } => (
                    StatusCode::TOO_MANY_REQUESTS,
                    ErrorBody::new(PROVIDER_RATE_LIMIT_MESSAGE).with_details(details.clone()),
                ),
                DomainError::Provider { status, details } => (
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                    ErrorBody::new(PROVIDER_ERROR_MESSAGE).with_details(details.clone()),
                ),
                DomainError::InvalidInput(msg) => {
                    (StatusCode::BAD_REQUEST, ErrorBody::new(msg.clone()))
                }
                DomainError::Network(msg) | DomainError::Internal(msg) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new(UNEXPECTED_ERROR_MESSAGE).with_details(msg.clone()),
                ),
                DomainError::Malformed(reason) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new(UNEXPECTED_ERROR_MESSAGE).with_details(reason.to_string()),
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        let mut response = (status, Json(body)).into_response();

        if let ApiError::Domain(DomainError::RateLimited { retry_after }) = &self {
            // Round up so clients never retry before the window reopens.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn render(err: ApiError) -> (StatusCode, Value) {
        let (status, body) = err.status_and_body();
        (status, serde_json::to_value(body).unwrap())
    }

    #[test]
    fn provider_overload_maps_to_429_with_details() {
        let (status, body) =
            render(DomainError::provider(429, json!({"error": {"message": "slow"}})).into());
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], PROVIDER_RATE_LIMIT_MESSAGE);
        assert_eq!(body["details"]["error"]["message"], "slow");
    }

    #[test]
    fn provider_status_is_mirrored() {
        let (status, body) = render(DomainError::provider(401, json!({"error": "bad key"})).into());
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], PROVIDER_ERROR_MESSAGE);
    }

    #[test]
    fn unrepresentable_status_falls_back_to_bad_gateway() {
        let (status, _) = render(DomainError::provider(42, "odd").into());
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn config_and_network_errors_are_500() {
        let (status, body) = render(DomainError::config("OpenAI API key is missing.").into());
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"error": "Server configuration error: OpenAI API key is missing."})
        );

        let (status, body) = render(DomainError::network("connection refused").into());
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], UNEXPECTED_ERROR_MESSAGE);
        assert_eq!(body["details"], "connection refused");
    }

    #[test]
    fn bad_json_body_has_no_details() {
        let (status, body) = render(ApiError::BadJson("expected value".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": BAD_JSON_MESSAGE}));
    }

    #[test]
    fn local_rate_limit_sets_retry_after_header() {
        let response = ApiError::from(DomainError::RateLimited {
            retry_after: Duration::from_millis(41_200),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }
}
