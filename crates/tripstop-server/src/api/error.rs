//! Mapping of domain errors onto HTTP responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use tripstop_core::TripError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Trip(#[from] TripError),

    #[error("malformed request body: {0}")]
    Body(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Body(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match self {
            ApiError::Body(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid request body", "details": message }),
            ),
            ApiError::Trip(TripError::Validation(message)) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            ApiError::Trip(TripError::Resolution(message)) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "Location not found", "details": message }),
            ),
            ApiError::Trip(TripError::Upstream(upstream)) => {
                tracing::warn!("Upstream failure: {}", upstream);
                (
                    upstream_status(upstream.status),
                    json!({ "error": "Upstream provider error", "details": details(&upstream.body) }),
                )
            }
            ApiError::Trip(TripError::AggregateUpstream(failures)) => {
                tracing::warn!("{}", message);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "error": message, "details": failures }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Provider error statuses pass through; anything else becomes 502.
fn upstream_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status)
        .ok()
        .filter(|status| status.is_client_error() || status.is_server_error())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

/// Provider bodies are usually JSON; keep them structured when they are.
fn details(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_error_statuses_pass_through() {
        assert_eq!(upstream_status(403), StatusCode::FORBIDDEN);
        assert_eq!(upstream_status(504), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(upstream_status(200), StatusCode::BAD_GATEWAY);
        assert_eq!(upstream_status(302), StatusCode::BAD_GATEWAY);
        assert_eq!(upstream_status(1000), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn json_details_stay_structured() {
        assert_eq!(details(r#"{"code":7}"#)["code"], 7);
        assert_eq!(details("plain text"), Value::String("plain text".to_string()));
    }
}
