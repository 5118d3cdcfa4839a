//! HTTP error responses.
//!
//! Bodies follow `{"detail": "..."}`. Upstream details are logged, not
//! returned.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use realty_assist_routing::AssistError;
use rootcause::prelude::Report;
use serde_json::json;
use std::fmt;

/// Errors returned by API handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The request itself is unusable.
    BadRequest(String),
    /// Chat handling failed.
    Assist(AssistError),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "bad request: {msg}"),
            Self::Assist(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<Report<AssistError>> for ApiError {
    fn from(report: Report<AssistError>) -> Self {
        Self::Assist(report.current_context().clone())
    }
}

impl ApiError {
    fn status_and_detail(&self) -> (StatusCode, String) {
        match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Assist(AssistError::UpstreamUnavailable { .. }) => (
                StatusCode::BAD_GATEWAY,
                "The language model service is unavailable".to_string(),
            ),
            Self::Assist(AssistError::MalformedUpstreamOutput { .. }) => (
                StatusCode::BAD_GATEWAY,
                "The language model returned an unusable response".to_string(),
            ),
            Self::Assist(AssistError::SessionNotFound { .. }) => {
                (StatusCode::NOT_FOUND, "Session not found".to_string())
            }
            Self::Assist(AssistError::StorageFailed { .. }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = self.status_and_detail();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
