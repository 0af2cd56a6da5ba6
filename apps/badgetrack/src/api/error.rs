//! Mapping of `TrackerError` onto HTTP responses.

use super::types::ErrorResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use badgetrack_core::TrackerError;

/// A handler error. Wraps the core error so it can be returned from axum.
#[derive(Debug)]
pub struct ApiError(pub TrackerError);

impl From<TrackerError> for ApiError {
    fn from(e: TrackerError) -> Self {
        Self(e)
    }
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            TrackerError::Forbidden(_) => StatusCode::FORBIDDEN,
            TrackerError::NotFound(_) => StatusCode::NOT_FOUND,
            TrackerError::Validation(_) => StatusCode::BAD_REQUEST,
            TrackerError::Conflict(_) => StatusCode::CONFLICT,
            TrackerError::Unauthorized => StatusCode::UNAUTHORIZED,
            TrackerError::Expired(_) => StatusCode::GONE,
            TrackerError::Storage(_)
            | TrackerError::Serialization(_)
            | TrackerError::Password(_)
            | TrackerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (summary, details) = match &self.0 {
            TrackerError::Forbidden(reason) => {
                tracing::warn!(event = "access_denied", reason = %reason, "Request denied");
                ("Forbidden", reason.clone())
            }
            TrackerError::NotFound(what) => ("Not found", format!("{} not found", what)),
            TrackerError::Validation(reason) => ("Validation failed", reason.clone()),
            TrackerError::Conflict(reason) => ("Conflict", reason.clone()),
            TrackerError::Unauthorized => (
                "Unauthorized",
                "Missing, invalid or expired credentials".to_string(),
            ),
            TrackerError::Expired(what) => ("Expired", format!("{} has expired", what)),
            other => {
                // Internal details stay in the log.
                tracing::error!(event = "internal_error", error = %other, "Request failed");
                ("Internal server error", "The request could not be completed".to_string())
            }
        };
        (status, Json(ErrorResponse::new(summary, details))).into_response()
    }
}
