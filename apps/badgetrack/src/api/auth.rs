//! # Authentication Module
//!
//! Bearer-session authentication for the badgetrack HTTP API.
//!
//! ## Usage
//!
//! Obtain a token from `POST /api/auth/login` (or `/api/auth/register`) and
//! send it with every protected request:
//!
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! The middleware resolves the token to an `Actor` and stores it, together
//! with the raw token, in the request extensions.

use super::AppState;
use super::error::ApiError;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use badgetrack_core::TrackerError;

/// The bearer token of the current request, for logout.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Session authentication middleware.
///
/// Requests without a valid, unexpired session get 401.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(request.headers()).map(str::to_string) else {
        tracing::warn!(
            event = "auth_failure",
            reason = "missing_authorization_header",
            path = %request.uri().path(),
            "Missing Authorization header"
        );
        return Err(ApiError(TrackerError::Unauthorized));
    };

    let actor = {
        let tracker = state.tracker.read().await;
        tracker.authenticate(&token)
    };

    match actor {
        Ok(actor) => {
            request.extensions_mut().insert(actor);
            request.extensions_mut().insert(SessionToken(token));
            Ok(next.run(request).await)
        }
        Err(e) => {
            tracing::warn!(
                event = "auth_failure",
                reason = "invalid_session",
                path = %request.uri().path(),
                "Authentication failed: {}",
                e
            );
            Err(ApiError(e))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
