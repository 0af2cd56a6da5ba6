//! Login, logout, registration and the current user.

use crate::api::{
    AppState,
    auth::SessionToken,
    error::ApiError,
    types::{LoginRequest, LoginResponse, MessageResponse, RegisterRequest, UserView},
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use badgetrack_core::{Actor, LoginOutcome, RegisterInput, RolePolicy};

fn login_response(outcome: LoginOutcome, policy: &RolePolicy) -> LoginResponse {
    LoginResponse {
        user: UserView::new(&outcome.user, policy),
        token: outcome.token,
        expires_at: outcome.expires_at,
    }
}

/// `POST /api/auth/login`
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let mut tracker = state.tracker.write().await;
    match tracker.login(&request.email, &request.password) {
        Ok(outcome) => {
            tracing::info!(event = "login", user_id = outcome.user.id.0, "User logged in");
            Ok(Json(login_response(outcome, tracker.policy())))
        }
        Err(e) => {
            tracing::warn!(event = "auth_failure", reason = "bad_credentials", "Login failed");
            Err(e.into())
        }
    }
}

/// `POST /api/auth/logout`
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.tracker.write().await.logout(&token.0)?;
    Ok(Json(MessageResponse::new("Logged out")))
}

/// `POST /api/auth/register`
pub async fn register_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    let mut tracker = state.tracker.write().await;
    let outcome = tracker.register(RegisterInput {
        email: request.email,
        token: request.token,
        name: request.name,
        password: request.password,
    })?;
    tracing::info!(
        event = "invitation_accepted",
        user_id = outcome.user.id.0,
        role = %outcome.user.role,
        "Invitation redeemed"
    );
    Ok((
        StatusCode::CREATED,
        Json(login_response(outcome, tracker.policy())),
    ))
}

/// `GET /api/auth/me`
pub async fn me_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<UserView>, ApiError> {
    let tracker = state.tracker.read().await;
    let user = tracker.get_user(&actor, actor.id)?;
    Ok(Json(UserView::new(&user, tracker.policy())))
}
