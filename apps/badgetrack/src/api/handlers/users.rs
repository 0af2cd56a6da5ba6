//! User administration and invitation endpoints.

use crate::api::{
    AppState,
    error::ApiError,
    types::{
        BulkDeleteRequest, BulkDeleteResponse, ChangePasswordRequest, InvitationView,
        InviteRequest, InviteResponse, MessageResponse, PasswordResetRequest, RoleChangeRequest,
        UserDeletionResponse, UserView, UsersQuery,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use badgetrack_core::{Actor, InviteInput, Submission, UserId};

/// `GET /api/users`
pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<UsersQuery>,
) -> Result<Json<Vec<UserView>>, ApiError> {
    let tracker = state.tracker.read().await;
    let users = tracker.list_users(&actor, query.role)?;
    Ok(Json(
        users
            .iter()
            .map(|u| UserView::new(u, tracker.policy()))
            .collect(),
    ))
}

/// `GET /api/users/{id}`
pub async fn get_user_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<u64>,
) -> Result<Json<UserView>, ApiError> {
    let tracker = state.tracker.read().await;
    let user = tracker.get_user(&actor, UserId(id))?;
    Ok(Json(UserView::new(&user, tracker.policy())))
}

/// `PUT /api/users/role`
pub async fn change_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<RoleChangeRequest>,
) -> Result<Json<UserView>, ApiError> {
    let mut tracker = state.tracker.write().await;
    let user = tracker.change_role(&actor, UserId(request.user_id), request.role)?;
    tracing::info!(
        event = "role_changed",
        actor_id = actor.id.0,
        user_id = user.id.0,
        role = %user.role,
        "User role changed"
    );
    Ok(Json(UserView::new(&user, tracker.policy())))
}

/// `PUT /api/users/{id}/password`
pub async fn reset_password_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<u64>,
    Json(request): Json<PasswordResetRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .tracker
        .write()
        .await
        .reset_password(&actor, UserId(id), &request.password)?;
    tracing::info!(
        event = "password_reset",
        actor_id = actor.id.0,
        user_id = id,
        "Password reset"
    );
    Ok(Json(MessageResponse::new("Password reset")))
}

/// `PUT /api/users/me/password`
pub async fn change_own_password_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.tracker.write().await.change_own_password(
        &actor,
        &request.current_password,
        &request.new_password,
    )?;
    Ok(Json(MessageResponse::new("Password changed")))
}

/// `DELETE /api/users/{id}`
pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<u64>,
) -> Result<Json<UserDeletionResponse>, ApiError> {
    let mut tracker = state.tracker.write().await;
    let deletion = tracker.delete_user(&actor, UserId(id))?;
    tracing::info!(
        event = "user_deleted",
        actor_id = actor.id.0,
        user_id = id,
        reassigned_badges = deletion.reassigned_badges,
        removed_submissions = deletion.removed_submissions,
        "User deleted"
    );
    Ok(Json(UserDeletionResponse {
        deleted: UserView::new(&deletion.user, tracker.policy()),
        reassigned_badges: deletion.reassigned_badges,
        removed_submissions: deletion.removed_submissions,
    }))
}

/// `POST /api/users/bulk-delete`
pub async fn bulk_delete_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>, ApiError> {
    let ids: Vec<UserId> = request.user_ids.into_iter().map(UserId).collect();
    let report = state
        .tracker
        .write()
        .await
        .bulk_delete_users(&actor, &ids)?;
    tracing::info!(
        event = "users_bulk_deleted",
        actor_id = actor.id.0,
        deleted = report.deleted.len(),
        protected = report.protected.len(),
        failed = report.failed.len(),
        "Bulk user deletion"
    );
    Ok(Json(BulkDeleteResponse::from(report)))
}

/// `GET /api/users/{id}/badges`
///
/// Approved submissions the student chose to show on their profile.
pub async fn profile_badges_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<Submission>>, ApiError> {
    let shown = state
        .tracker
        .read()
        .await
        .profile_badges(&actor, UserId(id))?;
    Ok(Json(shown))
}

/// `POST /api/users/invite`
pub async fn invite_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<InviteRequest>,
) -> Result<(StatusCode, Json<InviteResponse>), ApiError> {
    let issued = state.tracker.write().await.invite(
        &actor,
        InviteInput {
            email: request.email,
            role: request.role,
            password: request.password,
        },
    )?;
    tracing::info!(
        event = "invitation_sent",
        inviter_id = actor.id.0,
        invitation_id = issued.invitation.id.0,
        role = %issued.invitation.role,
        "Invitation created"
    );
    Ok((
        StatusCode::CREATED,
        Json(InviteResponse {
            invitation: InvitationView::from(&issued.invitation),
            token: issued.token,
        }),
    ))
}

/// `GET /api/users/invite`
pub async fn list_invitations_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<InvitationView>>, ApiError> {
    let invitations = state.tracker.read().await.list_invitations(&actor)?;
    Ok(Json(invitations.iter().map(InvitationView::from).collect()))
}
