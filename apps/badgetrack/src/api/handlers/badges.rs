//! Badge endpoints.

use crate::api::{
    AppState,
    error::ApiError,
    types::{
        ApproveRequest, ApproveResponse, BadgeDeletionResponse, BadgeQuery, CreateBadgeRequest,
        UpdateBadgeRequest,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use badgetrack_core::{
    Actor, Badge, BadgeFilter, BadgeId, BadgeInput, BadgeUpdate, ReviewDecision, TrackerError,
};

/// `GET /api/badges`
pub async fn list_badges_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<BadgeQuery>,
) -> Result<Json<Vec<Badge>>, ApiError> {
    let filter = BadgeFilter {
        category: query.category,
        status: query.status,
    };
    let badges = state.tracker.read().await.list_badges(&actor, &filter)?;
    Ok(Json(badges))
}

/// `GET /api/badges/{id}`
pub async fn get_badge_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<u64>,
) -> Result<Json<Badge>, ApiError> {
    let badge = state.tracker.read().await.get_badge(&actor, BadgeId(id))?;
    Ok(Json(badge))
}

/// `POST /api/badges`
pub async fn create_badge_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateBadgeRequest>,
) -> Result<(StatusCode, Json<Badge>), ApiError> {
    let badge = state.tracker.write().await.create_badge(
        &actor,
        BadgeInput {
            name: request.name,
            description: request.description,
            criteria: request.criteria,
            image_url: request.image_url,
            category: request.category,
        },
    )?;
    tracing::info!(
        event = "badge_created",
        badge_id = badge.id.0,
        creator_id = actor.id.0,
        status = %badge.approval_status,
        "Badge created"
    );
    Ok((StatusCode::CREATED, Json(badge)))
}

/// `PUT /api/badges/{id}`
pub async fn update_badge_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<u64>,
    Json(request): Json<UpdateBadgeRequest>,
) -> Result<Json<Badge>, ApiError> {
    let badge = state.tracker.write().await.update_badge(
        &actor,
        BadgeId(id),
        BadgeUpdate {
            name: request.name,
            description: request.description,
            criteria: request.criteria,
            image_url: request.image_url,
            category: request.category,
        },
    )?;
    Ok(Json(badge))
}

/// `DELETE /api/badges/{id}`
pub async fn delete_badge_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<u64>,
) -> Result<Json<BadgeDeletionResponse>, ApiError> {
    let (deleted, removed_submissions) = state
        .tracker
        .write()
        .await
        .delete_badge(&actor, BadgeId(id))?;
    tracing::info!(
        event = "badge_deleted",
        badge_id = id,
        actor_id = actor.id.0,
        removed_submissions,
        "Badge deleted"
    );
    Ok(Json(BadgeDeletionResponse {
        deleted,
        removed_submissions,
    }))
}

/// `POST /api/badges/approve`
///
/// Single (`badgeId`) and bulk (`badgeIds`) review share one response shape.
pub async fn approve_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<ApproveRequest>,
) -> Result<Json<ApproveResponse>, ApiError> {
    let mut tracker = state.tracker.write().await;
    // Who may review is settled before the request body is judged.
    tracker.policy().require_staff(&actor, "review badges")?;
    let ids = request.target_ids().ok_or_else(|| {
        TrackerError::Validation("Provide either badgeId or badgeIds".to_string())
    })?;
    let decision = ReviewDecision::new(request.status, request.comment.as_deref())?;

    let response = match request.badge_id {
        Some(id) => {
            let badge = tracker.review_badge(&actor, BadgeId(id), &decision)?;
            ApproveResponse {
                updated: 1,
                not_found: Vec::new(),
                badges: vec![badge],
            }
        }
        None => {
            let report = tracker.review_badges(&actor, &ids, &decision)?;
            ApproveResponse {
                updated: report.updated.len(),
                not_found: report.not_found.iter().map(|id| id.0).collect(),
                badges: report.updated,
            }
        }
    };

    tracing::info!(
        event = "badge_review",
        reviewer_id = actor.id.0,
        status = %decision.status(),
        updated = response.updated,
        not_found = response.not_found.len(),
        "Badges reviewed"
    );
    Ok(Json(response))
}
