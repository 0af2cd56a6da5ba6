//! Evidence submission endpoints.

use crate::api::{
    AppState,
    error::ApiError,
    types::{CreateSubmissionRequest, ReviewRequest, SubmissionQuery, VisibilityRequest},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use badgetrack_core::{
    Actor, BadgeId, ReviewDecision, Submission, SubmissionFilter, SubmissionId, SubmissionInput,
    VisibilityUpdate,
};

/// `GET /api/submissions`
pub async fn list_submissions_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<SubmissionQuery>,
) -> Result<Json<Vec<Submission>>, ApiError> {
    let filter = SubmissionFilter {
        status: query.status,
        badge_id: query.badge_id.map(BadgeId),
    };
    let submissions = state
        .tracker
        .read()
        .await
        .list_submissions(&actor, &filter)?;
    Ok(Json(submissions))
}

/// `GET /api/submissions/{id}`
pub async fn get_submission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<u64>,
) -> Result<Json<Submission>, ApiError> {
    let submission = state
        .tracker
        .read()
        .await
        .get_submission(&actor, SubmissionId(id))?;
    Ok(Json(submission))
}

/// `POST /api/submissions`
pub async fn create_submission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateSubmissionRequest>,
) -> Result<(StatusCode, Json<Submission>), ApiError> {
    let submission = state.tracker.write().await.create_submission(
        &actor,
        SubmissionInput {
            badge_id: BadgeId(request.badge_id),
            evidence: request.evidence,
            evidence_url: request.evidence_url,
            is_public: request.is_public,
            show_on_profile: request.show_on_profile,
        },
    )?;
    tracing::info!(
        event = "submission_created",
        submission_id = submission.id.0,
        badge_id = submission.badge_id.0,
        student_id = actor.id.0,
        "Evidence submitted"
    );
    Ok((StatusCode::CREATED, Json(submission)))
}

/// `PUT /api/submissions/{id}`
pub async fn review_submission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<u64>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<Submission>, ApiError> {
    let mut tracker = state.tracker.write().await;
    tracker.policy().require_staff(&actor, "review submissions")?;
    let decision = ReviewDecision::new(request.status, request.comment.as_deref())?;
    let submission = tracker.review_submission(&actor, SubmissionId(id), &decision)?;
    tracing::info!(
        event = "submission_review",
        submission_id = id,
        reviewer_id = actor.id.0,
        status = %submission.status,
        "Submission reviewed"
    );
    Ok(Json(submission))
}

/// `PUT /api/submissions/{id}/visibility`
pub async fn visibility_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<u64>,
    Json(request): Json<VisibilityRequest>,
) -> Result<Json<Submission>, ApiError> {
    let submission = state.tracker.write().await.set_submission_visibility(
        &actor,
        SubmissionId(id),
        VisibilityUpdate {
            is_public: request.is_public,
            show_on_profile: request.show_on_profile,
        },
    )?;
    Ok(Json(submission))
}
