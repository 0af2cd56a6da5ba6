//! Unit tests for API types serialization/deserialization.

#![allow(clippy::unwrap_used, clippy::panic)]

use badgetrack::api::{
    ApproveRequest, BulkDeleteResponse, CategoryView, CreateSubmissionRequest, ErrorResponse,
    HealthResponse, InvitationView, UpdateCategoryRequest, UserView, VisibilityRequest,
};
use badgetrack_core::{
    BadgeId, BulkDeleteReport, Category, CategoryId, CategorySummary, Invitation, InvitationId,
    InvitationStatus, ProtectedUser, ReviewStatus, Role, RolePolicy, User, UserId,
};
use chrono::{TimeZone, Utc};
use serde_json::{Value, json};

fn user(email: &str) -> User {
    User {
        id: UserId(7),
        name: "Jane".to_string(),
        email: email.to_string(),
        role: Role::Teacher,
        password_hash: "$argon2id$secret".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap(),
    }
}

// =============================================================================
// COMMON
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_error_response_shape() {
    let value = serde_json::to_value(ErrorResponse::new("Forbidden", "Nope")).unwrap();
    assert_eq!(value, json!({ "error": "Forbidden", "details": "Nope" }));
}

// =============================================================================
// USERS
// =============================================================================

#[test]
fn test_user_view_hides_password_hash() {
    let policy = RolePolicy::new("root@school.test");
    let view = UserView::new(&user("jane@school.test"), &policy);

    let json = serde_json::to_string(&view).unwrap();
    assert!(!json.contains("argon2"));
    assert!(json.contains("\"isSuperAdmin\":false"));
    assert!(json.contains("\"role\":\"teacher\""));
    assert!(json.contains("\"createdAt\""));
}

#[test]
fn test_user_view_flags_super_admin() {
    let policy = RolePolicy::new("root@school.test");
    let view = UserView::new(&user("root@school.test"), &policy);
    assert!(view.is_super_admin);
}

#[test]
fn test_bulk_delete_response_from_report() {
    let report = BulkDeleteReport {
        deleted: vec![UserId(2), UserId(3)],
        protected: vec![ProtectedUser {
            id: UserId(1),
            reason: "The super admin account cannot be deleted".to_string(),
        }],
        failed: vec![UserId(99)],
        reassigned_badges: 4,
    };

    let value = serde_json::to_value(BulkDeleteResponse::from(report)).unwrap();
    assert_eq!(value["deleted"], json!([2, 3]));
    assert_eq!(value["protected"][0]["id"], json!(1));
    assert_eq!(value["failed"], json!([99]));
    assert_eq!(value["reassignedBadges"], json!(4));
}

// =============================================================================
// INVITATIONS
// =============================================================================

#[test]
fn test_invitation_view_omits_secrets() {
    let created = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
    let invitation = Invitation {
        id: InvitationId(3),
        email: "kid@school.test".to_string(),
        role: Role::Student,
        token_digest: "deadbeef".to_string(),
        invited_by: UserId(1),
        password_hash: Some("$argon2id$preset".to_string()),
        status: InvitationStatus::Pending,
        expires_at: created + chrono::Duration::hours(72),
        created_at: created,
    };

    let value = serde_json::to_value(InvitationView::from(&invitation)).unwrap();
    let object = value.as_object().unwrap();
    assert!(!object.contains_key("tokenDigest"));
    assert!(!object.contains_key("passwordHash"));
    assert_eq!(value["hasPassword"], Value::Bool(true));
    assert_eq!(value["status"], json!("pending"));
    assert_eq!(value["invitedBy"], json!(1));
}

// =============================================================================
// BADGES
// =============================================================================

#[test]
fn test_approve_request_single_target() {
    let request: ApproveRequest =
        serde_json::from_value(json!({ "badgeId": 5, "status": "approved" })).unwrap();
    assert_eq!(request.status, ReviewStatus::Approved);
    assert_eq!(request.target_ids(), Some(vec![BadgeId(5)]));
}

#[test]
fn test_approve_request_bulk_target() {
    let request: ApproveRequest = serde_json::from_value(json!({
        "badgeIds": [1, 2],
        "status": "rejected",
        "comment": "Too vague",
    }))
    .unwrap();
    assert_eq!(request.target_ids(), Some(vec![BadgeId(1), BadgeId(2)]));
    assert_eq!(request.comment.as_deref(), Some("Too vague"));
}

#[test]
fn test_approve_request_ambiguous_target() {
    let both: ApproveRequest = serde_json::from_value(json!({
        "badgeId": 1,
        "badgeIds": [2],
        "status": "approved",
    }))
    .unwrap();
    assert_eq!(both.target_ids(), None);

    let neither: ApproveRequest =
        serde_json::from_value(json!({ "status": "approved" })).unwrap();
    assert_eq!(neither.target_ids(), None);
}

#[test]
fn test_unknown_review_status_rejected() {
    let result =
        serde_json::from_value::<ApproveRequest>(json!({ "badgeId": 1, "status": "maybe" }));
    assert!(result.is_err());
}

// =============================================================================
// CATEGORIES
// =============================================================================

#[test]
fn test_category_view_flattens_category() {
    let view = CategoryView::from(CategorySummary {
        category: Category {
            id: CategoryId(4),
            name: "Art".to_string(),
            color: "#FF8800".to_string(),
            description: String::new(),
            created_at: Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap(),
        },
        badge_count: 2,
    });

    let value = serde_json::to_value(&view).unwrap();
    assert_eq!(value["id"], json!(4));
    assert_eq!(value["name"], json!("Art"));
    assert_eq!(value["badgeCount"], json!(2));
}

#[test]
fn test_update_category_request_defaults() {
    let request: UpdateCategoryRequest =
        serde_json::from_value(json!({ "name": "Fine Arts" })).unwrap();
    assert_eq!(request.name.as_deref(), Some("Fine Arts"));
    assert!(!request.update_badges);

    let request: UpdateCategoryRequest =
        serde_json::from_value(json!({ "name": "Fine Arts", "updateBadges": true })).unwrap();
    assert!(request.update_badges);
}

// =============================================================================
// SUBMISSIONS
// =============================================================================

#[test]
fn test_create_submission_request_defaults() {
    let request: CreateSubmissionRequest =
        serde_json::from_value(json!({ "badgeId": 9, "evidence": "Photo of the model" }))
            .unwrap();
    assert_eq!(request.badge_id, 9);
    assert!(request.evidence_url.is_none());
    assert!(!request.is_public);
    assert!(!request.show_on_profile);
}

#[test]
fn test_visibility_request_partial() {
    let request: VisibilityRequest =
        serde_json::from_value(json!({ "showOnProfile": true })).unwrap();
    assert_eq!(request.is_public, None);
    assert_eq!(request.show_on_profile, Some(true));
}
