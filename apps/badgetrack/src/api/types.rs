//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API. Field names are
//! camelCase on the wire. Documents without secrets (`Badge`, `Category`,
//! `Submission`) are sent as-is; users and invitations go through views that
//! drop password hashes and token digests.

use badgetrack_core::{
    Badge, BadgeId, BulkDeleteReport, CascadeReport, Category, CategorySummary, Invitation,
    InvitationStatus, ReviewStatus, Role, RolePolicy, User,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// COMMON
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

/// Plain acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// AUTH
// =============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserView,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub token: String,
    pub name: String,
    #[serde(default)]
    pub password: Option<String>,
}

// =============================================================================
// USERS
// =============================================================================

/// A user as the API shows it: no password hash.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_super_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl UserView {
    pub fn new(user: &User, policy: &RolePolicy) -> Self {
        Self {
            id: user.id.0,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            is_super_admin: policy.is_super_admin(&user.email),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UsersQuery {
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleChangeRequest {
    pub user_id: u64,
    pub role: Role,
}

/// Administrative password reset of another account.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PasswordResetRequest {
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDeletionResponse {
    pub deleted: UserView,
    pub reassigned_badges: usize,
    pub removed_submissions: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRequest {
    pub user_ids: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProtectedView {
    pub id: u64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResponse {
    pub deleted: Vec<u64>,
    pub protected: Vec<ProtectedView>,
    pub failed: Vec<u64>,
    pub reassigned_badges: usize,
}

impl From<BulkDeleteReport> for BulkDeleteResponse {
    fn from(report: BulkDeleteReport) -> Self {
        Self {
            deleted: report.deleted.iter().map(|id| id.0).collect(),
            protected: report
                .protected
                .into_iter()
                .map(|p| ProtectedView {
                    id: p.id.0,
                    reason: p.reason,
                })
                .collect(),
            failed: report.failed.iter().map(|id| id.0).collect(),
            reassigned_badges: report.reassigned_badges,
        }
    }
}

// =============================================================================
// INVITATIONS
// =============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InviteRequest {
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub password: Option<String>,
}

/// An invitation without its token digest or preset password.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationView {
    pub id: u64,
    pub email: String,
    pub role: Role,
    pub status: InvitationStatus,
    pub invited_by: u64,
    pub has_password: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&Invitation> for InvitationView {
    fn from(inv: &Invitation) -> Self {
        Self {
            id: inv.id.0,
            email: inv.email.clone(),
            role: inv.role,
            status: inv.status,
            invited_by: inv.invited_by.0,
            has_password: inv.password_hash.is_some(),
            expires_at: inv.expires_at,
            created_at: inv.created_at,
        }
    }
}

/// The token is shown once, here; email delivery is left to the inviter.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InviteResponse {
    pub invitation: InvitationView,
    pub token: String,
}

// =============================================================================
// BADGES
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BadgeQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<ReviewStatus>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBadgeRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub criteria: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBadgeRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub criteria: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Review of one badge (`badgeId`) or many (`badgeIds`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    #[serde(default)]
    pub badge_id: Option<u64>,
    #[serde(default)]
    pub badge_ids: Option<Vec<u64>>,
    pub status: ReviewStatus,
    #[serde(default)]
    pub comment: Option<String>,
}

impl ApproveRequest {
    /// The targeted ids. Exactly one of `badgeId` and `badgeIds` must be set.
    pub fn target_ids(&self) -> Option<Vec<BadgeId>> {
        match (self.badge_id, &self.badge_ids) {
            (Some(id), None) => Some(vec![BadgeId(id)]),
            (None, Some(ids)) => Some(ids.iter().copied().map(BadgeId).collect()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveResponse {
    pub updated: usize,
    pub not_found: Vec<u64>,
    pub badges: Vec<Badge>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeDeletionResponse {
    pub deleted: Badge,
    pub removed_submissions: usize,
}

// =============================================================================
// CATEGORIES
// =============================================================================

/// A category with its badge count.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    #[serde(flatten)]
    pub category: Category,
    pub badge_count: usize,
}

impl From<CategorySummary> for CategoryView {
    fn from(summary: CategorySummary) -> Self {
        Self {
            category: summary.category,
            badge_count: summary.badge_count,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub update_badges: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryUpdateResponse {
    pub category: Category,
    pub cascade: Option<CascadeReport>,
}

// =============================================================================
// SUBMISSIONS
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionQuery {
    #[serde(default)]
    pub status: Option<ReviewStatus>,
    #[serde(default)]
    pub badge_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionRequest {
    pub badge_id: u64,
    pub evidence: String,
    #[serde(default)]
    pub evidence_url: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub show_on_profile: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReviewRequest {
    pub status: ReviewStatus,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRequest {
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub show_on_profile: Option<bool>,
}
