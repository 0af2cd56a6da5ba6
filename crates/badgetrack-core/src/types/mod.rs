//! # Core Type Definitions
//!
//! This module contains the document types of the badge tracker:
//! - Identifiers (`UserId`, `BadgeId`, `CategoryId`, `SubmissionId`, `InvitationId`)
//! - Enumerations (`Role`, `ReviewStatus`, `InvitationStatus`)
//! - Documents (`User`, `Badge`, `Category`, `Submission`, `Invitation`, `SessionRecord`)
//! - Error type (`TrackerError`)
//!
//! ## Persistence
//!
//! Documents are stored with postcard, which is not self-describing. Fields
//! must therefore never use `skip_serializing_if` or internally tagged enums;
//! the camelCase renames only affect the JSON representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

/// Identifier of a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BadgeId(pub u64);

/// Identifier of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub u64);

/// Identifier of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub u64);

/// Identifier of an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InvitationId(pub u64);

// =============================================================================
// ENUMERATIONS
// =============================================================================

/// Account role. Ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    /// All roles, least privileged first.
    pub const ALL: [Role; 3] = [Role::Student, Role::Teacher, Role::Admin];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }

    /// Teachers and admins may create badges and review work.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Role::Teacher | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "admin" => Ok(Role::Admin),
            other => Err(TrackerError::Validation(format!("Unknown role '{}'", other))),
        }
    }
}

/// Review state shared by badges and submissions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    #[default]
    Pending,
    Accepted,
    Expired,
}

// =============================================================================
// DOCUMENTS
// =============================================================================

/// A user account.
///
/// `password_hash` is an argon2 PHC string. This type is never sent over the
/// API as-is; the app layer projects it into a view without the hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Lower-cased, unique.
    pub email: String,
    pub role: Role,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A badge students can earn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: BadgeId,
    pub name: String,
    pub description: String,
    pub criteria: String,
    pub image_url: Option<String>,
    /// Category name, denormalized. Always names an existing category.
    pub category: String,
    pub creator_id: UserId,
    pub approval_status: ReviewStatus,
    pub approved_by: Option<UserId>,
    pub approval_date: Option<DateTime<Utc>>,
    pub approval_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A badge category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    /// Unique, trimmed, case-sensitive.
    pub name: String,
    pub color: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Evidence a student submitted to earn a badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub badge_id: BadgeId,
    pub student_id: UserId,
    pub evidence: String,
    pub evidence_url: Option<String>,
    pub status: ReviewStatus,
    /// Visible to other students.
    pub is_public: bool,
    /// Listed on the student's profile once approved.
    pub show_on_profile: bool,
    pub reviewer_id: Option<UserId>,
    pub review_comment: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A time-limited, single-use permission to register at a given role.
///
/// Only the BLAKE3 digest of the token is stored; the token itself is handed
/// to the inviter once, when the invitation is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: InvitationId,
    /// Lower-cased.
    pub email: String,
    pub role: Role,
    pub token_digest: String,
    pub invited_by: UserId,
    /// Initial password chosen by the inviter, if any.
    pub password_hash: Option<String>,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    /// Status as of `now`: a pending invitation past its expiry reads as expired.
    #[must_use]
    pub fn effective_status(&self, now: DateTime<Utc>) -> InvitationStatus {
        match self.status {
            InvitationStatus::Pending if now >= self.expires_at => InvitationStatus::Expired,
            status => status,
        }
    }
}

/// A login session, keyed in the store by the digest of its bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the badge tracker.
///
/// Denials carry a human-readable reason and nothing else; there is no
/// structured code taxonomy beyond the variant itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    /// The actor is not allowed to perform the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The referenced document does not exist (or is not visible to the actor).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request is malformed or violates an input rule.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The request conflicts with existing state (duplicates, references).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing, unknown or expired credentials.
    #[error("Unauthorized")]
    Unauthorized,

    /// A time-limited document (invitation) is no longer valid.
    #[error("Expired: {0}")]
    Expired(String),

    /// The storage engine failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Password hashing failed.
    #[error("Password error: {0}")]
    Password(String),

    /// File or socket I/O failed outside the store (config files, binding).
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Teacher".parse::<Role>(), Ok(Role::Teacher));
        assert_eq!(" admin ".parse::<Role>(), Ok(Role::Admin));
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn role_ordering_follows_privilege() {
        assert!(Role::Student < Role::Teacher);
        assert!(Role::Teacher < Role::Admin);
    }

    #[test]
    fn review_status_defaults_to_pending() {
        assert_eq!(ReviewStatus::default(), ReviewStatus::Pending);
    }

    #[test]
    fn pending_invitation_reads_expired_after_deadline() {
        let now = Utc::now();
        let invitation = Invitation {
            id: InvitationId(1),
            email: "a@b.c".to_string(),
            role: Role::Student,
            token_digest: String::new(),
            invited_by: UserId(1),
            password_hash: None,
            status: InvitationStatus::Pending,
            expires_at: now,
            created_at: now - Duration::hours(1),
        };
        assert_eq!(
            invitation.effective_status(now - Duration::minutes(1)),
            InvitationStatus::Pending
        );
        assert_eq!(invitation.effective_status(now), InvitationStatus::Expired);

        let accepted = Invitation {
            status: InvitationStatus::Accepted,
            ..invitation
        };
        assert_eq!(
            accepted.effective_status(now + Duration::days(1)),
            InvitationStatus::Accepted
        );
    }

    #[test]
    fn badge_survives_postcard_encoding() {
        let now = Utc::now();
        let badge = Badge {
            id: BadgeId(3),
            name: "Rustacean".to_string(),
            description: String::new(),
            criteria: String::new(),
            image_url: None,
            category: "Programming".to_string(),
            creator_id: UserId(1),
            approval_status: ReviewStatus::Approved,
            approved_by: Some(UserId(1)),
            approval_date: Some(now),
            approval_comment: None,
            created_at: now,
            updated_at: now,
        };
        let bytes = postcard::to_allocvec(&badge).expect("encode");
        let decoded: Badge = postcard::from_bytes(&bytes).expect("decode");
        assert_eq!(decoded, badge);
    }
}
