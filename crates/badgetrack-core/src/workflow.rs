//! # Review Workflow
//!
//! Badges and submissions share a three-state review field:
//!
//! ```text
//! pending ──► approved
//!    │
//!    └──────► rejected
//! ```
//!
//! There are no transition guards beyond who may review: an approved or
//! rejected document can be reviewed again. A rejection must carry a
//! comment. `pending` is the initial state only; it is never a review
//! decision.

use crate::primitives::MAX_TEXT_LENGTH;
use crate::{Badge, ReviewStatus, Submission, TrackerError, UserId};
use chrono::{DateTime, Utc};

/// A validated review decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDecision {
    status: ReviewStatus,
    comment: Option<String>,
}

impl ReviewDecision {
    /// Validate a decision.
    ///
    /// The comment is trimmed; an empty comment counts as none.
    ///
    /// # Errors
    ///
    /// `TrackerError::Validation` when:
    /// - `status` is `Pending`
    /// - `status` is `Rejected` and there is no comment
    /// - the comment exceeds `MAX_TEXT_LENGTH`
    pub fn new(status: ReviewStatus, comment: Option<&str>) -> Result<Self, TrackerError> {
        let comment = comment
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        if status == ReviewStatus::Pending {
            return Err(TrackerError::Validation(
                "Review status must be 'approved' or 'rejected'".to_string(),
            ));
        }
        if status == ReviewStatus::Rejected && comment.is_none() {
            return Err(TrackerError::Validation(
                "A comment is required when rejecting".to_string(),
            ));
        }
        if comment.as_ref().is_some_and(|c| c.len() > MAX_TEXT_LENGTH) {
            return Err(TrackerError::Validation(format!(
                "Comment exceeds {} characters",
                MAX_TEXT_LENGTH
            )));
        }

        Ok(Self { status, comment })
    }

    /// Shorthand for an approval with no comment.
    #[must_use]
    pub fn approve() -> Self {
        Self {
            status: ReviewStatus::Approved,
            comment: None,
        }
    }

    #[must_use]
    pub fn status(&self) -> ReviewStatus {
        self.status
    }

    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

/// A document that carries review tracking fields.
pub trait Reviewable {
    /// Write the decision and its tracking fields in place.
    fn record_review(&mut self, reviewer: UserId, decision: &ReviewDecision, at: DateTime<Utc>);

    /// Current review state.
    fn review_status(&self) -> ReviewStatus;
}

impl Reviewable for Badge {
    fn record_review(&mut self, reviewer: UserId, decision: &ReviewDecision, at: DateTime<Utc>) {
        self.approval_status = decision.status;
        self.approved_by = Some(reviewer);
        self.approval_date = Some(at);
        self.approval_comment = decision.comment.clone();
        self.updated_at = at;
    }

    fn review_status(&self) -> ReviewStatus {
        self.approval_status
    }
}

impl Reviewable for Submission {
    fn record_review(&mut self, reviewer: UserId, decision: &ReviewDecision, at: DateTime<Utc>) {
        self.status = decision.status;
        self.reviewer_id = Some(reviewer);
        self.reviewed_at = Some(at);
        self.review_comment = decision.comment.clone();
    }

    fn review_status(&self) -> ReviewStatus {
        self.status
    }
}

/// Put a badge back in the queue after its content changed.
pub fn reset_badge_review(badge: &mut Badge) {
    badge.approval_status = ReviewStatus::Pending;
    badge.approved_by = None;
    badge.approval_date = None;
    badge.approval_comment = None;
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BadgeId, SubmissionId};

    fn badge() -> Badge {
        let now = Utc::now();
        Badge {
            id: BadgeId(1),
            name: "Tidy Desk".to_string(),
            description: String::new(),
            criteria: String::new(),
            image_url: None,
            category: "General".to_string(),
            creator_id: UserId(2),
            approval_status: ReviewStatus::Pending,
            approved_by: None,
            approval_date: None,
            approval_comment: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn rejection_requires_comment() {
        assert!(ReviewDecision::new(ReviewStatus::Rejected, None).is_err());
        assert!(ReviewDecision::new(ReviewStatus::Rejected, Some("   ")).is_err());
        assert!(ReviewDecision::new(ReviewStatus::Rejected, Some("Blurry photo")).is_ok());
    }

    #[test]
    fn pending_is_not_a_decision() {
        assert!(ReviewDecision::new(ReviewStatus::Pending, Some("later")).is_err());
    }

    #[test]
    fn approval_comment_is_optional_and_trimmed() {
        let d = ReviewDecision::new(ReviewStatus::Approved, Some("  nice  ")).expect("valid");
        assert_eq!(d.comment(), Some("nice"));
        let d = ReviewDecision::new(ReviewStatus::Approved, Some("")).expect("valid");
        assert_eq!(d.comment(), None);
    }

    #[test]
    fn oversized_comment_rejected() {
        let long = "x".repeat(MAX_TEXT_LENGTH + 1);
        assert!(ReviewDecision::new(ReviewStatus::Approved, Some(&long)).is_err());
    }

    #[test]
    fn review_writes_tracking_fields() {
        let mut b = badge();
        let at = Utc::now();
        let d = ReviewDecision::new(ReviewStatus::Rejected, Some("Needs criteria")).expect("ok");
        b.record_review(UserId(7), &d, at);

        assert_eq!(b.review_status(), ReviewStatus::Rejected);
        assert_eq!(b.approved_by, Some(UserId(7)));
        assert_eq!(b.approval_date, Some(at));
        assert_eq!(b.approval_comment.as_deref(), Some("Needs criteria"));
    }

    #[test]
    fn re_review_is_allowed() {
        let mut b = badge();
        let at = Utc::now();
        let reject = ReviewDecision::new(ReviewStatus::Rejected, Some("no")).expect("ok");
        b.record_review(UserId(7), &reject, at);
        b.record_review(UserId(8), &ReviewDecision::approve(), at);

        assert_eq!(b.approval_status, ReviewStatus::Approved);
        assert_eq!(b.approved_by, Some(UserId(8)));
        assert_eq!(b.approval_comment, None);
    }

    #[test]
    fn reset_clears_review() {
        let mut b = badge();
        b.record_review(UserId(7), &ReviewDecision::approve(), Utc::now());
        reset_badge_review(&mut b);
        assert_eq!(b.approval_status, ReviewStatus::Pending);
        assert!(b.approved_by.is_none());
        assert!(b.approval_date.is_none());
    }

    #[test]
    fn submission_review() {
        let now = Utc::now();
        let mut s = Submission {
            id: SubmissionId(1),
            badge_id: BadgeId(1),
            student_id: UserId(3),
            evidence: "Photo of desk".to_string(),
            evidence_url: None,
            status: ReviewStatus::Pending,
            is_public: false,
            show_on_profile: true,
            reviewer_id: None,
            review_comment: None,
            reviewed_at: None,
            created_at: now,
        };
        s.record_review(UserId(2), &ReviewDecision::approve(), now);
        assert_eq!(s.review_status(), ReviewStatus::Approved);
        assert_eq!(s.reviewer_id, Some(UserId(2)));
        assert_eq!(s.reviewed_at, Some(now));
    }
}
