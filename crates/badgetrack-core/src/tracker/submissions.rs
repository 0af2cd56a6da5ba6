//! Evidence submissions and their review.

use super::{Tracker, now, validate};
use crate::policy::Actor;
use crate::primitives::MAX_EVIDENCE_LENGTH;
use crate::workflow::{ReviewDecision, Reviewable};
use crate::{BadgeId, ReviewStatus, Role, Submission, SubmissionId, TrackerError, UserId};

#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    pub status: Option<ReviewStatus>,
    pub badge_id: Option<BadgeId>,
}

#[derive(Debug, Clone)]
pub struct SubmissionInput {
    pub badge_id: BadgeId,
    pub evidence: String,
    pub evidence_url: Option<String>,
    pub is_public: bool,
    pub show_on_profile: bool,
}

/// Owner-controlled visibility flags. Absent fields are left unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisibilityUpdate {
    pub is_public: Option<bool>,
    pub show_on_profile: Option<bool>,
}

impl Tracker {
    fn load_submission(&self, id: SubmissionId) -> Result<Submission, TrackerError> {
        self.store
            .get_submission(id)?
            .ok_or_else(|| TrackerError::NotFound(format!("Submission {}", id.0)))
    }

    /// Students see their own submissions; staff see all. Newest first.
    pub fn list_submissions(
        &self,
        actor: &Actor,
        filter: &SubmissionFilter,
    ) -> Result<Vec<Submission>, TrackerError> {
        let mut submissions: Vec<Submission> = self
            .store
            .list_submissions()?
            .into_iter()
            .filter(|s| actor.role.is_staff() || s.student_id == actor.id)
            .filter(|s| filter.status.is_none_or(|st| s.status == st))
            .filter(|s| filter.badge_id.is_none_or(|b| s.badge_id == b))
            .collect();
        submissions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(submissions)
    }

    pub fn get_submission(
        &self,
        actor: &Actor,
        id: SubmissionId,
    ) -> Result<Submission, TrackerError> {
        let submission = self.load_submission(id)?;
        if submission.student_id != actor.id {
            self.policy.require_staff(actor, "view other students' submissions")?;
        }
        Ok(submission)
    }

    /// Submit evidence for an approved badge. Students only, and only while
    /// they have no pending or approved submission for it.
    pub fn create_submission(
        &mut self,
        actor: &Actor,
        input: SubmissionInput,
    ) -> Result<Submission, TrackerError> {
        if actor.role != Role::Student {
            return Err(TrackerError::Forbidden(
                "Only students can submit evidence".to_string(),
            ));
        }
        let badge = self
            .store
            .get_badge(input.badge_id)?
            .filter(|b| b.approval_status == ReviewStatus::Approved)
            .ok_or_else(|| TrackerError::NotFound(format!("Badge {}", input.badge_id.0)))?;

        let open = self.store.list_submissions()?.into_iter().find(|s| {
            s.badge_id == badge.id
                && s.student_id == actor.id
                && s.status != ReviewStatus::Rejected
        });
        if let Some(existing) = open {
            let msg = match existing.status {
                ReviewStatus::Approved => "You have already earned this badge",
                _ => "You already have a pending submission for this badge",
            };
            return Err(TrackerError::Conflict(msg.to_string()));
        }

        self.store.insert_submission(Submission {
            id: SubmissionId(0),
            badge_id: badge.id,
            student_id: actor.id,
            evidence: validate::required_text("evidence", &input.evidence, MAX_EVIDENCE_LENGTH)?,
            evidence_url: validate::optional_url("evidenceUrl", input.evidence_url.as_deref())?,
            status: ReviewStatus::Pending,
            is_public: input.is_public,
            show_on_profile: input.show_on_profile,
            reviewer_id: None,
            review_comment: None,
            reviewed_at: None,
            created_at: now(),
        })
    }

    /// Approve or reject a submission. Staff only.
    pub fn review_submission(
        &mut self,
        actor: &Actor,
        id: SubmissionId,
        decision: &ReviewDecision,
    ) -> Result<Submission, TrackerError> {
        self.policy.require_staff(actor, "review submissions")?;
        let mut submission = self.load_submission(id)?;
        submission.record_review(actor.id, decision, now());
        self.store.update_submission(&submission)?;
        Ok(submission)
    }

    /// Change the visibility flags of one's own submission.
    pub fn set_submission_visibility(
        &mut self,
        actor: &Actor,
        id: SubmissionId,
        update: VisibilityUpdate,
    ) -> Result<Submission, TrackerError> {
        let mut submission = self.load_submission(id)?;
        if submission.student_id != actor.id {
            return Err(TrackerError::Forbidden(
                "Only the student who submitted can change its visibility".to_string(),
            ));
        }
        if let Some(is_public) = update.is_public {
            submission.is_public = is_public;
        }
        if let Some(show) = update.show_on_profile {
            submission.show_on_profile = show;
        }
        self.store.update_submission(&submission)?;
        Ok(submission)
    }

    /// Approved submissions a student has chosen to show on their profile.
    /// Other students only see the public ones.
    pub fn profile_badges(
        &self,
        viewer: &Actor,
        student: UserId,
    ) -> Result<Vec<Submission>, TrackerError> {
        self.load_user(student)?;
        let sees_private = viewer.id == student || viewer.role.is_staff();
        Ok(self
            .store
            .list_submissions()?
            .into_iter()
            .filter(|s| {
                s.student_id == student
                    && s.status == ReviewStatus::Approved
                    && s.show_on_profile
                    && (sees_private || s.is_public)
            })
            .collect())
    }
}
