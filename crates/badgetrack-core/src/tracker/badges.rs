//! Badge CRUD and review.
//!
//! Every save runs the category hook: a badge naming a category that does
//! not exist yet creates it with the default colour.

use super::{Tracker, now, validate};
use crate::policy::Actor;
use crate::primitives::{DEFAULT_CATEGORY_COLOR, MAX_NAME_LENGTH, MAX_TEXT_LENGTH};
use crate::workflow::{ReviewDecision, Reviewable, reset_badge_review};
use crate::{Badge, BadgeId, Category, CategoryId, ReviewStatus, Role, TrackerError};

/// Listing filters.
#[derive(Debug, Clone, Default)]
pub struct BadgeFilter {
    pub category: Option<String>,
    pub status: Option<ReviewStatus>,
}

#[derive(Debug, Clone)]
pub struct BadgeInput {
    pub name: String,
    pub description: Option<String>,
    pub criteria: Option<String>,
    pub image_url: Option<String>,
    pub category: String,
}

/// Partial edit. Absent fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct BadgeUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub criteria: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
}

/// Outcome of a bulk review.
#[derive(Debug, Clone, Default)]
pub struct BulkReviewReport {
    pub updated: Vec<Badge>,
    pub not_found: Vec<BadgeId>,
}

impl Tracker {
    fn badge_visible(actor: &Actor, badge: &Badge) -> bool {
        match actor.role {
            Role::Admin => true,
            Role::Teacher => {
                badge.approval_status == ReviewStatus::Approved || badge.creator_id == actor.id
            }
            Role::Student => badge.approval_status == ReviewStatus::Approved,
        }
    }

    fn load_badge(&self, id: BadgeId) -> Result<Badge, TrackerError> {
        self.store
            .get_badge(id)?
            .ok_or_else(|| TrackerError::NotFound(format!("Badge {}", id.0)))
    }

    /// Create the named category if it does not exist.
    fn ensure_category(&mut self, name: &str) -> Result<(), TrackerError> {
        if self.store.category_by_name(name)?.is_none() {
            self.store.insert_category(Category {
                id: CategoryId(0),
                name: name.to_string(),
                color: DEFAULT_CATEGORY_COLOR.to_string(),
                description: String::new(),
                created_at: now(),
            })?;
        }
        Ok(())
    }

    /// Badges `actor` may see, newest first.
    pub fn list_badges(
        &self,
        actor: &Actor,
        filter: &BadgeFilter,
    ) -> Result<Vec<Badge>, TrackerError> {
        let mut badges: Vec<Badge> = self
            .store
            .list_badges()?
            .into_iter()
            .filter(|b| Self::badge_visible(actor, b))
            .filter(|b| filter.category.as_deref().is_none_or(|c| b.category == c))
            .filter(|b| filter.status.is_none_or(|s| b.approval_status == s))
            .collect();
        badges.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(badges)
    }

    /// One badge. Badges the actor may not see read as missing.
    pub fn get_badge(&self, actor: &Actor, id: BadgeId) -> Result<Badge, TrackerError> {
        let badge = self.load_badge(id)?;
        if !Self::badge_visible(actor, &badge) {
            return Err(TrackerError::NotFound(format!("Badge {}", id.0)));
        }
        Ok(badge)
    }

    /// Create a badge. An admin's badge is approved on creation; a teacher's
    /// waits for review.
    pub fn create_badge(
        &mut self,
        actor: &Actor,
        input: BadgeInput,
    ) -> Result<Badge, TrackerError> {
        self.policy.require_staff(actor, "create badges")?;
        let category = validate::required_text("category", &input.category, MAX_NAME_LENGTH)?;
        let created_at = now();
        let mut badge = Badge {
            id: BadgeId(0),
            name: validate::required_text("name", &input.name, MAX_NAME_LENGTH)?,
            description: validate::optional_text(
                "description",
                input.description.as_deref(),
                MAX_TEXT_LENGTH,
            )?,
            criteria: validate::optional_text(
                "criteria",
                input.criteria.as_deref(),
                MAX_TEXT_LENGTH,
            )?,
            image_url: validate::optional_url("imageUrl", input.image_url.as_deref())?,
            category,
            creator_id: actor.id,
            approval_status: ReviewStatus::Pending,
            approved_by: None,
            approval_date: None,
            approval_comment: None,
            created_at,
            updated_at: created_at,
        };
        if actor.role == Role::Admin {
            badge.record_review(actor.id, &ReviewDecision::approve(), created_at);
        }

        self.ensure_category(&badge.category)?;
        self.store.insert_badge(badge)
    }

    /// Edit a badge. Creator or admin only. A teacher's edit sends the badge
    /// back to review.
    pub fn update_badge(
        &mut self,
        actor: &Actor,
        id: BadgeId,
        update: BadgeUpdate,
    ) -> Result<Badge, TrackerError> {
        let mut badge = self.load_badge(id)?;
        self.policy.check_badge_owner(actor, badge.creator_id)?;

        if let Some(name) = update.name.as_deref() {
            badge.name = validate::required_text("name", name, MAX_NAME_LENGTH)?;
        }
        if let Some(description) = update.description.as_deref() {
            badge.description =
                validate::optional_text("description", Some(description), MAX_TEXT_LENGTH)?;
        }
        if let Some(criteria) = update.criteria.as_deref() {
            badge.criteria = validate::optional_text("criteria", Some(criteria), MAX_TEXT_LENGTH)?;
        }
        if let Some(url) = update.image_url.as_deref() {
            badge.image_url = validate::optional_url("imageUrl", Some(url))?;
        }
        if let Some(category) = update.category.as_deref() {
            badge.category = validate::required_text("category", category, MAX_NAME_LENGTH)?;
        }
        if actor.role == Role::Teacher {
            reset_badge_review(&mut badge);
        }
        badge.updated_at = now();

        self.ensure_category(&badge.category)?;
        self.store.update_badge(&badge)?;
        Ok(badge)
    }

    /// Delete a badge and every submission made for it. Returns the badge and
    /// the number of submissions removed.
    pub fn delete_badge(
        &mut self,
        actor: &Actor,
        id: BadgeId,
    ) -> Result<(Badge, usize), TrackerError> {
        let badge = self.load_badge(id)?;
        self.policy.check_badge_owner(actor, badge.creator_id)?;
        self.store.delete_badge(id)?;
        let removed = self.store.delete_submissions_where(|s| s.badge_id == id)?;
        Ok((badge, removed))
    }

    /// Approve or reject one badge.
    pub fn review_badge(
        &mut self,
        actor: &Actor,
        id: BadgeId,
        decision: &ReviewDecision,
    ) -> Result<Badge, TrackerError> {
        self.policy.require_staff(actor, "review badges")?;
        let mut badge = self.load_badge(id)?;
        badge.record_review(actor.id, decision, now());
        self.store.update_badge(&badge)?;
        Ok(badge)
    }

    /// Apply one decision to up to `MAX_BULK_IDS` badges. Each badge is
    /// written on its own; missing ids are reported, not fatal.
    pub fn review_badges(
        &mut self,
        actor: &Actor,
        ids: &[BadgeId],
        decision: &ReviewDecision,
    ) -> Result<BulkReviewReport, TrackerError> {
        self.policy.require_staff(actor, "review badges")?;
        let ids = validate::bulk_ids(ids)?;
        let at = now();

        let mut report = BulkReviewReport::default();
        for id in ids {
            match self.store.get_badge(id)? {
                Some(mut badge) => {
                    badge.record_review(actor.id, decision, at);
                    if self.store.update_badge(&badge)? {
                        report.updated.push(badge);
                    } else {
                        report.not_found.push(id);
                    }
                }
                None => report.not_found.push(id),
            }
        }
        Ok(report)
    }
}
