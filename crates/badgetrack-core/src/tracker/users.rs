//! Account administration: listing, role changes, password resets and
//! deletion.
//!
//! Deleting a user hands their badges to the super admin so that no badge is
//! left without a creator. The user's own submissions go with them.

use super::{Tracker, validate};
use crate::credentials::hash_password;
use crate::policy::Actor;
use crate::{Role, TrackerError, User, UserId};

/// Result of deleting one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDeletion {
    pub user: User,
    /// Badges moved to the super admin.
    pub reassigned_badges: usize,
    /// Submissions of the user that were removed.
    pub removed_submissions: usize,
}

/// A bulk-delete target the policy refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedUser {
    pub id: UserId,
    pub reason: String,
}

/// Result of a bulk delete. Every id lands in exactly one list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkDeleteReport {
    pub deleted: Vec<UserId>,
    pub protected: Vec<ProtectedUser>,
    /// Ids that do not exist or could not be removed.
    pub failed: Vec<UserId>,
    pub reassigned_badges: usize,
}

impl Tracker {
    /// All users, optionally restricted to one role. Staff only.
    pub fn list_users(&self, actor: &Actor, role: Option<Role>) -> Result<Vec<User>, TrackerError> {
        self.policy.require_staff(actor, "list users")?;
        let mut users = self.store.list_users()?;
        if let Some(role) = role {
            users.retain(|u| u.role == role);
        }
        Ok(users)
    }

    /// One user. Everyone may read themselves; staff may read anyone.
    pub fn get_user(&self, actor: &Actor, id: UserId) -> Result<User, TrackerError> {
        if actor.id != id {
            self.policy.require_staff(actor, "view other users")?;
        }
        self.load_user(id)
    }

    pub fn change_role(
        &mut self,
        actor: &Actor,
        target: UserId,
        role: Role,
    ) -> Result<User, TrackerError> {
        let mut user = self.load_user(target)?;
        self.policy.check_role_change(actor, &user, role)?;
        user.role = role;
        self.store.update_user(&user)?;
        Ok(user)
    }

    /// Set a new password on someone else's account. Their sessions are
    /// revoked.
    pub fn reset_password(
        &mut self,
        actor: &Actor,
        target: UserId,
        new_password: &str,
    ) -> Result<User, TrackerError> {
        let mut user = self.load_user(target)?;
        self.policy.check_password_reset(actor, &user)?;
        user.password_hash = hash_password(new_password)?;
        self.store.update_user(&user)?;
        self.store.remove_sessions_for_user(user.id)?;
        Ok(user)
    }

    pub fn delete_user(
        &mut self,
        actor: &Actor,
        target: UserId,
    ) -> Result<UserDeletion, TrackerError> {
        let user = self.load_user(target)?;
        self.policy.check_delete(actor, &user)?;
        let heir = self.badge_heir()?;
        self.remove_user(user, heir)
    }

    /// Delete several users. Admins only. Each id is handled on its own;
    /// a refusal or failure does not stop the rest.
    pub fn bulk_delete_users(
        &mut self,
        actor: &Actor,
        ids: &[UserId],
    ) -> Result<BulkDeleteReport, TrackerError> {
        self.policy.require_admin(actor, "delete users in bulk")?;
        let ids = validate::bulk_ids(ids)?;
        let heir = self.badge_heir()?;

        let mut report = BulkDeleteReport::default();
        for id in ids {
            let Some(user) = self.store.get_user(id)? else {
                report.failed.push(id);
                continue;
            };
            if let Err(e) = self.policy.check_delete(actor, &user) {
                let reason = match e {
                    TrackerError::Forbidden(reason) => reason,
                    other => other.to_string(),
                };
                report.protected.push(ProtectedUser { id, reason });
                continue;
            }
            match self.remove_user(user, heir) {
                Ok(deletion) => {
                    report.deleted.push(id);
                    report.reassigned_badges += deletion.reassigned_badges;
                }
                Err(_) => report.failed.push(id),
            }
        }
        Ok(report)
    }

    /// The account that inherits the badges of deleted users.
    fn badge_heir(&self) -> Result<UserId, TrackerError> {
        self.super_admin()?.map(|u| u.id).ok_or_else(|| {
            TrackerError::Conflict(
                "The super admin account does not exist; run `badgetrack init` first".to_string(),
            )
        })
    }

    fn remove_user(&mut self, user: User, heir: UserId) -> Result<UserDeletion, TrackerError> {
        let reassigned_badges = self.store.reassign_badges(user.id, heir)?;
        let removed_submissions = self
            .store
            .delete_submissions_where(|s| s.student_id == user.id)?;
        self.store.remove_sessions_for_user(user.id)?;
        self.store.delete_user(user.id)?;
        Ok(UserDeletion {
            user,
            reassigned_badges,
            removed_submissions,
        })
    }
}
