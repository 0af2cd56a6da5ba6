//! # Tracker
//!
//! The operation facade. Every public method takes the acting user, runs the
//! role gate, validates input and then touches the store. Nothing outside
//! this module writes documents.
//!
//! Reads take `&self`; anything that writes takes `&mut self`, so the app can
//! put the tracker behind a reader/writer lock and get serialized writes.

mod auth;
mod badges;
mod categories;
mod invitations;
mod submissions;
mod users;
mod validate;

pub use auth::{LoginOutcome, RegisterInput};
pub use badges::{BadgeFilter, BadgeInput, BadgeUpdate, BulkReviewReport};
pub use categories::{CategoryInput, CategorySummary, CategoryUpdate, CategoryUpdateOutcome};
pub use invitations::{InviteInput, IssuedInvitation};
pub use submissions::{SubmissionFilter, SubmissionInput, VisibilityUpdate};
pub use users::{BulkDeleteReport, ProtectedUser, UserDeletion};

use crate::credentials::hash_password;
use crate::policy::RolePolicy;
use crate::primitives::{
    DEFAULT_INVITATION_TTL_HOURS, DEFAULT_SESSION_TTL_HOURS, DEFAULT_SUPER_ADMIN_EMAIL,
    MAX_NAME_LENGTH, MAX_TTL_HOURS,
};
use crate::storage::Store;
use crate::{Role, TrackerError, User, UserId};
use chrono::{DateTime, Duration, Utc};
use std::path::Path;

/// Settings that change tracker behaviour at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Email of the undeletable, undemotable admin account.
    pub super_admin_email: String,
    /// Hours an invitation stays redeemable.
    pub invitation_ttl_hours: u32,
    /// Hours a login session stays valid.
    pub session_ttl_hours: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            super_admin_email: DEFAULT_SUPER_ADMIN_EMAIL.to_string(),
            invitation_ttl_hours: DEFAULT_INVITATION_TTL_HOURS,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
        }
    }
}

impl TrackerConfig {
    /// Reject TTLs above `MAX_TTL_HOURS`.
    pub fn validate(&self) -> Result<(), TrackerError> {
        for (key, hours) in [
            ("invitation_ttl_hours", self.invitation_ttl_hours),
            ("session_ttl_hours", self.session_ttl_hours),
        ] {
            if hours > MAX_TTL_HOURS {
                return Err(TrackerError::Validation(format!(
                    "{} must be at most {} (got {})",
                    key, MAX_TTL_HOURS, hours
                )));
            }
        }
        Ok(())
    }

    fn invitation_expiry(&self, from: DateTime<Utc>) -> Result<DateTime<Utc>, TrackerError> {
        expiry(from, self.invitation_ttl_hours)
    }

    fn session_expiry(&self, from: DateTime<Utc>) -> Result<DateTime<Utc>, TrackerError> {
        expiry(from, self.session_ttl_hours)
    }
}

fn expiry(from: DateTime<Utc>, hours: u32) -> Result<DateTime<Utc>, TrackerError> {
    from.checked_add_signed(Duration::hours(i64::from(hours)))
        .ok_or_else(|| {
            TrackerError::Validation(format!("A TTL of {} hours is out of range", hours))
        })
}

/// The badge tracker: a store plus the policy that guards it.
#[derive(Debug)]
pub struct Tracker {
    store: Store,
    policy: RolePolicy,
    config: TrackerConfig,
}

impl Tracker {
    /// Open (or create) a tracker backed by the database at `path`.
    pub fn open(path: impl AsRef<Path>, config: TrackerConfig) -> Result<Self, TrackerError> {
        config.validate()?;
        Ok(Self::with_store(Store::open(path)?, config))
    }

    /// Create a tracker on a volatile in-memory store.
    pub fn in_memory(config: TrackerConfig) -> Result<Self, TrackerError> {
        config.validate()?;
        Ok(Self::with_store(Store::in_memory()?, config))
    }

    fn with_store(store: Store, config: TrackerConfig) -> Self {
        Self {
            policy: RolePolicy::new(config.super_admin_email.clone()),
            store,
            config,
        }
    }

    /// Read access to the underlying store (status reporting, tests).
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn policy(&self) -> &RolePolicy {
        &self.policy
    }

    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Create the super-admin account, or reset its password and role if it
    /// already exists. Existing sessions of the account are revoked.
    pub fn bootstrap_super_admin(
        &mut self,
        name: &str,
        password: &str,
    ) -> Result<User, TrackerError> {
        let name = validate::required_text("name", name, MAX_NAME_LENGTH)?;
        let password_hash = hash_password(password)?;
        let email = self.policy.super_admin_email().to_string();

        match self.store.user_by_email(&email)? {
            Some(mut user) => {
                user.name = name;
                user.role = Role::Admin;
                user.password_hash = password_hash;
                self.store.update_user(&user)?;
                self.store.remove_sessions_for_user(user.id)?;
                Ok(user)
            }
            None => self.store.insert_user(User {
                id: UserId(0),
                name,
                email,
                role: Role::Admin,
                password_hash,
                created_at: now(),
            }),
        }
    }

    /// The super-admin account, if it has been created.
    pub fn super_admin(&self) -> Result<Option<User>, TrackerError> {
        self.store.user_by_email(self.policy.super_admin_email())
    }

    fn load_user(&self, id: UserId) -> Result<User, TrackerError> {
        self.store
            .get_user(id)?
            .ok_or_else(|| TrackerError::NotFound(format!("User {}", id.0)))
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}
