//! Login sessions, invitation redemption and self-service password change.

use super::{Tracker, now, validate};
use crate::credentials::{
    generate_token, hash_password, token_digest, token_matches, verify_password,
    verify_unknown_account,
};
use crate::policy::Actor;
use crate::primitives::MAX_NAME_LENGTH;
use crate::{InvitationStatus, SessionRecord, TrackerError, User, UserId};
use chrono::{DateTime, Utc};

/// A freshly opened session.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Bearer token. Only its digest is stored.
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

/// Registration against an invitation.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    /// The invitation token handed out by the inviter.
    pub token: String,
    pub name: String,
    /// Required unless the inviter set an initial password.
    pub password: Option<String>,
}

impl Tracker {
    /// Exchange email and password for a session.
    ///
    /// Unknown emails and wrong passwords return the same error after the
    /// same argon2 work.
    pub fn login(&mut self, email: &str, password: &str) -> Result<LoginOutcome, TrackerError> {
        let email = email.trim().to_ascii_lowercase();
        let Some(user) = self.store.user_by_email(&email)? else {
            verify_unknown_account(password);
            return Err(TrackerError::Unauthorized);
        };
        if !verify_password(password, &user.password_hash) {
            return Err(TrackerError::Unauthorized);
        }
        self.open_session(user)
    }

    fn open_session(&mut self, user: User) -> Result<LoginOutcome, TrackerError> {
        let token = generate_token();
        let created_at = now();
        let expires_at = self.config.session_expiry(created_at)?;
        self.store.insert_session(
            &token_digest(&token),
            &SessionRecord {
                user_id: user.id,
                created_at,
                expires_at,
            },
        )?;
        Ok(LoginOutcome {
            token,
            user,
            expires_at,
        })
    }

    /// Revoke a session. Returns false if it was not open.
    pub fn logout(&mut self, token: &str) -> Result<bool, TrackerError> {
        self.store.remove_session(&token_digest(token))
    }

    /// Resolve a bearer token to the acting user.
    ///
    /// The user is re-read on every call, so role changes apply to open
    /// sessions immediately. Expired sessions are removed on sight.
    pub fn authenticate(&self, token: &str) -> Result<Actor, TrackerError> {
        let digest = token_digest(token);
        let session = self
            .store
            .get_session(&digest)?
            .ok_or(TrackerError::Unauthorized)?;
        if now() >= session.expires_at {
            self.store.remove_session(&digest)?;
            return Err(TrackerError::Unauthorized);
        }
        match self.store.get_user(session.user_id)? {
            Some(user) => Ok(Actor::from(&user)),
            None => {
                self.store.remove_session(&digest)?;
                Err(TrackerError::Unauthorized)
            }
        }
    }

    /// Redeem an invitation: create the account at the invited role and log
    /// it in.
    pub fn register(&mut self, input: RegisterInput) -> Result<LoginOutcome, TrackerError> {
        let email = validate::normalize_email(&input.email)?;
        let mut invitation = self
            .store
            .invitation_by_email(&email)?
            .ok_or_else(|| TrackerError::NotFound(format!("Invitation for {}", email)))?;

        if !token_matches(&input.token, &invitation.token_digest) {
            return Err(TrackerError::Unauthorized);
        }
        // Invitations issued before the super-admin email was reconfigured.
        if self.policy.is_super_admin(&email) {
            return Err(TrackerError::Forbidden(
                "The super admin account cannot be registered by invitation".to_string(),
            ));
        }
        match invitation.effective_status(now()) {
            InvitationStatus::Pending => {}
            InvitationStatus::Accepted => {
                return Err(TrackerError::Conflict(
                    "This invitation has already been used".to_string(),
                ));
            }
            InvitationStatus::Expired => {
                if invitation.status != InvitationStatus::Expired {
                    invitation.status = InvitationStatus::Expired;
                    self.store.update_invitation(&invitation)?;
                }
                return Err(TrackerError::Expired(format!("Invitation for {}", email)));
            }
        }

        let name = validate::required_text("name", &input.name, MAX_NAME_LENGTH)?;
        let password_hash = match (input.password.as_deref(), &invitation.password_hash) {
            (Some(password), _) => hash_password(password)?,
            (None, Some(preset)) => preset.clone(),
            (None, None) => {
                return Err(TrackerError::Validation("A password is required".to_string()));
            }
        };

        let user = self.store.insert_user(User {
            id: UserId(0),
            name,
            email,
            role: invitation.role,
            password_hash,
            created_at: now(),
        })?;

        invitation.status = InvitationStatus::Accepted;
        self.store.update_invitation(&invitation)?;

        self.open_session(user)
    }

    /// Change one's own password by presenting the current one.
    pub fn change_own_password(
        &mut self,
        actor: &Actor,
        current: &str,
        new_password: &str,
    ) -> Result<(), TrackerError> {
        let mut user = self.load_user(actor.id)?;
        if !verify_password(current, &user.password_hash) {
            return Err(TrackerError::Forbidden(
                "Current password is incorrect".to_string(),
            ));
        }
        user.password_hash = hash_password(new_password)?;
        self.store.update_user(&user)?;
        Ok(())
    }
}
