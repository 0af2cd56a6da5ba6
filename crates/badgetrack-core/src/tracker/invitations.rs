//! Invitations: the only way new accounts come into existence.

use super::{Tracker, now, validate};
use crate::credentials::{generate_token, hash_password, token_digest};
use crate::policy::Actor;
use crate::{Invitation, InvitationId, InvitationStatus, Role, TrackerError};

#[derive(Debug, Clone)]
pub struct InviteInput {
    pub email: String,
    pub role: Role,
    /// Optional initial password for the invitee.
    pub password: Option<String>,
}

/// A stored invitation plus its token. The token is not recoverable later.
#[derive(Debug, Clone)]
pub struct IssuedInvitation {
    pub invitation: Invitation,
    pub token: String,
}

impl Tracker {
    /// Invite someone at `role`. A pending invitation to the same email is
    /// replaced.
    ///
    /// The super-admin address cannot be invited; that account only comes
    /// from `bootstrap_super_admin`.
    pub fn invite(
        &mut self,
        actor: &Actor,
        input: InviteInput,
    ) -> Result<IssuedInvitation, TrackerError> {
        self.policy.check_invite(actor, input.role)?;
        let email = validate::normalize_email(&input.email)?;
        if self.policy.is_super_admin(&email) {
            return Err(TrackerError::Forbidden(
                "The super admin account cannot be invited".to_string(),
            ));
        }
        if self.store.user_by_email(&email)?.is_some() {
            return Err(TrackerError::Conflict(format!(
                "An account for {} already exists",
                email
            )));
        }
        let password_hash = input.password.as_deref().map(hash_password).transpose()?;

        if let Some(previous) = self.store.invitation_by_email(&email)? {
            if previous.status == InvitationStatus::Pending {
                self.store.delete_invitation(previous.id)?;
            }
        }

        let token = generate_token();
        let created_at = now();
        let expires_at = self.config.invitation_expiry(created_at)?;
        let invitation = self.store.insert_invitation(Invitation {
            id: InvitationId(0),
            email,
            role: input.role,
            token_digest: token_digest(&token),
            invited_by: actor.id,
            password_hash,
            status: InvitationStatus::Pending,
            expires_at,
            created_at,
        })?;

        Ok(IssuedInvitation { invitation, token })
    }

    /// Invitations visible to `actor`, with expiry applied. Admins see all of
    /// them; teachers see the ones they sent.
    pub fn list_invitations(&self, actor: &Actor) -> Result<Vec<Invitation>, TrackerError> {
        self.policy.require_staff(actor, "view invitations")?;
        let at = now();
        Ok(self
            .store
            .list_invitations()?
            .into_iter()
            .filter(|inv| actor.role == Role::Admin || inv.invited_by == actor.id)
            .map(|mut inv| {
                inv.status = inv.effective_status(at);
                inv
            })
            .collect())
    }
}
