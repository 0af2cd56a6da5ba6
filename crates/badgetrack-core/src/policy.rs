//! # Role Policy
//!
//! Decides which role changes, password resets, deletions and invitations an
//! actor may perform against a target account.
//!
//! The policy is a flat decision table over three roles plus one
//! distinguished account, the super admin, identified by email. Every check
//! returns `Ok(())` or `TrackerError::Forbidden` with a reason meant for the
//! person who made the request.
//!
//! ## Role changes
//!
//! | Actor        | Allowed transitions                        |
//! |--------------|--------------------------------------------|
//! | super admin  | any, on anyone but itself                  |
//! | admin        | student → teacher, teacher → admin         |
//! | teacher      | student → teacher                          |
//! | student      | none                                       |
//!
//! Changing one's own role and touching the super-admin account are denied
//! for every actor.

use crate::{Role, TrackerError, User, UserId};

/// The authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

fn deny(reason: &str) -> TrackerError {
    TrackerError::Forbidden(reason.to_string())
}

/// The role decision table.
#[derive(Debug, Clone)]
pub struct RolePolicy {
    super_admin_email: String,
}

impl RolePolicy {
    /// Create a policy for the given super-admin email.
    pub fn new(super_admin_email: impl Into<String>) -> Self {
        Self {
            super_admin_email: super_admin_email.into().trim().to_ascii_lowercase(),
        }
    }

    /// The (lower-cased) super-admin email.
    #[must_use]
    pub fn super_admin_email(&self) -> &str {
        &self.super_admin_email
    }

    /// Whether `email` belongs to the super admin. Case-insensitive.
    #[must_use]
    pub fn is_super_admin(&self, email: &str) -> bool {
        email.trim().eq_ignore_ascii_case(&self.super_admin_email)
    }

    /// Whether `actor` holds super-admin rights: the super-admin email on an
    /// account that is still an admin.
    #[must_use]
    pub fn acts_as_super_admin(&self, actor: &Actor) -> bool {
        actor.role == Role::Admin && self.is_super_admin(&actor.email)
    }

    // =========================================================================
    // ACCOUNT ADMINISTRATION
    // =========================================================================

    /// May `actor` move `target` to the `requested` role?
    ///
    /// Authorization is decided first, so for every actor except the super
    /// admin a no-op request is a plain denial. The super admin gets a
    /// validation error for a no-op instead.
    pub fn check_role_change(
        &self,
        actor: &Actor,
        target: &User,
        requested: Role,
    ) -> Result<(), TrackerError> {
        if actor.id == target.id {
            return Err(deny("You cannot change your own role"));
        }
        if self.is_super_admin(&target.email) {
            return Err(deny("The super admin account cannot be modified"));
        }

        if self.acts_as_super_admin(actor) {
            if target.role == requested {
                return Err(TrackerError::Validation(format!(
                    "User already has the {} role",
                    requested
                )));
            }
            return Ok(());
        }

        match actor.role {
            Role::Admin => {
                if target.role == Role::Admin {
                    return Err(deny("Admins cannot modify other admins"));
                }
                match (target.role, requested) {
                    (Role::Student, Role::Teacher) | (Role::Teacher, Role::Admin) => Ok(()),
                    _ => Err(deny(
                        "Admins can only promote students to teacher or teachers to admin",
                    )),
                }
            }
            Role::Teacher => match (target.role, requested) {
                (Role::Student, Role::Teacher) => Ok(()),
                _ => Err(deny("Teachers can only promote students to teacher")),
            },
            Role::Student => Err(deny("Students cannot change user roles")),
        }
    }

    /// May `actor` set a new password on `target` without knowing the old one?
    pub fn check_password_reset(&self, actor: &Actor, target: &User) -> Result<(), TrackerError> {
        let actor_is_super = self.acts_as_super_admin(actor);

        if self.is_super_admin(&target.email) && !actor_is_super {
            return Err(deny("The super admin account cannot be modified"));
        }
        if actor_is_super {
            return Ok(());
        }
        if actor.id == target.id {
            return Err(deny(
                "Use the change-password endpoint to change your own password",
            ));
        }

        match actor.role {
            Role::Admin if target.role == Role::Admin => {
                Err(deny("Admins cannot reset other admins' passwords"))
            }
            Role::Admin => Ok(()),
            Role::Teacher if target.role == Role::Student => Ok(()),
            Role::Teacher => Err(deny("Teachers can only reset student passwords")),
            Role::Student => Err(deny("Students cannot reset passwords")),
        }
    }

    /// May `actor` delete `target`?
    pub fn check_delete(&self, actor: &Actor, target: &User) -> Result<(), TrackerError> {
        if self.is_super_admin(&target.email) {
            return Err(deny("The super admin account cannot be deleted"));
        }
        if actor.id == target.id {
            return Err(deny("You cannot delete your own account"));
        }
        if self.acts_as_super_admin(actor) {
            return Ok(());
        }

        match actor.role {
            Role::Admin if target.role == Role::Admin => {
                Err(deny("Admins cannot delete other admins"))
            }
            Role::Admin => Ok(()),
            Role::Teacher | Role::Student => Err(deny("Only admins can delete users")),
        }
    }

    /// May `actor` invite someone at `role`?
    pub fn check_invite(&self, actor: &Actor, role: Role) -> Result<(), TrackerError> {
        match (actor.role, role) {
            (Role::Admin, _) => Ok(()),
            (Role::Teacher, Role::Student | Role::Teacher) => Ok(()),
            (Role::Teacher, Role::Admin) => Err(deny("Teachers cannot invite admins")),
            (Role::Student, _) => Err(deny("Students cannot send invitations")),
        }
    }

    // =========================================================================
    // CONTENT GATES
    // =========================================================================

    /// Teachers and admins: create badges, review badges and submissions,
    /// create categories, list users.
    pub fn require_staff(&self, actor: &Actor, action: &str) -> Result<(), TrackerError> {
        if actor.role.is_staff() {
            Ok(())
        } else {
            Err(TrackerError::Forbidden(format!(
                "Only teachers and admins can {}",
                action
            )))
        }
    }

    /// Admins only: manage categories, bulk deletion.
    pub fn require_admin(&self, actor: &Actor, action: &str) -> Result<(), TrackerError> {
        if actor.role == Role::Admin {
            Ok(())
        } else {
            Err(TrackerError::Forbidden(format!("Only admins can {}", action)))
        }
    }

    /// Badge owners and admins may edit or delete a badge.
    pub fn check_badge_owner(&self, actor: &Actor, creator: UserId) -> Result<(), TrackerError> {
        if actor.role == Role::Admin || (actor.role == Role::Teacher && actor.id == creator) {
            Ok(())
        } else {
            Err(deny("Only the badge creator or an admin can modify this badge"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const SUPER: &str = "root@school.test";

    fn user(id: u64, email: &str, role: Role) -> User {
        User {
            id: UserId(id),
            name: format!("user-{}", id),
            email: email.to_string(),
            role,
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    fn actor(u: &User) -> Actor {
        Actor::from(u)
    }

    fn policy() -> RolePolicy {
        RolePolicy::new(SUPER)
    }

    #[test]
    fn super_admin_matches_case_insensitively() {
        let p = RolePolicy::new("Root@School.Test ");
        assert!(p.is_super_admin("root@school.test"));
        assert!(p.is_super_admin("ROOT@SCHOOL.TEST"));
        assert!(!p.is_super_admin("other@school.test"));
    }

    #[test]
    fn admin_single_step_upgrades_only() {
        let p = policy();
        let admin = user(1, "a@school.test", Role::Admin);
        let student = user(2, "s@school.test", Role::Student);
        let teacher = user(3, "t@school.test", Role::Teacher);

        assert!(p.check_role_change(&actor(&admin), &student, Role::Teacher).is_ok());
        assert!(p.check_role_change(&actor(&admin), &teacher, Role::Admin).is_ok());
        assert!(p.check_role_change(&actor(&admin), &student, Role::Admin).is_err());
        assert!(p.check_role_change(&actor(&admin), &teacher, Role::Student).is_err());
    }

    #[test]
    fn admin_cannot_touch_other_admins() {
        let p = policy();
        let admin = user(1, "a@school.test", Role::Admin);
        let other = user(2, "b@school.test", Role::Admin);

        let err = p
            .check_role_change(&actor(&admin), &other, Role::Teacher)
            .expect_err("denied");
        assert_eq!(
            err,
            TrackerError::Forbidden("Admins cannot modify other admins".to_string())
        );
        assert!(p.check_password_reset(&actor(&admin), &other).is_err());
        assert!(p.check_delete(&actor(&admin), &other).is_err());
    }

    #[test]
    fn teacher_promotes_students_only() {
        let p = policy();
        let teacher = user(1, "t@school.test", Role::Teacher);
        let student = user(2, "s@school.test", Role::Student);
        let other_teacher = user(3, "t2@school.test", Role::Teacher);

        assert!(p.check_role_change(&actor(&teacher), &student, Role::Teacher).is_ok());
        assert!(p.check_role_change(&actor(&teacher), &student, Role::Admin).is_err());
        assert!(
            p.check_role_change(&actor(&teacher), &other_teacher, Role::Admin)
                .is_err()
        );
    }

    #[test]
    fn student_has_no_rights() {
        let p = policy();
        let student = user(1, "s@school.test", Role::Student);
        let other = user(2, "s2@school.test", Role::Student);

        assert!(p.check_role_change(&actor(&student), &other, Role::Teacher).is_err());
        assert!(p.check_password_reset(&actor(&student), &other).is_err());
        assert!(p.check_delete(&actor(&student), &other).is_err());
        assert!(p.check_invite(&actor(&student), Role::Student).is_err());
    }

    #[test]
    fn super_admin_may_demote_admins() {
        let p = policy();
        let root = user(1, SUPER, Role::Admin);
        let admin = user(2, "a@school.test", Role::Admin);

        assert!(p.check_role_change(&actor(&root), &admin, Role::Student).is_ok());
        assert!(p.check_password_reset(&actor(&root), &admin).is_ok());
        assert!(p.check_delete(&actor(&root), &admin).is_ok());
    }

    #[test]
    fn super_admin_no_op_is_validation_error() {
        let p = policy();
        let root = user(1, SUPER, Role::Admin);
        let teacher = user(2, "t@school.test", Role::Teacher);

        assert!(matches!(
            p.check_role_change(&actor(&root), &teacher, Role::Teacher),
            Err(TrackerError::Validation(_))
        ));
    }

    #[test]
    fn super_admin_account_is_untouchable() {
        let p = policy();
        let root = user(1, SUPER, Role::Admin);
        let admin = user(2, "a@school.test", Role::Admin);

        assert!(p.check_role_change(&actor(&root), &root, Role::Teacher).is_err());
        assert!(p.check_role_change(&actor(&admin), &root, Role::Teacher).is_err());
        assert!(p.check_delete(&actor(&root), &root).is_err());
        assert!(p.check_password_reset(&actor(&admin), &root).is_err());
        // Resetting its own password is not a demotion.
        assert!(p.check_password_reset(&actor(&root), &root).is_ok());
    }

    #[test]
    fn super_admin_email_without_admin_role_has_no_rights() {
        let p = policy();
        let impostor = user(1, SUPER, Role::Student);
        let admin = user(2, "a@school.test", Role::Admin);

        assert!(!p.acts_as_super_admin(&actor(&impostor)));
        assert!(p.check_delete(&actor(&impostor), &admin).is_err());
        assert!(p.check_password_reset(&actor(&impostor), &admin).is_err());
        assert!(
            p.check_role_change(&actor(&impostor), &admin, Role::Student)
                .is_err()
        );
    }

    #[test]
    fn teacher_cannot_reset_admin_password() {
        let p = policy();
        let teacher = user(1, "t@school.test", Role::Teacher);
        let admin = user(2, "a@school.test", Role::Admin);
        let student = user(3, "s@school.test", Role::Student);

        assert!(p.check_password_reset(&actor(&teacher), &admin).is_err());
        assert!(p.check_password_reset(&actor(&teacher), &student).is_ok());
    }

    #[test]
    fn self_reset_goes_through_change_password() {
        let p = policy();
        let admin = user(1, "a@school.test", Role::Admin);
        assert!(p.check_password_reset(&actor(&admin), &admin).is_err());
    }

    #[test]
    fn invitation_roles() {
        let p = policy();
        let admin = user(1, "a@school.test", Role::Admin);
        let teacher = user(2, "t@school.test", Role::Teacher);

        for role in Role::ALL {
            assert!(p.check_invite(&actor(&admin), role).is_ok());
        }
        assert!(p.check_invite(&actor(&teacher), Role::Student).is_ok());
        assert!(p.check_invite(&actor(&teacher), Role::Teacher).is_ok());
        assert!(p.check_invite(&actor(&teacher), Role::Admin).is_err());
    }

    #[test]
    fn badge_owner_gate() {
        let p = policy();
        let teacher = user(1, "t@school.test", Role::Teacher);
        let admin = user(2, "a@school.test", Role::Admin);
        let student = user(3, "s@school.test", Role::Student);

        assert!(p.check_badge_owner(&actor(&teacher), UserId(1)).is_ok());
        assert!(p.check_badge_owner(&actor(&teacher), UserId(9)).is_err());
        assert!(p.check_badge_owner(&actor(&admin), UserId(9)).is_ok());
        assert!(p.check_badge_owner(&actor(&student), UserId(3)).is_err());
    }
}
