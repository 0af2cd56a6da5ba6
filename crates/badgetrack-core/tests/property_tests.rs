//! # Property-Based Tests
//!
//! Invariants of the role table, the review step and the rename cascade,
//! checked with proptest.

use badgetrack_core::{
    Actor, Badge, BadgeCategoryIndex, BadgeId, ReviewDecision, ReviewStatus, Role, RolePolicy,
    Store, TrackerError, User, UserId, propagate_rename,
};
use chrono::Utc;
use proptest::collection::vec;
use proptest::prelude::*;

const SUPER: &str = "root@school.test";

fn role_strategy() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::Student), Just(Role::Teacher), Just(Role::Admin)]
}

fn target(id: u64, email: &str, role: Role) -> User {
    User {
        id: UserId(id),
        name: "Target".to_string(),
        email: email.to_string(),
        role,
        password_hash: String::new(),
        created_at: Utc::now(),
    }
}

fn actor(id: u64, email: &str, role: Role) -> Actor {
    Actor {
        id: UserId(id),
        email: email.to_string(),
        role,
    }
}

/// The single-step upgrades a non-super actor may perform.
fn single_step_allowed(actor: Role, from: Role, to: Role) -> bool {
    matches!(
        (actor, from, to),
        (Role::Admin, Role::Student, Role::Teacher)
            | (Role::Admin, Role::Teacher, Role::Admin)
            | (Role::Teacher, Role::Student, Role::Teacher)
    )
}

fn badge(id: u64, category: &str) -> Badge {
    let now = Utc::now();
    Badge {
        id: BadgeId(id),
        name: format!("Badge {}", id),
        description: String::new(),
        criteria: String::new(),
        image_url: None,
        category: category.to_string(),
        creator_id: UserId(1),
        approval_status: ReviewStatus::Approved,
        approved_by: None,
        approval_date: None,
        approval_comment: None,
        created_at: now,
        updated_at: now,
    }
}

// =============================================================================
// ROLE POLICY
// =============================================================================

proptest! {
    /// Only single-step upgrades succeed for ordinary actors; everything
    /// else is a Forbidden denial.
    #[test]
    fn only_single_step_upgrades_succeed(
        actor_role in role_strategy(),
        from in role_strategy(),
        to in role_strategy(),
    ) {
        let policy = RolePolicy::new(SUPER);
        let result = policy.check_role_change(
            &actor(1, "someone@school.test", actor_role),
            &target(2, "other@school.test", from),
            to,
        );

        if single_step_allowed(actor_role, from, to) {
            prop_assert_eq!(result, Ok(()));
        } else {
            prop_assert!(matches!(result, Err(TrackerError::Forbidden(_))));
        }
    }

    /// Nobody changes their own role, whatever they are.
    #[test]
    fn self_role_change_always_fails(
        role in role_strategy(),
        to in role_strategy(),
        is_super in any::<bool>(),
    ) {
        let policy = RolePolicy::new(SUPER);
        let email = if is_super { SUPER } else { "me@school.test" };
        let me = target(7, email, role);
        let result = policy.check_role_change(&actor(7, email, role), &me, to);
        prop_assert!(matches!(result, Err(TrackerError::Forbidden(_))));
    }

    /// The super-admin account cannot be changed, reset or deleted by anyone
    /// else.
    #[test]
    fn super_admin_is_untouchable(
        actor_role in role_strategy(),
        to in role_strategy(),
    ) {
        let policy = RolePolicy::new(SUPER);
        let someone = actor(3, "someone@school.test", actor_role);
        let root = target(1, SUPER, Role::Admin);

        prop_assert!(policy.check_role_change(&someone, &root, to).is_err());
        prop_assert!(policy.check_password_reset(&someone, &root).is_err());
        prop_assert!(policy.check_delete(&someone, &root).is_err());
    }

    /// The super admin may move anyone else to any different role.
    #[test]
    fn super_admin_changes_any_other_role(
        from in role_strategy(),
        to in role_strategy(),
    ) {
        let policy = RolePolicy::new(SUPER);
        let root = actor(1, SUPER, Role::Admin);
        let result = policy.check_role_change(&root, &target(2, "x@school.test", from), to);
        if from == to {
            prop_assert!(matches!(result, Err(TrackerError::Validation(_))));
        } else {
            prop_assert_eq!(result, Ok(()));
        }
    }

    /// A password reset is only ever allowed downwards, or by the super admin.
    #[test]
    fn password_reset_goes_downwards(
        actor_role in role_strategy(),
        target_role in role_strategy(),
    ) {
        let policy = RolePolicy::new(SUPER);
        let result = policy.check_password_reset(
            &actor(1, "a@school.test", actor_role),
            &target(2, "b@school.test", target_role),
        );
        let expected = matches!(
            (actor_role, target_role),
            (Role::Admin, Role::Student | Role::Teacher) | (Role::Teacher, Role::Student)
        );
        prop_assert_eq!(result.is_ok(), expected);
    }
}

// =============================================================================
// REVIEW WORKFLOW
// =============================================================================

proptest! {
    /// A rejection whose comment is blank after trimming never validates.
    #[test]
    fn rejection_needs_comment(blank in "[ \t\n]{0,8}") {
        let result = ReviewDecision::new(ReviewStatus::Rejected, Some(&blank));
        prop_assert!(matches!(result, Err(TrackerError::Validation(_))));
        prop_assert!(ReviewDecision::new(ReviewStatus::Rejected, None).is_err());
    }

    /// Any non-blank comment is accepted for both decisions and stored trimmed.
    #[test]
    fn comment_is_trimmed(comment in "[a-z]{1,40}", pad in " {0,4}") {
        let padded = format!("{}{}{}", pad, comment, pad);
        for status in [ReviewStatus::Approved, ReviewStatus::Rejected] {
            let decision = ReviewDecision::new(status, Some(&padded)).expect("valid");
            prop_assert_eq!(decision.status(), status);
            prop_assert_eq!(decision.comment(), Some(comment.as_str()));
        }
    }

    /// `pending` is never a review decision.
    #[test]
    fn pending_is_not_a_decision(comment in proptest::option::of("[a-z]{1,10}")) {
        let result = ReviewDecision::new(ReviewStatus::Pending, comment.as_deref());
        prop_assert!(result.is_err());
    }
}

// =============================================================================
// RENAME CASCADE
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// On a healthy store the cascade moves every badge off the old name and
    /// leaves the others alone.
    #[test]
    fn cascade_leaves_nothing_behind(picks in vec(0usize..3, 0..30)) {
        let names = ["Art", "Math", "Design"];
        let mut store = Store::in_memory().expect("store");
        for (i, pick) in picks.iter().enumerate() {
            store.insert_badge(badge(i as u64, names[*pick])).expect("insert");
        }
        let art = picks.iter().filter(|p| **p == 0).count();
        let math = picks.iter().filter(|p| **p == 1).count();
        let design = picks.iter().filter(|p| **p == 2).count();

        let report = propagate_rename(&mut store, "Art", "Design").expect("cascade");

        prop_assert_eq!(report.matched, art);
        prop_assert_eq!(report.remaining, 0);
        prop_assert_eq!(store.count_in_category("Art").expect("count"), 0);
        prop_assert_eq!(store.count_in_category("Design").expect("count"), art + design);
        prop_assert_eq!(store.count_in_category("Math").expect("count"), math);
    }
}
