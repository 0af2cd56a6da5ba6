//! # badgetrack-core
//!
//! The badge tracker's logic - THE LOGIC.
//!
//! Students submit evidence to earn badges; teachers and admins create
//! badges and review submissions; administrators manage accounts, roles,
//! categories and invitations. This crate holds all of it:
//!
//! - `types` → documents, identifiers, `TrackerError`
//! - `policy` → the role decision table (`RolePolicy`)
//! - `workflow` → the pending/approved/rejected review step
//! - `cascade` → propagation of category renames onto badges
//! - `credentials` → argon2 password hashes and bearer tokens
//! - `storage` → the redb document store
//! - `tracker` → `Tracker`, the facade every operation goes through
//!
//! ## Architectural Constraints
//!
//! - Has NO async, NO network dependencies (pure Rust)
//! - No logging framework; outcomes worth logging are returned to the caller
//! - Every write passes the role gate in `Tracker` first

// =============================================================================
// MODULES
// =============================================================================

pub mod cascade;
pub mod credentials;
pub mod policy;
pub mod primitives;
pub mod storage;
pub mod tracker;
pub mod types;
pub mod workflow;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Badge, BadgeId, Category, CategoryId, Invitation, InvitationId, InvitationStatus,
    ReviewStatus, Role, SessionRecord, Submission, SubmissionId, TrackerError, User, UserId,
};

// =============================================================================
// RE-EXPORTS: Policy, Workflow, Cascade
// =============================================================================

pub use cascade::{BadgeCategoryIndex, CascadeReport, propagate_rename};
pub use policy::{Actor, RolePolicy};
pub use workflow::{ReviewDecision, Reviewable};

// =============================================================================
// RE-EXPORTS: Store and Tracker
// =============================================================================

pub use storage::{Store, StoreCounts};
pub use tracker::{
    BadgeFilter, BadgeInput, BadgeUpdate, BulkDeleteReport, BulkReviewReport, CategoryInput,
    CategorySummary, CategoryUpdate, CategoryUpdateOutcome, InviteInput, IssuedInvitation,
    LoginOutcome, ProtectedUser, RegisterInput, SubmissionFilter, SubmissionInput, Tracker,
    TrackerConfig, UserDeletion, VisibilityUpdate,
};
