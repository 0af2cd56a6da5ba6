//! # Primitives
//!
//! Hardcoded constants for the badge tracker.
//!
//! These are compiled into the binary. The ones that deployments commonly
//! change (super-admin email, TTLs) are only defaults; `TrackerConfig`
//! carries the values actually in force.

/// Email of the distinguished super-admin account.
///
/// The super admin is not a role value: it is the `admin` account whose
/// email matches this address. It can never be demoted or deleted.
pub const DEFAULT_SUPER_ADMIN_EMAIL: &str = "admin@badgetrack.local";

/// How long an invitation stays redeemable (7 days).
pub const DEFAULT_INVITATION_TTL_HOURS: u32 = 7 * 24;

/// How long a login session stays valid (12 hours).
pub const DEFAULT_SESSION_TTL_HOURS: u32 = 12;

/// Upper bound for both TTL settings (one year).
pub const MAX_TTL_HOURS: u32 = 365 * 24;

/// Length of generated bearer and invitation tokens (alphanumeric chars).
pub const TOKEN_LENGTH: usize = 64;

/// Colour given to categories created without one (Tailwind gray-500).
pub const DEFAULT_CATEGORY_COLOR: &str = "#6B7280";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum number of badge or user ids in a single bulk request.
pub const MAX_BULK_IDS: usize = 100;

/// Maximum length of names (users, badges, categories).
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length of descriptions, criteria and review comments.
pub const MAX_TEXT_LENGTH: usize = 2_000;

/// Maximum length of submission evidence text.
pub const MAX_EVIDENCE_LENGTH: usize = 10_000;

/// Maximum length of URLs (badge images, evidence links).
pub const MAX_URL_LENGTH: usize = 2_048;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length. Bounds the argon2 input.
pub const MAX_PASSWORD_LENGTH: usize = 128;
