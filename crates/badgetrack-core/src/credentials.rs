//! # Credentials
//!
//! Password hashing (argon2id) and opaque token handling.
//!
//! Tokens are random alphanumeric strings. The store only ever sees their
//! BLAKE3 digest, so a leaked database does not yield usable sessions or
//! invitations.

use crate::TrackerError;
use crate::primitives::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH, TOKEN_LENGTH};
use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use rand::SeedableRng;
use rand::distributions::{Alphanumeric, Distribution};
use rand::rngs::StdRng;
use subtle::ConstantTimeEq;

// =============================================================================
// PASSWORDS
// =============================================================================

/// Check a candidate password against the length and character rules.
///
/// Passwords need `MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH` characters
/// with at least one letter and one digit.
pub fn validate_password(password: &str) -> Result<(), TrackerError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(TrackerError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(TrackerError::Validation(format!(
            "Password must be at most {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(TrackerError::Validation(
            "Password must contain at least one letter and one digit".to_string(),
        ));
    }
    Ok(())
}

/// Validate and hash a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, TrackerError> {
    validate_password(password)?;
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| TrackerError::Password(e.to_string()))
}

/// Check a password against a stored PHC string.
///
/// A malformed stored hash verifies as false rather than erroring; the
/// caller only ever needs "credentials accepted or not".
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Well-formed argon2id hash that no login password is expected to match.
const UNKNOWN_ACCOUNT_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$ARQ7+JcKmvG/WTsy+pJkvg$0sfirqHjNrYY5MCFV6UH+VPaIKOI7swC0ww6rxQ237w";

/// Spend one full verification on a login attempt for an unknown email, so
/// the miss takes as long as a wrong password.
pub fn verify_unknown_account(password: &str) {
    std::hint::black_box(verify_password(password, UNKNOWN_ACCOUNT_HASH));
}

// =============================================================================
// TOKENS
// =============================================================================

/// Generate a fresh random token of `TOKEN_LENGTH` alphanumeric characters.
#[must_use]
pub fn generate_token() -> String {
    let mut rng = StdRng::from_entropy();
    (0..TOKEN_LENGTH)
        .map(|_| Alphanumeric.sample(&mut rng) as char)
        .collect()
}

/// Hex BLAKE3 digest of a token, as stored.
#[must_use]
pub fn token_digest(token: &str) -> String {
    blake3::hash(token.as_bytes()).to_hex().to_string()
}

/// Compare a presented token with a stored digest in constant time.
#[must_use]
pub fn token_matches(presented: &str, stored_digest: &str) -> bool {
    let presented = token_digest(presented);
    let a = presented.as_bytes();
    let b = stored_digest.as_bytes();
    // Digests are fixed-length hex; a length mismatch means a corrupt record.
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_rules() {
        assert!(validate_password("Abcd1234!").is_ok());
        assert!(validate_password("short1").is_err());
        assert!(validate_password("onlyletters").is_err());
        assert!(validate_password("1234567890").is_err());
        assert!(validate_password(&"a1".repeat(MAX_PASSWORD_LENGTH)).is_err());
    }

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("Abcd1234!").expect("hash");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Abcd1234!", &hash));
        assert!(!verify_password("Abcd1234?", &hash));
    }

    #[test]
    fn unknown_account_hash_runs_full_verification() {
        // A parse failure would skip the argon2 work entirely.
        let parsed = PasswordHash::new(UNKNOWN_ACCOUNT_HASH).expect("phc");
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert!(!verify_password("Abcd1234!", UNKNOWN_ACCOUNT_HASH));
        verify_unknown_account("Abcd1234!");
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("Abcd1234!").expect("hash");
        let b = hash_password("Abcd1234!").expect("hash");
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("Abcd1234!", "not-a-phc-string"));
        assert!(!verify_password("Abcd1234!", ""));
    }

    #[test]
    fn tokens_are_random_alphanumeric() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), TOKEN_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn token_digest_matching() {
        let token = generate_token();
        let digest = token_digest(&token);
        assert_eq!(digest.len(), 64);
        assert!(token_matches(&token, &digest));
        assert!(!token_matches("something-else", &digest));
        assert!(!token_matches(&token, "abc"));
    }
}
