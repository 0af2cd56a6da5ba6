//! Input normalization shared by the tracker operations.

use crate::TrackerError;
use crate::primitives::{MAX_BULK_IDS, MAX_NAME_LENGTH, MAX_URL_LENGTH};

fn invalid(msg: String) -> TrackerError {
    TrackerError::Validation(msg)
}

/// Trim and lower-case an email, rejecting obviously malformed ones.
pub(crate) fn normalize_email(email: &str) -> Result<String, TrackerError> {
    let email = email.trim().to_ascii_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };
    if !valid || email.len() > MAX_NAME_LENGTH || email.chars().any(char::is_whitespace) {
        return Err(invalid(format!("'{}' is not a valid email address", email)));
    }
    Ok(email)
}

/// Trimmed, non-empty, at most `max` characters.
pub(crate) fn required_text(field: &str, value: &str, max: usize) -> Result<String, TrackerError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid(format!("{} is required", field)));
    }
    bounded(field, value, max)
}

/// Trimmed, possibly empty, at most `max` characters.
pub(crate) fn optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<String, TrackerError> {
    bounded(field, value.unwrap_or_default().trim(), max)
}

fn bounded(field: &str, value: &str, max: usize) -> Result<String, TrackerError> {
    if value.chars().count() > max {
        return Err(invalid(format!("{} exceeds {} characters", field, max)));
    }
    Ok(value.to_string())
}

/// An optional http(s) URL. Empty counts as absent.
pub(crate) fn optional_url(
    field: &str,
    value: Option<&str>,
) -> Result<Option<String>, TrackerError> {
    let Some(url) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(invalid(format!("{} must be an http(s) URL", field)));
    }
    Ok(Some(bounded(field, url, MAX_URL_LENGTH)?))
}

/// A `#RRGGBB` colour.
pub(crate) fn color(value: &str) -> Result<String, TrackerError> {
    let value = value.trim();
    let ok = value.len() == 7
        && value.starts_with('#')
        && value.chars().skip(1).all(|c| c.is_ascii_hexdigit());
    if !ok {
        return Err(invalid(format!("'{}' is not a #RRGGBB colour", value)));
    }
    Ok(value.to_string())
}

/// Check a bulk id list (1..=MAX_BULK_IDS) and drop duplicates, keeping the
/// first occurrence.
pub(crate) fn bulk_ids<T: Copy + PartialEq>(ids: &[T]) -> Result<Vec<T>, TrackerError> {
    if ids.is_empty() {
        return Err(invalid("At least one id is required".to_string()));
    }
    if ids.len() > MAX_BULK_IDS {
        return Err(invalid(format!(
            "At most {} ids per request",
            MAX_BULK_IDS
        )));
    }
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    Ok(unique)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized() {
        assert_eq!(
            normalize_email("  Student@X.com ").expect("valid"),
            "student@x.com"
        );
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@x.com").is_err());
        assert!(normalize_email("a@localhost").is_err());
        assert!(normalize_email("a b@x.com").is_err());
    }

    #[test]
    fn text_bounds() {
        assert_eq!(required_text("name", "  Art ", 10).expect("ok"), "Art");
        assert!(required_text("name", "   ", 10).is_err());
        assert!(required_text("name", "abcdef", 5).is_err());
        assert_eq!(optional_text("description", None, 5).expect("ok"), "");
    }

    #[test]
    fn urls_and_colours() {
        assert_eq!(optional_url("imageUrl", Some("")).expect("ok"), None);
        assert!(optional_url("imageUrl", Some("ftp://x")).is_err());
        assert!(optional_url("imageUrl", Some("https://x.test/a.png")).is_ok());
        assert_eq!(color("#1a2B3c").expect("ok"), "#1a2B3c");
        assert!(color("red").is_err());
        assert!(color("#12345").is_err());
    }

    #[test]
    fn bulk_ids_dedupe_and_bound() {
        assert_eq!(bulk_ids(&[3, 1, 3, 2]).expect("ok"), vec![3, 1, 2]);
        assert!(bulk_ids::<u64>(&[]).is_err());
        let too_many: Vec<u64> = (0..=MAX_BULK_IDS as u64).collect();
        assert!(bulk_ids(&too_many).is_err());
    }
}
