//! # Category Rename Propagation
//!
//! Badges carry their category by name. When a category is renamed with the
//! "also update badges" flag, every badge still carrying the old name is
//! rewritten:
//!
//! 1. count badges on the old name
//! 2. bulk update
//! 3. recount
//! 4. if anything is left, update the leftovers one document at a time
//! 5. final count
//!
//! This is best effort. The category rename has already been committed when
//! the cascade starts and is never rolled back; a non-zero `remaining` in the
//! report is the observable inconsistency.

use crate::{BadgeId, TrackerError};
use serde::{Deserialize, Serialize};

/// The badge-side operations the cascade needs.
///
/// Implemented by the redb store; tests substitute stores that drop writes.
pub trait BadgeCategoryIndex {
    /// Number of badges whose category is `name`.
    fn count_in_category(&self, name: &str) -> Result<usize, TrackerError>;

    /// Rewrite every badge on `old` to `new` in one write. Returns how many
    /// documents were written.
    fn rename_category_bulk(&mut self, old: &str, new: &str) -> Result<usize, TrackerError>;

    /// Ids of badges whose category is `name`.
    fn badge_ids_in_category(&self, name: &str) -> Result<Vec<BadgeId>, TrackerError>;

    /// Rewrite one badge's category. Returns false if the badge is gone.
    fn set_badge_category(&mut self, id: BadgeId, name: &str) -> Result<bool, TrackerError>;
}

/// Outcome of a rename cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeReport {
    /// Badges on the old name before the cascade started.
    pub matched: usize,
    /// Documents written (bulk plus fallback).
    pub updated: usize,
    /// Badges still on the old name afterwards.
    pub remaining: usize,
    /// Whether the per-document fallback ran.
    pub fallback_used: bool,
    /// Error reported by the bulk write, if it failed outright.
    pub bulk_error: Option<String>,
    /// Badges the fallback could not rewrite.
    pub failed: Vec<BadgeId>,
}

impl CascadeReport {
    /// True when no badge is left on the old name.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}

/// Move every badge from category `old` to `new`.
///
/// Only the initial and final counts are fatal; write failures are recorded
/// in the report.
pub fn propagate_rename<S>(
    store: &mut S,
    old: &str,
    new: &str,
) -> Result<CascadeReport, TrackerError>
where
    S: BadgeCategoryIndex + ?Sized,
{
    let mut report = CascadeReport {
        matched: store.count_in_category(old)?,
        ..CascadeReport::default()
    };
    if report.matched == 0 || old == new {
        return Ok(report);
    }

    match store.rename_category_bulk(old, new) {
        Ok(written) => report.updated = written,
        Err(e) => report.bulk_error = Some(e.to_string()),
    }

    let leftover = store.count_in_category(old).unwrap_or(report.matched);
    if leftover > 0 {
        report.fallback_used = true;
        for id in store.badge_ids_in_category(old)? {
            match store.set_badge_category(id, new) {
                Ok(true) => report.updated += 1,
                Ok(false) => {}
                Err(_) => report.failed.push(id),
            }
        }
    }

    report.remaining = store.count_in_category(old)?;
    Ok(report)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// In-memory badge index with injectable faults.
    #[derive(Default)]
    struct FlakyIndex {
        badges: BTreeMap<BadgeId, String>,
        /// Bulk write silently skips this many matching documents.
        bulk_skips: usize,
        bulk_fails: bool,
        /// Single-document writes to these ids fail.
        broken: Vec<BadgeId>,
    }

    impl FlakyIndex {
        fn with(categories: &[&str]) -> Self {
            let badges = categories
                .iter()
                .enumerate()
                .map(|(i, c)| (BadgeId(i as u64 + 1), (*c).to_string()))
                .collect();
            Self {
                badges,
                ..Self::default()
            }
        }
    }

    impl BadgeCategoryIndex for FlakyIndex {
        fn count_in_category(&self, name: &str) -> Result<usize, TrackerError> {
            Ok(self.badges.values().filter(|c| c.as_str() == name).count())
        }

        fn rename_category_bulk(&mut self, old: &str, new: &str) -> Result<usize, TrackerError> {
            if self.bulk_fails {
                return Err(TrackerError::Storage("write conflict".to_string()));
            }
            let mut skipped = 0;
            let mut written = 0;
            for category in self.badges.values_mut().filter(|c| c.as_str() == old) {
                if skipped < self.bulk_skips {
                    skipped += 1;
                    continue;
                }
                *category = new.to_string();
                written += 1;
            }
            Ok(written)
        }

        fn badge_ids_in_category(&self, name: &str) -> Result<Vec<BadgeId>, TrackerError> {
            Ok(self
                .badges
                .iter()
                .filter(|(_, c)| c.as_str() == name)
                .map(|(id, _)| *id)
                .collect())
        }

        fn set_badge_category(&mut self, id: BadgeId, name: &str) -> Result<bool, TrackerError> {
            if self.broken.contains(&id) {
                return Err(TrackerError::Storage("disk full".to_string()));
            }
            match self.badges.get_mut(&id) {
                Some(c) => {
                    *c = name.to_string();
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    #[test]
    fn clean_bulk_needs_no_fallback() {
        let mut index = FlakyIndex::with(&["Art", "Art", "Math"]);
        let report = propagate_rename(&mut index, "Art", "Visual Arts").expect("cascade");

        assert_eq!(report.matched, 2);
        assert_eq!(report.updated, 2);
        assert_eq!(report.remaining, 0);
        assert!(!report.fallback_used);
        assert!(report.is_complete());
        assert_eq!(index.count_in_category("Math").expect("count"), 1);
    }

    #[test]
    fn partial_bulk_falls_back_per_document() {
        let mut index = FlakyIndex::with(&["Art", "Art", "Art"]);
        index.bulk_skips = 2;
        let report = propagate_rename(&mut index, "Art", "Design").expect("cascade");

        assert_eq!(report.matched, 3);
        assert!(report.fallback_used);
        assert_eq!(report.updated, 3);
        assert_eq!(report.remaining, 0);
    }

    #[test]
    fn failed_bulk_is_recorded_and_recovered() {
        let mut index = FlakyIndex::with(&["Art", "Art"]);
        index.bulk_fails = true;
        let report = propagate_rename(&mut index, "Art", "Design").expect("cascade");

        assert!(report.bulk_error.is_some());
        assert!(report.fallback_used);
        assert_eq!(report.remaining, 0);
    }

    #[test]
    fn unrecoverable_documents_surface_as_remaining() {
        let mut index = FlakyIndex::with(&["Art", "Art"]);
        index.bulk_fails = true;
        index.broken = vec![BadgeId(2)];
        let report = propagate_rename(&mut index, "Art", "Design").expect("cascade");

        assert_eq!(report.remaining, 1);
        assert_eq!(report.failed, vec![BadgeId(2)]);
        assert!(!report.is_complete());
    }

    #[test]
    fn nothing_to_cascade() {
        let mut index = FlakyIndex::with(&["Math"]);
        let report = propagate_rename(&mut index, "Art", "Design").expect("cascade");
        assert_eq!(report, CascadeReport::default());
    }
}
