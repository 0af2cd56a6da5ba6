//! # redb-backed Document Store
//!
//! Every collection is a redb table of `u64 id -> postcard bytes`, with a
//! secondary `&str -> id` table where lookups by a unique key are needed
//! (user email, category name, invitation email). Ids come from per-collection
//! counters in the metadata table and start at 1.
//!
//! The store enforces uniqueness of the indexed keys and nothing else.
//! Authorization, validation and the badge/category invariant live in
//! `Tracker`.
//!
//! Each public method is one transaction. Multi-document operations that
//! callers compose from several methods (cascade, user deletion) are
//! therefore not atomic as a whole.

use crate::cascade::BadgeCategoryIndex;
use crate::{
    Badge, BadgeId, Category, CategoryId, Invitation, InvitationId, SessionRecord, Submission,
    SubmissionId, TrackerError, User, UserId,
};
use redb::backends::InMemoryBackend;
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

type DocTable = TableDefinition<'static, u64, &'static [u8]>;
type IndexTable = TableDefinition<'static, &'static str, u64>;

/// Users: UserId -> User.
const USERS: DocTable = TableDefinition::new("users");
/// Unique user email -> UserId.
const USER_EMAILS: IndexTable = TableDefinition::new("user_emails");

/// Badges: BadgeId -> Badge.
const BADGES: DocTable = TableDefinition::new("badges");

/// Categories: CategoryId -> Category.
const CATEGORIES: DocTable = TableDefinition::new("categories");
/// Unique category name -> CategoryId.
const CATEGORY_NAMES: IndexTable = TableDefinition::new("category_names");

/// Submissions: SubmissionId -> Submission.
const SUBMISSIONS: DocTable = TableDefinition::new("submissions");

/// Invitations: InvitationId -> Invitation.
const INVITATIONS: DocTable = TableDefinition::new("invitations");
/// Invited email -> most recent InvitationId.
const INVITATION_EMAILS: IndexTable = TableDefinition::new("invitation_emails");

/// Sessions: token digest -> SessionRecord.
const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// Metadata: counter name -> next id.
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_USER_ID: &str = "next_user_id";
const NEXT_BADGE_ID: &str = "next_badge_id";
const NEXT_CATEGORY_ID: &str = "next_category_id";
const NEXT_SUBMISSION_ID: &str = "next_submission_id";
const NEXT_INVITATION_ID: &str = "next_invitation_id";

// =============================================================================
// HELPERS
// =============================================================================

fn storage_err<E: std::fmt::Display>(e: E) -> TrackerError {
    TrackerError::Storage(e.to_string())
}

fn encode<T: Serialize>(doc: &T) -> Result<Vec<u8>, TrackerError> {
    postcard::to_allocvec(doc).map_err(|e| TrackerError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, TrackerError> {
    postcard::from_bytes(bytes).map_err(|e| TrackerError::Serialization(e.to_string()))
}

/// Allocate the next id from `counter` inside an open write transaction.
fn allocate_id(txn: &WriteTransaction, counter: &str) -> Result<u64, TrackerError> {
    let mut meta = txn.open_table(METADATA).map_err(storage_err)?;
    let id = meta
        .get(counter)
        .map_err(storage_err)?
        .map(|v| v.value())
        .unwrap_or(1);
    meta.insert(counter, id.saturating_add(1))
        .map_err(storage_err)?;
    Ok(id)
}

fn write_doc<T: Serialize>(
    txn: &WriteTransaction,
    table: DocTable,
    id: u64,
    doc: &T,
) -> Result<(), TrackerError> {
    let bytes = encode(doc)?;
    let mut t = txn.open_table(table).map_err(storage_err)?;
    t.insert(id, bytes.as_slice()).map_err(storage_err)?;
    Ok(())
}

/// Document counts per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub users: u64,
    pub badges: u64,
    pub categories: u64,
    pub submissions: u64,
    pub invitations: u64,
    pub sessions: u64,
}

/// The document store.
pub struct Store {
    db: Database,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TrackerError> {
        let db = Database::create(path.as_ref()).map_err(storage_err)?;
        Self::init(db)
    }

    /// Create a volatile store (tests, `--in-memory` runs).
    pub fn in_memory() -> Result<Self, TrackerError> {
        let db = Database::builder()
            .create_with_backend(InMemoryBackend::new())
            .map_err(storage_err)?;
        Self::init(db)
    }

    fn init(db: Database) -> Result<Self, TrackerError> {
        let txn = db.begin_write().map_err(storage_err)?;
        {
            for table in [USERS, BADGES, CATEGORIES, SUBMISSIONS, INVITATIONS] {
                txn.open_table(table).map_err(storage_err)?;
            }
            for index in [USER_EMAILS, CATEGORY_NAMES, INVITATION_EMAILS] {
                txn.open_table(index).map_err(storage_err)?;
            }
            txn.open_table(SESSIONS).map_err(storage_err)?;
            txn.open_table(METADATA).map_err(storage_err)?;
        }
        txn.commit().map_err(storage_err)?;
        Ok(Self { db })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), TrackerError> {
        self.db.compact().map_err(storage_err)?;
        Ok(())
    }

    // =========================================================================
    // GENERIC DOCUMENT ACCESS
    // =========================================================================

    fn get_doc<T: DeserializeOwned>(
        &self,
        table: DocTable,
        id: u64,
    ) -> Result<Option<T>, TrackerError> {
        let txn = self.db.begin_read().map_err(storage_err)?;
        let t = txn.open_table(table).map_err(storage_err)?;
        let doc = match t.get(id).map_err(storage_err)? {
            Some(data) => Some(decode(data.value())?),
            None => None,
        };
        Ok(doc)
    }

    fn all_docs<T: DeserializeOwned>(&self, table: DocTable) -> Result<Vec<T>, TrackerError> {
        let txn = self.db.begin_read().map_err(storage_err)?;
        let t = txn.open_table(table).map_err(storage_err)?;
        let mut docs = Vec::new();
        for entry in t.iter().map_err(storage_err)? {
            let (_, value) = entry.map_err(storage_err)?;
            docs.push(decode(value.value())?);
        }
        Ok(docs)
    }

    /// Overwrite an existing document. Returns false if it does not exist.
    fn replace_doc<T: Serialize>(
        &self,
        table: DocTable,
        id: u64,
        doc: &T,
    ) -> Result<bool, TrackerError> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        let existed = {
            let bytes = encode(doc)?;
            let mut t = txn.open_table(table).map_err(storage_err)?;
            let exists = t.get(id).map_err(storage_err)?.is_some();
            if exists {
                t.insert(id, bytes.as_slice()).map_err(storage_err)?;
            }
            exists
        };
        txn.commit().map_err(storage_err)?;
        Ok(existed)
    }

    fn lookup_index(&self, index: IndexTable, key: &str) -> Result<Option<u64>, TrackerError> {
        let txn = self.db.begin_read().map_err(storage_err)?;
        let t = txn.open_table(index).map_err(storage_err)?;
        let id = t.get(key).map_err(storage_err)?.map(|v| v.value());
        Ok(id)
    }

    fn table_len(&self, table: DocTable) -> Result<u64, TrackerError> {
        let txn = self.db.begin_read().map_err(storage_err)?;
        let t = txn.open_table(table).map_err(storage_err)?;
        t.len().map_err(storage_err)
    }

    /// Document counts across all collections.
    pub fn counts(&self) -> Result<StoreCounts, TrackerError> {
        let sessions = {
            let txn = self.db.begin_read().map_err(storage_err)?;
            let t = txn.open_table(SESSIONS).map_err(storage_err)?;
            t.len().map_err(storage_err)?
        };
        Ok(StoreCounts {
            users: self.table_len(USERS)?,
            badges: self.table_len(BADGES)?,
            categories: self.table_len(CATEGORIES)?,
            submissions: self.table_len(SUBMISSIONS)?,
            invitations: self.table_len(INVITATIONS)?,
            sessions,
        })
    }

    // =========================================================================
    // USERS
    // =========================================================================

    /// Insert a user, assigning its id. The email must not be taken.
    pub fn insert_user(&self, mut user: User) -> Result<User, TrackerError> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut emails = txn.open_table(USER_EMAILS).map_err(storage_err)?;
            if emails.get(user.email.as_str()).map_err(storage_err)?.is_some() {
                return Err(TrackerError::Conflict(format!(
                    "A user with email {} already exists",
                    user.email
                )));
            }
            user.id = UserId(allocate_id(&txn, NEXT_USER_ID)?);
            emails
                .insert(user.email.as_str(), user.id.0)
                .map_err(storage_err)?;
        }
        write_doc(&txn, USERS, user.id.0, &user)?;
        txn.commit().map_err(storage_err)?;
        Ok(user)
    }

    pub fn get_user(&self, id: UserId) -> Result<Option<User>, TrackerError> {
        self.get_doc(USERS, id.0)
    }

    /// Find a user by (lower-cased) email.
    pub fn user_by_email(&self, email: &str) -> Result<Option<User>, TrackerError> {
        match self.lookup_index(USER_EMAILS, email)? {
            Some(id) => self.get_user(UserId(id)),
            None => Ok(None),
        }
    }

    pub fn list_users(&self) -> Result<Vec<User>, TrackerError> {
        self.all_docs(USERS)
    }

    /// Overwrite a user. The email is the index key and must not change.
    pub fn update_user(&self, user: &User) -> Result<bool, TrackerError> {
        self.replace_doc(USERS, user.id.0, user)
    }

    /// Remove a user and its email index entry.
    pub fn delete_user(&self, id: UserId) -> Result<Option<User>, TrackerError> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        let removed: Option<User> = {
            let mut users = txn.open_table(USERS).map_err(storage_err)?;
            let removed = match users.remove(id.0).map_err(storage_err)? {
                Some(data) => Some(decode(data.value())?),
                None => None,
            };
            removed
        };
        if let Some(user) = &removed {
            let mut emails = txn.open_table(USER_EMAILS).map_err(storage_err)?;
            emails.remove(user.email.as_str()).map_err(storage_err)?;
        }
        txn.commit().map_err(storage_err)?;
        Ok(removed)
    }

    // =========================================================================
    // BADGES
    // =========================================================================

    /// Insert a badge, assigning its id.
    pub fn insert_badge(&self, mut badge: Badge) -> Result<Badge, TrackerError> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        badge.id = BadgeId(allocate_id(&txn, NEXT_BADGE_ID)?);
        write_doc(&txn, BADGES, badge.id.0, &badge)?;
        txn.commit().map_err(storage_err)?;
        Ok(badge)
    }

    pub fn get_badge(&self, id: BadgeId) -> Result<Option<Badge>, TrackerError> {
        self.get_doc(BADGES, id.0)
    }

    pub fn list_badges(&self) -> Result<Vec<Badge>, TrackerError> {
        self.all_docs(BADGES)
    }

    pub fn update_badge(&self, badge: &Badge) -> Result<bool, TrackerError> {
        self.replace_doc(BADGES, badge.id.0, badge)
    }

    pub fn delete_badge(&self, id: BadgeId) -> Result<Option<Badge>, TrackerError> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        let removed = {
            let mut badges = txn.open_table(BADGES).map_err(storage_err)?;
            let removed = match badges.remove(id.0).map_err(storage_err)? {
                Some(data) => Some(decode(data.value())?),
                None => None,
            };
            removed
        };
        txn.commit().map_err(storage_err)?;
        Ok(removed)
    }

    /// Hand every badge created by `from` over to `to`. Returns the count.
    pub fn reassign_badges(&self, from: UserId, to: UserId) -> Result<usize, TrackerError> {
        self.rewrite_badges(|badge| {
            if badge.creator_id == from {
                badge.creator_id = to;
                true
            } else {
                false
            }
        })
    }

    /// Apply `edit` to every badge in one transaction, writing back the ones
    /// for which it returns true.
    fn rewrite_badges<F>(&self, mut edit: F) -> Result<usize, TrackerError>
    where
        F: FnMut(&mut Badge) -> bool,
    {
        let txn = self.db.begin_write().map_err(storage_err)?;
        let written = {
            let mut badges = txn.open_table(BADGES).map_err(storage_err)?;
            let mut changed = Vec::new();
            for entry in badges.iter().map_err(storage_err)? {
                let (_, value) = entry.map_err(storage_err)?;
                let mut badge: Badge = decode(value.value())?;
                if edit(&mut badge) {
                    changed.push(badge);
                }
            }
            for badge in &changed {
                let bytes = encode(badge)?;
                badges
                    .insert(badge.id.0, bytes.as_slice())
                    .map_err(storage_err)?;
            }
            changed.len()
        };
        txn.commit().map_err(storage_err)?;
        Ok(written)
    }

    // =========================================================================
    // CATEGORIES
    // =========================================================================

    /// Insert a category, assigning its id. The name must not be taken.
    pub fn insert_category(&self, mut category: Category) -> Result<Category, TrackerError> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut names = txn.open_table(CATEGORY_NAMES).map_err(storage_err)?;
            if names
                .get(category.name.as_str())
                .map_err(storage_err)?
                .is_some()
            {
                return Err(TrackerError::Conflict(format!(
                    "Category '{}' already exists",
                    category.name
                )));
            }
            category.id = CategoryId(allocate_id(&txn, NEXT_CATEGORY_ID)?);
            names
                .insert(category.name.as_str(), category.id.0)
                .map_err(storage_err)?;
        }
        write_doc(&txn, CATEGORIES, category.id.0, &category)?;
        txn.commit().map_err(storage_err)?;
        Ok(category)
    }

    pub fn get_category(&self, id: CategoryId) -> Result<Option<Category>, TrackerError> {
        self.get_doc(CATEGORIES, id.0)
    }

    pub fn category_by_name(&self, name: &str) -> Result<Option<Category>, TrackerError> {
        match self.lookup_index(CATEGORY_NAMES, name)? {
            Some(id) => self.get_category(CategoryId(id)),
            None => Ok(None),
        }
    }

    pub fn list_categories(&self) -> Result<Vec<Category>, TrackerError> {
        self.all_docs(CATEGORIES)
    }

    /// Overwrite a category, moving its name index entry if the name changed.
    ///
    /// Fails with `Conflict` if the new name belongs to another category and
    /// `NotFound` if the category does not exist.
    pub fn update_category(&self, category: &Category) -> Result<(), TrackerError> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        {
            let previous: Category = {
                let t = txn.open_table(CATEGORIES).map_err(storage_err)?;
                let previous = match t.get(category.id.0).map_err(storage_err)? {
                    Some(data) => decode(data.value())?,
                    None => {
                        return Err(TrackerError::NotFound(format!(
                            "Category {}",
                            category.id.0
                        )));
                    }
                };
                previous
            };

            if previous.name != category.name {
                let mut names = txn.open_table(CATEGORY_NAMES).map_err(storage_err)?;
                if names
                    .get(category.name.as_str())
                    .map_err(storage_err)?
                    .is_some()
                {
                    return Err(TrackerError::Conflict(format!(
                        "Category '{}' already exists",
                        category.name
                    )));
                }
                names
                    .remove(previous.name.as_str())
                    .map_err(storage_err)?;
                names
                    .insert(category.name.as_str(), category.id.0)
                    .map_err(storage_err)?;
            }
        }
        write_doc(&txn, CATEGORIES, category.id.0, category)?;
        txn.commit().map_err(storage_err)?;
        Ok(())
    }

    pub fn delete_category(&self, id: CategoryId) -> Result<Option<Category>, TrackerError> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        let removed: Option<Category> = {
            let mut t = txn.open_table(CATEGORIES).map_err(storage_err)?;
            let removed = match t.remove(id.0).map_err(storage_err)? {
                Some(data) => Some(decode(data.value())?),
                None => None,
            };
            removed
        };
        if let Some(category) = &removed {
            let mut names = txn.open_table(CATEGORY_NAMES).map_err(storage_err)?;
            names
                .remove(category.name.as_str())
                .map_err(storage_err)?;
        }
        txn.commit().map_err(storage_err)?;
        Ok(removed)
    }

    // =========================================================================
    // SUBMISSIONS
    // =========================================================================

    pub fn insert_submission(
        &self,
        mut submission: Submission,
    ) -> Result<Submission, TrackerError> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        submission.id = SubmissionId(allocate_id(&txn, NEXT_SUBMISSION_ID)?);
        write_doc(&txn, SUBMISSIONS, submission.id.0, &submission)?;
        txn.commit().map_err(storage_err)?;
        Ok(submission)
    }

    pub fn get_submission(&self, id: SubmissionId) -> Result<Option<Submission>, TrackerError> {
        self.get_doc(SUBMISSIONS, id.0)
    }

    pub fn list_submissions(&self) -> Result<Vec<Submission>, TrackerError> {
        self.all_docs(SUBMISSIONS)
    }

    pub fn update_submission(&self, submission: &Submission) -> Result<bool, TrackerError> {
        self.replace_doc(SUBMISSIONS, submission.id.0, submission)
    }

    /// Delete every submission matching `pred`. Returns the count.
    pub fn delete_submissions_where<F>(&self, pred: F) -> Result<usize, TrackerError>
    where
        F: Fn(&Submission) -> bool,
    {
        let txn = self.db.begin_write().map_err(storage_err)?;
        let removed = {
            let mut t = txn.open_table(SUBMISSIONS).map_err(storage_err)?;
            let mut doomed = Vec::new();
            for entry in t.iter().map_err(storage_err)? {
                let (key, value) = entry.map_err(storage_err)?;
                let submission: Submission = decode(value.value())?;
                if pred(&submission) {
                    doomed.push(key.value());
                }
            }
            for id in &doomed {
                t.remove(*id).map_err(storage_err)?;
            }
            doomed.len()
        };
        txn.commit().map_err(storage_err)?;
        Ok(removed)
    }

    // =========================================================================
    // INVITATIONS
    // =========================================================================

    /// Insert an invitation and point the email index at it.
    pub fn insert_invitation(
        &self,
        mut invitation: Invitation,
    ) -> Result<Invitation, TrackerError> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        invitation.id = InvitationId(allocate_id(&txn, NEXT_INVITATION_ID)?);
        {
            let mut emails = txn.open_table(INVITATION_EMAILS).map_err(storage_err)?;
            emails
                .insert(invitation.email.as_str(), invitation.id.0)
                .map_err(storage_err)?;
        }
        write_doc(&txn, INVITATIONS, invitation.id.0, &invitation)?;
        txn.commit().map_err(storage_err)?;
        Ok(invitation)
    }

    pub fn get_invitation(&self, id: InvitationId) -> Result<Option<Invitation>, TrackerError> {
        self.get_doc(INVITATIONS, id.0)
    }

    /// Most recent invitation sent to `email`.
    pub fn invitation_by_email(&self, email: &str) -> Result<Option<Invitation>, TrackerError> {
        match self.lookup_index(INVITATION_EMAILS, email)? {
            Some(id) => self.get_invitation(InvitationId(id)),
            None => Ok(None),
        }
    }

    pub fn list_invitations(&self) -> Result<Vec<Invitation>, TrackerError> {
        self.all_docs(INVITATIONS)
    }

    pub fn update_invitation(&self, invitation: &Invitation) -> Result<bool, TrackerError> {
        self.replace_doc(INVITATIONS, invitation.id.0, invitation)
    }

    /// Remove an invitation document. The email index is left to the
    /// replacement invitation that triggers this.
    pub fn delete_invitation(&self, id: InvitationId) -> Result<bool, TrackerError> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        let existed = {
            let mut t = txn.open_table(INVITATIONS).map_err(storage_err)?;
            let existed = t.remove(id.0).map_err(storage_err)?.is_some();
            existed
        };
        txn.commit().map_err(storage_err)?;
        Ok(existed)
    }

    // =========================================================================
    // SESSIONS
    // =========================================================================

    pub fn insert_session(
        &self,
        digest: &str,
        session: &SessionRecord,
    ) -> Result<(), TrackerError> {
        let bytes = encode(session)?;
        let txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut t = txn.open_table(SESSIONS).map_err(storage_err)?;
            t.insert(digest, bytes.as_slice()).map_err(storage_err)?;
        }
        txn.commit().map_err(storage_err)?;
        Ok(())
    }

    pub fn get_session(&self, digest: &str) -> Result<Option<SessionRecord>, TrackerError> {
        let txn = self.db.begin_read().map_err(storage_err)?;
        let t = txn.open_table(SESSIONS).map_err(storage_err)?;
        let session = match t.get(digest).map_err(storage_err)? {
            Some(data) => Some(decode(data.value())?),
            None => None,
        };
        Ok(session)
    }

    pub fn remove_session(&self, digest: &str) -> Result<bool, TrackerError> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        let existed = {
            let mut t = txn.open_table(SESSIONS).map_err(storage_err)?;
            let existed = t.remove(digest).map_err(storage_err)?.is_some();
            existed
        };
        txn.commit().map_err(storage_err)?;
        Ok(existed)
    }

    /// Revoke every session of `user`. Returns the count.
    pub fn remove_sessions_for_user(&self, user: UserId) -> Result<usize, TrackerError> {
        let txn = self.db.begin_write().map_err(storage_err)?;
        let removed = {
            let mut t = txn.open_table(SESSIONS).map_err(storage_err)?;
            let mut doomed = Vec::new();
            for entry in t.iter().map_err(storage_err)? {
                let (key, value) = entry.map_err(storage_err)?;
                let session: SessionRecord = decode(value.value())?;
                if session.user_id == user {
                    doomed.push(key.value().to_string());
                }
            }
            for digest in &doomed {
                t.remove(digest.as_str()).map_err(storage_err)?;
            }
            doomed.len()
        };
        txn.commit().map_err(storage_err)?;
        Ok(removed)
    }
}

// =============================================================================
// RENAME CASCADE SUPPORT
// =============================================================================

impl BadgeCategoryIndex for Store {
    fn count_in_category(&self, name: &str) -> Result<usize, TrackerError> {
        Ok(self
            .list_badges()?
            .iter()
            .filter(|b| b.category == name)
            .count())
    }

    fn rename_category_bulk(&mut self, old: &str, new: &str) -> Result<usize, TrackerError> {
        let now = chrono::Utc::now();
        self.rewrite_badges(|badge| {
            if badge.category == old {
                badge.category = new.to_string();
                badge.updated_at = now;
                true
            } else {
                false
            }
        })
    }

    fn badge_ids_in_category(&self, name: &str) -> Result<Vec<BadgeId>, TrackerError> {
        Ok(self
            .list_badges()?
            .into_iter()
            .filter(|b| b.category == name)
            .map(|b| b.id)
            .collect())
    }

    fn set_badge_category(&mut self, id: BadgeId, name: &str) -> Result<bool, TrackerError> {
        match self.get_badge(id)? {
            Some(mut badge) => {
                badge.category = name.to_string();
                badge.updated_at = chrono::Utc::now();
                self.update_badge(&badge)
            }
            None => Ok(false),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InvitationStatus, ReviewStatus, Role};
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    fn user(email: &str, role: Role) -> User {
        User {
            id: UserId(0),
            name: "Test".to_string(),
            email: email.to_string(),
            role,
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    fn badge(category: &str, creator: UserId) -> Badge {
        let now = Utc::now();
        Badge {
            id: BadgeId(0),
            name: "Badge".to_string(),
            description: String::new(),
            criteria: String::new(),
            image_url: None,
            category: category.to_string(),
            creator_id: creator,
            approval_status: ReviewStatus::Pending,
            approved_by: None,
            approval_date: None,
            approval_comment: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn category(name: &str) -> Category {
        Category {
            id: CategoryId(0),
            name: name.to_string(),
            color: "#000000".to_string(),
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn ids_start_at_one_and_increase() {
        let store = Store::in_memory().expect("store");
        let a = store.insert_user(user("a@x.com", Role::Student)).expect("insert");
        let b = store.insert_user(user("b@x.com", Role::Student)).expect("insert");
        assert_eq!(a.id, UserId(1));
        assert_eq!(b.id, UserId(2));
    }

    #[test]
    fn duplicate_email_is_conflict() {
        let store = Store::in_memory().expect("store");
        store.insert_user(user("a@x.com", Role::Student)).expect("insert");
        let err = store
            .insert_user(user("a@x.com", Role::Teacher))
            .expect_err("duplicate");
        assert!(matches!(err, TrackerError::Conflict(_)));
        assert_eq!(store.list_users().expect("list").len(), 1);
    }

    #[test]
    fn user_lookup_by_email_and_delete() {
        let store = Store::in_memory().expect("store");
        let a = store.insert_user(user("a@x.com", Role::Student)).expect("insert");
        assert_eq!(
            store.user_by_email("a@x.com").expect("lookup").map(|u| u.id),
            Some(a.id)
        );

        let removed = store.delete_user(a.id).expect("delete");
        assert_eq!(removed.map(|u| u.id), Some(a.id));
        assert!(store.user_by_email("a@x.com").expect("lookup").is_none());
        // Email is free again.
        store.insert_user(user("a@x.com", Role::Student)).expect("reinsert");
    }

    #[test]
    fn update_missing_document_returns_false() {
        let store = Store::in_memory().expect("store");
        let mut ghost = user("g@x.com", Role::Student);
        ghost.id = UserId(42);
        assert!(!store.update_user(&ghost).expect("update"));
    }

    #[test]
    fn category_rename_moves_index() {
        let store = Store::in_memory().expect("store");
        let mut art = store.insert_category(category("Art")).expect("insert");
        store.insert_category(category("Math")).expect("insert");

        art.name = "Design".to_string();
        store.update_category(&art).expect("rename");
        assert!(store.category_by_name("Art").expect("lookup").is_none());
        assert_eq!(
            store.category_by_name("Design").expect("lookup").map(|c| c.id),
            Some(art.id)
        );

        art.name = "Math".to_string();
        assert!(matches!(
            store.update_category(&art),
            Err(TrackerError::Conflict(_))
        ));
    }

    #[test]
    fn reassign_badges_by_creator() {
        let store = Store::in_memory().expect("store");
        store.insert_badge(badge("Art", UserId(5))).expect("insert");
        store.insert_badge(badge("Art", UserId(5))).expect("insert");
        store.insert_badge(badge("Art", UserId(6))).expect("insert");

        let moved = store.reassign_badges(UserId(5), UserId(1)).expect("reassign");
        assert_eq!(moved, 2);
        let owners: Vec<UserId> = store
            .list_badges()
            .expect("list")
            .iter()
            .map(|b| b.creator_id)
            .collect();
        assert_eq!(owners, vec![UserId(1), UserId(1), UserId(6)]);
    }

    #[test]
    fn cascade_on_store() {
        let mut store = Store::in_memory().expect("store");
        store.insert_badge(badge("Art", UserId(1))).expect("insert");
        store.insert_badge(badge("Art", UserId(1))).expect("insert");
        store.insert_badge(badge("Math", UserId(1))).expect("insert");

        let report =
            crate::cascade::propagate_rename(&mut store, "Art", "Design").expect("cascade");
        assert_eq!(report.matched, 2);
        assert_eq!(report.updated, 2);
        assert_eq!(report.remaining, 0);
        assert_eq!(store.count_in_category("Design").expect("count"), 2);
    }

    #[test]
    fn delete_submissions_by_predicate() {
        let store = Store::in_memory().expect("store");
        let now = Utc::now();
        for student in [1, 2, 1] {
            store
                .insert_submission(Submission {
                    id: SubmissionId(0),
                    badge_id: BadgeId(1),
                    student_id: UserId(student),
                    evidence: "done".to_string(),
                    evidence_url: None,
                    status: ReviewStatus::Pending,
                    is_public: false,
                    show_on_profile: false,
                    reviewer_id: None,
                    review_comment: None,
                    reviewed_at: None,
                    created_at: now,
                })
                .expect("insert");
        }
        let removed = store
            .delete_submissions_where(|s| s.student_id == UserId(1))
            .expect("delete");
        assert_eq!(removed, 2);
        assert_eq!(store.list_submissions().expect("list").len(), 1);
    }

    #[test]
    fn invitation_email_index_points_at_latest() {
        let store = Store::in_memory().expect("store");
        let now = Utc::now();
        let invite = |role| Invitation {
            id: InvitationId(0),
            email: "new@x.com".to_string(),
            role,
            token_digest: String::new(),
            invited_by: UserId(1),
            password_hash: None,
            status: InvitationStatus::Pending,
            expires_at: now + Duration::days(1),
            created_at: now,
        };
        store.insert_invitation(invite(Role::Student)).expect("insert");
        let second = store.insert_invitation(invite(Role::Teacher)).expect("insert");

        let found = store.invitation_by_email("new@x.com").expect("lookup");
        assert_eq!(found.map(|i| i.id), Some(second.id));
    }

    #[test]
    fn sessions_revoked_per_user() {
        let store = Store::in_memory().expect("store");
        let now = Utc::now();
        for (digest, uid) in [("d1", 1), ("d2", 1), ("d3", 2)] {
            store
                .insert_session(
                    digest,
                    &SessionRecord {
                        user_id: UserId(uid),
                        created_at: now,
                        expires_at: now + Duration::hours(1),
                    },
                )
                .expect("insert");
        }
        assert_eq!(store.remove_sessions_for_user(UserId(1)).expect("revoke"), 2);
        assert!(store.get_session("d1").expect("get").is_none());
        assert!(store.get_session("d3").expect("get").is_some());
        assert!(store.remove_session("d3").expect("remove"));
        assert!(!store.remove_session("d3").expect("remove"));
    }

    #[test]
    fn recovery_persistence_after_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("badgetrack.redb");

        {
            let store = Store::open(&db_path).expect("open");
            store.insert_user(user("a@x.com", Role::Admin)).expect("insert");
            store.insert_category(category("Art")).expect("insert");
            store.insert_badge(badge("Art", UserId(1))).expect("insert");
        }

        {
            let store = Store::open(&db_path).expect("reopen");
            let counts = store.counts().expect("counts");
            assert_eq!(counts.users, 1);
            assert_eq!(counts.categories, 1);
            assert_eq!(counts.badges, 1);
            assert!(store.category_by_name("Art").expect("lookup").is_some());

            // Counters survive the reopen.
            let next = store.insert_user(user("b@x.com", Role::Student)).expect("insert");
            assert_eq!(next.id, UserId(2));
        }
    }
}
