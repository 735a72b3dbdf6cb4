//! Shortened URL entry and the values that flow around it.

/// A stored mapping from a generated numeric id to an original URL.
///
/// Entries are never physically removed. Deletion flips `is_deleted`, and the
/// flag never reverts once set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlEntry {
    pub id: i64,
    pub owner_id: i64,
    pub original_url: String,
    pub is_deleted: bool,
}

impl UrlEntry {
    /// Creates a live (not deleted) entry.
    pub fn new(id: i64, owner_id: i64, original_url: impl Into<String>) -> Self {
        Self {
            id,
            owner_id,
            original_url: original_url.into(),
            is_deleted: false,
        }
    }

    /// Returns true if a delete request from `requester` would flip the flag.
    ///
    /// Requests from anyone but the owner, and requests against an entry that
    /// is already deleted, change nothing.
    pub fn accepts_delete_from(&self, requester: i64) -> bool {
        !self.is_deleted && self.owner_id == requester
    }

    /// Applies an ownership-checked soft delete.
    ///
    /// Returns `true` if the flag was flipped by this call.
    pub fn soft_delete(&mut self, requester: i64) -> bool {
        if self.accepts_delete_from(requester) {
            self.is_deleted = true;
            true
        } else {
            false
        }
    }
}

/// A request to delete an entry, not yet applied.
///
/// Takes effect only when `user_id` owns `url_id`; anything else is a silent
/// no-op when the batch is flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeletionIntent {
    pub url_id: i64,
    pub user_id: i64,
}

impl DeletionIntent {
    pub fn new(url_id: i64, user_id: i64) -> Self {
        Self { url_id, user_id }
    }
}

/// One URL of a batch insert, tagged by the caller's correlation id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchUrl {
    pub correlation_id: String,
    pub original_url: String,
}

/// The id assigned to one newly inserted URL of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchUrlId {
    pub correlation_id: String,
    pub url_id: i64,
}

/// Entry and user counters of a storage backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub urls: i64,
    pub users: i64,
}
