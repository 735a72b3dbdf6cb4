//! In-memory index of entries and users shared by the memory and file backends.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::domain::entities::{DeletionIntent, StorageStats, UrlEntry};
use crate::domain::repositories::{StorageError, StorageResult};

/// Entries keyed by id plus the lookups the storage contract needs.
///
/// Not synchronised; owners wrap it in a lock.
#[derive(Debug, Default)]
pub struct UrlIndex {
    entries: BTreeMap<i64, UrlEntry>,
    ids_by_url: HashMap<String, i64>,
    ids_by_owner: HashMap<i64, BTreeSet<i64>>,
    last_url_id: i64,
    last_user_id: i64,
}

impl UrlIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next user id.
    pub fn create_user(&mut self) -> i64 {
        self.last_user_id += 1;
        self.last_user_id
    }

    /// Id the next inserted entry will receive.
    pub fn next_url_id(&self) -> i64 {
        self.last_url_id + 1
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.ids_by_url.contains_key(url)
    }

    /// Inserts a new entry under the next id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::AlreadyExists`] if the URL is already indexed.
    pub fn insert(&mut self, url: &str, owner_id: i64) -> StorageResult<i64> {
        if self.contains_url(url) {
            return Err(StorageError::AlreadyExists);
        }
        let id = self.next_url_id();
        self.commit(UrlEntry::new(id, owner_id, url));
        Ok(id)
    }

    /// Adds a live entry whose id came from [`UrlIndex::next_url_id`] and
    /// whose write already reached disk.
    ///
    /// Only the url counter moves; users are allocated by
    /// [`UrlIndex::create_user`] alone.
    pub fn commit(&mut self, entry: UrlEntry) {
        self.last_url_id = self.last_url_id.max(entry.id);

        self.ids_by_url
            .entry(entry.original_url.clone())
            .or_insert(entry.id);
        self.ids_by_owner
            .entry(entry.owner_id)
            .or_default()
            .insert(entry.id);
        self.entries.insert(entry.id, entry);
    }

    /// Adds an entry read back from the log.
    ///
    /// The log does not record users, so the user counter also advances past
    /// the owner to keep new users from taking an id already in the log.
    pub fn restore(&mut self, entry: UrlEntry) {
        self.last_user_id = self.last_user_id.max(entry.owner_id);
        self.commit(entry);
    }

    /// Returns the live URL behind `id`.
    pub fn get(&self, id: i64) -> StorageResult<&str> {
        let entry = self.entries.get(&id).ok_or(StorageError::NotFound)?;
        if entry.is_deleted {
            return Err(StorageError::Deleted);
        }
        Ok(&entry.original_url)
    }

    pub fn get_id(&self, url: &str) -> StorageResult<i64> {
        self.ids_by_url
            .get(url)
            .copied()
            .ok_or(StorageError::NotFound)
    }

    /// Every entry owned by `owner_id`, deleted ones included.
    pub fn user_urls(&self, owner_id: i64) -> BTreeMap<i64, String> {
        self.ids_by_owner
            .get(&owner_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.entries.get(id))
            .map(|entry| (entry.id, entry.original_url.clone()))
            .collect()
    }

    /// Check-and-set soft delete for a single intent.
    ///
    /// Unknown ids and foreign owners are no-ops. Returns `true` if the flag
    /// was flipped.
    pub fn apply_delete(&mut self, intent: DeletionIntent) -> bool {
        self.entries
            .get_mut(&intent.url_id)
            .is_some_and(|entry| entry.soft_delete(intent.user_id))
    }

    /// Ids that `intents` would flip, in first-seen order, without applying
    /// anything.
    pub fn pending_deletes(&self, intents: &[DeletionIntent]) -> Vec<i64> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for intent in intents {
            let flips = self
                .entries
                .get(&intent.url_id)
                .is_some_and(|entry| entry.accepts_delete_from(intent.user_id));
            if flips && seen.insert(intent.url_id) {
                ids.push(intent.url_id);
            }
        }
        ids
    }

    /// Sets the deleted flag on ids previously returned by
    /// [`UrlIndex::pending_deletes`].
    pub fn mark_deleted(&mut self, ids: &[i64]) {
        for id in ids {
            if let Some(entry) = self.entries.get_mut(id) {
                entry.is_deleted = true;
            }
        }
    }

    /// All entries in ascending id order.
    pub fn entries(&self) -> impl Iterator<Item = &UrlEntry> {
        self.entries.values()
    }

    pub fn stats(&self) -> StorageStats {
        StorageStats {
            urls: self.entries.len() as i64,
            users: self.last_user_id,
        }
    }
}
