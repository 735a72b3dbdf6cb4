//! Core domain entities.
//!
//! - [`UrlEntry`] - A shortened URL with its owner and soft-delete flag
//! - [`DeletionIntent`] - A pending, ownership-checked delete request
//! - [`BatchUrl`] / [`BatchUrlId`] - Input and output of batch inserts
//! - [`StorageStats`] - Entry and user counters

pub mod url_entry;

pub use url_entry::{BatchUrl, BatchUrlId, DeletionIntent, StorageStats, UrlEntry};
