//! DTOs for the per-user URL listing.

use serde::{Deserialize, Serialize};

/// One entry owned by the caller.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserUrlResponse {
    pub short_url: String,
    pub original_url: String,
}
