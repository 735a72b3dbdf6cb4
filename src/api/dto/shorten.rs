//! DTOs for link shortening endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::BatchUrl;

/// `POST /api/shorten` body.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    #[validate(url(message = "Invalid URL format"))]
    pub url: String,
}

/// `POST /api/shorten` response, both for new and already known URLs.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub result: String,
}

/// One item of a `POST /api/shorten/batch` body.
#[derive(Debug, Deserialize, Validate)]
pub struct BatchShortenItem {
    #[validate(length(min = 1, max = 256))]
    pub correlation_id: String,

    #[validate(url(message = "Invalid URL format"))]
    pub original_url: String,
}

impl From<BatchShortenItem> for BatchUrl {
    fn from(item: BatchShortenItem) -> Self {
        BatchUrl {
            correlation_id: item.correlation_id,
            original_url: item.original_url,
        }
    }
}

/// One newly shortened URL of a batch.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchShortenResult {
    pub correlation_id: String,
    pub short_url: String,
}
