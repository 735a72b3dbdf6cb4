//! Data Transfer Objects for request/response serialization.

pub mod health;
pub mod shorten;
pub mod stats;
pub mod user_urls;
