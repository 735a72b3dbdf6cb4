//! HTTP middleware and request extractors.
//!
//! Provides cookie-based user identity and request tracing.

pub mod identity;
pub mod tracing;
