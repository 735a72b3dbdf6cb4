//! Infrastructure layer for external integrations.
//!
//! Implements the storage interface defined by the domain layer.
//!
//! # Modules
//!
//! - [`persistence`] - Memory, file and PostgreSQL storage backends

pub mod persistence;
