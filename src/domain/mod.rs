//! Domain layer containing entities, the storage contract, and the delete
//! pipeline.
//!
//! # Architecture
//!
//! - [`entities`] - Core data structures
//! - [`repositories`] - Storage trait and its error type
//! - [`delete_worker`] - Asynchronous batched deletion
//! - [`flush_signal`] - Coalescing wake-up used by the delete worker
//! - [`retry_policy`] - Fixed-delay retry with cancellable wait
//! - [`shutdown`] - Shutdown signal shared by background tasks
//!
//! # Deletion Flow
//!
//! 1. HTTP handler builds [`entities::DeletionIntent`]s for the caller
//! 2. [`delete_worker::DeleteQueue::enqueue`] pushes them into a bounded queue
//! 3. [`delete_worker::DeleteWorker`] buffers them and flushes on size or time
//! 4. [`repositories::UrlStorage::delete_batch`] applies ownership-checked soft deletes

pub mod delete_worker;
pub mod entities;
pub mod flush_signal;
pub mod repositories;
pub mod retry_policy;
pub mod shutdown;
