//! Asynchronous batched deletion of shortened URLs.
//!
//! Request handlers push [`DeletionIntent`]s into a bounded queue through a
//! [`DeleteQueue`] handle and return immediately. A single [`DeleteWorker`]
//! moves them into a buffer and hands the whole buffer to
//! [`UrlStorage::delete_batch`] when either:
//!
//! - the buffer reaches `chunk_size` intents, or
//! - `flush_interval` elapses with a non-empty buffer.
//!
//! Flushes run on a separate flusher task woken through a coalescing
//! [`flush_signal`]. The flusher holds the buffer lock for the whole storage
//! call, so appends wait while a flush is in flight. Failed flushes are
//! retried at a fixed interval until they succeed; nothing is dropped.
//!
//! On shutdown the worker stops the flusher, drains whatever is still queued,
//! makes one final flush attempt bounded by `shutdown_timeout`, and exits.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::domain::entities::DeletionIntent;
use crate::domain::flush_signal::{FlushWaiter, flush_signal};
use crate::domain::repositories::{StorageResult, UrlStorage};
use crate::domain::retry_policy::RetryPolicy;
use crate::domain::shutdown::{ShutdownSignal, shutdown_channel, stopped};

/// Tuning knobs for the delete pipeline.
#[derive(Debug, Clone)]
pub struct DeleteWorkerSettings {
    /// Capacity of the queue between producers and the worker.
    pub queue_capacity: usize,
    /// Buffer length that triggers an immediate flush.
    pub chunk_size: usize,
    /// Period of the timer-driven flush.
    pub flush_interval: Duration,
    /// Delay before a failed flush is retried.
    pub retry_delay: Duration,
    /// Upper bound for the final flush on shutdown.
    pub shutdown_timeout: Duration,
}

impl Default for DeleteWorkerSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
            chunk_size: 10,
            flush_interval: Duration::from_secs(10),
            retry_delay: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Returned by [`DeleteQueue::enqueue`] once the worker has stopped.
#[derive(Debug, Error)]
#[error("delete queue is closed")]
pub struct DeleteQueueClosed;

/// Producer handle of the delete pipeline. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DeleteQueue {
    tx: mpsc::Sender<DeletionIntent>,
}

impl DeleteQueue {
    /// Queues intents for deletion without waiting for them to be applied.
    ///
    /// Waits only while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`DeleteQueueClosed`] if the worker is no longer running.
    /// Intents queued before the failing one stay queued.
    pub async fn enqueue(&self, intents: Vec<DeletionIntent>) -> Result<(), DeleteQueueClosed> {
        let count = intents.len();
        for intent in intents {
            self.tx.send(intent).await.map_err(|_| DeleteQueueClosed)?;
        }
        metrics::counter!("delete_intents_enqueued_total").increment(count as u64);
        Ok(())
    }

    /// Returns true once the worker has stopped accepting intents.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Free slots left in the queue.
    pub fn capacity(&self) -> usize {
        self.tx.capacity()
    }
}

/// Consumer side of the delete pipeline. Run it exactly once.
pub struct DeleteWorker {
    rx: mpsc::Receiver<DeletionIntent>,
    buffer: Arc<Mutex<Vec<DeletionIntent>>>,
    storage: Arc<dyn UrlStorage>,
    settings: DeleteWorkerSettings,
}

/// Creates a connected producer handle and worker.
pub fn delete_pipeline(
    storage: Arc<dyn UrlStorage>,
    settings: DeleteWorkerSettings,
) -> (DeleteQueue, DeleteWorker) {
    let (tx, rx) = mpsc::channel(settings.queue_capacity.max(1));
    let worker = DeleteWorker {
        rx,
        buffer: Arc::new(Mutex::new(Vec::new())),
        storage,
        settings,
    };
    (DeleteQueue { tx }, worker)
}

impl DeleteWorker {
    /// Runs the accumulate/flush loop until `shutdown` turns `true`.
    ///
    /// Also stops when every [`DeleteQueue`] handle has been dropped. In both
    /// cases pending intents get one final flush attempt before returning.
    pub async fn run(self, mut shutdown: ShutdownSignal) {
        let DeleteWorker {
            mut rx,
            buffer,
            storage,
            settings,
        } = self;

        let (notifier, waiter) = flush_signal();
        let (stop_tx, stop_rx) = shutdown_channel();
        let flusher = tokio::spawn(run_flusher(
            waiter,
            buffer.clone(),
            storage.clone(),
            settings.retry_delay,
            stop_rx,
        ));

        let period = settings.flush_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            chunk_size = settings.chunk_size,
            flush_interval_secs = period.as_secs(),
            "Delete worker started"
        );

        loop {
            tokio::select! {
                _ = stopped(&mut shutdown) => {
                    info!("Stopping delete worker");
                    break;
                }
                received = rx.recv() => {
                    let Some(intent) = received else {
                        info!("All delete queue handles dropped, stopping delete worker");
                        break;
                    };
                    let mut pending = buffer.lock().await;
                    pending.push(intent);
                    if pending.len() >= settings.chunk_size {
                        notifier.notify();
                        ticker.reset();
                    }
                }
                _ = ticker.tick() => {
                    let pending = buffer.lock().await.len();
                    if pending > 0 {
                        debug!(pending, "Flushing deletions after {:?}", period);
                        notifier.notify();
                    }
                }
            }
        }

        let _ = stop_tx.send(true);
        drop(notifier);
        if let Err(e) = flusher.await {
            error!(error = %e, "Delete flusher task failed");
        }

        drain_and_flush(rx, &buffer, storage.as_ref(), settings.shutdown_timeout).await;
    }
}

/// Waits for flush signals and flushes the buffer, retrying failures.
async fn run_flusher(
    mut waiter: FlushWaiter,
    buffer: Arc<Mutex<Vec<DeletionIntent>>>,
    storage: Arc<dyn UrlStorage>,
    retry_delay: Duration,
    mut stop: ShutdownSignal,
) {
    let mut retry = RetryPolicy::fixed(retry_delay);

    loop {
        tokio::select! {
            biased;
            _ = stopped(&mut stop) => return,
            woken = waiter.wait() => {
                if !woken {
                    return;
                }
            }
        }

        loop {
            match flush_buffer(&buffer, storage.as_ref()).await {
                Ok(_) => {
                    retry.reset();
                    break;
                }
                Err(e) => {
                    metrics::counter!("delete_flush_failures_total").increment(1);
                    error!(
                        error = %e,
                        attempt = retry.attempt() + 1,
                        "Failed to flush deletion batch, will retry"
                    );
                    if !retry.backoff(&mut stop).await {
                        return;
                    }
                }
            }
        }
    }
}

/// Sends the whole buffer to storage and clears it on success.
///
/// The buffer lock is held across the storage call.
async fn flush_buffer(
    buffer: &Mutex<Vec<DeletionIntent>>,
    storage: &dyn UrlStorage,
) -> StorageResult<usize> {
    let mut pending = buffer.lock().await;
    if pending.is_empty() {
        return Ok(0);
    }

    storage.delete_batch(&pending).await?;

    let flushed = pending.len();
    pending.clear();

    metrics::counter!("delete_flushes_total").increment(1);
    metrics::counter!("delete_intents_flushed_total").increment(flushed as u64);
    debug!(batch_size = flushed, "Flushed deletion batch");

    Ok(flushed)
}

/// Final flush on shutdown: closes the queue, moves everything left into the
/// buffer and makes a single bounded attempt. Failures are logged only.
async fn drain_and_flush(
    mut rx: mpsc::Receiver<DeletionIntent>,
    buffer: &Mutex<Vec<DeletionIntent>>,
    storage: &dyn UrlStorage,
    timeout: Duration,
) {
    rx.close();

    let mut pending = buffer.lock().await;
    while let Some(intent) = rx.recv().await {
        pending.push(intent);
    }

    if pending.is_empty() {
        info!("Delete worker stopped, no pending deletions");
        return;
    }

    let count = pending.len();
    match tokio::time::timeout(timeout, storage.delete_batch(&pending)).await {
        Ok(Ok(())) => {
            pending.clear();
            metrics::counter!("delete_flushes_total").increment(1);
            metrics::counter!("delete_intents_flushed_total").increment(count as u64);
            info!(batch_size = count, "Flushed pending deletions on shutdown");
        }
        Ok(Err(e)) => {
            error!(error = %e, batch_size = count, "Final deletion flush failed");
        }
        Err(_) => {
            warn!(
                batch_size = count,
                timeout_secs = timeout.as_secs(),
                "Final deletion flush timed out"
            );
        }
    }
}
