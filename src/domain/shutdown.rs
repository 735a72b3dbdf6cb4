//! Process-wide shutdown signal.
//!
//! A `watch` channel carrying `false` until shutdown is requested. Each
//! long-lived task holds its own receiver.

use tokio::sync::watch;

/// Sender used to request shutdown.
pub type ShutdownTrigger = watch::Sender<bool>;

/// Receiver handed to background tasks.
pub type ShutdownSignal = watch::Receiver<bool>;

/// Creates a signal in the "running" state.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    watch::channel(false)
}

/// Resolves once shutdown is requested or the trigger is dropped.
pub async fn stopped(signal: &mut ShutdownSignal) {
    let _ = signal.wait_for(|stop| *stop).await;
}
