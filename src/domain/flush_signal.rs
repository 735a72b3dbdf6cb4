//! Single-slot wake-up signal for the delete worker's flusher.

use tokio::sync::mpsc;

/// Creates a connected notifier/waiter pair.
///
/// The slot holds at most one pending wake-up: any number of
/// [`FlushNotifier::notify`] calls made before [`FlushWaiter::wait`] consumes
/// the slot are delivered as a single wake-up.
pub fn flush_signal() -> (FlushNotifier, FlushWaiter) {
    let (tx, rx) = mpsc::channel(1);
    (FlushNotifier { tx }, FlushWaiter { rx })
}

/// Sending half. Cheap to clone.
#[derive(Debug, Clone)]
pub struct FlushNotifier {
    tx: mpsc::Sender<()>,
}

impl FlushNotifier {
    /// Records a pending wake-up without blocking.
    ///
    /// A full slot means a wake-up is already pending, so the call is dropped.
    pub fn notify(&self) {
        let _ = self.tx.try_send(());
    }
}

/// Receiving half.
#[derive(Debug)]
pub struct FlushWaiter {
    rx: mpsc::Receiver<()>,
}

impl FlushWaiter {
    /// Waits for and consumes one pending wake-up.
    ///
    /// Returns `false` once every notifier has been dropped and no wake-up is
    /// left.
    pub async fn wait(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}
