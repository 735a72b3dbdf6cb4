//! Fixed-delay retry policy with a cancellable wait.

use std::time::Duration;

use tokio_retry::strategy::FixedInterval;

use crate::domain::shutdown::{ShutdownSignal, stopped};

/// Retries forever at a fixed interval until success or shutdown.
///
/// The wait between attempts races against the shutdown signal, so a pending
/// retry never delays process exit.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    strategy: FixedInterval,
    attempt: u32,
}

impl RetryPolicy {
    /// Creates a policy that waits `delay` between attempts.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            strategy: FixedInterval::new(delay),
            attempt: 0,
        }
    }

    /// Number of failed attempts recorded since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Clears the failure count after a successful attempt.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Records a failure and sleeps until the next attempt is due.
    ///
    /// Returns `false` without waiting out the delay if `shutdown` fires (or
    /// its sender is dropped) first.
    pub async fn backoff(&mut self, shutdown: &mut ShutdownSignal) -> bool {
        self.attempt = self.attempt.saturating_add(1);

        if *shutdown.borrow() {
            return false;
        }

        let Some(delay) = self.strategy.next() else {
            return false;
        };

        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = stopped(shutdown) => false,
        }
    }
}
