//! Background session cleanup task.
//!
//! Periodically sweeps expired sessions from the backend until the store cancels it.

use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval, timeout},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{backend::SessionBackend, store::Clock};

pub(crate) struct CleanupScheduler<B> {
    backend: Arc<B>,
    interval: Duration,
    clock: Clock,
    shutdown: CancellationToken,
}

impl<B: SessionBackend> CleanupScheduler<B> {
    pub(crate) fn new(
        backend: Arc<B>,
        interval: Duration,
        clock: Clock,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            backend,
            interval,
            clock,
            shutdown,
        }
    }

    pub(crate) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        let mut ticker = interval(self.interval);
        // A slow sweep must not cause a burst of catch-up sweeps.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Skip the first immediate tick
        ticker.tick().await;

        debug!(interval = ?self.interval, "session cleanup started");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if self.shutdown.is_cancelled() {
                        break;
                    }
                    self.sweep().await;
                }
            }
        }

        debug!("session cleanup stopped");
    }

    /// Runs one sweep, bounded by the interval so a hung backend cannot stall the loop.
    async fn sweep(&self) {
        let now = (self.clock)();

        match timeout(self.interval, self.backend.delete_expired(now)).await {
            Ok(Ok(0)) => debug!("session cleanup: no expired sessions"),
            Ok(Ok(deleted)) => info!(deleted, "session cleanup completed"),
            Ok(Err(err)) => error!(error = ?err, "session cleanup failed"),
            Err(_) => warn!(timeout = ?self.interval, "session cleanup timed out"),
        }
    }
}
