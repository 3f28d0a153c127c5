use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use chrono::{DateTime, TimeDelta, Utc};
use sessionstore_config::CleanupConfig;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{Result, backend::SessionBackend, cleanup::CleanupScheduler};

/// Default cleanup interval in seconds.
pub const DEFAULT_CLEANUP_INTERVAL_SECS: i64 = 300;

/// Source of the current time used for expiry checks and sweeps.
pub type Clock = fn() -> DateTime<Utc>;

/// Session storage with expiry-aware reads, atomic upserts and an optional background cleanup.
///
/// Constructing a store has no side effects. The cleanup task only runs once
/// [`SessionStore::start_cleanup`] is called and stops for good on
/// [`SessionStore::stop_cleanup`] or when the store is dropped.
pub struct SessionStore<B> {
    backend: Arc<B>,
    clock: Clock,
    cleanup_interval: TimeDelta,
    shutdown: CancellationToken,
    cleanup_started: AtomicBool,
}

impl<B: SessionBackend> SessionStore<B> {
    /// Creates an inert store sweeping every [`DEFAULT_CLEANUP_INTERVAL_SECS`] once started.
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            clock: Utc::now,
            cleanup_interval: TimeDelta::seconds(DEFAULT_CLEANUP_INTERVAL_SECS),
            shutdown: CancellationToken::new(),
            cleanup_started: AtomicBool::new(false),
        }
    }

    /// Sets the time between two sweeps. Zero or a negative interval disables the cleanup task.
    pub fn with_cleanup_interval(mut self, interval: TimeDelta) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Takes the cleanup interval from the `[cleanup]` configuration section.
    pub fn with_cleanup_config(self, config: &CleanupConfig) -> Self {
        let interval = TimeDelta::try_seconds(config.interval_secs).unwrap_or_else(|| {
            warn!(
                interval_secs = config.interval_secs,
                "cleanup interval out of range, disabling session cleanup"
            );
            TimeDelta::zero()
        });
        self.with_cleanup_interval(interval)
    }

    /// Replaces the wall clock used to decide whether a session has expired.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn cleanup_interval(&self) -> TimeDelta {
        self.cleanup_interval
    }

    /// Creates the session table if it does not exist yet.
    pub async fn create_table(&self) -> Result<()> {
        self.backend.create_table().await
    }

    /// Returns the payload stored under `token` if the session has not expired.
    ///
    /// A missing token and an expired session both yield `Ok(None)`; only backend failures are errors.
    pub async fn find(&self, token: &str) -> Result<Option<Vec<u8>>> {
        let now = (self.clock)();
        self.backend.find(token, now).await
    }

    /// Stores `data` under `token` until `expiry`, replacing any session already stored under it.
    ///
    /// An expiry in the past is accepted; such a session is simply never found.
    pub async fn commit(&self, token: &str, data: &[u8], expiry: DateTime<Utc>) -> Result<()> {
        self.backend.upsert(token, data, expiry).await?;
        debug!(bytes = data.len(), %expiry, "committed session");
        Ok(())
    }

    /// Deletes the session stored under `token`. Deleting a missing token succeeds.
    pub async fn delete(&self, token: &str) -> Result<()> {
        self.backend.delete(token).await
    }

    /// Sweeps every session that expired before now and returns how many were removed.
    ///
    /// This is what the cleanup task runs on every tick. Call it directly when the
    /// cleanup task is disabled.
    pub async fn delete_expired(&self) -> Result<u64> {
        let now = (self.clock)();
        self.backend.delete_expired(now).await
    }

    /// Spawns the background cleanup task on the current tokio runtime.
    ///
    /// Returns `None` without spawning anything if the interval is zero or negative,
    /// if the cleanup was already started, or if it has been stopped before.
    pub fn start_cleanup(&self) -> Option<JoinHandle<()>> {
        let interval = match self.cleanup_interval.to_std() {
            Ok(interval) if !interval.is_zero() => interval,
            _ => {
                debug!(
                    interval_ms = self.cleanup_interval.num_milliseconds(),
                    "session cleanup disabled"
                );
                return None;
            }
        };

        if self.shutdown.is_cancelled() {
            warn!("session cleanup was stopped and cannot be restarted");
            return None;
        }

        if self.cleanup_started.swap(true, Ordering::SeqCst) {
            warn!("session cleanup is already running");
            return None;
        }

        let scheduler = CleanupScheduler::new(
            Arc::clone(&self.backend),
            interval,
            self.clock,
            self.shutdown.child_token(),
        );

        Some(scheduler.spawn())
    }

    /// Signals the cleanup task to stop. No sweep is started after the task observes the signal.
    pub fn stop_cleanup(&self) {
        self.shutdown.cancel();
    }

    pub fn is_cleanup_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl<B> Drop for SessionStore<B> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
