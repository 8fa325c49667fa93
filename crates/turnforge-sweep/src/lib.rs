//! Scheduled expiry sweeper for Turnforge.
//!
//! Runs [`SessionManager::delete_outdated`] on a fixed period so expired
//! games are purged without piggybacking on request traffic. The
//! debounce lives in the store (see
//! [`Store::claim_sweep`](turnforge_store::Store::claim_sweep)), so any
//! number of processes can run a sweeper against the same store and at
//! most one sweep per `min_interval` does any work.
//!
//! ```text
//! spawn ──→ jitter ──→ sweep ──→ period ──→ sweep ──→ …
//!                                                  │
//!                     SweepHandle::shutdown() ─────┘──→ SweepStats
//! ```

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use turnforge_protocol::Codec;
use turnforge_session::SessionManager;
use turnforge_store::{Cache, Store};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Sweeper configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Time between sweeps.
    pub period: Duration,
    /// Games not updated for this long are deleted.
    pub expiry: Duration,
    /// Minimum time between two sweeps that do work, across every
    /// process sharing the store.
    pub min_interval: Duration,
    /// Upper bound of the random delay before the first sweep, so
    /// processes started together don't sweep together.
    pub initial_jitter: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(10 * 60),
            expiry: Duration::from_secs(24 * 60 * 60),
            min_interval: Duration::from_secs(5 * 60),
            initial_jitter: Duration::from_secs(2),
        }
    }
}

impl SweepConfig {
    /// Fixes out-of-range values. Rules:
    /// - a zero `period` falls back to the default period
    /// - `min_interval` is capped to `period`
    pub fn validated(mut self) -> Self {
        if self.period.is_zero() {
            warn!("sweep period is zero, using default");
            self.period = Self::default().period;
        }
        if self.min_interval > self.period {
            warn!(
                min_interval = ?self.min_interval,
                period = ?self.period,
                "sweep min_interval exceeds period, clamping"
            );
            self.min_interval = self.period;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// What a sweeper did over its lifetime, returned on shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Sweeps attempted.
    pub runs: u64,
    /// Sweeps skipped because another sweep ran within `min_interval`.
    pub skipped: u64,
    /// Sweeps that failed (store unavailable etc.).
    pub failures: u64,
    /// Games deleted in total.
    pub deleted: u64,
}

// ---------------------------------------------------------------------------
// Sweeper
// ---------------------------------------------------------------------------

/// Handle to a running sweeper task. Dropping it also stops the task.
pub struct SweepHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<SweepStats>,
}

impl SweepHandle {
    /// Stops the sweeper after any sweep in progress and returns its
    /// stats.
    pub async fn shutdown(self) -> Result<SweepStats, JoinError> {
        let _ = self.shutdown.send(());
        self.task.await
    }
}

/// Periodic driver for [`SessionManager::delete_outdated`].
pub struct Sweeper<S, K, C> {
    manager: Arc<SessionManager<S, K, C>>,
    config: SweepConfig,
    stats: SweepStats,
}

impl<S: Store, K: Cache, C: Codec> Sweeper<S, K, C> {
    pub fn new(manager: Arc<SessionManager<S, K, C>>, config: SweepConfig) -> Self {
        Self {
            manager,
            config: config.validated(),
            stats: SweepStats::default(),
        }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Runs one sweep now and folds the result into the stats.
    pub async fn sweep_once(&mut self) -> Option<usize> {
        self.stats.runs += 1;
        match self
            .manager
            .delete_outdated(self.config.expiry, self.config.min_interval)
            .await
        {
            Ok(Some(deleted)) => {
                self.stats.deleted += deleted as u64;
                if deleted > 0 {
                    info!(deleted, "sweep purged outdated games");
                }
                Some(deleted)
            }
            Ok(None) => {
                self.stats.skipped += 1;
                None
            }
            Err(err) => {
                self.stats.failures += 1;
                warn!(%err, "sweep failed");
                None
            }
        }
    }

    /// Moves the sweeper onto its own task.
    pub fn spawn(self) -> SweepHandle {
        let (shutdown, rx) = oneshot::channel();
        let task = tokio::spawn(self.run(rx));
        SweepHandle { shutdown, task }
    }

    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) -> SweepStats {
        let jitter = if self.config.initial_jitter.is_zero() {
            Duration::ZERO
        } else {
            let max = self.config.initial_jitter.as_millis() as u64;
            Duration::from_millis(rand::rng().random_range(0..=max))
        };
        debug!(
            period = ?self.config.period,
            expiry = ?self.config.expiry,
            ?jitter,
            "sweeper started"
        );

        let mut ticker = time::interval_at(Instant::now() + jitter, self.config.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                // Fires on send and on a dropped handle alike.
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.sweep_once().await;
                }
            }
        }

        info!(
            runs = self.stats.runs,
            deleted = self.stats.deleted,
            "sweeper stopped"
        );
        self.stats
    }
}
