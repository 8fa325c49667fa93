//! `Turnforge` builder and runtime.
//!
//! Ties the layers together: store + cache → session manager → game
//! services, plus the optional background sweeper.

use std::sync::Arc;

use turnforge_session::{SessionConfig, SessionManager};
use turnforge_store::{Cache, Store};
use turnforge_sweep::{SweepConfig, SweepHandle, SweepStats, Sweeper};

use crate::{Blockers, TurnforgeConfig, TurnforgeError};

/// Builder for a [`Turnforge`] instance.
///
/// # Example
///
/// ```rust,ignore
/// use turnforge::prelude::*;
///
/// let tf = TurnforgeBuilder::new()
///     .sweep_enabled(false)
///     .build(MemoryStore::new(), MemoryCache::new())
///     .await;
/// let blockers = tf.blockers();
/// ```
pub struct TurnforgeBuilder {
    config: TurnforgeConfig,
}

impl TurnforgeBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: TurnforgeConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: TurnforgeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    pub fn sweep_config(mut self, config: SweepConfig) -> Self {
        self.config.sweep = config;
        self
    }

    pub fn sweep_enabled(mut self, enabled: bool) -> Self {
        self.config.sweep_enabled = enabled;
        self
    }

    /// Builds the instance on top of `store` and `cache`, starting the
    /// sweeper task if enabled.
    pub async fn build<S: Store, K: Cache>(self, store: S, cache: K) -> Turnforge<S, K> {
        let manager = Arc::new(SessionManager::new(store, cache, self.config.session.clone()));
        let sweeper = self
            .config
            .sweep_enabled
            .then(|| Sweeper::new(Arc::clone(&manager), self.config.sweep.clone()).spawn());

        tracing::info!(sweep_enabled = self.config.sweep_enabled, "turnforge ready");
        Turnforge {
            manager,
            sweeper,
            config: self.config,
        }
    }
}

impl Default for TurnforgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured Turnforge instance.
pub struct Turnforge<S, K> {
    manager: Arc<SessionManager<S, K>>,
    sweeper: Option<SweepHandle>,
    config: TurnforgeConfig,
}

impl<S: Store, K: Cache> Turnforge<S, K> {
    /// The generic session manager, for game types other than Blockers.
    pub fn manager(&self) -> &Arc<SessionManager<S, K>> {
        &self.manager
    }

    pub fn config(&self) -> &TurnforgeConfig {
        &self.config
    }

    /// The Blockers game service.
    pub fn blockers(&self) -> Blockers<S, K> {
        Blockers::new(Arc::clone(&self.manager), self.config.probe_concurrency)
    }

    /// Stops the sweeper, if running, and returns its stats.
    pub async fn shutdown(self) -> Result<Option<SweepStats>, TurnforgeError> {
        let Some(sweeper) = self.sweeper else {
            return Ok(None);
        };
        let stats = sweeper
            .shutdown()
            .await
            .map_err(|err| TurnforgeError::Session(err.into()))?;
        tracing::info!("turnforge stopped");
        Ok(Some(stats))
    }
}
