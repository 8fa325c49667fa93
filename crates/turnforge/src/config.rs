//! Top-level configuration.

use serde::{Deserialize, Serialize};
use turnforge_session::SessionConfig;
use turnforge_sweep::SweepConfig;

use crate::TurnforgeError;

/// Everything a [`Turnforge`](crate::Turnforge) instance can be tuned
/// with. Missing fields take their defaults, so `{}` is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnforgeConfig {
    pub session: SessionConfig,
    pub sweep: SweepConfig,
    /// Run the expiry sweeper in this process.
    pub sweep_enabled: bool,
    /// How many reads the whose-turn probe runs at once.
    pub probe_concurrency: usize,
}

impl Default for TurnforgeConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            sweep: SweepConfig::default(),
            sweep_enabled: true,
            probe_concurrency: 4,
        }
    }
}

impl TurnforgeConfig {
    /// Parses a JSON document.
    pub fn from_json(json: &str) -> Result<Self, TurnforgeError> {
        Ok(serde_json::from_str(json)?)
    }
}
