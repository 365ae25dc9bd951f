use crate::client::Tracking;
use crate::indicator::VisibilityCoordinator;
use crate::model::Operation;
use anyhow::{anyhow, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    #[serde(with = "humantime_serde")]
    pub min_latency: Duration,
    #[serde(with = "humantime_serde")]
    pub max_latency: Duration,
    /// Probability in [0, 1] that an operation fails
    pub failure_rate: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            min_latency: Duration::from_millis(20),
            max_latency: Duration::from_millis(600),
            failure_rate: 0.05,
        }
    }
}

/// Backend that sleeps instead of talking to the network. Tracked operations go
/// through the coordinator exactly like intercepted HTTP calls.
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    cfg: SimulationConfig,
    indicator: VisibilityCoordinator,
}

impl SimulatedBackend {
    pub fn new(cfg: SimulationConfig, indicator: VisibilityCoordinator) -> Self {
        Self { cfg, indicator }
    }

    pub async fn perform(&self, op: &Operation) -> Result<()> {
        let (latency, fail) = self.roll();
        let path = op.path.clone();
        let work = async move {
            tokio::time::sleep(latency).await;
            if fail {
                Err(anyhow!("simulated failure on {path}"))
            } else {
                Ok(())
            }
        };
        match op.tracking {
            Tracking::Indicator => self.indicator.wrap(work).await,
            Tracking::Silent => work.await,
        }
    }

    fn roll(&self) -> (Duration, bool) {
        let (lo, hi) = if self.cfg.min_latency <= self.cfg.max_latency {
            (self.cfg.min_latency, self.cfg.max_latency)
        } else {
            (self.cfg.max_latency, self.cfg.min_latency)
        };
        let rate = if self.cfg.failure_rate.is_nan() {
            0.0
        } else {
            self.cfg.failure_rate.clamp(0.0, 1.0)
        };
        let mut rng = rand::thread_rng();
        (rng.gen_range(lo..=hi), rng.gen_bool(rate))
    }
}
