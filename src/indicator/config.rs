use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MIN_DURATION: Duration = Duration::from_millis(300);
pub const DEFAULT_SHOW_DELAY: Duration = Duration::ZERO;

/// Timing policy for the busy indicator. Fixed for the coordinator's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Minimum time the indicator stays visible once shown
    #[serde(with = "humantime_serde")]
    pub min_duration: Duration,
    /// Delay between the first pending operation and the indicator appearing
    #[serde(with = "humantime_serde")]
    pub show_delay: Duration,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            min_duration: DEFAULT_MIN_DURATION,
            show_delay: DEFAULT_SHOW_DELAY,
        }
    }
}

impl IndicatorConfig {
    pub fn new(min_duration: Duration, show_delay: Duration) -> Self {
        Self {
            min_duration,
            show_delay,
        }
    }
}
