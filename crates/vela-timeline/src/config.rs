//! Projection configuration

use std::time::Duration;

/// Intervals at or below zero are coerced to this
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Timeline projector configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimelineConfig {
    /// Future window covered by one projection
    pub horizon: Duration,
    /// Hard cap on entries per projection
    pub max_entries: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        TimelineConfig {
            horizon: Duration::from_secs(5 * 60),
            max_entries: 512,
        }
    }
}

impl TimelineConfig {
    /// Fewer host wake-ups at the cost of longer-lived schedules
    pub fn battery_saver() -> Self {
        TimelineConfig {
            horizon: Duration::from_secs(30 * 60),
            max_entries: 2048,
        }
    }

    pub fn with_horizon(horizon: Duration) -> Self {
        TimelineConfig {
            horizon,
            ..TimelineConfig::default()
        }
    }
}
