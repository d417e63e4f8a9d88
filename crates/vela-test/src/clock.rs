//! Simulated wall clock

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use vela_core::{Clock, Timestamp};

/// Manually advanced clock shared by a harness and its engine
#[derive(Debug)]
pub struct SimClock {
    millis: AtomicI64,
}

impl SimClock {
    pub fn new(start: Timestamp) -> Self {
        SimClock {
            millis: AtomicI64::new(start.as_millis()),
        }
    }

    pub fn advance(&self, by: Duration) -> Timestamp {
        let by = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        let prev = self.millis.fetch_add(by, Ordering::AcqRel);
        Timestamp::from_millis(prev.saturating_add(by))
    }

    pub fn set(&self, to: Timestamp) {
        self.millis.store(to.as_millis(), Ordering::Release);
    }
}

impl Default for SimClock {
    /// 2023-11-14T22:13:20Z
    fn default() -> Self {
        SimClock::new(Timestamp::from_secs(1_700_000_000))
    }
}

impl Clock for SimClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.millis.load(Ordering::Acquire))
    }
}
