//! End-to-end integration harness
//!
//! Wires a [`SimulatedLedger`] and a [`SimClock`] to a real
//! [`EntitlementEngine`] so scenarios exercise the same code paths a host does.

use std::sync::Arc;
use std::time::Duration;

use vela_core::{EntitlementState, ProductId, Timestamp, TransactionEvent, TransactionId};
use vela_entitlement::EntitlementCache;
use vela_runtime::{EngineConfig, EntitlementEngine};

use crate::{SimClock, SimulatedLedger};

/// Integration test configuration
#[derive(Clone, Debug)]
pub struct HarnessConfig {
    pub engine: EngineConfig,
    pub page_size: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            engine: EngineConfig::default(),
            page_size: 2,
        }
    }
}

impl HarnessConfig {
    pub fn with_restore_timeout(mut self, timeout: Duration) -> Self {
        self.engine.restore_timeout = timeout;
        self
    }
}

pub struct Harness {
    pub clock: Arc<SimClock>,
    pub ledger: Arc<SimulatedLedger>,
    pub engine: EntitlementEngine,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_cache(HarnessConfig::default(), EntitlementCache::new())
    }

    pub fn with_config(config: HarnessConfig) -> Self {
        Self::with_cache(config, EntitlementCache::new())
    }

    pub fn with_cache(config: HarnessConfig, cache: EntitlementCache) -> Self {
        let clock = Arc::new(SimClock::default());
        let ledger = Arc::new(SimulatedLedger::new(clock.clone()).with_page_size(config.page_size));
        let engine = EntitlementEngine::with_clock(config.engine, ledger.clone(), cache, clock.clone());
        Harness {
            clock,
            ledger,
            engine,
        }
    }

    pub fn now(&self) -> Timestamp {
        vela_core::Clock::now(self.clock.as_ref())
    }

    pub fn monthly(&self, id: u64, purchased: Timestamp, expires: Timestamp) -> TransactionEvent {
        TransactionEvent::verified(
            TransactionId::new(id),
            self.ledger.catalog().monthly.clone(),
            purchased,
            Some(expires),
        )
    }

    pub fn lifetime(&self, id: u64, purchased: Timestamp) -> TransactionEvent {
        TransactionEvent::verified(
            TransactionId::new(id),
            self.ledger.catalog().lifetime.clone(),
            purchased,
            None,
        )
    }

    pub fn monthly_product(&self) -> ProductId {
        self.ledger.catalog().monthly.clone()
    }

    /// Poll until the committed state matches or `within` elapses
    pub async fn wait_for_state(&self, expected: EntitlementState, within: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + within;
        while tokio::time::Instant::now() < deadline {
            if self.engine.current_entitlement() == expected {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        self.engine.current_entitlement() == expected
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
