//! Generation feature gate
//!
//! Paid users generate without limit. Free users get a fixed number of
//! generations, counted in the `usage` blob.

use vela_core::Timestamp;
use vela_store::{ConfigStore, GenerationUsage, StoreResult};

use crate::EntitlementEngine;

pub const DEFAULT_FREE_LIMIT: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Unlimited,
    FreeRemaining(u32),
    PurchaseRequired,
}

impl GateDecision {
    pub fn allows_generation(self) -> bool {
        !matches!(self, GateDecision::PurchaseRequired)
    }
}

pub struct FeatureGate {
    engine: EntitlementEngine,
    store: ConfigStore,
    free_limit: u32,
}

impl FeatureGate {
    pub fn new(engine: EntitlementEngine, store: ConfigStore, free_limit: u32) -> Self {
        FeatureGate {
            engine,
            store,
            free_limit,
        }
    }

    pub fn decision(&self, now: Timestamp) -> GateDecision {
        self.decide(now, self.store.load_usage())
    }

    fn decide(&self, now: Timestamp, usage: GenerationUsage) -> GateDecision {
        if self.engine.entitlement().grants_access(now) {
            return GateDecision::Unlimited;
        }
        match self.free_limit.saturating_sub(usage.used) {
            0 => GateDecision::PurchaseRequired,
            left => GateDecision::FreeRemaining(left),
        }
    }

    /// Count one generation against the free quota when not entitled
    ///
    /// Returns the decision after counting. Nothing is counted when the
    /// caller is unlimited or already out of free generations.
    pub fn record_generation(&self, now: Timestamp) -> StoreResult<GateDecision> {
        let mut usage = self.store.load_usage();
        match self.decide(now, usage) {
            GateDecision::FreeRemaining(_) => {
                usage.used += 1;
                self.store.save_usage(&usage)?;
                Ok(self.decide(now, usage))
            }
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::testing::{monthly, FixedClock, ScriptedLedger};
    use crate::EngineConfig;
    use vela_core::{days, Clock};
    use vela_entitlement::EntitlementCache;
    use vela_store::StoreConfig;

    fn setup() -> (tempfile::TempDir, Arc<FixedClock>, EntitlementEngine, FeatureGate) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(StoreConfig::ephemeral(dir.path())).unwrap();
        let clock = Arc::new(FixedClock::default());
        let engine = EntitlementEngine::with_clock(
            EngineConfig::default(),
            Arc::new(ScriptedLedger::default()),
            EntitlementCache::new(),
            clock.clone(),
        );
        let gate = FeatureGate::new(engine.clone(), store, DEFAULT_FREE_LIMIT);
        (dir, clock, engine, gate)
    }

    #[test]
    fn test_free_quota_runs_out() {
        let (_dir, clock, _engine, gate) = setup();
        let t = clock.now();
        assert_eq!(gate.decision(t), GateDecision::FreeRemaining(3));
        assert_eq!(gate.record_generation(t).unwrap(), GateDecision::FreeRemaining(2));
        assert_eq!(gate.record_generation(t).unwrap(), GateDecision::FreeRemaining(1));
        assert_eq!(gate.record_generation(t).unwrap(), GateDecision::PurchaseRequired);
        assert_eq!(gate.record_generation(t).unwrap(), GateDecision::PurchaseRequired);
        assert!(!gate.decision(t).allows_generation());
    }

    #[tokio::test]
    async fn test_entitled_users_are_unlimited_until_expiry() {
        let (_dir, clock, engine, gate) = setup();
        let t = clock.now();
        engine.apply_live(monthly(1, t, t + days(30))).await.unwrap();

        assert_eq!(gate.record_generation(t).unwrap(), GateDecision::Unlimited);
        assert_eq!(gate.decision(t + days(31)), GateDecision::FreeRemaining(3));
    }
}
