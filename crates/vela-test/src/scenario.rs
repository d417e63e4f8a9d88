//! Entitlement scenario fuzzer
//!
//! Generates a random transaction history, delivers it live through
//! [`DeliveryChaos`], and checks:
//! - the live decision never loses access it already granted
//! - Lifetime is absorbing
//! - the live decision converges to what a restore over the same history finds

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vela_core::{
    days, Entitlement, EntitlementState, ProductCatalog, ProductId, Timestamp, TransactionEvent,
    TransactionId,
};
use vela_entitlement::{replay, EntitlementCache, TransitionRules};

use crate::DeliveryChaos;

/// Fuzzer configuration
#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    pub transactions: usize,
    pub lifetime_prob: f64,
    pub unverified_prob: f64,
    pub revoked_prob: f64,
    pub expired_prob: f64,
    pub unknown_prob: f64,
    pub chaos: DeliveryChaos,
    pub seed: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        ScenarioConfig {
            transactions: 40,
            lifetime_prob: 0.05,
            unverified_prob: 0.1,
            revoked_prob: 0.05,
            expired_prob: 0.3,
            unknown_prob: 0.05,
            chaos: DeliveryChaos::default(),
            seed: 42,
        }
    }
}

impl ScenarioConfig {
    pub fn light() -> Self {
        ScenarioConfig {
            transactions: 10,
            chaos: DeliveryChaos::calm(),
            ..ScenarioConfig::default()
        }
    }

    /// Subscriptions only, heavy reordering
    pub fn monthly_only() -> Self {
        ScenarioConfig {
            transactions: 200,
            lifetime_prob: 0.0,
            chaos: DeliveryChaos::hostile(),
            ..ScenarioConfig::default()
        }
    }

    pub fn adversarial() -> Self {
        ScenarioConfig {
            transactions: 500,
            lifetime_prob: 0.02,
            unverified_prob: 0.3,
            revoked_prob: 0.2,
            expired_prob: 0.4,
            unknown_prob: 0.1,
            chaos: DeliveryChaos::hostile(),
            seed: 42,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Outcome of one scenario run
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub delivered: usize,
    pub live: Entitlement,
    pub restored: Entitlement,
    /// Steps where live delivery removed access
    pub access_lost: u32,
    /// Steps where live delivery left Lifetime
    pub lifetime_left: u32,
}

impl ScenarioResult {
    pub fn converged(&self) -> bool {
        match (self.live.state, self.restored.state) {
            // Which lifetime transaction justifies it depends on delivery order
            (EntitlementState::Lifetime, EntitlementState::Lifetime) => true,
            _ => self.live == self.restored,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.converged() && self.access_lost == 0 && self.lifetime_left == 0
    }
}

pub struct ScenarioFuzzer {
    config: ScenarioConfig,
    catalog: ProductCatalog,
    rng: StdRng,
    now: Timestamp,
}

impl ScenarioFuzzer {
    pub fn new(config: ScenarioConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        ScenarioFuzzer {
            config,
            catalog: ProductCatalog::default(),
            rng,
            now: Timestamp::from_secs(1_700_000_000),
        }
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Random ledger history; each transaction id appears exactly once
    pub fn generate_history(&mut self) -> Vec<TransactionEvent> {
        (0..self.config.transactions)
            .map(|i| self.generate_transaction(TransactionId::new(i as u64 + 1)))
            .collect()
    }

    fn generate_transaction(&mut self, id: TransactionId) -> TransactionEvent {
        let purchased = self.now - days(self.rng.gen_range(0..400));
        let (product, expiration) = if self.rng.gen::<f64>() < self.config.lifetime_prob {
            (self.catalog.lifetime.clone(), None)
        } else {
            let expiration = if self.rng.gen::<f64>() < self.config.expired_prob {
                self.now - std::time::Duration::from_secs(self.rng.gen_range(0..86_400 * 30))
            } else {
                self.now + std::time::Duration::from_secs(self.rng.gen_range(1..86_400 * 30))
            };
            (self.catalog.monthly.clone(), Some(expiration))
        };

        let product = if self.rng.gen::<f64>() < self.config.unknown_prob {
            ProductId::new("com.textwidget.sticker_pack")
        } else {
            product
        };

        let mut event = TransactionEvent::verified(id, product, purchased, expiration);
        if self.rng.gen::<f64>() < self.config.unverified_prob {
            event = event.unverified();
        }
        if self.rng.gen::<f64>() < self.config.revoked_prob {
            event = event.revoked();
        }
        event
    }

    /// Generate, deliver live and compare with a restore
    pub fn run(&mut self) -> ScenarioResult {
        let history = self.generate_history();
        let delivery = self.config.chaos.scramble(&history, &mut self.rng);

        let rules = TransitionRules::new(self.catalog.clone());
        let cache = EntitlementCache::new();
        let mut access_lost = 0;
        let mut lifetime_left = 0;

        for event in &delivery {
            let before = cache.read();
            if let Ok(candidate) = rules.classify(event, self.now) {
                cache.commit_if_newer(candidate, self.now);
            }
            let after = cache.read();

            if before.grants_access(self.now) && !after.grants_access(self.now) {
                access_lost += 1;
            }
            if before.state.is_lifetime() && !after.state.is_lifetime() {
                lifetime_left += 1;
            }
        }

        ScenarioResult {
            delivered: delivery.len(),
            live: cache.read(),
            restored: replay(&rules, &history, self.now).hypothesis,
            access_lost,
            lifetime_left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_light_scenario() {
        let result = ScenarioFuzzer::new(ScenarioConfig::light()).run();
        assert!(result.is_valid(), "{result:?}");
    }

    #[test]
    fn test_default_scenario_many_seeds() {
        for seed in 0..50 {
            let result = ScenarioFuzzer::new(ScenarioConfig::default().with_seed(seed)).run();
            assert!(result.is_valid(), "seed {seed}: {result:?}");
        }
    }

    #[test]
    fn test_monthly_only_latest_purchase_wins() {
        for seed in 0..20 {
            let mut fuzzer = ScenarioFuzzer::new(ScenarioConfig::monthly_only().with_seed(seed));
            let result = fuzzer.run();
            assert!(result.is_valid(), "seed {seed}: {result:?}");
            assert!(!result.live.state.is_lifetime());
        }
    }

    #[test]
    fn test_adversarial_scenario() {
        for seed in 0..10 {
            let result = ScenarioFuzzer::new(ScenarioConfig::adversarial().with_seed(seed)).run();
            assert!(result.is_valid(), "seed {seed}: {result:?}");
            assert!(result.delivered >= 500);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_rough_delivery_converges(seed in any::<u64>(), n in 1usize..80) {
            let config = ScenarioConfig {
                transactions: n,
                chaos: DeliveryChaos::rough(),
                ..ScenarioConfig::default()
            }
            .with_seed(seed);
            let result = ScenarioFuzzer::new(config).run();
            prop_assert!(result.is_valid(), "{:?}", result);
        }
    }
}
