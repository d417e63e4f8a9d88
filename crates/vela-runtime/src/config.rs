//! Engine configuration

use std::time::Duration;

use vela_core::ProductCatalog;

/// Reconciliation engine configuration
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub catalog: ProductCatalog,
    /// Upper bound for fetching the whole history during a restore
    pub restore_timeout: Duration,
    /// A history longer than this is treated as a misbehaving ledger
    pub max_history_pages: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            catalog: ProductCatalog::default(),
            restore_timeout: Duration::from_secs(30),
            max_history_pages: 256,
        }
    }
}

impl EngineConfig {
    /// Config for high-latency links
    pub fn slow_network() -> Self {
        EngineConfig {
            restore_timeout: Duration::from_secs(120),
            ..EngineConfig::default()
        }
    }

    pub fn with_catalog(catalog: ProductCatalog) -> Self {
        EngineConfig {
            catalog,
            ..EngineConfig::default()
        }
    }
}
