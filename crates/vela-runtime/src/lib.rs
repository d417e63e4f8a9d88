//! VELA Runtime - Reconciliation engine and host-facing adapters
//!
//! This crate wires the pure pieces to the outside world:
//! 1. The ledger seam ([`Ledger`])
//! 2. The reconciliation engine: live worker, restore, purchase flow
//! 3. The renderer host adapter ([`TimelineProvider`])
//! 4. The configuration editor and the generation feature gate
//! 5. Tracing setup

pub mod config;
pub mod editor;
pub mod engine;
pub mod error;
pub mod gate;
pub mod ledger;
pub mod provider;
pub mod purchase;
pub mod telemetry;
pub mod worker;

#[cfg(test)]
mod testing;

pub use config::*;
pub use editor::*;
pub use engine::*;
pub use error::*;
pub use gate::*;
pub use ledger::*;
pub use provider::*;
pub use purchase::*;
pub use telemetry::*;
pub use worker::*;
