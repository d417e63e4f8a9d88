//! VELA Test Harness - Simulation and scenario validation
//!
//! This crate provides:
//! - A manually advanced clock
//! - A simulated paging ledger with fault injection
//! - Duplicating, reordering live delivery
//! - Entitlement scenario fuzzing
//! - End-to-end integration testing

pub mod chaos;
pub mod clock;
pub mod ledger;
pub mod scenario;
pub mod integration;

pub use chaos::*;
pub use clock::*;
pub use ledger::*;
pub use scenario::*;
pub use integration::*;
