//! VELA Entitlement - Reconciling paid status from an unreliable ledger
//!
//! Three pieces:
//! - [`TransitionRules`]: classify one transaction into a candidate decision
//! - [`replay`]: rebuild a decision from a full history, starting from Free
//! - [`EntitlementCache`]: the last committed decision, single writer, snapshot reads

pub mod cache;
pub mod error;
pub mod replay;
pub mod rules;

pub use cache::*;
pub use error::*;
pub use replay::*;
pub use rules::*;
