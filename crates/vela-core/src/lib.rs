//! VELA Core - Fundamental types shared by every VELA crate
//!
//! This crate defines:
//! - Wall-clock primitives (Timestamp)
//! - Identifiers (TransactionId, ProductId, ContentId)
//! - The editable display configuration and rotation content
//! - Ledger transactions and entitlement decisions
//! - The product catalog and the shared error taxonomy

pub mod time;
pub mod id;
pub mod display;
pub mod content;
pub mod transaction;
pub mod entitlement;
pub mod catalog;
pub mod error;

pub use time::*;
pub use id::*;
pub use display::*;
pub use content::*;
pub use transaction::*;
pub use entitlement::*;
pub use catalog::*;
pub use error::*;
