//! Runtime errors
//!
//! `UserCancelled` and `Pending` purchases are outcomes, not errors.

use thiserror::Error;
use vela_core::{ProductId, TransactionId, VelaError};
use vela_entitlement::{CacheError, TransitionError};

use crate::purchase::PurchaseStatus;

/// Failures reported by a ledger implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger transport failure: {0}")]
    Transport(String),

    #[error("ledger request timed out")]
    Timeout,

    #[error("ledger rejected request: {0}")]
    Rejected(String),
}

impl From<LedgerError> for VelaError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Timeout => VelaError::TimedOut,
            other => VelaError::TransportFailure(other.to_string()),
        }
    }
}

/// Live event handling errors; the cache is unchanged in every case
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("transaction {0} failed verification")]
    VerificationFailed(TransactionId),

    #[error("event discarded: {0}")]
    Discarded(TransitionError),
}

impl From<EngineError> for VelaError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::VerificationFailed(id) => VelaError::VerificationFailure(id),
            EngineError::Discarded(reason) => reason.into(),
        }
    }
}

/// Restore errors
///
/// Only [`RestoreError::NoValidEntitlement`] comes from a completed restore;
/// every other variant leaves the cache untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RestoreError {
    #[error("network unavailable: {0}")]
    NetworkUnavailable(LedgerError),

    #[error("restore timed out")]
    TimedOut,

    #[error("restore cancelled")]
    Cancelled,

    #[error("history exceeded {0} pages")]
    HistoryTooLong(usize),

    #[error("restore interrupted: {0}")]
    Interrupted(#[from] CacheError),

    #[error("no valid entitlement found")]
    NoValidEntitlement,
}

impl RestoreError {
    /// Whether the cache was left exactly as it was
    pub fn cache_untouched(&self) -> bool {
        !matches!(self, RestoreError::NoValidEntitlement)
    }
}

impl From<RestoreError> for VelaError {
    fn from(err: RestoreError) -> Self {
        match err {
            RestoreError::NetworkUnavailable(e) => e.into(),
            RestoreError::TimedOut => VelaError::TimedOut,
            RestoreError::Cancelled => VelaError::Cancelled,
            RestoreError::NoValidEntitlement => VelaError::NoValidEntitlement,
            RestoreError::Interrupted(e) => e.into(),
            other @ RestoreError::HistoryTooLong(_) => VelaError::TransportFailure(other.to_string()),
        }
    }
}

/// Purchase errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),

    #[error("network unavailable: {0}")]
    NetworkUnavailable(LedgerError),

    #[error("purchase transaction {0} failed verification")]
    VerificationFailed(TransactionId),

    #[error("purchase transaction rejected: {0}")]
    Rejected(TransitionError),

    #[error("invalid purchase transition {from:?} -> {to:?}")]
    InvalidTransition {
        from: PurchaseStatus,
        to: PurchaseStatus,
    },
}

impl From<PurchaseError> for VelaError {
    fn from(err: PurchaseError) -> Self {
        match err {
            PurchaseError::UnknownProduct(p) => VelaError::UnknownProduct(p.0),
            PurchaseError::NetworkUnavailable(e) => e.into(),
            PurchaseError::VerificationFailed(id) => VelaError::VerificationFailure(id),
            PurchaseError::Rejected(reason) => reason.into(),
            other @ PurchaseError::InvalidTransition { .. } => {
                VelaError::InvalidTransition(other.to_string())
            }
        }
    }
}
