//! Entitlement errors

use thiserror::Error;
use vela_core::{ProductId, Timestamp, TransactionId, VelaError};

/// Why a transaction produced no candidate decision
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("transaction {0} failed verification")]
    Unverified(TransactionId),

    #[error("transaction {0} was revoked")]
    Revoked(TransactionId),

    #[error("transaction {transaction_id} is for unknown product {product}")]
    UnknownProduct {
        transaction_id: TransactionId,
        product: ProductId,
    },

    #[error("subscription transaction {0} has no expiration date")]
    MissingExpiration(TransactionId),

    #[error("subscription transaction {transaction_id} expired at {expires_at}")]
    Expired {
        transaction_id: TransactionId,
        expires_at: Timestamp,
    },
}

impl TransitionError {
    pub fn transaction_id(&self) -> TransactionId {
        match self {
            TransitionError::Unverified(id)
            | TransitionError::Revoked(id)
            | TransitionError::MissingExpiration(id) => *id,
            TransitionError::UnknownProduct { transaction_id, .. }
            | TransitionError::Expired { transaction_id, .. } => *transaction_id,
        }
    }
}

impl From<TransitionError> for VelaError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::Unverified(id) => VelaError::VerificationFailure(id),
            TransitionError::UnknownProduct { product, .. } => VelaError::UnknownProduct(product.0),
            other => VelaError::Discarded(other.to_string()),
        }
    }
}

/// Entitlement cache errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("restore ticket {0} is no longer open")]
    StaleRestore(u64),
}

impl From<CacheError> for VelaError {
    fn from(err: CacheError) -> Self {
        VelaError::InvalidTransition(err.to_string())
    }
}
