//! Error taxonomy for VELA
//!
//! Nothing in the core is fatal to the process. Every failure degrades to the
//! last known good state, except a successfully completed restore.

use thiserror::Error;

use crate::TransactionId;

/// Core VELA errors
#[derive(Error, Debug)]
pub enum VelaError {
    // Store errors
    #[error("Corrupt data in blob {blob}: {reason}")]
    CorruptData { blob: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Ledger errors
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("Verification failed for transaction {0}")]
    VerificationFailure(TransactionId),

    // Restore errors
    #[error("Restore completed without finding a valid entitlement")]
    NoValidEntitlement,

    #[error("Operation timed out")]
    TimedOut,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    // Reconciliation
    #[error("Event discarded: {0}")]
    Discarded(String),

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),
}

impl VelaError {
    /// Safe to retry without any state having changed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VelaError::TransportFailure(_) | VelaError::TimedOut | VelaError::Io(_)
        )
    }
}

/// Result type for VELA operations
pub type VelaResult<T> = Result<T, VelaError>;
