//! Ledger transactions
//!
//! A transaction event arrives either as a live push or as a member of a full
//! history replay. The same event may be delivered more than once and in any
//! order relative to others.

use serde::{Deserialize, Serialize};

use crate::{ProductId, Timestamp, TransactionId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEvent {
    pub transaction_id: TransactionId,
    pub product_id: ProductId,
    pub purchase_date: Timestamp,
    /// Absent for non-expiring products
    #[serde(default)]
    pub expiration_date: Option<Timestamp>,
    /// Ledger signature verified
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub revoked: bool,
}

impl TransactionEvent {
    /// A verified, non-revoked transaction
    pub fn verified(
        transaction_id: TransactionId,
        product_id: ProductId,
        purchase_date: Timestamp,
        expiration_date: Option<Timestamp>,
    ) -> Self {
        TransactionEvent {
            transaction_id,
            product_id,
            purchase_date,
            expiration_date,
            verified: true,
            revoked: false,
        }
    }

    pub fn unverified(mut self) -> Self {
        self.verified = false;
        self
    }

    pub fn revoked(mut self) -> Self {
        self.revoked = true;
        self
    }

    /// Expired at `now`; non-expiring transactions never expire
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        matches!(self.expiration_date, Some(exp) if exp <= now)
    }

    /// Replay ordering: purchase date, then transaction id
    pub fn replay_key(&self) -> (Timestamp, TransactionId) {
        (self.purchase_date, self.transaction_id)
    }
}
