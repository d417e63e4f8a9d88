//! Purchase flow
//!
//! ```text
//! Idle -> Requesting -> Verifying -> Committed
//!                   |            \-> Failed
//!                   +-> Cancelled | Pending | Failed
//! ```
//!
//! A verified purchase is applied exactly like a live event. Attempts are
//! never retried here.

use std::fmt;

use vela_core::{EntitlementState, ProductId};
use vela_entitlement::CommitOutcome;

use crate::{EngineError, EntitlementEngine, PurchaseError, PurchaseResult};

/// Why an attempt failed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureReason {
    Transport,
    Unverified,
    /// Verified but not a usable entitlement (revoked, expired, unknown product)
    Rejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PurchaseStatus {
    Idle,
    Requesting,
    Verifying,
    Committed,
    Cancelled,
    Pending,
    Failed(FailureReason),
}

impl PurchaseStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PurchaseStatus::Committed
                | PurchaseStatus::Cancelled
                | PurchaseStatus::Pending
                | PurchaseStatus::Failed(_)
        )
    }

    fn allows(self, next: PurchaseStatus) -> bool {
        use PurchaseStatus::*;
        matches!(
            (self, next),
            (Idle, Requesting)
                | (Requesting, Verifying | Cancelled | Pending | Failed(_))
                | (Verifying, Committed | Failed(_))
        )
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurchaseStatus::Idle => f.write_str("idle"),
            PurchaseStatus::Requesting => f.write_str("requesting"),
            PurchaseStatus::Verifying => f.write_str("verifying"),
            PurchaseStatus::Committed => f.write_str("committed"),
            PurchaseStatus::Cancelled => f.write_str("cancelled"),
            PurchaseStatus::Pending => f.write_str("pending"),
            PurchaseStatus::Failed(reason) => write!(f, "failed({reason:?})"),
        }
    }
}

/// One purchase attempt; ephemeral
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchaseAttempt {
    pub product_id: ProductId,
    status: PurchaseStatus,
}

impl PurchaseAttempt {
    pub fn new(product_id: ProductId) -> Self {
        PurchaseAttempt {
            product_id,
            status: PurchaseStatus::Idle,
        }
    }

    pub fn status(&self) -> PurchaseStatus {
        self.status
    }

    /// Move to `next`, rejecting transitions the state machine does not have
    pub fn advance(&mut self, next: PurchaseStatus) -> Result<(), PurchaseError> {
        if !self.status.allows(next) {
            return Err(PurchaseError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        tracing::trace!(product = %self.product_id, from = %self.status, to = %next, "purchase attempt");
        self.status = next;
        Ok(())
    }
}

/// Non-error purchase endings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// Verified and applied; `state` is the committed state afterwards
    Committed {
        state: EntitlementState,
        commit: CommitOutcome,
    },
    Cancelled,
    /// Deferred approval; not an entitlement
    Pending,
}

impl EntitlementEngine {
    /// Run one purchase attempt for `product`
    pub async fn purchase(&self, product: &ProductId) -> Result<PurchaseOutcome, PurchaseError> {
        let (outcome, attempt) = self.run_purchase(product).await?;
        tracing::info!(product = %product, status = %attempt.status(), "purchase finished");
        Ok(outcome)
    }

    async fn run_purchase(
        &self,
        product: &ProductId,
    ) -> Result<(PurchaseOutcome, PurchaseAttempt), PurchaseError> {
        if self.rules().catalog().tier_of(product).is_none() {
            return Err(PurchaseError::UnknownProduct(product.clone()));
        }

        let mut attempt = PurchaseAttempt::new(product.clone());
        attempt.advance(PurchaseStatus::Requesting)?;

        let event = match self.ledger().purchase(product).await {
            Err(err) => {
                attempt.advance(PurchaseStatus::Failed(FailureReason::Transport))?;
                tracing::warn!(product = %product, error = %err, "purchase request failed");
                return Err(PurchaseError::NetworkUnavailable(err));
            }
            Ok(PurchaseResult::UserCancelled) => {
                attempt.advance(PurchaseStatus::Cancelled)?;
                return Ok((PurchaseOutcome::Cancelled, attempt));
            }
            Ok(PurchaseResult::Pending) => {
                attempt.advance(PurchaseStatus::Pending)?;
                return Ok((PurchaseOutcome::Pending, attempt));
            }
            Ok(PurchaseResult::Success(event)) => event,
        };

        attempt.advance(PurchaseStatus::Verifying)?;
        match self.apply_live(event).await {
            Ok(commit) => {
                attempt.advance(PurchaseStatus::Committed)?;
                let state = self.current_entitlement();
                Ok((PurchaseOutcome::Committed { state, commit }, attempt))
            }
            Err(EngineError::VerificationFailed(id)) => {
                attempt.advance(PurchaseStatus::Failed(FailureReason::Unverified))?;
                Err(PurchaseError::VerificationFailed(id))
            }
            Err(EngineError::Discarded(reason)) => {
                attempt.advance(PurchaseStatus::Failed(FailureReason::Rejected))?;
                Err(PurchaseError::Rejected(reason))
            }
        }
    }
}
