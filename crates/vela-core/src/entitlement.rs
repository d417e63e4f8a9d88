//! Entitlement decisions
//!
//! An entitlement is the derived decision of whether paid features are
//! unlocked, together with the transaction that justified it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Timestamp, TransactionEvent, TransactionId};

/// Entitlement tier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntitlementState {
    #[default]
    Free,
    ActiveMonthly { expires_at: Timestamp },
    /// Absorbing: no live event moves the state away from Lifetime
    Lifetime,
}

impl EntitlementState {
    pub fn is_lifetime(&self) -> bool {
        matches!(self, EntitlementState::Lifetime)
    }

    pub fn is_free(&self) -> bool {
        matches!(self, EntitlementState::Free)
    }

    /// Whether paid features are unlocked at `now`
    pub fn grants_access(&self, now: Timestamp) -> bool {
        match self {
            EntitlementState::Free => false,
            EntitlementState::ActiveMonthly { expires_at } => *expires_at > now,
            EntitlementState::Lifetime => true,
        }
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            EntitlementState::Free => "free",
            EntitlementState::ActiveMonthly { .. } => "monthly",
            EntitlementState::Lifetime => "lifetime",
        }
    }
}

impl fmt::Display for EntitlementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntitlementState::ActiveMonthly { expires_at } => {
                write!(f, "monthly(until {})", expires_at)
            }
            other => f.write_str(other.label()),
        }
    }
}

/// The transaction a decision rests on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Justification {
    pub transaction_id: TransactionId,
    pub purchase_date: Timestamp,
}

impl Justification {
    /// Precedence key: purchase date, then transaction id
    pub fn key(&self) -> (Timestamp, TransactionId) {
        (self.purchase_date, self.transaction_id)
    }
}

impl From<&TransactionEvent> for Justification {
    fn from(event: &TransactionEvent) -> Self {
        Justification {
            transaction_id: event.transaction_id,
            purchase_date: event.purchase_date,
        }
    }
}

/// A committed (or candidate) entitlement decision
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Entitlement {
    pub state: EntitlementState,
    pub justification: Option<Justification>,
}

impl Entitlement {
    pub const FREE: Entitlement = Entitlement {
        state: EntitlementState::Free,
        justification: None,
    };

    pub fn lifetime(by: Justification) -> Self {
        Entitlement {
            state: EntitlementState::Lifetime,
            justification: Some(by),
        }
    }

    pub fn monthly(expires_at: Timestamp, by: Justification) -> Self {
        Entitlement {
            state: EntitlementState::ActiveMonthly { expires_at },
            justification: Some(by),
        }
    }

    /// Purchase date of the justifying transaction
    pub fn purchase_date(&self) -> Option<Timestamp> {
        self.justification.map(|j| j.purchase_date)
    }

    /// Whether `id` is the transaction this decision rests on
    pub fn is_justified_by(&self, id: TransactionId) -> bool {
        matches!(self.justification, Some(j) if j.transaction_id == id)
    }

    pub fn grants_access(&self, now: Timestamp) -> bool {
        self.state.grants_access(now)
    }
}
