//! Restore replay
//!
//! Rebuilds a decision from a complete transaction history. The working
//! hypothesis starts at Free and only ever sees the history, never the cache,
//! so the result is the authoritative answer for the history as fetched.

use std::collections::HashSet;

use vela_core::{Entitlement, Timestamp, TransactionEvent};

use crate::{supersedes, TransitionError, TransitionRules};

/// Replay result for one history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub hypothesis: Entitlement,
    pub examined: u32,
    /// Candidates that replaced the hypothesis
    pub applied: u32,
    /// Valid candidates that lost on precedence
    pub kept: u32,
    pub unverified: u32,
    pub revoked: u32,
    /// Expired, open-ended or unknown-product transactions
    pub discarded: u32,
}

impl ReplayReport {
    pub fn found_valid(&self) -> bool {
        !self.hypothesis.state.is_free()
    }
}

/// Replay a full history at `now`
///
/// Events are applied in purchase-date order, transaction id breaking ties.
/// A transaction that appears revoked anywhere in the history is excluded
/// entirely, including any earlier non-revoked copy of it.
pub fn replay(rules: &TransitionRules, events: &[TransactionEvent], now: Timestamp) -> ReplayReport {
    let revoked: HashSet<_> = events
        .iter()
        .filter(|e| e.verified && e.revoked)
        .map(|e| e.transaction_id)
        .collect();

    let mut ordered: Vec<&TransactionEvent> = events.iter().collect();
    ordered.sort_by_key(|e| e.replay_key());

    let mut report = ReplayReport::default();
    for event in ordered {
        report.examined += 1;

        if revoked.contains(&event.transaction_id) && event.verified {
            report.revoked += 1;
            continue;
        }

        match rules.classify(event, now) {
            Ok(candidate) => match supersedes(&report.hypothesis, &candidate, now) {
                Ok(()) => {
                    report.hypothesis = candidate;
                    report.applied += 1;
                }
                Err(_) => report.kept += 1,
            },
            Err(TransitionError::Unverified(_)) => report.unverified += 1,
            Err(TransitionError::Revoked(_)) => report.revoked += 1,
            Err(reason) => {
                tracing::trace!(%reason, "replay discard");
                report.discarded += 1;
            }
        }
    }

    tracing::debug!(
        examined = report.examined,
        applied = report.applied,
        state = %report.hypothesis.state,
        "replay finished"
    );
    report
}
