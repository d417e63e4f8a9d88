//! Live update worker
//!
//! One task drains the ledger subscription strictly in delivery order.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vela_core::TransactionEvent;

use crate::{EngineError, EntitlementEngine};

/// Counters for one worker run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub received: u64,
    pub committed: u64,
    pub unchanged: u64,
    pub unverified: u64,
    pub discarded: u64,
    /// Stopped by cancellation rather than by the channel closing
    pub cancelled: bool,
}

/// Handle to a running live worker
pub struct LiveWorker {
    cancel: CancellationToken,
    handle: JoinHandle<WorkerReport>,
}

impl LiveWorker {
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop after the event in progress and wait for the report
    pub async fn shutdown(self) -> WorkerReport {
        self.cancel.cancel();
        self.join().await
    }

    /// Wait for the subscription to close
    pub async fn join(self) -> WorkerReport {
        match self.handle.await {
            Ok(report) => report,
            Err(err) => {
                tracing::error!(error = %err, "live worker task failed");
                WorkerReport::default()
            }
        }
    }
}

impl EntitlementEngine {
    /// Subscribe to the ledger and apply live events on a dedicated task
    pub fn spawn_live_worker(&self) -> LiveWorker {
        let cancel = CancellationToken::new();
        let rx = self.ledger().subscribe();
        let handle = tokio::spawn(run(self.clone(), rx, cancel.clone()));
        LiveWorker { cancel, handle }
    }
}

async fn run(
    engine: EntitlementEngine,
    mut rx: mpsc::Receiver<TransactionEvent>,
    cancel: CancellationToken,
) -> WorkerReport {
    let mut report = WorkerReport::default();
    tracing::debug!("live worker started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                report.cancelled = true;
                break;
            }
            next = rx.recv() => {
                let Some(event) = next else { break };
                report.received += 1;
                match engine.apply_live(event).await {
                    Ok(outcome) if outcome.is_committed() => report.committed += 1,
                    Ok(_) => report.unchanged += 1,
                    Err(EngineError::VerificationFailed(_)) => report.unverified += 1,
                    Err(EngineError::Discarded(_)) => report.discarded += 1,
                }
            }
        }
    }

    tracing::debug!(
        received = report.received,
        committed = report.committed,
        cancelled = report.cancelled,
        "live worker stopped"
    );
    report
}
