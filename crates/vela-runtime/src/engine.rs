//! Entitlement reconciliation engine
//!
//! Explicitly constructed and cloneable; every clone shares one cache, one
//! ledger and one restore lane. Live events are applied through the writer
//! lock of the cache, restores replay the full history and commit once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use vela_core::{
    Clock, Entitlement, EntitlementState, SystemClock, Timestamp, TransactionEvent, TransactionId,
};
use vela_entitlement::{replay, CommitOutcome, EntitlementCache, TransitionError, TransitionRules};

use crate::{EngineConfig, EngineError, HistoryCursor, Ledger, RestoreError};

struct EngineInner {
    config: EngineConfig,
    rules: TransitionRules,
    cache: EntitlementCache,
    ledger: Arc<dyn Ledger>,
    clock: Arc<dyn Clock>,
    /// Serializes restores among themselves
    restore_lane: tokio::sync::Mutex<()>,
    resync: AtomicBool,
}

/// Entitlement reconciliation engine handle
#[derive(Clone)]
pub struct EntitlementEngine {
    inner: Arc<EngineInner>,
}

impl EntitlementEngine {
    pub fn new(config: EngineConfig, ledger: Arc<dyn Ledger>, cache: EntitlementCache) -> Self {
        Self::with_clock(config, ledger, cache, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: EngineConfig,
        ledger: Arc<dyn Ledger>,
        cache: EntitlementCache,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let rules = TransitionRules::new(config.catalog.clone());
        EntitlementEngine {
            inner: Arc::new(EngineInner {
                config,
                rules,
                cache,
                ledger,
                clock,
                restore_lane: tokio::sync::Mutex::new(()),
                resync: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn rules(&self) -> &TransitionRules {
        &self.inner.rules
    }

    pub fn cache(&self) -> &EntitlementCache {
        &self.inner.cache
    }

    pub(crate) fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.inner.ledger
    }

    pub fn now(&self) -> Timestamp {
        self.inner.clock.now()
    }

    /// Committed state; never blocks on a writer
    pub fn current_entitlement(&self) -> EntitlementState {
        self.inner.cache.read().state
    }

    /// Committed decision with its justification
    pub fn entitlement(&self) -> Entitlement {
        self.inner.cache.read()
    }

    /// Set when the justifying transaction was revoked; cleared by a
    /// completed restore
    pub fn resync_recommended(&self) -> bool {
        self.inner.resync.load(Ordering::Acquire)
    }

    /// Apply one live transaction
    pub async fn apply_live(&self, event: TransactionEvent) -> Result<CommitOutcome, EngineError> {
        let now = self.now();
        let result = match self.inner.rules.classify(&event, now) {
            Ok(candidate) => Ok(self.inner.cache.commit_if_newer(candidate, now)),
            Err(TransitionError::Unverified(id)) => {
                tracing::warn!(transaction_id = %id, product = %event.product_id, "unverified transaction discarded");
                return Err(EngineError::VerificationFailed(id));
            }
            Err(TransitionError::Revoked(id)) => {
                if self.inner.cache.read().is_justified_by(id) {
                    tracing::warn!(transaction_id = %id, "justifying transaction revoked, restore recommended");
                    self.inner.resync.store(true, Ordering::Release);
                }
                Err(EngineError::Discarded(TransitionError::Revoked(id)))
            }
            Err(reason) => {
                tracing::debug!(transaction_id = %event.transaction_id, %reason, "transaction discarded");
                Err(EngineError::Discarded(reason))
            }
        };

        // Writer lock already released
        self.acknowledge(event.transaction_id).await;
        result
    }

    async fn acknowledge(&self, transaction_id: TransactionId) {
        if let Err(err) = self.inner.ledger.finish(transaction_id).await {
            tracing::warn!(%transaction_id, error = %err, "failed to finish transaction");
        }
    }

    /// Replay the full history and commit the result
    pub async fn restore(&self) -> Result<EntitlementState, RestoreError> {
        self.restore_with_cancel(CancellationToken::new()).await
    }

    /// Restore, giving up without side effects when `cancel` fires
    pub async fn restore_with_cancel(
        &self,
        cancel: CancellationToken,
    ) -> Result<EntitlementState, RestoreError> {
        let _lane = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RestoreError::Cancelled),
            lane = self.inner.restore_lane.lock() => lane,
        };
        let ticket = self.inner.cache.begin_restore();

        let fetched = tokio::select! {
            _ = cancel.cancelled() => Err(RestoreError::Cancelled),
            fetched = tokio::time::timeout(self.inner.config.restore_timeout, self.fetch_history()) => {
                fetched.unwrap_or(Err(RestoreError::TimedOut))
            }
        };

        let history = match fetched {
            Ok(history) => history,
            Err(err) => {
                self.inner.cache.abandon_restore(ticket);
                tracing::warn!(error = %err, "restore failed, keeping cached entitlement");
                return Err(err);
            }
        };

        let now = self.now();
        let report = replay(&self.inner.rules, &history, now);
        let commit = self.inner.cache.commit_restore(ticket, report.hypothesis, now)?;
        self.inner.resync.store(false, Ordering::Release);

        if commit.committed.state.is_free() {
            Err(RestoreError::NoValidEntitlement)
        } else {
            Ok(commit.committed.state)
        }
    }

    async fn fetch_history(&self) -> Result<Vec<TransactionEvent>, RestoreError> {
        let max_pages = self.inner.config.max_history_pages;
        let mut events = Vec::new();
        let mut cursor: Option<HistoryCursor> = None;

        for _ in 0..max_pages {
            let page = self
                .inner
                .ledger
                .history_page(cursor.take())
                .await
                .map_err(RestoreError::NetworkUnavailable)?;
            events.extend(page.events);
            match page.next {
                Some(next) => cursor = Some(next),
                None => return Ok(events),
            }
        }
        Err(RestoreError::HistoryTooLong(max_pages))
    }
}
