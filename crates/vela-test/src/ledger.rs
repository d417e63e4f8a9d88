//! Simulated remote ledger
//!
//! Keeps an authoritative transaction history, serves it in pages, pushes
//! live events, and answers purchases from a script. Faults can be injected
//! per page and per request.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use vela_core::{days, Clock, ProductCatalog, ProductId, Tier, TransactionEvent, TransactionId};
use vela_runtime::{HistoryCursor, HistoryPage, Ledger, LedgerError, PurchaseResult};

use crate::SimClock;

/// Injected ledger faults
#[derive(Clone, Debug, Default)]
pub struct LedgerFaults {
    /// Page index that fails with a transport error
    pub fail_page: Option<usize>,
    /// Delay before every history page
    pub page_delay: Duration,
    /// `finish` fails (the engine must only log this)
    pub fail_finish: bool,
}

/// Scripted answer to the next purchase request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PurchaseScript {
    Succeed,
    SucceedUnverified,
    Cancel,
    Pending,
    TransportError,
}

/// Request counters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerStats {
    pub history_requests: u32,
    pub purchase_requests: u32,
    pub finished: Vec<TransactionId>,
}

struct State {
    history: Vec<TransactionEvent>,
    page_size: usize,
    faults: LedgerFaults,
    purchases: VecDeque<PurchaseScript>,
    next_transaction: u64,
    live: Option<mpsc::Sender<TransactionEvent>>,
    stats: LedgerStats,
}

pub struct SimulatedLedger {
    catalog: ProductCatalog,
    clock: Arc<SimClock>,
    live_buffer: usize,
    state: Mutex<State>,
}

impl SimulatedLedger {
    pub fn new(clock: Arc<SimClock>) -> Self {
        SimulatedLedger {
            catalog: ProductCatalog::default(),
            clock,
            live_buffer: 64,
            state: Mutex::new(State {
                history: Vec::new(),
                page_size: 2,
                faults: LedgerFaults::default(),
                purchases: VecDeque::new(),
                next_transaction: 1_000,
                live: None,
                stats: LedgerStats::default(),
            }),
        }
    }

    pub fn with_page_size(self, page_size: usize) -> Self {
        self.state.lock().page_size = page_size.max(1);
        self
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    pub fn set_faults(&self, faults: LedgerFaults) {
        self.state.lock().faults = faults;
    }

    pub fn script_purchase(&self, script: PurchaseScript) {
        self.state.lock().purchases.push_back(script);
    }

    pub fn stats(&self) -> LedgerStats {
        self.state.lock().stats.clone()
    }

    pub fn history(&self) -> Vec<TransactionEvent> {
        self.state.lock().history.clone()
    }

    /// Add a transaction to the history without pushing it live
    pub fn record(&self, event: TransactionEvent) {
        self.state.lock().history.push(event);
    }

    /// Record a transaction and push it to the live subscriber, if any
    pub async fn deliver(&self, event: TransactionEvent) -> bool {
        let sender = {
            let mut state = self.state.lock();
            state.history.push(event.clone());
            state.live.clone()
        };
        self.push(sender, event).await
    }

    /// Push an event live without touching the history (redelivery)
    pub async fn redeliver(&self, event: TransactionEvent) -> bool {
        let sender = self.state.lock().live.clone();
        self.push(sender, event).await
    }

    async fn push(&self, sender: Option<mpsc::Sender<TransactionEvent>>, event: TransactionEvent) -> bool {
        match sender {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Close the live subscription
    pub fn close_live(&self) {
        self.state.lock().live = None;
    }

    /// Fresh verified transaction for `tier`, purchased now
    pub fn issue(&self, tier: Tier) -> TransactionEvent {
        let id = {
            let mut state = self.state.lock();
            state.next_transaction += 1;
            TransactionId::new(state.next_transaction)
        };
        let now = self.clock.now();
        let expiration = match tier {
            Tier::Monthly => Some(now + days(30)),
            Tier::Lifetime => None,
        };
        TransactionEvent::verified(id, self.catalog.product_for(tier).clone(), now, expiration)
    }
}

#[async_trait]
impl Ledger for SimulatedLedger {
    fn subscribe(&self) -> mpsc::Receiver<TransactionEvent> {
        let (tx, rx) = mpsc::channel(self.live_buffer);
        self.state.lock().live = Some(tx);
        rx
    }

    async fn history_page(&self, cursor: Option<HistoryCursor>) -> Result<HistoryPage, LedgerError> {
        let index: usize = match cursor {
            None => 0,
            Some(HistoryCursor(raw)) => raw
                .parse()
                .map_err(|_| LedgerError::Rejected(format!("bad cursor {raw:?}")))?,
        };

        let delay = {
            let mut state = self.state.lock();
            state.stats.history_requests += 1;
            state.faults.page_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.lock();
        if state.faults.fail_page == Some(index) {
            return Err(LedgerError::Transport(format!("page {index} dropped")));
        }
        let start = index * state.page_size;
        let end = (start + state.page_size).min(state.history.len());
        let events = state.history.get(start..end).map(<[_]>::to_vec).unwrap_or_default();
        let next = (end < state.history.len()).then(|| HistoryCursor((index + 1).to_string()));
        Ok(HistoryPage { events, next })
    }

    async fn purchase(&self, product: &ProductId) -> Result<PurchaseResult, LedgerError> {
        let script = {
            let mut state = self.state.lock();
            state.stats.purchase_requests += 1;
            state.purchases.pop_front().unwrap_or(PurchaseScript::Succeed)
        };
        let tier = self
            .catalog
            .tier_of(product)
            .ok_or_else(|| LedgerError::Rejected(format!("unknown product {product}")))?;

        match script {
            PurchaseScript::Cancel => Ok(PurchaseResult::UserCancelled),
            PurchaseScript::Pending => Ok(PurchaseResult::Pending),
            PurchaseScript::TransportError => Err(LedgerError::Transport("purchase dropped".into())),
            PurchaseScript::Succeed => {
                let event = self.issue(tier);
                self.record(event.clone());
                Ok(PurchaseResult::Success(event))
            }
            PurchaseScript::SucceedUnverified => Ok(PurchaseResult::Success(self.issue(tier).unverified())),
        }
    }

    async fn finish(&self, transaction_id: TransactionId) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        if state.faults.fail_finish {
            return Err(LedgerError::Transport("finish dropped".into()));
        }
        state.stats.finished.push(transaction_id);
        Ok(())
    }
}
