//! Scripted ledger and clock for unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use vela_core::{
    Clock, ProductId, Timestamp, TransactionEvent, TransactionId, LIFETIME_PRODUCT, MONTHLY_PRODUCT,
};

use crate::{HistoryCursor, HistoryPage, Ledger, LedgerError, PurchaseResult};

pub struct FixedClock(pub Mutex<Timestamp>);

impl Default for FixedClock {
    fn default() -> Self {
        FixedClock(Mutex::new(Timestamp::from_secs(1_700_000_000)))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.0.lock()
    }
}

pub fn monthly(id: u64, purchased: Timestamp, expires: Timestamp) -> TransactionEvent {
    TransactionEvent::verified(
        TransactionId::new(id),
        ProductId::new(MONTHLY_PRODUCT),
        purchased,
        Some(expires),
    )
}

pub fn lifetime(id: u64, purchased: Timestamp) -> TransactionEvent {
    TransactionEvent::verified(TransactionId::new(id), ProductId::new(LIFETIME_PRODUCT), purchased, None)
}

#[derive(Default)]
enum HistoryMode {
    #[default]
    Scripted,
    Stalled,
    Endless,
}

#[derive(Default)]
struct Script {
    pages: Vec<Result<Vec<TransactionEvent>, LedgerError>>,
    mode: HistoryMode,
    purchase: Option<Result<PurchaseResult, LedgerError>>,
    purchase_calls: u32,
    finished: Vec<TransactionId>,
    live: Option<mpsc::Receiver<TransactionEvent>>,
}

#[derive(Default)]
pub struct ScriptedLedger {
    script: Mutex<Script>,
}

impl ScriptedLedger {
    pub fn set_history(&self, pages: Vec<Result<Vec<TransactionEvent>, LedgerError>>) {
        let mut script = self.script.lock();
        script.pages = pages;
        script.mode = HistoryMode::Scripted;
    }

    pub fn stall_history(&self) {
        self.script.lock().mode = HistoryMode::Stalled;
    }

    pub fn endless_history(&self) {
        self.script.lock().mode = HistoryMode::Endless;
    }

    pub fn respond_to_purchase(&self, response: Result<PurchaseResult, LedgerError>) {
        self.script.lock().purchase = Some(response);
    }

    pub fn purchase_calls(&self) -> u32 {
        self.script.lock().purchase_calls
    }

    pub fn finished(&self) -> Vec<TransactionId> {
        self.script.lock().finished.clone()
    }

    /// Sender feeding the next `subscribe()` call
    pub fn live_sender(&self) -> mpsc::Sender<TransactionEvent> {
        let (tx, rx) = mpsc::channel(16);
        self.script.lock().live = Some(rx);
        tx
    }
}

#[async_trait]
impl Ledger for ScriptedLedger {
    fn subscribe(&self) -> mpsc::Receiver<TransactionEvent> {
        match self.script.lock().live.take() {
            Some(rx) => rx,
            None => mpsc::channel(1).1,
        }
    }

    async fn history_page(&self, cursor: Option<HistoryCursor>) -> Result<HistoryPage, LedgerError> {
        let index: usize = cursor.and_then(|c| c.0.parse().ok()).unwrap_or(0);
        let page = {
            let script = self.script.lock();
            match script.mode {
                HistoryMode::Stalled => None,
                HistoryMode::Endless => Some(Ok(HistoryPage {
                    events: Vec::new(),
                    next: Some(HistoryCursor((index + 1).to_string())),
                })),
                HistoryMode::Scripted => Some(match script.pages.get(index) {
                    None => Ok(HistoryPage::default()),
                    Some(Err(err)) => Err(err.clone()),
                    Some(Ok(events)) => Ok(HistoryPage {
                        events: events.clone(),
                        next: (index + 1 < script.pages.len())
                            .then(|| HistoryCursor((index + 1).to_string())),
                    }),
                }),
            }
        };
        match page {
            Some(page) => page,
            None => std::future::pending().await,
        }
    }

    async fn purchase(&self, _product: &ProductId) -> Result<PurchaseResult, LedgerError> {
        let mut script = self.script.lock();
        script.purchase_calls += 1;
        script.purchase.clone().unwrap_or(Ok(PurchaseResult::UserCancelled))
    }

    async fn finish(&self, transaction_id: TransactionId) -> Result<(), LedgerError> {
        self.script.lock().finished.push(transaction_id);
        Ok(())
    }
}
