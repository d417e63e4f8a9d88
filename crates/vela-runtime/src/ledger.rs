//! Remote ledger seam
//!
//! The ledger is the external source of truth for purchases. It is never
//! modelled beyond this trait.

use async_trait::async_trait;
use tokio::sync::mpsc;
use vela_core::{ProductId, TransactionEvent, TransactionId};

use crate::LedgerError;

/// Opaque position in the ledger history
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryCursor(pub String);

/// One page of the full transaction history
#[derive(Clone, Debug, Default)]
pub struct HistoryPage {
    pub events: Vec<TransactionEvent>,
    /// Cursor of the next page, `None` on the last page
    pub next: Option<HistoryCursor>,
}

/// Ledger answer to a purchase request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PurchaseResult {
    Success(TransactionEvent),
    UserCancelled,
    /// Awaiting external approval; the transaction arrives later as a live event
    Pending,
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Live transaction updates, in delivery order
    fn subscribe(&self) -> mpsc::Receiver<TransactionEvent>;

    /// Fetch one history page; `None` starts from the beginning
    async fn history_page(&self, cursor: Option<HistoryCursor>) -> Result<HistoryPage, LedgerError>;

    async fn purchase(&self, product: &ProductId) -> Result<PurchaseResult, LedgerError>;

    /// Acknowledge a processed transaction
    async fn finish(&self, transaction_id: TransactionId) -> Result<(), LedgerError>;
}
