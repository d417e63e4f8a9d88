//! Entitlement cache
//!
//! Holds the last committed decision. All commits go through one writer lock;
//! readers copy the published value under a read lock that is only ever held
//! for the swap itself, never for a decision or for persistence I/O.
//!
//! A restore is the only path that may move the decision down. While a restore
//! is open, every valid live candidate is journaled, and the journal is
//! re-applied on top of the restored hypothesis when the restore commits.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use vela_core::{Entitlement, Timestamp};
use vela_store::{BlobStore, LoadOrigin};

use crate::{supersedes, CacheError, Kept};

/// Blob holding the last committed decision
pub const ENTITLEMENT_BLOB: &str = "entitlement";

/// Result of a live commit attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed { previous: Entitlement },
    Unchanged(Kept),
}

impl CommitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed { .. })
    }
}

/// Handle for one open restore
#[derive(Debug)]
pub struct RestoreTicket {
    id: u64,
}

impl RestoreTicket {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Result of committing a restore
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestoreCommit {
    pub previous: Entitlement,
    pub committed: Entitlement,
    /// Live candidates accepted on top of the hypothesis
    pub replayed_live: usize,
}

impl RestoreCommit {
    /// Whether the restore moved the decision to a weaker tier
    pub fn downgraded(&self, now: Timestamp) -> bool {
        (self.previous.grants_access(now) && !self.committed.grants_access(now))
            || (self.previous.state.is_lifetime() && !self.committed.state.is_lifetime())
    }
}

struct OpenRestore {
    id: u64,
    journal: Vec<Entitlement>,
}

#[derive(Default)]
struct Writer {
    restore: Option<OpenRestore>,
    next_ticket: u64,
}

/// Last committed entitlement decision
pub struct EntitlementCache {
    published: RwLock<Entitlement>,
    writer: Mutex<Writer>,
    revision: AtomicU64,
    persistence: Option<BlobStore>,
}

impl Default for EntitlementCache {
    fn default() -> Self {
        Self::new()
    }
}

impl EntitlementCache {
    /// In-memory cache starting at Free
    pub fn new() -> Self {
        Self::starting_at(Entitlement::FREE, None)
    }

    /// Cache backed by the `entitlement` blob
    pub fn with_persistence(store: BlobStore) -> Self {
        let loaded = store.load_detailed::<Entitlement>(ENTITLEMENT_BLOB);
        if loaded.origin == LoadOrigin::Stored {
            tracing::info!(state = %loaded.value.state, "entitlement restored from disk");
        }
        Self::starting_at(loaded.value, Some(store))
    }

    fn starting_at(initial: Entitlement, persistence: Option<BlobStore>) -> Self {
        EntitlementCache {
            published: RwLock::new(initial),
            writer: Mutex::new(Writer::default()),
            revision: AtomicU64::new(0),
            persistence,
        }
    }

    /// Snapshot of the committed decision
    #[inline]
    pub fn read(&self) -> Entitlement {
        *self.published.read()
    }

    /// Commits performed so far
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    pub fn restore_in_progress(&self) -> bool {
        self.writer.lock().restore.is_some()
    }

    /// Commit `candidate` if it takes precedence over the current decision
    pub fn commit_if_newer(&self, candidate: Entitlement, now: Timestamp) -> CommitOutcome {
        let mut writer = self.writer.lock();

        if let Some(open) = writer.restore.as_mut() {
            if !candidate.state.is_free() {
                open.journal.push(candidate);
            }
        }

        let previous = self.read();
        match supersedes(&previous, &candidate, now) {
            Ok(()) => {
                self.publish(candidate);
                tracing::info!(
                    from = %previous.state,
                    to = %candidate.state,
                    transaction_id = ?candidate.justification.map(|j| j.transaction_id),
                    "entitlement committed"
                );
                CommitOutcome::Committed { previous }
            }
            Err(kept) => {
                tracing::debug!(current = %previous.state, candidate = %candidate.state, %kept, "entitlement unchanged");
                CommitOutcome::Unchanged(kept)
            }
        }
    }

    /// Open a restore; a previously open restore is abandoned
    pub fn begin_restore(&self) -> RestoreTicket {
        let mut writer = self.writer.lock();
        writer.next_ticket += 1;
        let id = writer.next_ticket;
        if let Some(stale) = writer.restore.replace(OpenRestore {
            id,
            journal: Vec::new(),
        }) {
            tracing::debug!(ticket = stale.id, "open restore superseded");
        }
        RestoreTicket { id }
    }

    /// Commit a restored hypothesis, then re-apply live candidates journaled
    /// since the ticket was opened
    pub fn commit_restore(
        &self,
        ticket: RestoreTicket,
        hypothesis: Entitlement,
        now: Timestamp,
    ) -> Result<RestoreCommit, CacheError> {
        let mut writer = self.writer.lock();
        let open = match writer.restore.take() {
            Some(open) if open.id == ticket.id => open,
            other => {
                writer.restore = other;
                return Err(CacheError::StaleRestore(ticket.id));
            }
        };

        let mut committed = hypothesis;
        let mut replayed_live = 0;
        for candidate in open.journal {
            if supersedes(&committed, &candidate, now).is_ok() {
                committed = candidate;
                replayed_live += 1;
            }
        }

        let previous = self.read();
        self.publish(committed);

        let result = RestoreCommit {
            previous,
            committed,
            replayed_live,
        };
        if result.downgraded(now) {
            tracing::warn!(from = %previous.state, to = %committed.state, "restore downgraded entitlement");
        } else {
            tracing::info!(from = %previous.state, to = %committed.state, replayed_live, "restore committed");
        }
        Ok(result)
    }

    /// Drop an open restore without touching the committed decision
    pub fn abandon_restore(&self, ticket: RestoreTicket) {
        let mut writer = self.writer.lock();
        if writer.restore.as_ref().is_some_and(|open| open.id == ticket.id) {
            writer.restore = None;
            tracing::debug!(ticket = ticket.id, "restore abandoned");
        }
    }

    /// Publish under the writer lock; the read lock covers only the swap
    fn publish(&self, value: Entitlement) {
        *self.published.write() = value;
        self.revision.fetch_add(1, Ordering::AcqRel);

        if let Some(store) = &self.persistence {
            if let Err(err) = store.save(ENTITLEMENT_BLOB, &value) {
                tracing::warn!(blob = ENTITLEMENT_BLOB, error = %err, "failed to persist entitlement");
            }
        }
    }
}
