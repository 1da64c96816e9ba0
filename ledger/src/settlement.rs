//! # Delayed Settlement
//!
//! Transfers and withdrawals are acknowledged immediately and confirmed
//! later. [`SettlementSupervisor`] owns one tokio task per pending
//! transaction. When the delay elapses the task marks the transaction
//! `confirmed` and attaches a decoy hash from [`random_tx_hash`].
//!
//! Every scheduled task is tracked by transaction id, so settlements can be
//! cancelled one by one or all at once on shutdown. A cancelled settlement
//! leaves its transaction `pending`; the debit it belongs to is not undone.
//!
//! ```text
//!   schedule(id, delay) ──► [tracked] ──sleep──► confirm + hash ──► [untracked]
//!                              │
//!                   cancel(id) / shutdown()
//!                              ▼
//!                         aborted, tx stays pending
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::Rng;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::store::LedgerStore;
use crate::transaction::TransactionStatus;

/// Broadcast capacity for settlement notifications.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Generates a `0x`-prefixed, 64-hex-digit random hash.
///
/// This is a display decoy, not a digest of anything.
pub fn random_tx_hash() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    format!("0x{}", hex::encode(bytes))
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Notifications published by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementEvent {
    /// A settlement timer fired and the transaction is now confirmed.
    Confirmed { transaction_id: Uuid, tx_hash: String },
    /// A settlement was aborted before its timer fired.
    Cancelled { transaction_id: Uuid },
}

// ---------------------------------------------------------------------------
// SettlementSupervisor
// ---------------------------------------------------------------------------

/// Schedules, tracks and cancels delayed settlements.
pub struct SettlementSupervisor {
    store: Arc<dyn LedgerStore>,
    tasks: Arc<DashMap<Uuid, JoinHandle<()>>>,
    events: broadcast::Sender<SettlementEvent>,
    closed: AtomicBool,
}

impl std::fmt::Debug for SettlementSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementSupervisor")
            .field("pending", &self.tasks.len())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

impl SettlementSupervisor {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            tasks: Arc::new(DashMap::new()),
            events,
            closed: AtomicBool::new(false),
        }
    }

    /// Subscribes to settlement notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SettlementEvent> {
        self.events.subscribe()
    }

    /// Schedules confirmation of `tx_id` after `delay`.
    ///
    /// Must be called from within a tokio runtime. Returns `false` if the
    /// transaction already has a settlement scheduled or the supervisor has
    /// been shut down.
    pub fn schedule(&self, tx_id: Uuid, delay: Duration) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            tracing::warn!(%tx_id, "settlement supervisor is shut down, not scheduling");
            return false;
        }

        // The shard lock is held until the handle is stored, so a task that
        // finishes immediately cannot remove its entry before it exists.
        match self.tasks.entry(tx_id) {
            Entry::Occupied(_) => return false,
            Entry::Vacant(slot) => {
                let store = Arc::clone(&self.store);
                let tasks = Arc::clone(&self.tasks);
                let events = self.events.clone();
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    tasks.remove(&tx_id);
                    settle(store.as_ref(), &events, tx_id);
                });
                slot.insert(handle);
            }
        }

        // A shutdown that collected its ids before the insert above never
        // sees this entry.
        if self.closed.load(Ordering::SeqCst) {
            if let Some((_, handle)) = self.tasks.remove(&tx_id) {
                handle.abort();
            }
            tracing::warn!(%tx_id, "settlement supervisor shut down while scheduling");
            return false;
        }

        tracing::debug!(%tx_id, delay_ms = delay.as_millis() as u64, "settlement scheduled");
        true
    }

    /// Aborts the pending settlement of `tx_id`. Returns `true` if one was
    /// pending.
    pub fn cancel(&self, tx_id: Uuid) -> bool {
        match self.tasks.remove(&tx_id) {
            Some((_, handle)) => {
                handle.abort();
                let _ = self.events.send(SettlementEvent::Cancelled {
                    transaction_id: tx_id,
                });
                tracing::info!(%tx_id, "settlement cancelled");
                true
            }
            None => false,
        }
    }

    /// Number of settlements that have not fired yet.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_pending(&self, tx_id: Uuid) -> bool {
        self.tasks.contains_key(&tx_id)
    }

    /// Aborts every outstanding settlement and refuses new ones.
    ///
    /// Returns the ids that were still pending. Their transactions remain
    /// `pending` in the store.
    pub fn shutdown(&self) -> Vec<Uuid> {
        self.closed.store(true, Ordering::SeqCst);
        let ids: Vec<Uuid> = self.tasks.iter().map(|entry| *entry.key()).collect();
        ids.into_iter().filter(|id| self.cancel(*id)).collect()
    }
}

/// Marks `tx_id` confirmed with a fresh hash and announces it.
fn settle(store: &dyn LedgerStore, events: &broadcast::Sender<SettlementEvent>, tx_id: Uuid) {
    let tx_hash = random_tx_hash();
    match store.update_transaction_status(tx_id, TransactionStatus::Confirmed, Some(&tx_hash)) {
        Some(_) => {
            tracing::info!(%tx_id, %tx_hash, "transaction settled");
            let _ = events.send(SettlementEvent::Confirmed {
                transaction_id: tx_id,
                tx_hash,
            });
        }
        None => {
            tracing::warn!(%tx_id, "settled transaction no longer exists");
        }
    }
}
