//! # Ledger Store
//!
//! The store owns every wallet and transaction record. Nothing else in the
//! workspace mutates them directly; the mutation core goes through the
//! [`LedgerStore`] trait and the node only ever talks to the core.
//!
//! ## Semantics
//!
//! - Lookups for missing entities return `None` or an empty list. No store
//!   operation fails.
//! - Wallets are keyed by address, transactions by id.
//! - Transactions are append-only. Listings are newest first; records with
//!   identical timestamps come out in reverse insertion order.
//!
//! [`MemoryStore`] keeps everything in process memory behind
//! `parking_lot::RwLock`s. Each instance is independent, so tests build
//! their own.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::config;
use crate::transaction::{NewTransaction, Transaction, TransactionKind, TransactionStatus};
use crate::wallet::VirtualWallet;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Storage contract for wallets and transactions.
pub trait LedgerStore: Send + Sync {
    /// Returns the wallet stored under `address`.
    fn get_wallet(&self, address: &str) -> Option<VirtualWallet>;

    /// Returns the wallet for `owner_address`, creating an empty one first
    /// if none exists.
    fn get_or_create_wallet(&self, owner_address: &str) -> VirtualWallet;

    /// Overwrites both balances of the wallet at `address`. Returns the
    /// updated wallet, or `None` if it does not exist.
    fn update_wallet_balance(
        &self,
        address: &str,
        eth_balance: &str,
        usdc_balance: &str,
    ) -> Option<VirtualWallet>;

    /// All transactions of a wallet, newest first.
    fn get_transactions(&self, wallet_id: Uuid) -> Vec<Transaction>;

    fn get_transaction(&self, id: Uuid) -> Option<Transaction>;

    /// Stores a new transaction, assigning its id and creation time.
    fn create_transaction(&self, new: NewTransaction) -> Transaction;

    /// Sets the status of a transaction. The hash is only replaced when one
    /// is supplied.
    fn update_transaction_status(
        &self,
        id: Uuid,
        status: TransactionStatus,
        tx_hash: Option<&str>,
    ) -> Option<Transaction>;

    /// The earliest-created wallet, used when the configured default is
    /// missing.
    fn default_wallet(&self) -> Option<VirtualWallet>;

    fn wallet_count(&self) -> usize;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Insertion-ordered transaction table with an id index.
#[derive(Debug, Default)]
struct TransactionTable {
    records: Vec<Transaction>,
    index: HashMap<Uuid, usize>,
}

/// Process-memory implementation of [`LedgerStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    wallets: RwLock<HashMap<String, VirtualWallet>>,
    transactions: RwLock<TransactionTable>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the demo wallet and its history.
    pub fn with_demo_wallet(address: &str) -> Self {
        let store = Self::new();
        seed_demo_wallet(&store, address);
        store
    }
}

impl LedgerStore for MemoryStore {
    fn get_wallet(&self, address: &str) -> Option<VirtualWallet> {
        self.wallets.read().get(address).cloned()
    }

    fn get_or_create_wallet(&self, owner_address: &str) -> VirtualWallet {
        let mut wallets = self.wallets.write();
        wallets
            .entry(owner_address.to_string())
            .or_insert_with(|| {
                tracing::debug!(address = owner_address, "creating empty wallet");
                VirtualWallet::new(owner_address)
            })
            .clone()
    }

    fn update_wallet_balance(
        &self,
        address: &str,
        eth_balance: &str,
        usdc_balance: &str,
    ) -> Option<VirtualWallet> {
        let mut wallets = self.wallets.write();
        let wallet = wallets.get_mut(address)?;
        wallet.virtual_eth_balance = eth_balance.to_string();
        wallet.virtual_usdc_balance = usdc_balance.to_string();
        Some(wallet.clone())
    }

    fn get_transactions(&self, wallet_id: Uuid) -> Vec<Transaction> {
        let table = self.transactions.read();
        let mut txs: Vec<Transaction> = table
            .records
            .iter()
            .rev()
            .filter(|tx| tx.wallet_id == wallet_id)
            .cloned()
            .collect();
        // Stable sort keeps reverse insertion order for equal timestamps.
        txs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        txs
    }

    fn get_transaction(&self, id: Uuid) -> Option<Transaction> {
        let table = self.transactions.read();
        table.index.get(&id).map(|&i| table.records[i].clone())
    }

    fn create_transaction(&self, new: NewTransaction) -> Transaction {
        let tx = Transaction {
            id: Uuid::new_v4(),
            wallet_id: new.wallet_id,
            kind: new.kind,
            token_symbol: new.token_symbol,
            amount: new.amount,
            to_address: new.to_address,
            from_address: new.from_address,
            tx_hash: new.tx_hash,
            status: new.status,
            gas_fee: new.gas_fee,
            created_at: new.created_at.unwrap_or_else(Utc::now),
        };

        let mut table = self.transactions.write();
        let position = table.records.len();
        table.index.insert(tx.id, position);
        table.records.push(tx.clone());
        tx
    }

    fn update_transaction_status(
        &self,
        id: Uuid,
        status: TransactionStatus,
        tx_hash: Option<&str>,
    ) -> Option<Transaction> {
        let mut table = self.transactions.write();
        let position = *table.index.get(&id)?;
        let tx = &mut table.records[position];
        tx.status = status;
        if let Some(hash) = tx_hash {
            tx.tx_hash = Some(hash.to_string());
        }
        Some(tx.clone())
    }

    fn default_wallet(&self) -> Option<VirtualWallet> {
        self.wallets
            .read()
            .values()
            .min_by_key(|w| w.created_at)
            .cloned()
    }

    fn wallet_count(&self) -> usize {
        self.wallets.read().len()
    }
}

// ---------------------------------------------------------------------------
// Demo Seed
// ---------------------------------------------------------------------------

/// Seeds the demo wallet at `address` with its starting balances and four
/// historic transactions. Calling it twice adds the history twice.
pub fn seed_demo_wallet(store: &dyn LedgerStore, address: &str) -> VirtualWallet {
    store.get_or_create_wallet(address);
    let wallet = store
        .update_wallet_balance(address, config::DEMO_ETH_BALANCE, config::DEMO_USDC_BALANCE)
        .unwrap_or_else(|| VirtualWallet::new(address));

    let now = Utc::now();
    let history = [
        NewTransaction::new(wallet.id, TransactionKind::Send, "ETH", "0.5")
            .to_address("0x8ba1f109551bD432803012645Hac136E9E5d98f")
            .from_address(address)
            .tx_hash("0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef")
            .status(TransactionStatus::Confirmed)
            .gas_fee("0.002")
            .created_at(now - Duration::hours(2)),
        NewTransaction::new(wallet.id, TransactionKind::Receive, "USDC", "1000.00")
            .to_address(address)
            .from_address("0xdAC17F958D2ee523a2206206994597C13D831ec7")
            .tx_hash("0xabcdef1234567890abcdef1234567890abcdef1234567890abcdef1234567890")
            .status(TransactionStatus::Confirmed)
            .gas_fee("0.001")
            .created_at(now - Duration::hours(24)),
        NewTransaction::new(wallet.id, TransactionKind::Convert, "ETH", "1.0")
            .tx_hash("0x5678901234abcdef5678901234abcdef5678901234abcdef5678901234abcdef")
            .status(TransactionStatus::Confirmed)
            .gas_fee("0.003")
            .created_at(now - Duration::hours(48)),
        NewTransaction::new(wallet.id, TransactionKind::Withdraw, "USDC", "500.00")
            .to_address("0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC")
            .from_address(address)
            .gas_fee("0.002")
            .created_at(now - Duration::minutes(30)),
    ];
    for new in history {
        store.create_transaction(new);
    }

    tracing::info!(address, "demo wallet seeded");
    wallet
}
