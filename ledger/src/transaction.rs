//! # Transaction Records
//!
//! A [`Transaction`] is created once per wallet action and mutated at most
//! once afterwards, when settlement moves it from `pending` to `confirmed`
//! and attaches a hash. Conversions are recorded already confirmed.
//!
//! [`TransactionDisplay`] is the client-facing projection: timestamps as
//! RFC 3339 strings and empty optional fields left out of the JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// TransactionKind
// ---------------------------------------------------------------------------

/// The wallet action a transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Send,
    Receive,
    Convert,
    Withdraw,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send => write!(f, "send"),
            Self::Receive => write!(f, "receive"),
            Self::Convert => write!(f, "convert"),
            Self::Withdraw => write!(f, "withdraw"),
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a transaction.
///
/// `Pending → Confirmed` through settlement, or `Confirmed` at creation for
/// conversions. `Failed` is part of the wire format but nothing in the
/// ledger produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Confirmed,
    Failed,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A stored ledger transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Token symbol as submitted by the client (e.g. `"USDQ"`).
    pub token_symbol: String,
    /// Amount as a decimal string, exactly as submitted.
    pub amount: String,
    pub to_address: Option<String>,
    pub from_address: Option<String>,
    pub tx_hash: Option<String>,
    pub status: TransactionStatus,
    pub gas_fee: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Client-facing projection of this record.
    pub fn to_display(&self) -> TransactionDisplay {
        TransactionDisplay {
            id: self.id.to_string(),
            kind: self.kind,
            token_symbol: self.token_symbol.clone(),
            amount: self.amount.clone(),
            to_address: non_empty(&self.to_address),
            from_address: non_empty(&self.from_address),
            tx_hash: non_empty(&self.tx_hash),
            status: self.status,
            gas_fee: non_empty(&self.gas_fee),
            created_at: self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

fn non_empty(field: &Option<String>) -> Option<String> {
    field.as_ref().filter(|s| !s.is_empty()).cloned()
}

// ---------------------------------------------------------------------------
// NewTransaction
// ---------------------------------------------------------------------------

/// Input to [`LedgerStore::create_transaction`](crate::store::LedgerStore::create_transaction).
///
/// The store assigns the id and creation time. `status` defaults to
/// `Pending`; `created_at` is only set when seeding historic records.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub wallet_id: Uuid,
    pub kind: TransactionKind,
    pub token_symbol: String,
    pub amount: String,
    pub to_address: Option<String>,
    pub from_address: Option<String>,
    pub tx_hash: Option<String>,
    pub status: TransactionStatus,
    pub gas_fee: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl NewTransaction {
    /// A pending record with no addresses, hash or fee.
    pub fn new(
        wallet_id: Uuid,
        kind: TransactionKind,
        token_symbol: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            wallet_id,
            kind,
            token_symbol: token_symbol.into(),
            amount: amount.into(),
            to_address: None,
            from_address: None,
            tx_hash: None,
            status: TransactionStatus::default(),
            gas_fee: None,
            created_at: None,
        }
    }

    pub fn to_address(mut self, address: impl Into<String>) -> Self {
        self.to_address = Some(address.into());
        self
    }

    pub fn from_address(mut self, address: impl Into<String>) -> Self {
        self.from_address = Some(address.into());
        self
    }

    pub fn tx_hash(mut self, hash: impl Into<String>) -> Self {
        self.tx_hash = Some(hash.into());
        self
    }

    pub fn status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn gas_fee(mut self, fee: impl Into<String>) -> Self {
        self.gas_fee = Some(fee.into());
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }
}

// ---------------------------------------------------------------------------
// TransactionDisplay
// ---------------------------------------------------------------------------

/// Transaction as returned by the REST API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDisplay {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub token_symbol: String,
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_fee: Option<String>,
    pub created_at: String,
}
