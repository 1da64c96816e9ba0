//! Error types for ledger operations.
//!
//! Every fallible [`WalletLedger`](crate::ledger::WalletLedger) operation
//! returns a [`LedgerError`]. The variants line up with the three failure
//! tiers of the REST API: malformed input, business-rule rejections and
//! internal faults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-field validation messages, in the shape the web client expects:
/// `{ "formErrors": [...], "fieldErrors": { "amount": [...] } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldErrors {
    /// Errors that concern the request as a whole (e.g. unparsable body).
    pub form_errors: Vec<String>,
    /// Errors keyed by the offending field name.
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message against `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.field_errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Records a message that is not tied to a single field.
    pub fn add_form(&mut self, message: impl Into<String>) {
        self.form_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.form_errors.is_empty() && self.field_errors.is_empty()
    }

    /// Returns the messages recorded for `field`, if any.
    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.field_errors.get(field).map(Vec::as_slice)
    }
}

/// Errors that can occur while serving a wallet request.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The request failed schema validation. Nothing was mutated.
    #[error("{message}")]
    Validation {
        /// Summary such as "Invalid transfer request".
        message: String,
        /// Structured per-field details.
        errors: FieldErrors,
    },

    /// No wallet exists at the requested address.
    #[error("Wallet not found")]
    WalletNotFound,

    /// No transaction exists with the requested id.
    #[error("Transaction not found")]
    TransactionNotFound,

    /// The requested amount exceeds the available slot balance.
    #[error("{message}")]
    InsufficientBalance {
        /// Client-facing message, e.g. "Insufficient USDC balance".
        message: String,
    },

    /// A balance computation exceeded the decimal range.
    #[error("balance arithmetic overflow for wallet {address}")]
    Overflow { address: String },

    /// A stored balance string could not be parsed as a decimal.
    #[error("stored balance {value:?} for wallet {address} is not a decimal")]
    CorruptBalance {
        address: String,
        value: String,
    },
}

impl LedgerError {
    /// Shorthand for the generic insufficient-balance rejection.
    pub fn insufficient() -> Self {
        Self::InsufficientBalance {
            message: "Insufficient balance".to_string(),
        }
    }
}
