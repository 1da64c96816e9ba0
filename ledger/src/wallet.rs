//! # Virtual Wallets
//!
//! A [`VirtualWallet`] holds two decimal-string balances and nothing else.
//! There is no key material and no on-chain backing. [`WalletOverview`] is
//! the priced view served by `GET /api/wallet`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::amount;
use crate::error::LedgerError;
use crate::token::BalanceSlot;
use crate::transaction::TransactionDisplay;

// ---------------------------------------------------------------------------
// VirtualWallet
// ---------------------------------------------------------------------------

/// A wallet record as kept by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualWallet {
    pub id: Uuid,
    /// Lookup key in the store.
    pub address: String,
    pub owner_address: String,
    pub virtual_eth_balance: String,
    pub virtual_usdc_balance: String,
    pub created_at: DateTime<Utc>,
}

impl VirtualWallet {
    /// A fresh wallet with zero balances, owned by its own address.
    pub fn new(owner_address: &str) -> Self {
        Self::with_balances(owner_address, "0", "0")
    }

    pub fn with_balances(owner_address: &str, eth: &str, usdc: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            address: owner_address.to_string(),
            owner_address: owner_address.to_string(),
            virtual_eth_balance: eth.to_string(),
            virtual_usdc_balance: usdc.to_string(),
            created_at: Utc::now(),
        }
    }

    /// The raw stored string for `slot`.
    pub fn balance_str(&self, slot: BalanceSlot) -> &str {
        match slot {
            BalanceSlot::Eth => &self.virtual_eth_balance,
            BalanceSlot::Usdc => &self.virtual_usdc_balance,
        }
    }

    /// Parses the stored balance for `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::CorruptBalance`] if the stored string is not a
    /// decimal.
    pub fn balance(&self, slot: BalanceSlot) -> Result<Decimal, LedgerError> {
        let raw = self.balance_str(slot);
        amount::parse_balance(raw).ok_or_else(|| LedgerError::CorruptBalance {
            address: self.address.clone(),
            value: raw.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Overview
// ---------------------------------------------------------------------------

/// One priced token line in the wallet overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub symbol: String,
    pub name: String,
    pub virtual_balance: String,
    pub usd_value: String,
    pub change_24h: f64,
    pub icon: String,
}

/// Response body of `GET /api/wallet`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletOverview {
    pub address: String,
    pub total_value_usd: String,
    pub tokens: Vec<TokenBalance>,
    pub recent_transactions: Vec<TransactionDisplay>,
}
