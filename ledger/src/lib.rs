// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Virtual Wallet Ledger
//!
//! An in-memory ledger for a demo wallet that holds two virtual balances,
//! an ETH slot and a USDC slot. Balances are decimal strings and every
//! computation on them uses exact decimal arithmetic.
//!
//! Transfers and withdrawals are acknowledged at once and settled after a
//! short delay with a decoy transaction hash. Conversions swap between the
//! two slots at a fixed rate and are confirmed immediately. Nothing here
//! touches a real chain.
//!
//! ## Modules
//!
//! - **config**: Demo constants, delays, fees and pricing defaults.
//! - **error**: The [`LedgerError`] taxonomy and per-field validation detail.
//! - **token**: Accepted token symbols and the balance slot each maps to.
//! - **amount**: Decimal parsing and formatting of balance strings.
//! - **wallet**: Wallet records and the priced overview.
//! - **transaction**: Transaction records, status lifecycle, display form.
//! - **store**: The [`LedgerStore`] contract and its in-memory implementation.
//! - **pricing**: The [`PricingProvider`] contract and static demo prices.
//! - **request**: Request payloads and their validation.
//! - **settlement**: Supervised, cancellable delayed settlement.
//! - **ledger**: [`WalletLedger`], the mutation core the API drives.

pub mod amount;
pub mod config;
pub mod error;
pub mod ledger;
pub mod pricing;
pub mod request;
pub mod settlement;
pub mod store;
pub mod token;
pub mod transaction;
pub mod wallet;

pub use config::LedgerConfig;
pub use error::{FieldErrors, LedgerError};
pub use ledger::{SubmissionReceipt, WalletLedger};
pub use pricing::{PricingProvider, StaticPricing};
pub use settlement::{SettlementEvent, SettlementSupervisor};
pub use store::{LedgerStore, MemoryStore};
