//! # Wallet Ledger
//!
//! [`WalletLedger`] is the mutation core behind the REST API. It validates
//! requests, checks and moves balances, records transactions and hands
//! pending ones to the [`SettlementSupervisor`].
//!
//! ## Per-wallet serialization
//!
//! The balance check, the debit/credit and the store write for one wallet
//! run under that wallet's mutex. Two concurrent requests against the same
//! wallet can therefore never both pass the check against the same
//! pre-debit balance. Different wallets do not contend.
//!
//! ## Ordering
//!
//! A transfer or withdrawal debits the balance before its transaction is
//! settled. Cancelling a settlement (or shutting down) leaves the debit in
//! place and the transaction `pending`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::amount;
use crate::config::{LedgerConfig, RECENT_TRANSACTION_LIMIT};
use crate::error::LedgerError;
use crate::pricing::{ExchangeRates, GasEstimate, PricingProvider, StaticPricing};
use crate::request::{ConvertPayload, TransferPayload, WithdrawPayload};
use crate::settlement::SettlementSupervisor;
use crate::store::{seed_demo_wallet, LedgerStore, MemoryStore};
use crate::token::{BalanceSlot, TokenSymbol};
use crate::transaction::{
    NewTransaction, Transaction, TransactionDisplay, TransactionKind, TransactionStatus,
};
use crate::wallet::{TokenBalance, VirtualWallet, WalletOverview};

// ---------------------------------------------------------------------------
// Receipt
// ---------------------------------------------------------------------------

/// Synchronous acknowledgment returned by the mutating endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub success: bool,
    pub transaction_id: String,
    pub message: String,
}

impl SubmissionReceipt {
    fn accepted(tx: &Transaction, message: &str) -> Self {
        Self {
            success: true,
            transaction_id: tx.id.to_string(),
            message: message.to_string(),
        }
    }
}

/// An outgoing debit: shared shape of transfers and withdrawals.
struct Debit<'a> {
    wallet_address: &'a str,
    token: TokenSymbol,
    amount: &'a str,
    amount_value: Decimal,
    to_address: &'a str,
    kind: TransactionKind,
    gas_fee: &'a str,
    settle_after: Duration,
}

// ---------------------------------------------------------------------------
// WalletLedger
// ---------------------------------------------------------------------------

/// The ledger service shared by all request handlers.
pub struct WalletLedger {
    store: Arc<dyn LedgerStore>,
    pricing: Arc<dyn PricingProvider>,
    settlements: SettlementSupervisor,
    locks: DashMap<String, Arc<Mutex<()>>>,
    config: LedgerConfig,
}

impl std::fmt::Debug for WalletLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletLedger")
            .field("wallets", &self.store.wallet_count())
            .field("settlements", &self.settlements)
            .field("config", &self.config)
            .finish()
    }
}

impl WalletLedger {
    /// Builds a ledger over an existing store and pricing provider.
    pub fn new(
        store: Arc<dyn LedgerStore>,
        pricing: Arc<dyn PricingProvider>,
        config: LedgerConfig,
    ) -> Self {
        let settlements = SettlementSupervisor::new(Arc::clone(&store));
        Self {
            store,
            pricing,
            settlements,
            locks: DashMap::new(),
            config,
        }
    }

    /// Builds a ledger over a fresh [`MemoryStore`] and [`StaticPricing`],
    /// seeding the demo wallet when the configuration asks for it.
    pub fn in_memory(config: LedgerConfig) -> Self {
        let store = MemoryStore::new();
        if config.seed_demo_wallet {
            seed_demo_wallet(&store, &config.default_wallet);
        }
        let pricing = StaticPricing::new(config.pricing.clone());
        Self::new(Arc::new(store), Arc::new(pricing), config)
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    pub fn settlements(&self) -> &SettlementSupervisor {
        &self.settlements
    }

    fn wallet_lock(&self, address: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(address.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// `POST /api/transfer`: debit the source wallet and schedule settlement.
    pub async fn transfer(&self, payload: &TransferPayload) -> Result<SubmissionReceipt, LedgerError> {
        let req = payload.validate()?;
        let tx = self
            .debit(Debit {
                wallet_address: &req.from_wallet_address,
                token: req.token,
                amount: &req.amount,
                amount_value: req.amount_value,
                to_address: &req.to_address,
                kind: TransactionKind::Send,
                gas_fee: &self.config.send_gas_fee,
                settle_after: self.config.send_delay,
            })
            .await?;
        Ok(SubmissionReceipt::accepted(&tx, "Transfer submitted successfully"))
    }

    /// `POST /api/withdraw`: debit the default wallet and schedule settlement.
    pub async fn withdraw(&self, payload: &WithdrawPayload) -> Result<SubmissionReceipt, LedgerError> {
        let req = payload.validate()?;
        let tx = self
            .debit(Debit {
                wallet_address: &self.config.default_wallet,
                token: req.token,
                amount: &req.amount,
                amount_value: req.amount_value,
                to_address: &req.to_address,
                kind: TransactionKind::Withdraw,
                gas_fee: &self.config.withdraw_gas_fee,
                settle_after: self.config.withdraw_delay,
            })
            .await?;
        Ok(SubmissionReceipt::accepted(&tx, "Withdrawal submitted successfully"))
    }

    async fn debit(&self, debit: Debit<'_>) -> Result<Transaction, LedgerError> {
        if self.store.get_wallet(debit.wallet_address).is_none() {
            return Err(LedgerError::WalletNotFound);
        }

        let lock = self.wallet_lock(debit.wallet_address);
        let tx = {
            let _guard = lock.lock().await;
            let wallet = self
                .store
                .get_wallet(debit.wallet_address)
                .ok_or(LedgerError::WalletNotFound)?;

            let slot = debit.token.slot();
            let balance = wallet.balance(slot)?;
            if debit.amount_value > balance {
                tracing::debug!(
                    wallet = %wallet.address,
                    token = %debit.token,
                    requested = %debit.amount_value,
                    available = %balance,
                    "debit rejected"
                );
                return Err(LedgerError::insufficient());
            }

            let remaining = amount::to_plain_string(balance - debit.amount_value);
            let (eth, usdc) = match slot {
                BalanceSlot::Eth => (remaining.as_str(), wallet.virtual_usdc_balance.as_str()),
                BalanceSlot::Usdc => (wallet.virtual_eth_balance.as_str(), remaining.as_str()),
            };
            self.store
                .update_wallet_balance(&wallet.address, eth, usdc)
                .ok_or(LedgerError::WalletNotFound)?;

            self.store.create_transaction(
                NewTransaction::new(wallet.id, debit.kind, debit.token.as_str(), debit.amount)
                    .to_address(debit.to_address)
                    .from_address(wallet.address.as_str())
                    .gas_fee(debit.gas_fee),
            )
        };

        self.settlements.schedule(tx.id, debit.settle_after);
        tracing::info!(
            tx_id = %tx.id,
            kind = %tx.kind,
            token = %tx.token_symbol,
            amount = %tx.amount,
            to = debit.to_address,
            "debit accepted, settlement pending"
        );
        Ok(tx)
    }

    /// `POST /api/convert`: swap between the two slots of the default wallet
    /// at the provider's rate. Recorded as confirmed immediately.
    pub async fn convert(&self, payload: &ConvertPayload) -> Result<SubmissionReceipt, LedgerError> {
        let req = payload.validate()?;
        let address = self.config.default_wallet.as_str();
        if self.store.get_wallet(address).is_none() {
            return Err(LedgerError::WalletNotFound);
        }

        let lock = self.wallet_lock(address);
        let tx = {
            let _guard = lock.lock().await;
            let wallet = self
                .store
                .get_wallet(address)
                .ok_or(LedgerError::WalletNotFound)?;
            let (eth, usdc) = self.converted_balances(&wallet, req.from_token, req.amount_value)?;

            self.store
                .update_wallet_balance(&wallet.address, &eth, &usdc)
                .ok_or(LedgerError::WalletNotFound)?;

            self.store.create_transaction(
                NewTransaction::new(
                    wallet.id,
                    TransactionKind::Convert,
                    req.from_token.as_str(),
                    req.amount.as_str(),
                )
                .status(TransactionStatus::Confirmed)
                .gas_fee(self.config.convert_gas_fee.as_str()),
            )
        };

        tracing::info!(
            tx_id = %tx.id,
            from = %req.from_token,
            to = %req.to_token,
            amount = %req.amount,
            "conversion completed"
        );
        Ok(SubmissionReceipt::accepted(&tx, "Conversion completed successfully"))
    }

    /// New `(eth, usdc)` balance strings after converting `amount` out of
    /// the slot of `from`.
    fn converted_balances(
        &self,
        wallet: &VirtualWallet,
        from: TokenSymbol,
        amount_value: Decimal,
    ) -> Result<(String, String), LedgerError> {
        let eth = wallet.balance(BalanceSlot::Eth)?;
        let usdc = wallet.balance(BalanceSlot::Usdc)?;
        let overflow = || LedgerError::Overflow {
            address: wallet.address.clone(),
        };

        match from.slot() {
            BalanceSlot::Eth => {
                if amount_value > eth {
                    return Err(LedgerError::InsufficientBalance {
                        message: "Insufficient USDQ balance".to_string(),
                    });
                }
                let credit = amount_value
                    .checked_mul(self.pricing.eth_to_usdc())
                    .ok_or_else(overflow)?;
                let new_usdc = usdc.checked_add(credit).ok_or_else(overflow)?;
                Ok((
                    amount::to_plain_string(eth - amount_value),
                    amount::to_fixed(new_usdc, BalanceSlot::Usdc.decimals()),
                ))
            }
            BalanceSlot::Usdc => {
                if amount_value > usdc {
                    return Err(LedgerError::InsufficientBalance {
                        message: "Insufficient USDC balance".to_string(),
                    });
                }
                let credit = amount_value
                    .checked_mul(self.pricing.usdc_to_eth())
                    .ok_or_else(overflow)?;
                let new_eth = eth.checked_add(credit).ok_or_else(overflow)?;
                Ok((
                    amount::to_fixed(new_eth, BalanceSlot::Eth.decimals()),
                    amount::to_fixed(usdc - amount_value, BalanceSlot::Usdc.decimals()),
                ))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// `GET /api/wallet`: the default wallet, or the earliest-created one if
    /// the default is missing, priced and with its recent history.
    pub fn wallet_overview(&self) -> Result<WalletOverview, LedgerError> {
        let wallet = self
            .store
            .get_wallet(&self.config.default_wallet)
            .or_else(|| self.store.default_wallet())
            .ok_or(LedgerError::WalletNotFound)?;
        self.build_overview(&wallet)
    }

    fn build_overview(&self, wallet: &VirtualWallet) -> Result<WalletOverview, LedgerError> {
        let overflow = || LedgerError::Overflow {
            address: wallet.address.clone(),
        };
        let line = |slot: BalanceSlot, symbol: &str, name: &str, icon: &str| {
            let value = wallet
                .balance(slot)?
                .checked_mul(self.pricing.price_usd(slot))
                .ok_or_else(overflow)?;
            Ok::<_, LedgerError>((
                value,
                TokenBalance {
                    symbol: symbol.to_string(),
                    name: name.to_string(),
                    virtual_balance: wallet.balance_str(slot).to_string(),
                    usd_value: amount::to_fixed(value, 2),
                    change_24h: self.pricing.change_24h(slot),
                    icon: icon.to_string(),
                },
            ))
        };

        let (eth_value, eth_line) = line(BalanceSlot::Eth, "ETH", "Ethereum", "eth")?;
        let (usdc_value, usdc_line) = line(BalanceSlot::Usdc, "USDC", "USD Coin", "usdc")?;
        let total = eth_value.checked_add(usdc_value).ok_or_else(overflow)?;

        let recent_transactions = self
            .store
            .get_transactions(wallet.id)
            .iter()
            .take(RECENT_TRANSACTION_LIMIT)
            .map(Transaction::to_display)
            .collect();

        Ok(WalletOverview {
            address: wallet.address.clone(),
            total_value_usd: amount::to_fixed(total, 2),
            tokens: vec![eth_line, usdc_line],
            recent_transactions,
        })
    }

    /// `GET /api/transactions`: full history of the default wallet, newest
    /// first. Empty if the wallet does not exist.
    pub fn transactions(&self) -> Vec<TransactionDisplay> {
        match self.store.get_wallet(&self.config.default_wallet) {
            Some(wallet) => self
                .store
                .get_transactions(wallet.id)
                .iter()
                .map(Transaction::to_display)
                .collect(),
            None => Vec::new(),
        }
    }

    /// `GET /api/transactions/:id`.
    pub fn transaction(&self, id: &str) -> Result<TransactionDisplay, LedgerError> {
        let id = Uuid::parse_str(id).map_err(|_| LedgerError::TransactionNotFound)?;
        self.store
            .get_transaction(id)
            .map(|tx| tx.to_display())
            .ok_or(LedgerError::TransactionNotFound)
    }

    pub fn gas_estimate(&self) -> GasEstimate {
        self.pricing.gas_estimate()
    }

    pub fn rates(&self) -> ExchangeRates {
        self.pricing.rates(Utc::now())
    }

    /// Stops all outstanding settlements. Returns the ids left pending.
    pub fn shutdown(&self) -> Vec<Uuid> {
        let pending = self.settlements.shutdown();
        if !pending.is_empty() {
            tracing::warn!(
                count = pending.len(),
                "shutting down with unsettled transactions"
            );
        }
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEMO_WALLET_ADDRESS;

    const DEST: &str = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC";

    fn demo_ledger() -> WalletLedger {
        WalletLedger::in_memory(LedgerConfig::default())
    }

    fn empty_ledger() -> WalletLedger {
        WalletLedger::in_memory(LedgerConfig {
            seed_demo_wallet: false,
            ..LedgerConfig::default()
        })
    }

    fn transfer(token: &str, amount: &str) -> TransferPayload {
        TransferPayload {
            token: Some(token.into()),
            amount: Some(amount.into()),
            to_address: Some(DEST.into()),
            from_wallet_address: Some(DEMO_WALLET_ADDRESS.into()),
        }
    }

    fn convert(from: &str, to: &str, amount: &str) -> ConvertPayload {
        ConvertPayload {
            from_token: Some(from.into()),
            to_token: Some(to.into()),
            amount: Some(amount.into()),
        }
    }

    fn demo_wallet(ledger: &WalletLedger) -> VirtualWallet {
        ledger.store().get_wallet(DEMO_WALLET_ADDRESS).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn transfer_debits_and_records_pending() {
        let ledger = demo_ledger();
        let receipt = ledger.transfer(&transfer("ETH", "0.5")).await.unwrap();

        assert!(receipt.success);
        assert_eq!(receipt.message, "Transfer submitted successfully");

        let wallet = demo_wallet(&ledger);
        assert_eq!(wallet.virtual_eth_balance, "2.0847");
        assert_eq!(wallet.virtual_usdc_balance, "4250.00");

        let tx = ledger.transaction(&receipt.transaction_id).unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.amount, "0.5");
        assert_eq!(tx.to_address.as_deref(), Some(DEST));
        assert_eq!(tx.gas_fee.as_deref(), Some("0.002"));
        assert!(tx.tx_hash.is_none());
        assert_eq!(ledger.settlements().pending(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transfer_settles_after_three_seconds() {
        let ledger = demo_ledger();
        let receipt = ledger.transfer(&transfer("ETH", "0.5")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(2_999)).await;
        let tx = ledger.transaction(&receipt.transaction_id).unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);

        tokio::time::sleep(Duration::from_millis(2)).await;
        let tx = ledger.transaction(&receipt.transaction_id).unwrap();
        assert_eq!(tx.status, TransactionStatus::Confirmed);
        let hash = tx.tx_hash.unwrap();
        assert_eq!(hash.len(), 66);
        assert!(hash[2..].chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    }

    #[tokio::test(start_paused = true)]
    async fn usdc_transfer_uses_usdc_slot() {
        let ledger = demo_ledger();
        ledger.transfer(&transfer("USDC", "250")).await.unwrap();

        let wallet = demo_wallet(&ledger);
        assert_eq!(wallet.virtual_eth_balance, "2.5847");
        assert_eq!(wallet.virtual_usdc_balance, "4000");
    }

    #[tokio::test(start_paused = true)]
    async fn overdraft_is_rejected_without_mutation() {
        let ledger = demo_ledger();
        let before = ledger.transactions().len();

        let err = ledger.transfer(&transfer("ETH", "2.5848")).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(err.to_string(), "Insufficient balance");

        assert_eq!(demo_wallet(&ledger).virtual_eth_balance, "2.5847");
        assert_eq!(ledger.transactions().len(), before);
        assert_eq!(ledger.settlements().pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn whole_balance_can_be_sent() {
        let ledger = demo_ledger();
        ledger.transfer(&transfer("ETH", "2.5847")).await.unwrap();
        assert_eq!(demo_wallet(&ledger).virtual_eth_balance, "0");
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_source_wallet_is_not_found() {
        let ledger = demo_ledger();
        let mut payload = transfer("ETH", "0.1");
        payload.from_wallet_address = Some(format!("0x{}", "9".repeat(40)));

        let err = ledger.transfer(&payload).await.unwrap_err();
        assert!(matches!(err, LedgerError::WalletNotFound));
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_address_is_rejected_before_mutation() {
        let ledger = demo_ledger();
        let mut payload = transfer("ETH", "0.1");
        payload.to_address = Some("0x123".into());

        let err = ledger.transfer(&payload).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation { .. }));
        assert_eq!(demo_wallet(&ledger).virtual_eth_balance, "2.5847");
        assert_eq!(ledger.transactions().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn underscore_amount_is_rejected_before_mutation() {
        let ledger = demo_ledger();

        let err = ledger.transfer(&transfer("USDC", "1_000")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation { .. }));
        assert_eq!(demo_wallet(&ledger).virtual_usdc_balance, "4250.00");
        assert_eq!(ledger.transactions().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn withdraw_to_short_address_is_rejected() {
        let ledger = demo_ledger();
        let payload = WithdrawPayload {
            token: Some("USDC".into()),
            amount: Some("500".into()),
            to_address: Some("0x123".into()),
        };

        let err = ledger.withdraw(&payload).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid withdrawal request");
        assert!(matches!(err, LedgerError::Validation { .. }));
        assert_eq!(demo_wallet(&ledger).virtual_usdc_balance, "4250.00");
        assert_eq!(ledger.transactions().len(), 4);
        assert_eq!(ledger.settlements().pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_transfers_cannot_overdraw() {
        let ledger = Arc::new(demo_ledger());
        let mut handles = Vec::new();
        for _ in 0..2 {
            let ledger = Arc::clone(&ledger);
            handles.push(tokio::spawn(async move {
                ledger.transfer(&transfer("ETH", "2")).await
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(demo_wallet(&ledger).virtual_eth_balance, "0.5847");
    }

    #[tokio::test(start_paused = true)]
    async fn withdraw_settles_after_five_seconds() {
        let ledger = demo_ledger();
        let payload = WithdrawPayload {
            token: Some("USDC".into()),
            amount: Some("500".into()),
            to_address: Some(DEST.into()),
        };
        let receipt = ledger.withdraw(&payload).await.unwrap();
        assert_eq!(receipt.message, "Withdrawal submitted successfully");
        assert_eq!(demo_wallet(&ledger).virtual_usdc_balance, "3750");

        let tx = ledger.transaction(&receipt.transaction_id).unwrap();
        assert_eq!(tx.gas_fee.as_deref(), Some("0.003"));

        tokio::time::sleep(Duration::from_millis(4_000)).await;
        let tx = ledger.transaction(&receipt.transaction_id).unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);

        tokio::time::sleep(Duration::from_millis(1_001)).await;
        let tx = ledger.transaction(&receipt.transaction_id).unwrap();
        assert_eq!(tx.status, TransactionStatus::Confirmed);
    }

    #[tokio::test]
    async fn convert_eth_slot_to_usdc() {
        let ledger = demo_ledger();
        let receipt = ledger.convert(&convert("USDQ", "USDC", "1")).await.unwrap();
        assert_eq!(receipt.message, "Conversion completed successfully");

        let wallet = demo_wallet(&ledger);
        assert_eq!(wallet.virtual_eth_balance, "1.5847");
        assert_eq!(wallet.virtual_usdc_balance, "6595.67");

        let tx = ledger.transaction(&receipt.transaction_id).unwrap();
        assert_eq!(tx.status, TransactionStatus::Confirmed);
        assert_eq!(tx.token_symbol, "USDQ");
        assert!(tx.to_address.is_none());
        assert_eq!(ledger.settlements().pending(), 0);
    }

    #[tokio::test]
    async fn convert_usdc_slot_to_eth() {
        let ledger = demo_ledger();
        ledger.convert(&convert("USDC", "USDQ", "2345.67")).await.unwrap();

        let wallet = demo_wallet(&ledger);
        assert_eq!(wallet.virtual_eth_balance, "3.584700");
        assert_eq!(wallet.virtual_usdc_balance, "1904.33");
    }

    #[tokio::test]
    async fn convert_same_token_is_allowed() {
        let ledger = demo_ledger();
        assert!(ledger.convert(&convert("USDC", "USDC", "10")).await.is_ok());
    }

    #[tokio::test]
    async fn convert_overdraft_names_the_slot() {
        let ledger = demo_ledger();
        let err = ledger.convert(&convert("USDQ", "USDC", "3")).await.unwrap_err();
        assert_eq!(err.to_string(), "Insufficient USDQ balance");

        let err = ledger.convert(&convert("OP", "USDQ", "5000")).await.unwrap_err();
        assert_eq!(err.to_string(), "Insufficient USDC balance");
        assert_eq!(demo_wallet(&ledger).virtual_usdc_balance, "4250.00");
    }

    #[test]
    fn overview_prices_balances() {
        let ledger = demo_ledger();
        let overview = ledger.wallet_overview().unwrap();

        assert_eq!(overview.address, DEMO_WALLET_ADDRESS);
        // 2.5847 * 2345.67 = 6062.853249
        assert_eq!(overview.tokens[0].usd_value, "6062.85");
        assert_eq!(overview.tokens[1].usd_value, "4250.00");
        assert_eq!(overview.total_value_usd, "10312.85");
        assert_eq!(overview.recent_transactions.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn overview_caps_recent_history() {
        let ledger = demo_ledger();
        for _ in 0..12 {
            ledger.transfer(&transfer("USDC", "1")).await.unwrap();
        }
        let overview = ledger.wallet_overview().unwrap();
        assert_eq!(overview.recent_transactions.len(), RECENT_TRANSACTION_LIMIT);
        assert_eq!(ledger.transactions().len(), 16);
    }

    #[test]
    fn overview_falls_back_to_earliest_wallet() {
        let ledger = empty_ledger();
        assert!(matches!(
            ledger.wallet_overview(),
            Err(LedgerError::WalletNotFound)
        ));

        let other = "0x5555555555555555555555555555555555555555";
        ledger.store().get_or_create_wallet(other);
        let overview = ledger.wallet_overview().unwrap();
        assert_eq!(overview.address, other);
        assert_eq!(overview.total_value_usd, "0.00");
    }

    #[test]
    fn empty_ledger_lists_no_transactions() {
        let ledger = empty_ledger();
        assert!(ledger.transactions().is_empty());
        assert!(matches!(
            ledger.transaction("not-a-uuid"),
            Err(LedgerError::TransactionNotFound)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_leaves_debits_pending() {
        let ledger = demo_ledger();
        let receipt = ledger.transfer(&transfer("ETH", "1")).await.unwrap();

        let pending = ledger.shutdown();
        assert_eq!(pending.len(), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        let tx = ledger.transaction(&receipt.transaction_id).unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(demo_wallet(&ledger).virtual_eth_balance, "1.5847");
    }
}
