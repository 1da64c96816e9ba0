//! # Ledger Configuration & Constants
//!
//! Every demo constant the ledger relies on lives here: the seeded wallet,
//! nominal gas fees, settlement delays and mock prices. The mutation core
//! reads them through [`LedgerConfig`] and the pricing provider, never as
//! literals, so tests and the node binary can override any of them.

use std::time::Duration;

use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Demo Wallet
// ---------------------------------------------------------------------------

/// Address of the wallet seeded at start-up. The read endpoints and the
/// convert/withdraw handlers operate on this wallet.
pub const DEMO_WALLET_ADDRESS: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f1e2a7";

/// Initial ETH-slot balance of the demo wallet.
pub const DEMO_ETH_BALANCE: &str = "2.5847";

/// Initial USDC-slot balance of the demo wallet.
pub const DEMO_USDC_BALANCE: &str = "4250.00";

// ---------------------------------------------------------------------------
// Settlement
// ---------------------------------------------------------------------------

/// Delay before a submitted transfer is marked confirmed.
pub const SEND_SETTLEMENT_DELAY: Duration = Duration::from_secs(3);

/// Delay before a submitted withdrawal is marked confirmed.
pub const WITHDRAW_SETTLEMENT_DELAY: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

/// Nominal gas fee recorded on send transactions.
pub const SEND_GAS_FEE: &str = "0.002";

/// Nominal gas fee recorded on withdraw transactions.
pub const WITHDRAW_GAS_FEE: &str = "0.003";

/// Nominal gas fee recorded on convert transactions.
pub const CONVERT_GAS_FEE: &str = "0.001";

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// Number of transactions embedded in the wallet overview.
pub const RECENT_TRANSACTION_LIMIT: usize = 10;

/// Decimal places kept for USDC-denominated results.
pub const USDC_DECIMALS: u32 = 2;

/// Decimal places kept for ETH-denominated results.
pub const ETH_DECIMALS: u32 = 6;

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

/// Mock prices and the static gas estimate served by `/api/rates` and
/// `/api/gas-estimate`.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingConfig {
    /// USD price of one unit in the ETH slot. Also the ETH→USDC rate.
    pub eth_price_usd: Decimal,
    /// USD price of one unit in the USDC slot.
    pub usdc_price_usd: Decimal,
    /// Reported 24h change (percent) for the ETH slot.
    pub eth_change_24h: f64,
    /// Reported 24h change (percent) for the USDC slot.
    pub usdc_change_24h: f64,
    /// Gas estimate tiers, as decimal strings.
    pub gas_slow: String,
    pub gas_standard: String,
    pub gas_fast: String,
    /// Estimated confirmation time for the standard tier.
    pub estimated_time_seconds: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            eth_price_usd: Decimal::new(234_567, 2),
            usdc_price_usd: Decimal::ONE,
            eth_change_24h: 2.34,
            usdc_change_24h: 0.01,
            gas_slow: "0.001".to_string(),
            gas_standard: "0.002".to_string(),
            gas_fast: "0.004".to_string(),
            estimated_time_seconds: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Runtime configuration for [`WalletLedger`](crate::ledger::WalletLedger).
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    /// Wallet used by the read endpoints, convert and withdraw.
    pub default_wallet: String,
    /// Seed the demo wallet and its history on start-up.
    pub seed_demo_wallet: bool,
    pub send_delay: Duration,
    pub withdraw_delay: Duration,
    pub send_gas_fee: String,
    pub withdraw_gas_fee: String,
    pub convert_gas_fee: String,
    pub pricing: PricingConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_wallet: DEMO_WALLET_ADDRESS.to_string(),
            seed_demo_wallet: true,
            send_delay: SEND_SETTLEMENT_DELAY,
            withdraw_delay: WITHDRAW_SETTLEMENT_DELAY,
            send_gas_fee: SEND_GAS_FEE.to_string(),
            withdraw_gas_fee: WITHDRAW_GAS_FEE.to_string(),
            convert_gas_fee: CONVERT_GAS_FEE.to_string(),
            pricing: PricingConfig::default(),
        }
    }
}
