//! # CLI Interface
//!
//! Defines the command-line argument structure for `vwallet-node` using
//! `clap` derive. Supports two subcommands: `run` and `version`.
//!
//! Every `run` flag has an environment fallback, so the server can be
//! configured entirely through `VWALLET_*` variables.

use std::net::IpAddr;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use vwallet_ledger::config::{LedgerConfig, DEMO_WALLET_ADDRESS};
use vwallet_ledger::request::is_valid_address;

/// Virtual wallet demo server.
///
/// Serves the wallet REST API over an in-memory ledger and exposes
/// Prometheus metrics on a separate port.
#[derive(Parser, Debug)]
#[command(
    name = "vwallet-node",
    about = "Virtual wallet demo server",
    version,
    propagate_version = true
)]
pub struct VwalletNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the API and metrics servers.
    Run(RunArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Port for the REST API.
    #[arg(long, env = "VWALLET_RPC_PORT", default_value_t = 5000)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "VWALLET_METRICS_PORT", default_value_t = 5001)]
    pub metrics_port: u16,

    /// Interface both servers bind to.
    #[arg(long, env = "VWALLET_BIND", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Log output format: `pretty` or `json`.
    #[arg(long, env = "VWALLET_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Start with an empty ledger instead of the seeded demo wallet.
    #[arg(long, env = "VWALLET_NO_SEED")]
    pub no_seed: bool,

    /// Address of the wallet served by `/api/wallet`, `/api/transactions`,
    /// `/api/convert` and `/api/withdraw`.
    #[arg(
        long,
        env = "VWALLET_DEFAULT_WALLET",
        default_value = DEMO_WALLET_ADDRESS,
        value_parser = parse_address
    )]
    pub default_wallet: String,

    /// Settlement delay for transfers, in milliseconds.
    #[arg(long, env = "VWALLET_SEND_DELAY_MS", default_value_t = 3000)]
    pub send_delay_ms: u64,

    /// Settlement delay for withdrawals, in milliseconds.
    #[arg(long, env = "VWALLET_WITHDRAW_DELAY_MS", default_value_t = 5000)]
    pub withdraw_delay_ms: u64,

    /// USD price of one ETH-slot unit; also the conversion rate.
    #[arg(
        long,
        env = "VWALLET_ETH_PRICE",
        default_value = "2345.67",
        value_parser = parse_price
    )]
    pub eth_price: Decimal,
}

impl RunArgs {
    /// Builds the ledger configuration from the parsed flags.
    pub fn ledger_config(&self) -> LedgerConfig {
        let mut config = LedgerConfig::default();
        config.default_wallet = self.default_wallet.clone();
        config.seed_demo_wallet = !self.no_seed;
        config.send_delay = Duration::from_millis(self.send_delay_ms);
        config.withdraw_delay = Duration::from_millis(self.withdraw_delay_ms);
        config.pricing.eth_price_usd = self.eth_price;
        config
    }
}

fn parse_address(s: &str) -> Result<String, String> {
    if is_valid_address(s) {
        Ok(s.to_string())
    } else {
        Err("expected 0x followed by 40 hex digits".to_string())
    }
}

fn parse_price(s: &str) -> Result<Decimal, String> {
    let price: Decimal = s.parse().map_err(|e| format!("{}", e))?;
    if price > Decimal::ZERO {
        Ok(price)
    } else {
        Err("price must be positive".to_string())
    }
}
