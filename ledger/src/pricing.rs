//! # Pricing Provider
//!
//! Prices, exchange rates and gas estimates reach the ledger through the
//! [`PricingProvider`] trait. The only implementation is
//! [`StaticPricing`], which serves fixed demo values from
//! [`PricingConfig`].

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount;
use crate::config::{PricingConfig, ETH_DECIMALS};
use crate::token::BalanceSlot;

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response body of `GET /api/gas-estimate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasEstimate {
    pub slow: String,
    pub standard: String,
    pub fast: String,
    pub estimated_time_seconds: u64,
}

/// Response body of `GET /api/rates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRates {
    pub eth_to_usdc: f64,
    pub usdc_to_eth: f64,
    pub eth_price: f64,
    pub usdc_price: f64,
    /// RFC 3339 time the rates were produced.
    pub last_updated: String,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Source of prices and rates for the ledger.
pub trait PricingProvider: Send + Sync {
    /// USD price of one ETH-slot unit.
    fn eth_price_usd(&self) -> Decimal;

    /// USD price of one USDC-slot unit.
    fn usdc_price_usd(&self) -> Decimal;

    /// Amount of USDC received per ETH converted.
    fn eth_to_usdc(&self) -> Decimal {
        self.eth_price_usd()
    }

    /// Amount of ETH received per USDC converted. Zero if the ETH rate is
    /// zero.
    fn usdc_to_eth(&self) -> Decimal {
        Decimal::ONE
            .checked_div(self.eth_to_usdc())
            .unwrap_or(Decimal::ZERO)
    }

    /// USD price of one unit in `slot`.
    fn price_usd(&self, slot: BalanceSlot) -> Decimal {
        match slot {
            BalanceSlot::Eth => self.eth_price_usd(),
            BalanceSlot::Usdc => self.usdc_price_usd(),
        }
    }

    /// Reported 24h change, in percent.
    fn change_24h(&self, slot: BalanceSlot) -> f64;

    fn gas_estimate(&self) -> GasEstimate;

    /// Snapshot of the current rates stamped with `now`.
    fn rates(&self, now: DateTime<Utc>) -> ExchangeRates {
        let inverse = amount::to_fixed(self.usdc_to_eth(), ETH_DECIMALS);
        ExchangeRates {
            eth_to_usdc: to_number(&self.eth_to_usdc().to_string()),
            usdc_to_eth: to_number(&inverse),
            eth_price: to_number(&self.eth_price_usd().to_string()),
            usdc_price: to_number(&self.usdc_price_usd().to_string()),
            last_updated: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// JSON number for a decimal string. Parsing the text keeps `2345.67`
/// as the nearest `f64`.
fn to_number(s: &str) -> f64 {
    s.parse().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// StaticPricing
// ---------------------------------------------------------------------------

/// Fixed prices taken from configuration.
#[derive(Debug, Clone)]
pub struct StaticPricing {
    config: PricingConfig,
}

impl StaticPricing {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }
}

impl Default for StaticPricing {
    fn default() -> Self {
        Self::new(PricingConfig::default())
    }
}

impl PricingProvider for StaticPricing {
    fn eth_price_usd(&self) -> Decimal {
        self.config.eth_price_usd
    }

    fn usdc_price_usd(&self) -> Decimal {
        self.config.usdc_price_usd
    }

    fn change_24h(&self, slot: BalanceSlot) -> f64 {
        match slot {
            BalanceSlot::Eth => self.config.eth_change_24h,
            BalanceSlot::Usdc => self.config.usdc_change_24h,
        }
    }

    fn gas_estimate(&self) -> GasEstimate {
        GasEstimate {
            slow: self.config.gas_slow.clone(),
            standard: self.config.gas_standard.clone(),
            fast: self.config.gas_fast.clone(),
            estimated_time_seconds: self.config.estimated_time_seconds,
        }
    }
}
