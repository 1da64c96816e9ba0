//! # Token Symbols and Balance Slots
//!
//! The client offers several token symbols, but a virtual wallet only keeps
//! two balances: an ETH slot and a USDC slot. Every symbol resolves to one
//! of them through [`TokenSymbol::slot`].
//!
//! Endpoints accept different subsets of symbols: transfers take
//! [`TRANSFER_TOKENS`], converts and withdrawals take [`ASSET_TOKENS`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// BalanceSlot
// ---------------------------------------------------------------------------

/// One of the two balance fields held by a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BalanceSlot {
    Eth,
    Usdc,
}

impl BalanceSlot {
    /// Decimal places kept when a conversion credits this slot.
    pub fn decimals(self) -> u32 {
        match self {
            Self::Eth => crate::config::ETH_DECIMALS,
            Self::Usdc => crate::config::USDC_DECIMALS,
        }
    }
}

// ---------------------------------------------------------------------------
// TokenSymbol
// ---------------------------------------------------------------------------

/// A token symbol as sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenSymbol {
    #[serde(rename = "ETH")]
    Eth,
    #[serde(rename = "USDQ")]
    Usdq,
    #[serde(rename = "USDC")]
    Usdc,
    #[serde(rename = "WETH")]
    Weth,
    #[serde(rename = "OP")]
    Op,
    #[serde(rename = "YLP")]
    Ylp,
    #[serde(rename = "YL$")]
    YlDollar,
}

/// Symbols accepted by `POST /api/transfer`.
pub const TRANSFER_TOKENS: &[TokenSymbol] = &[TokenSymbol::Eth, TokenSymbol::Usdc];

/// Symbols accepted by `POST /api/convert` and `POST /api/withdraw`.
pub const ASSET_TOKENS: &[TokenSymbol] = &[
    TokenSymbol::Usdq,
    TokenSymbol::Usdc,
    TokenSymbol::Weth,
    TokenSymbol::Op,
    TokenSymbol::Ylp,
    TokenSymbol::YlDollar,
];

impl TokenSymbol {
    /// Wire representation of the symbol.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eth => "ETH",
            Self::Usdq => "USDQ",
            Self::Usdc => "USDC",
            Self::Weth => "WETH",
            Self::Op => "OP",
            Self::Ylp => "YLP",
            Self::YlDollar => "YL$",
        }
    }

    /// The wallet balance this symbol draws from.
    ///
    /// `ETH` and `USDQ` live in the ETH slot. Everything else is carried in
    /// the USDC slot.
    pub fn slot(self) -> BalanceSlot {
        match self {
            Self::Eth | Self::Usdq => BalanceSlot::Eth,
            _ => BalanceSlot::Usdc,
        }
    }

    /// Parses `s` and checks it against `allowed`.
    pub fn parse_allowed(s: &str, allowed: &[TokenSymbol]) -> Result<Self, String> {
        match s.parse::<TokenSymbol>() {
            Ok(symbol) if allowed.contains(&symbol) => Ok(symbol),
            _ => Err(format!(
                "Invalid token '{}', expected one of: {}",
                s,
                allowed
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

impl fmt::Display for TokenSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenSymbol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ETH" => Ok(Self::Eth),
            "USDQ" => Ok(Self::Usdq),
            "USDC" => Ok(Self::Usdc),
            "WETH" => Ok(Self::Weth),
            "OP" => Ok(Self::Op),
            "YLP" => Ok(Self::Ylp),
            "YL$" => Ok(Self::YlDollar),
            other => Err(format!("unknown token symbol: {}", other)),
        }
    }
}
