//! # Request Payloads and Validation
//!
//! Raw payloads deserialize leniently (every field optional, all strings)
//! so that missing or malformed fields can be reported per field instead of
//! as a single decode error. `validate()` turns a payload into its typed
//! request or a [`LedgerError::Validation`] carrying [`FieldErrors`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount;
use crate::error::{FieldErrors, LedgerError};
use crate::token::{TokenSymbol, ASSET_TOKENS, TRANSFER_TOKENS};

const REQUIRED: &str = "Required";
const AMOUNT_MESSAGE: &str = "Amount must be a positive number";

/// Returns `true` for `0x` followed by exactly 40 hex digits.
pub fn is_valid_address(address: &str) -> bool {
    address.len() == 42
        && address.starts_with("0x")
        && address[2..].chars().all(|c| c.is_ascii_hexdigit())
}

// ---------------------------------------------------------------------------
// Typed Requests
// ---------------------------------------------------------------------------

/// A validated `POST /api/transfer`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub token: TokenSymbol,
    /// Amount exactly as submitted; recorded verbatim on the transaction.
    pub amount: String,
    pub amount_value: Decimal,
    pub to_address: String,
    pub from_wallet_address: String,
}

/// A validated `POST /api/convert`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertRequest {
    pub from_token: TokenSymbol,
    pub to_token: TokenSymbol,
    pub amount: String,
    pub amount_value: Decimal,
}

/// A validated `POST /api/withdraw`.
#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawRequest {
    pub token: TokenSymbol,
    pub amount: String,
    pub amount_value: Decimal,
    pub to_address: String,
}

// ---------------------------------------------------------------------------
// Raw Payloads
// ---------------------------------------------------------------------------

/// Body of `POST /api/transfer` as received.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferPayload {
    pub token: Option<String>,
    pub amount: Option<String>,
    pub to_address: Option<String>,
    pub from_wallet_address: Option<String>,
}

/// Body of `POST /api/convert` as received.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertPayload {
    pub from_token: Option<String>,
    pub to_token: Option<String>,
    pub amount: Option<String>,
}

/// Body of `POST /api/withdraw` as received.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawPayload {
    pub token: Option<String>,
    pub amount: Option<String>,
    pub to_address: Option<String>,
}

pub const INVALID_TRANSFER: &str = "Invalid transfer request";
pub const INVALID_CONVERSION: &str = "Invalid conversion request";
pub const INVALID_WITHDRAWAL: &str = "Invalid withdrawal request";

impl TransferPayload {
    pub fn validate(&self) -> Result<TransferRequest, LedgerError> {
        let mut errors = FieldErrors::new();
        let token = check_token(&mut errors, "token", &self.token, TRANSFER_TOKENS);
        let amount = check_amount(&mut errors, &self.amount);
        let to = check_address(&mut errors, "toAddress", &self.to_address, "Invalid Ethereum address");
        let from = check_address(
            &mut errors,
            "fromWalletAddress",
            &self.from_wallet_address,
            "Invalid wallet address",
        );

        match (token, amount, to, from) {
            (Some(token), Some((amount, amount_value)), Some(to_address), Some(from_wallet_address))
                if errors.is_empty() =>
            {
                Ok(TransferRequest {
                    token,
                    amount,
                    amount_value,
                    to_address,
                    from_wallet_address,
                })
            }
            _ => Err(invalid(INVALID_TRANSFER, errors)),
        }
    }
}

impl ConvertPayload {
    pub fn validate(&self) -> Result<ConvertRequest, LedgerError> {
        let mut errors = FieldErrors::new();
        let from_token = check_token(&mut errors, "fromToken", &self.from_token, ASSET_TOKENS);
        let to_token = check_token(&mut errors, "toToken", &self.to_token, ASSET_TOKENS);
        let amount = check_amount(&mut errors, &self.amount);

        match (from_token, to_token, amount) {
            (Some(from_token), Some(to_token), Some((amount, amount_value))) if errors.is_empty() => {
                Ok(ConvertRequest {
                    from_token,
                    to_token,
                    amount,
                    amount_value,
                })
            }
            _ => Err(invalid(INVALID_CONVERSION, errors)),
        }
    }
}

impl WithdrawPayload {
    pub fn validate(&self) -> Result<WithdrawRequest, LedgerError> {
        let mut errors = FieldErrors::new();
        let token = check_token(&mut errors, "token", &self.token, ASSET_TOKENS);
        let amount = check_amount(&mut errors, &self.amount);
        let to = check_address(&mut errors, "toAddress", &self.to_address, "Invalid Ethereum address");

        match (token, amount, to) {
            (Some(token), Some((amount, amount_value)), Some(to_address)) if errors.is_empty() => {
                Ok(WithdrawRequest {
                    token,
                    amount,
                    amount_value,
                    to_address,
                })
            }
            _ => Err(invalid(INVALID_WITHDRAWAL, errors)),
        }
    }
}

// ---------------------------------------------------------------------------
// Field Checks
// ---------------------------------------------------------------------------

fn invalid(message: &str, errors: FieldErrors) -> LedgerError {
    LedgerError::Validation {
        message: message.to_string(),
        errors,
    }
}

fn check_token(
    errors: &mut FieldErrors,
    field: &str,
    value: &Option<String>,
    allowed: &[TokenSymbol],
) -> Option<TokenSymbol> {
    let Some(raw) = value else {
        errors.add(field, REQUIRED);
        return None;
    };
    match TokenSymbol::parse_allowed(raw, allowed) {
        Ok(symbol) => Some(symbol),
        Err(message) => {
            errors.add(field, message);
            None
        }
    }
}

fn check_amount(errors: &mut FieldErrors, value: &Option<String>) -> Option<(String, Decimal)> {
    let Some(raw) = value else {
        errors.add("amount", REQUIRED);
        return None;
    };
    match amount::parse_positive(raw) {
        Some(parsed) => Some((raw.trim().to_string(), parsed)),
        None => {
            errors.add("amount", AMOUNT_MESSAGE);
            None
        }
    }
}

fn check_address(
    errors: &mut FieldErrors,
    field: &str,
    value: &Option<String>,
    message: &str,
) -> Option<String> {
    let Some(raw) = value else {
        errors.add(field, REQUIRED);
        return None;
    };
    if is_valid_address(raw) {
        Some(raw.clone())
    } else {
        errors.add(field, message);
        None
    }
}
