//! Decimal-string amounts.
//!
//! Balances and amounts travel as strings. Arithmetic is done on
//! [`rust_decimal::Decimal`] so that `"2.5847" - "0.5"` is exactly
//! `"2.0847"`.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Parses a client-supplied amount. Accepts plain decimal notation only and
/// rejects zero and negative values.
pub fn parse_positive(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    if !is_plain_decimal(trimmed) {
        return None;
    }
    let value = Decimal::from_str(trimmed).ok()?;
    if value > Decimal::ZERO {
        Some(value)
    } else {
        None
    }
}

/// Digits with at most one `.` and an optional leading `+`. Rejects the
/// underscores and exponents `Decimal::from_str` would otherwise accept.
fn is_plain_decimal(s: &str) -> bool {
    let digits = s.strip_prefix('+').unwrap_or(s);
    let (int, frac) = digits.split_once('.').unwrap_or((digits, ""));
    !(int.is_empty() && frac.is_empty())
        && int.chars().all(|c| c.is_ascii_digit())
        && frac.chars().all(|c| c.is_ascii_digit())
}

/// Parses a stored balance string.
pub fn parse_balance(s: &str) -> Option<Decimal> {
    Decimal::from_str(s.trim()).ok()
}

/// Renders a balance without trailing zeros (`4000.00 - 0` → `"4000"`).
pub fn to_plain_string(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Rounds half away from zero and renders exactly `dp` decimal places.
pub fn to_fixed(value: Decimal, dp: u32) -> String {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    rounded.to_string()
}
