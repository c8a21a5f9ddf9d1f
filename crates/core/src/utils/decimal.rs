//! Exact fixed-point decimal helpers.
//!
//! All money and quantity arithmetic in the engine goes through
//! `rust_decimal`; these helpers centralize the half-up rounding and the
//! tolerant parsing used by direct entry and workbook import.

use num_traits::Zero;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::constants::RATE_SCALE;
use crate::errors::{Result, ValidationError};

/// Rounds a money amount half-up at the given scale.
pub fn round_money(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a quantity half-up at the given scale.
pub fn round_qty(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Ratio of `numerator / denominator` rounded half-up to 4 decimals.
/// Returns zero when the denominator is not positive.
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator > Decimal::zero() {
        (numerator / denominator)
            .round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero)
    } else {
        Decimal::ZERO
    }
}

/// Tolerant decimal parse: trims whitespace and accepts a comma decimal
/// separator when no dot is present (European spreadsheets).
pub fn parse_decimal(raw: &str) -> Result<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidInput("empty decimal value".to_string()).into());
    }
    let normalized = if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replace(',', ".")
    } else {
        trimmed.to_string()
    };
    let value = normalized
        .parse::<Decimal>()
        .map_err(ValidationError::DecimalParse)?;
    Ok(value)
}
