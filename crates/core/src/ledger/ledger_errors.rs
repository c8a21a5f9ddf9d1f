use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by ledger mutations and position replay.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A SELL exceeds the quantity derivable at its ordering point.
    /// Never clamped.
    #[error(
        "Insufficient position for asset {asset_id} in account {account_id} on {date}: \
         selling {requested} with only {available} held"
    )]
    InsufficientPosition {
        asset_id: String,
        account_id: String,
        date: NaiveDate,
        requested: Decimal,
        available: Decimal,
    },

    /// A SELL without an account and no open position to infer one from.
    #[error("No open position for asset {0}; cannot infer the selling account")]
    NoOpenPosition(String),

    #[error("Invalid transaction data: {0}")]
    InvalidData(String),
}
