//! Quote models and provider-side errors.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single quote from the external provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub ticker: String,
    pub price: Decimal,
}

/// Failures of a single quote request. Collected per ticker; never fatal
/// to the refresh batch.
#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Unknown ticker: {0}")]
    UnknownTicker(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Quote request timed out after {0}s")]
    Timeout(u64),
}

/// One refreshed price, for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerPrice {
    pub ticker: String,
    pub name: String,
    pub price: Decimal,
}

/// Per-ticker failure entry in a refresh summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdateError {
    pub ticker: String,
    pub message: String,
}

/// Outcome of one best-effort refresh batch: successes and failures
/// together, never all-or-nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdateSummary {
    /// Number of assets whose price was updated.
    pub updated: usize,
    pub errors: Vec<PriceUpdateError>,
    pub prices: Vec<TickerPrice>,
}
