//! Asset domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Asset category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetType {
    #[default]
    Stock,
    Etf,
    Fund,
    Crypto,
}

impl AssetType {
    pub const fn as_db_str(&self) -> &'static str {
        match self {
            AssetType::Stock => "STOCK",
            AssetType::Etf => "ETF",
            AssetType::Fund => "FUND",
            AssetType::Crypto => "CRYPTO",
        }
    }
}

/// How the asset's price is maintained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceMode {
    /// Refreshed by the price update pipeline.
    #[default]
    Auto,
    /// User-entered prices only; never touched by the pipeline.
    Manual,
}

/// Outcome of the last price observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceStatus {
    Ok,
    Error,
    NoTicker,
}

/// An instrument. Invariant: `price_status == NoTicker` iff `ticker` is
/// absent; an AUTO asset without a ticker can never become `Ok`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub ticker: Option<String>,
    pub asset_type: AssetType,
    pub currency: String,
    pub price_mode: PriceMode,
    pub current_price: Option<Decimal>,
    pub price_status: PriceStatus,
    pub price_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Asset {
    /// Recomputes `price_status` after a ticker, price, or mode change.
    /// A lost ticker always forces `NoTicker`; a gained ticker starts
    /// `Ok` only when a price is already known, otherwise `Error` until
    /// a refresh succeeds. On a MANUAL asset a present price is its own
    /// successful observation, so a stale `Error` never sticks.
    pub fn reconcile_price_status(&mut self) {
        self.price_status = match (&self.ticker, &self.current_price) {
            (None, _) => PriceStatus::NoTicker,
            (Some(_), Some(_)) if self.price_status == PriceStatus::NoTicker => PriceStatus::Ok,
            (Some(_), None) if self.price_status == PriceStatus::NoTicker => PriceStatus::Error,
            (Some(_), Some(_)) if self.price_mode == PriceMode::Manual => PriceStatus::Ok,
            (Some(_), _) => self.price_status,
        };
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAsset {
    pub name: String,
    pub ticker: Option<String>,
    pub asset_type: AssetType,
    pub currency: Option<String>,
    pub price_mode: Option<PriceMode>,
    pub current_price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetUpdate {
    pub id: String,
    pub name: Option<String>,
    /// `Some(None)` clears the ticker, `Some(Some(..))` replaces it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<Option<String>>,
    pub asset_type: Option<AssetType>,
    pub currency: Option<String>,
    pub price_mode: Option<PriceMode>,
    /// Manual price entry; also stamps `price_updated_at`.
    pub current_price: Option<Decimal>,
}
