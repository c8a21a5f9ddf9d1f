//! Valuation models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accounts::AccountType;
use crate::assets::AssetType;

/// One valued position. `stale` marks lines priced from a last known
/// (possibly outdated) quote; they are flagged, never dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionValuation {
    pub asset_id: String,
    pub asset_name: String,
    pub ticker: Option<String>,
    pub asset_type: AssetType,
    pub account_id: String,
    pub quantity: Decimal,
    pub average_cost: Decimal,
    pub cost_total: Decimal,
    pub current_price: Option<Decimal>,
    pub market_value: Decimal,
    pub unrealized_gain: Decimal,
    pub unrealized_gain_pct: Decimal,
    pub weight_pct: Decimal,
    pub stale: bool,
}

/// Non-zero cash balance contributing to the grand total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    pub account_id: String,
    pub account_name: String,
    pub account_type: AccountType,
    pub balance: Decimal,
}

/// Aggregate portfolio valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValuation {
    pub total_market_value: Decimal,
    pub total_cost: Decimal,
    pub total_unrealized_gain: Decimal,
    pub total_cash: Decimal,
    pub grand_total: Decimal,
    /// True when any position was valued from a stale or missing price.
    pub has_stale_prices: bool,
    pub positions: Vec<PositionValuation>,
    pub accounts: Vec<AccountBalance>,
}
