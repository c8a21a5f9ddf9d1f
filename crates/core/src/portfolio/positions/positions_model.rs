//! Derived position models. Positions are projections of the ledger and
//! are never independently authored.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identity of one position: one asset within one account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionKey {
    pub asset_id: String,
    pub account_id: String,
}

impl PositionKey {
    pub fn new(asset_id: &str, account_id: &str) -> Self {
        PositionKey {
            asset_id: asset_id.to_string(),
            account_id: account_id.to_string(),
        }
    }
}

/// Current quantity and weighted-average unit cost for one asset+account.
/// A position with quantity zero is logically absent and never surfaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub asset_id: String,
    pub account_id: String,
    pub quantity: Decimal,
    pub average_cost: Decimal,
}

/// Gain recognized at the moment of a SELL, relative to the WAC in force.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealizedGain {
    pub date: NaiveDate,
    pub asset_id: String,
    pub account_id: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub average_cost: Decimal,
    pub realized_gain: Decimal,
}
