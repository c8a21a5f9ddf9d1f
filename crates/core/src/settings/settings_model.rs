//! Settings domain model.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BASE_CURRENCY, MONEY_SCALE, QUANTITY_SCALE};

/// Cost basis accounting method. Fixed to weighted-average cost; the
/// variant exists so the setting round-trips through the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostBasisMethod {
    #[default]
    Wac,
}

impl CostBasisMethod {
    pub const fn as_db_str(&self) -> &'static str {
        match self {
            CostBasisMethod::Wac => "WAC",
        }
    }
}

/// Cost assigned to incoming GIFT acquisitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GiftCostMode {
    /// Gifts enter the position at zero cost.
    #[default]
    Zero,
    /// Gifts enter at the market price on the transaction date.
    Market,
}

impl GiftCostMode {
    pub const fn as_db_str(&self) -> &'static str {
        match self {
            GiftCostMode::Zero => "ZERO",
            GiftCostMode::Market => "MARKET",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "ZERO" => Some(GiftCostMode::Zero),
            "MARKET" => Some(GiftCostMode::Market),
            _ => None,
        }
    }
}

/// Process-wide settings singleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub base_currency: String,
    pub cost_basis_method: CostBasisMethod,
    pub gift_cost_mode: GiftCostMode,
    /// Decimal places kept on money amounts.
    pub rounding_money: u32,
    /// Decimal places kept on quantities.
    pub rounding_qty: u32,
    /// Auto price-update interval in minutes. 0 = disabled (manual only).
    pub price_update_interval: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            cost_basis_method: CostBasisMethod::Wac,
            gift_cost_mode: GiftCostMode::Zero,
            rounding_money: MONEY_SCALE,
            rounding_qty: QUANTITY_SCALE,
            price_update_interval: 0,
        }
    }
}

/// Partial settings patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub base_currency: Option<String>,
    pub gift_cost_mode: Option<GiftCostMode>,
    pub rounding_money: Option<u32>,
    pub rounding_qty: Option<u32>,
    pub price_update_interval: Option<u32>,
}
