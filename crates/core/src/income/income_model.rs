//! Income domain models.
//!
//! Persisted dividends always satisfy `gross = net + tax` and
//! `withholding_rate = tax / gross` (4 decimals, zero when gross is not
//! positive); the service recomputes the triple from the two fields the
//! caller supplies rather than trusting all three.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A dividend payment on an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dividend {
    pub id: String,
    pub date: NaiveDate,
    pub asset_id: String,
    /// Shares held at payment time, when known.
    pub shares: Option<Decimal>,
    pub gross: Decimal,
    pub tax: Decimal,
    pub net: Decimal,
    pub withholding_rate: Decimal,
    pub fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDividend {
    pub date: NaiveDate,
    pub asset_id: String,
    pub shares: Option<Decimal>,
    pub net: Decimal,
    pub tax: Option<Decimal>,
    pub fingerprint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividendUpdate {
    pub id: String,
    pub date: Option<NaiveDate>,
    pub shares: Option<Decimal>,
    pub net: Option<Decimal>,
    pub tax: Option<Decimal>,
}

/// An interest payment on a cash account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interest {
    pub id: String,
    pub date: NaiveDate,
    pub account_id: String,
    pub gross: Decimal,
    pub net: Decimal,
    /// Account balance snapshot at payment time, when known.
    pub balance: Option<Decimal>,
    pub annual_rate: Option<Decimal>,
    pub fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInterest {
    pub date: NaiveDate,
    pub account_id: String,
    pub gross: Decimal,
    /// Taken as-is when provided; derived as `gross - tax` otherwise.
    pub net: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub balance: Option<Decimal>,
    pub annual_rate: Option<Decimal>,
    pub fingerprint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestUpdate {
    pub id: String,
    pub date: Option<NaiveDate>,
    pub gross: Option<Decimal>,
    pub net: Option<Decimal>,
    pub balance: Option<Decimal>,
    pub annual_rate: Option<Decimal>,
}

/// Consistent dividend figures recomputed from net and tax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividendFigures {
    pub gross: Decimal,
    pub net: Decimal,
    pub tax: Decimal,
    pub withholding_rate: Decimal,
}

/// Income and realized gains aggregated per calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSummary {
    pub year: i32,
    pub dividends_gross: Decimal,
    pub dividends_tax: Decimal,
    pub dividends_net: Decimal,
    pub interests_gross: Decimal,
    pub interests_net: Decimal,
    pub sales_pnl: Decimal,
    pub total_net: Decimal,
}

impl YearSummary {
    pub fn empty(year: i32) -> Self {
        YearSummary {
            year,
            dividends_gross: Decimal::ZERO,
            dividends_tax: Decimal::ZERO,
            dividends_net: Decimal::ZERO,
            interests_gross: Decimal::ZERO,
            interests_net: Decimal::ZERO,
            sales_pnl: Decimal::ZERO,
            total_net: Decimal::ZERO,
        }
    }
}
