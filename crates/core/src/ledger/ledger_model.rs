//! Transaction domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ledger event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Buy,
    Sell,
    Gift,
}

impl TransactionType {
    pub const fn as_db_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => "BUY",
            TransactionType::Sell => "SELL",
            TransactionType::Gift => "GIFT",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "BUY" => Some(TransactionType::Buy),
            "SELL" => Some(TransactionType::Sell),
            "GIFT" => Some(TransactionType::Gift),
            _ => None,
        }
    }
}

/// A committed ledger event.
///
/// Ledger order is `(date, sequence)`: `sequence` is the insertion
/// counter assigned by the store and breaks same-day ties
/// deterministically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub tx_type: TransactionType,
    pub asset_id: String,
    pub account_id: String,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub commission: Decimal,
    pub tax: Decimal,
    pub notes: Option<String>,
    /// Dedup fingerprint set by the import reconciler.
    pub fingerprint: Option<String>,
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
}

/// Payload for recording a transaction. `account_id` is required for
/// BUY/GIFT; a SELL without one is inferred from the open position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub tx_type: TransactionType,
    pub asset_id: String,
    pub account_id: Option<String>,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub commission: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub notes: Option<String>,
    pub fingerprint: Option<String>,
}

/// Partial amendment of an existing transaction. The insertion sequence
/// is preserved so same-day ordering stays stable across edits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    pub id: String,
    pub date: Option<NaiveDate>,
    pub tx_type: Option<TransactionType>,
    pub account_id: Option<String>,
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub commission: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub notes: Option<String>,
}

/// Filter for ledger queries. All criteria are conjunctive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    pub asset_id: Option<String>,
    pub account_id: Option<String>,
    pub tx_type: Option<TransactionType>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl TransactionFilter {
    pub fn for_asset(asset_id: &str) -> Self {
        TransactionFilter {
            asset_id: Some(asset_id.to_string()),
            ..Default::default()
        }
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(ref asset_id) = self.asset_id {
            if &tx.asset_id != asset_id {
                return false;
            }
        }
        if let Some(ref account_id) = self.account_id {
            if &tx.account_id != account_id {
                return false;
            }
        }
        if let Some(tx_type) = self.tx_type {
            if tx.tx_type != tx_type {
                return false;
            }
        }
        if let Some(from) = self.from_date {
            if tx.date < from {
                return false;
            }
        }
        if let Some(to) = self.to_date {
            if tx.date > to {
                return false;
            }
        }
        true
    }
}
