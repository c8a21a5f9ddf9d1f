//! Account domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    #[default]
    Operating,
    Savings,
    Investment,
    Deposits,
    Alternative,
}

impl AccountType {
    pub const fn as_db_str(&self) -> &'static str {
        match self {
            AccountType::Operating => "OPERATING",
            AccountType::Savings => "SAVINGS",
            AccountType::Investment => "INVESTMENT",
            AccountType::Deposits => "DEPOSITS",
            AccountType::Alternative => "ALTERNATIVE",
        }
    }
}

/// A cash account. The balance is mutated independently of the ledger;
/// it is not derived from transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub account_type: AccountType,
    pub currency: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub name: String,
    pub account_type: AccountType,
    pub currency: Option<String>,
    pub balance: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    pub id: String,
    pub name: Option<String>,
    pub account_type: Option<AccountType>,
    pub currency: Option<String>,
    pub balance: Option<Decimal>,
}
