use std::collections::HashSet;

use crate::income::{
    Dividend, DividendFigures, DividendUpdate, Interest, InterestUpdate, NewDividend, NewInterest,
    YearSummary,
};
use crate::utils::Page;
use crate::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Trait defining the contract for Dividend repository operations.
#[async_trait]
pub trait DividendRepositoryTrait: Send + Sync {
    fn get_dividend(&self, dividend_id: &str) -> Result<Dividend>;
    /// All dividends, newest first.
    fn list_dividends(&self) -> Result<Vec<Dividend>>;
    fn list_dividends_for_asset(&self, asset_id: &str) -> Result<Vec<Dividend>>;
    fn dividend_fingerprints(&self) -> Result<HashSet<String>>;
    async fn insert_dividend(&self, dividend: Dividend) -> Result<Dividend>;
    async fn update_dividend(&self, dividend: Dividend) -> Result<Dividend>;
    async fn delete_dividend(&self, dividend_id: &str) -> Result<Dividend>;
}

/// Trait defining the contract for Interest repository operations.
#[async_trait]
pub trait InterestRepositoryTrait: Send + Sync {
    fn get_interest(&self, interest_id: &str) -> Result<Interest>;
    /// All interest payments, newest first.
    fn list_interests(&self) -> Result<Vec<Interest>>;
    fn list_interests_for_account(&self, account_id: &str) -> Result<Vec<Interest>>;
    fn interest_fingerprints(&self) -> Result<HashSet<String>>;
    async fn insert_interest(&self, interest: Interest) -> Result<Interest>;
    async fn update_interest(&self, interest: Interest) -> Result<Interest>;
    async fn delete_interest(&self, interest_id: &str) -> Result<Interest>;
}

/// Trait defining the contract for income accounting operations.
#[async_trait]
pub trait IncomeServiceTrait: Send + Sync {
    /// Gross and withholding rate from net and tax, normalized to the
    /// configured money scale (rate at 4 decimals).
    fn compute_dividend(&self, net: Decimal, tax: Decimal) -> Result<DividendFigures>;
    /// Net interest from gross and tax at the configured money scale.
    fn compute_interest(&self, gross: Decimal, tax: Decimal) -> Result<Decimal>;

    fn get_dividend(&self, dividend_id: &str) -> Result<Dividend>;
    fn search_dividends(&self, page: usize, page_size: usize) -> Result<Page<Dividend>>;
    async fn record_dividend(&self, new_dividend: NewDividend) -> Result<Dividend>;
    async fn amend_dividend(&self, update: DividendUpdate) -> Result<Dividend>;
    async fn remove_dividend(&self, dividend_id: &str) -> Result<Dividend>;

    fn get_interest(&self, interest_id: &str) -> Result<Interest>;
    fn search_interests(&self, page: usize, page_size: usize) -> Result<Page<Interest>>;
    async fn record_interest(&self, new_interest: NewInterest) -> Result<Interest>;
    async fn amend_interest(&self, update: InterestUpdate) -> Result<Interest>;
    async fn remove_interest(&self, interest_id: &str) -> Result<Interest>;

    /// Dividends, interests, and realized gains aggregated per year.
    fn year_summary(&self) -> Result<Vec<YearSummary>>;
}
