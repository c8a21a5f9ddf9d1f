use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::accounts::AccountRepositoryTrait;
use crate::assets::AssetRepositoryTrait;
use crate::errors::Error;
use crate::income::{DividendRepositoryTrait, InterestRepositoryTrait};
use crate::ledger::{TransactionFilter, TransactionRepositoryTrait};
use crate::Result;

/// Writes flat CSV mirroring the list endpoints, with asset and account
/// references resolved to names. The column layout matches the import
/// sheets, so an export re-imports cleanly as all-duplicates.
pub struct ExportService {
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    dividend_repository: Arc<dyn DividendRepositoryTrait>,
    interest_repository: Arc<dyn InterestRepositoryTrait>,
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    account_repository: Arc<dyn AccountRepositoryTrait>,
}

impl ExportService {
    pub fn new(
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        dividend_repository: Arc<dyn DividendRepositoryTrait>,
        interest_repository: Arc<dyn InterestRepositoryTrait>,
        asset_repository: Arc<dyn AssetRepositoryTrait>,
        account_repository: Arc<dyn AccountRepositoryTrait>,
    ) -> Self {
        Self {
            transaction_repository,
            dividend_repository,
            interest_repository,
            asset_repository,
            account_repository,
        }
    }

    fn asset_names(&self) -> Result<HashMap<String, (String, Option<String>)>> {
        Ok(self
            .asset_repository
            .list_assets()?
            .into_iter()
            .map(|a| (a.id, (a.name, a.ticker)))
            .collect())
    }

    fn account_names(&self) -> Result<HashMap<String, String>> {
        Ok(self
            .account_repository
            .list_accounts()?
            .into_iter()
            .map(|a| (a.id, a.name))
            .collect())
    }

    pub fn transactions_csv(&self) -> Result<String> {
        let assets = self.asset_names()?;
        let accounts = self.account_names()?;
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record([
                "Date",
                "Type",
                "Asset",
                "Ticker",
                "Account",
                "Quantity",
                "Price",
                "Commission",
                "Tax",
            ])
            .map_err(csv_error)?;
        for tx in self
            .transaction_repository
            .list_transactions(&TransactionFilter::default())?
        {
            let (asset_name, ticker) = assets
                .get(&tx.asset_id)
                .cloned()
                .unwrap_or((tx.asset_id.clone(), None));
            writer
                .write_record([
                    tx.date.format("%Y-%m-%d").to_string(),
                    tx.tx_type.as_db_str().to_string(),
                    asset_name,
                    ticker.unwrap_or_default(),
                    accounts
                        .get(&tx.account_id)
                        .cloned()
                        .unwrap_or(tx.account_id.clone()),
                    tx.quantity.to_string(),
                    tx.price.map(|p| p.to_string()).unwrap_or_default(),
                    tx.commission.to_string(),
                    tx.tax.to_string(),
                ])
                .map_err(csv_error)?;
        }
        finish(writer)
    }

    pub fn dividends_csv(&self) -> Result<String> {
        let assets = self.asset_names()?;
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["Date", "Asset", "Shares", "Gross", "Tax", "Net"])
            .map_err(csv_error)?;
        for dividend in self.dividend_repository.list_dividends()? {
            writer
                .write_record([
                    dividend.date.format("%Y-%m-%d").to_string(),
                    assets
                        .get(&dividend.asset_id)
                        .map(|(name, _)| name.clone())
                        .unwrap_or(dividend.asset_id.clone()),
                    optional(dividend.shares),
                    dividend.gross.to_string(),
                    dividend.tax.to_string(),
                    dividend.net.to_string(),
                ])
                .map_err(csv_error)?;
        }
        finish(writer)
    }

    pub fn interests_csv(&self) -> Result<String> {
        let accounts = self.account_names()?;
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["Date", "Account", "Gross", "Net", "Balance", "Annual Rate"])
            .map_err(csv_error)?;
        for interest in self.interest_repository.list_interests()? {
            writer
                .write_record([
                    interest.date.format("%Y-%m-%d").to_string(),
                    accounts
                        .get(&interest.account_id)
                        .cloned()
                        .unwrap_or(interest.account_id.clone()),
                    interest.gross.to_string(),
                    interest.net.to_string(),
                    optional(interest.balance),
                    optional(interest.annual_rate),
                ])
                .map_err(csv_error)?;
        }
        finish(writer)
    }
}

fn optional(value: Option<Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn csv_error(e: csv::Error) -> Error {
    Error::Unexpected(format!("CSV write failed: {e}"))
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Unexpected(format!("CSV write failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| Error::Unexpected(format!("CSV is not UTF-8: {e}")))
}
