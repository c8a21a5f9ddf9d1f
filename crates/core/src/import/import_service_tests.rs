use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal_macros::dec;

use crate::accounts::{AccountRepositoryTrait, AccountType, NewAccount};
use crate::assets::{AssetRepositoryTrait, NewAsset};
use crate::constants::IMPORT_ACCOUNT_NAME;
use crate::engine::PortfolioEngine;
use crate::import::CsvWorkbookParser;
use crate::income::{DividendRepositoryTrait, IncomeServiceTrait, InterestRepositoryTrait, NewDividend};
use crate::ledger::{
    LedgerServiceTrait, NewTransaction, TransactionFilter, TransactionRepositoryTrait,
    TransactionType,
};
use crate::portfolio::positions::PositionServiceTrait;
use crate::quotes::{Quote, QuoteError, QuoteProviderTrait};
use crate::store::MemoryStore;

struct NoQuotes;

#[async_trait]
impl QuoteProviderTrait for NoQuotes {
    async fn latest_quote(&self, ticker: &str) -> Result<Quote, QuoteError> {
        Err(QuoteError::Provider(format!("offline: {ticker}")))
    }
}

fn engine() -> (Arc<MemoryStore>, PortfolioEngine) {
    let store = Arc::new(MemoryStore::new());
    let engine = PortfolioEngine::with_store(
        store.clone(),
        Arc::new(NoQuotes),
        Arc::new(CsvWorkbookParser::new()),
    );
    (store, engine)
}

const WORKBOOK: &[u8] = b"## Transactions\n\
Date,Type,Asset,Ticker,Quantity,Price,Commission,Tax\n\
2024-01-02,BUY,Apple,AAPL,10,100,1,0\n\
2024-02-01,SELL,Apple,,4,120,1,0\n\
\n\
## Dividends\n\
Date,Asset,Shares,Gross,Tax,Net\n\
2024-03-01,Apple,6,12.50,2.50,10.00\n\
\n\
## Interests\n\
Date,Account,Gross,Net,Balance,Annual Rate\n\
2024-01-31,Livret A,30,25.5,10000,0.03\n";

#[tokio::test]
async fn dry_run_reports_counts_without_mutating_any_store() {
    let (store, engine) = engine();
    let result = engine.import.reconcile(WORKBOOK, true).await.unwrap();

    assert!(result.dry_run);
    assert!(result.errors.is_empty());
    assert_eq!(result.inserted.transactions, 2);
    assert_eq!(result.inserted.dividends, 1);
    assert_eq!(result.inserted.interests, 1);
    assert_eq!(result.inserted.assets, 1);

    // The central guarantee: nothing was written.
    assert!(store.list_assets().unwrap().is_empty());
    assert!(store.list_accounts().unwrap().is_empty());
    assert!(store
        .list_transactions(&TransactionFilter::default())
        .unwrap()
        .is_empty());
    assert!(store.list_dividends().unwrap().is_empty());
    assert!(store.list_interests().unwrap().is_empty());
}

#[tokio::test]
async fn commit_applies_rows_and_auto_creates_referenced_records() {
    let (store, engine) = engine();
    let result = engine.import.reconcile(WORKBOOK, false).await.unwrap();

    assert!(!result.dry_run);
    assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
    assert_eq!(result.inserted.transactions, 2);
    assert_eq!(result.inserted.dividends, 1);
    assert_eq!(result.inserted.interests, 1);
    assert_eq!(result.inserted.assets, 1);

    let apple = store.find_asset_by_name("Apple").unwrap().unwrap();
    assert_eq!(apple.ticker.as_deref(), Some("AAPL"));

    let broker = store
        .find_account_by_name(IMPORT_ACCOUNT_NAME)
        .unwrap()
        .unwrap();
    assert_eq!(broker.account_type, AccountType::Investment);
    let livret = store.find_account_by_name("Livret A").unwrap().unwrap();
    assert_eq!(livret.account_type, AccountType::Savings);

    // 10 bought, 4 sold.
    let position = engine
        .positions
        .position(&apple.id, &broker.id)
        .unwrap()
        .unwrap();
    assert_eq!(position.quantity, dec!(6));
}

#[tokio::test]
async fn reimport_after_commit_skips_everything_as_duplicates() {
    let (_store, engine) = engine();
    engine.import.reconcile(WORKBOOK, false).await.unwrap();

    let again = engine.import.reconcile(WORKBOOK, false).await.unwrap();
    assert!(again.errors.is_empty(), "errors: {:?}", again.errors);
    assert_eq!(again.inserted.transactions, 0);
    assert_eq!(again.inserted.dividends, 0);
    assert_eq!(again.inserted.interests, 0);
    assert_eq!(again.inserted.assets, 0);
    assert_eq!(again.skipped_duplicates.transactions, 2);
    assert_eq!(again.skipped_duplicates.dividends, 1);
    assert_eq!(again.skipped_duplicates.interests, 1);
}

#[tokio::test]
async fn duplicate_rows_within_one_workbook_collapse() {
    let (_store, engine) = engine();
    let workbook = b"## Transactions\n\
Date,Type,Asset,Ticker,Quantity,Price,Commission,Tax\n\
2024-01-02,BUY,Apple,AAPL,10,100,0,0\n\
2024-01-02,BUY,Apple,AAPL,10,100,0,0\n";

    let result = engine.import.reconcile(workbook, true).await.unwrap();
    assert_eq!(result.inserted.transactions, 1);
    assert_eq!(result.skipped_duplicates.transactions, 1);
}

#[tokio::test]
async fn malformed_rows_are_excluded_without_aborting_the_sheet() {
    let (_store, engine) = engine();
    let workbook = b"## Transactions\n\
Date,Type,Asset,Ticker,Quantity,Price,Commission,Tax\n\
not-a-date,BUY,Apple,AAPL,10,100,0,0\n\
2024-01-02,SPLIT,Apple,AAPL,10,100,0,0\n\
2024-01-03,BUY,Apple,AAPL,ten,100,0,0\n\
2024-01-04,BUY,Apple,AAPL,10,100,0,0\n";

    let result = engine.import.reconcile(workbook, true).await.unwrap();
    assert_eq!(result.inserted.transactions, 1);
    assert_eq!(result.errors.len(), 3);

    assert_eq!(result.errors[0].sheet, "Transactions");
    assert_eq!(result.errors[0].row, 2);
    assert_eq!(result.errors[0].column, "Date");
    assert_eq!(result.errors[1].row, 3);
    assert_eq!(result.errors[1].column, "Type");
    assert_eq!(result.errors[2].row, 4);
    assert_eq!(result.errors[2].column, "Quantity");
}

#[tokio::test]
async fn sell_exceeding_the_planned_position_is_a_row_error() {
    let (_store, engine) = engine();
    let workbook = b"## Transactions\n\
Date,Type,Asset,Ticker,Quantity,Price,Commission,Tax\n\
2024-01-02,BUY,Apple,AAPL,10,100,0,0\n\
2024-02-01,SELL,Apple,,25,120,0,0\n";

    let result = engine.import.reconcile(workbook, false).await.unwrap();
    assert_eq!(result.inserted.transactions, 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].row, 3);
    assert!(result.errors[0].message.contains("exceeds the position"));
}

#[tokio::test]
async fn sell_ordered_before_its_buy_is_rejected_in_planned_order() {
    let (_store, engine) = engine();
    // Sheet order SELL-first, but the BUY is dated later too, so the
    // planned order really has the SELL starved.
    let workbook = b"## Transactions\n\
Date,Type,Asset,Ticker,Quantity,Price,Commission,Tax\n\
2024-01-02,SELL,Apple,,5,120,0,0\n\
2024-02-01,BUY,Apple,AAPL,10,100,0,0\n";

    let result = engine.import.reconcile(workbook, true).await.unwrap();
    assert_eq!(result.inserted.transactions, 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].row, 2);
}

#[tokio::test]
async fn commit_matches_dry_run_when_sell_row_precedes_its_buy() {
    // Sheet order SELL-first with the SELL dated after its BUY; the
    // planned order covers it, so dry run and commit must agree.
    let workbook = b"## Transactions\n\
Date,Type,Asset,Ticker,Quantity,Price,Commission,Tax\n\
2024-02-01,SELL,Apple,,5,120,0,0\n\
2024-01-02,BUY,Apple,AAPL,10,100,0,0\n";

    let (_store, preview_engine) = engine();
    let preview = preview_engine
        .import
        .reconcile(workbook, true)
        .await
        .unwrap();
    assert!(preview.errors.is_empty(), "errors: {:?}", preview.errors);
    assert_eq!(preview.inserted.transactions, 2);

    let (store, engine) = engine();
    let committed = engine.import.reconcile(workbook, false).await.unwrap();
    assert!(committed.errors.is_empty(), "errors: {:?}", committed.errors);
    assert_eq!(committed.inserted.transactions, 2);

    let apple = store.find_asset_by_name("Apple").unwrap().unwrap();
    let broker = store
        .find_account_by_name(IMPORT_ACCOUNT_NAME)
        .unwrap()
        .unwrap();
    let position = engine
        .positions
        .position(&apple.id, &broker.id)
        .unwrap()
        .unwrap();
    assert_eq!(position.quantity, dec!(5));
}

#[tokio::test]
async fn rows_matching_directly_entered_records_are_duplicates() {
    let (store, engine) = engine();
    let apple = store
        .create_asset(NewAsset {
            name: "Apple".to_string(),
            ticker: Some("AAPL".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    let broker = store
        .create_account(NewAccount {
            name: "Broker".to_string(),
            account_type: AccountType::Investment,
            ..Default::default()
        })
        .await
        .unwrap();
    // Entered by hand, so no fingerprint is stored.
    engine
        .ledger
        .record(NewTransaction {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            tx_type: TransactionType::Buy,
            asset_id: apple.id.clone(),
            account_id: Some(broker.id.clone()),
            quantity: dec!(10),
            price: Some(dec!(100)),
            commission: Some(dec!(1)),
            tax: None,
            notes: None,
            fingerprint: None,
        })
        .await
        .unwrap();
    engine
        .income
        .record_dividend(NewDividend {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            asset_id: apple.id.clone(),
            shares: Some(dec!(6)),
            net: dec!(10.00),
            tax: Some(dec!(2.50)),
            fingerprint: None,
        })
        .await
        .unwrap();

    let workbook = b"## Transactions\n\
Date,Type,Asset,Ticker,Quantity,Price,Commission,Tax\n\
2024-01-02,BUY,Apple,AAPL,10,100,1,0\n\
\n\
## Dividends\n\
Date,Asset,Shares,Gross,Tax,Net\n\
2024-03-01,Apple,6,12.50,2.50,10.00\n";

    let result = engine.import.reconcile(workbook, false).await.unwrap();
    assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
    assert_eq!(result.inserted.transactions, 0);
    assert_eq!(result.inserted.dividends, 0);
    assert_eq!(result.skipped_duplicates.transactions, 1);
    assert_eq!(result.skipped_duplicates.dividends, 1);
    assert_eq!(
        store
            .list_transactions(&TransactionFilter::default())
            .unwrap()
            .len(),
        1
    );
    assert_eq!(store.list_dividends().unwrap().len(), 1);
}

#[tokio::test]
async fn dividend_gross_mismatch_is_a_row_error() {
    let (_store, engine) = engine();
    let workbook = b"## Dividends\n\
Date,Asset,Shares,Gross,Tax,Net\n\
2024-03-01,Apple,6,100,10,80\n";

    let result = engine.import.reconcile(workbook, true).await.unwrap();
    assert_eq!(result.inserted.dividends, 0);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].sheet, "Dividends");
    assert_eq!(result.errors[0].column, "Gross");
    // An unreferenced new asset is not created.
    assert_eq!(result.inserted.assets, 0);
}

#[tokio::test]
async fn commit_against_existing_records_only_adds_the_new_rows() {
    let (store, engine) = engine();
    engine.import.reconcile(WORKBOOK, false).await.unwrap();

    let extended = b"## Transactions\n\
Date,Type,Asset,Ticker,Quantity,Price,Commission,Tax\n\
2024-01-02,BUY,Apple,AAPL,10,100,1,0\n\
2024-03-01,BUY,Apple,,2,130,0,0\n";

    let result = engine.import.reconcile(extended, false).await.unwrap();
    assert_eq!(result.inserted.transactions, 1);
    assert_eq!(result.skipped_duplicates.transactions, 1);
    assert_eq!(result.inserted.assets, 0);

    let all = store
        .list_transactions(&TransactionFilter::default())
        .unwrap();
    assert_eq!(all.len(), 3);
}
