use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::accounts::{Account, AccountRepositoryTrait, AccountType, NewAccount};
use crate::assets::{Asset, AssetRepositoryTrait, NewAsset};
use crate::income::{DividendUpdate, IncomeService, IncomeServiceTrait, NewDividend, NewInterest};
use crate::ledger::{Transaction, TransactionRepositoryTrait, TransactionType};
use crate::portfolio::positions::{PositionService, PositionServiceTrait};
use crate::settings::{SettingsService, SettingsServiceTrait};
use crate::store::MemoryStore;

struct Fixture {
    store: Arc<MemoryStore>,
    income: IncomeService,
    asset: Asset,
    account: Account,
}

async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let settings: Arc<dyn SettingsServiceTrait> = Arc::new(SettingsService::new(store.clone()));
    let positions: Arc<dyn PositionServiceTrait> =
        Arc::new(PositionService::new(store.clone(), settings.clone()));
    let income = IncomeService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        positions,
        settings,
    );
    let asset = store
        .create_asset(NewAsset {
            name: "Apple".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let account = store
        .create_account(NewAccount {
            name: "Livret A".to_string(),
            account_type: AccountType::Savings,
            ..Default::default()
        })
        .await
        .unwrap();
    Fixture {
        store,
        income,
        asset,
        account,
    }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn compute_dividend_from_net_and_tax() {
    let fixture = fixture().await;
    let figures = fixture.income.compute_dividend(dec!(80), dec!(20)).unwrap();
    assert_eq!(figures.gross, dec!(100.00));
    assert_eq!(figures.net, dec!(80.00));
    assert_eq!(figures.tax, dec!(20.00));
    assert_eq!(figures.withholding_rate, dec!(0.2000));
}

#[tokio::test]
async fn zero_gross_dividend_has_zero_rate() {
    let fixture = fixture().await;
    let figures = fixture.income.compute_dividend(dec!(0), dec!(0)).unwrap();
    assert_eq!(figures.gross, Decimal::ZERO);
    assert_eq!(figures.withholding_rate, Decimal::ZERO);
}

#[tokio::test]
async fn negative_net_is_rejected() {
    let fixture = fixture().await;
    assert!(fixture.income.compute_dividend(dec!(-1), dec!(0)).is_err());
}

#[tokio::test]
async fn recorded_dividend_satisfies_the_invariant() {
    let fixture = fixture().await;
    let dividend = fixture
        .income
        .record_dividend(NewDividend {
            date: date("2024-03-01"),
            asset_id: fixture.asset.id.clone(),
            shares: Some(dec!(10)),
            net: dec!(10.47),
            tax: Some(dec!(3.2)),
            fingerprint: None,
        })
        .await
        .unwrap();
    assert_eq!(dividend.gross, dividend.net + dividend.tax);
    assert_eq!(dividend.gross, dec!(13.67));
}

#[tokio::test]
async fn amend_dividend_recomputes_the_triple() {
    let fixture = fixture().await;
    let dividend = fixture
        .income
        .record_dividend(NewDividend {
            date: date("2024-03-01"),
            asset_id: fixture.asset.id.clone(),
            shares: None,
            net: dec!(80),
            tax: Some(dec!(20)),
            fingerprint: None,
        })
        .await
        .unwrap();

    let amended = fixture
        .income
        .amend_dividend(DividendUpdate {
            id: dividend.id,
            net: Some(dec!(90)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(amended.gross, dec!(110.00));
    assert_eq!(amended.withholding_rate, dec!(0.1818));
}

#[tokio::test]
async fn interest_net_is_derived_when_absent() {
    let fixture = fixture().await;
    let interest = fixture
        .income
        .record_interest(NewInterest {
            date: date("2024-01-31"),
            account_id: fixture.account.id.clone(),
            gross: dec!(120),
            net: None,
            tax: Some(dec!(36)),
            balance: Some(dec!(10000)),
            annual_rate: Some(dec!(0.03)),
            fingerprint: None,
        })
        .await
        .unwrap();
    assert_eq!(interest.net, dec!(84.00));
}

#[tokio::test]
async fn year_summary_aggregates_income_and_realized_gains() {
    let fixture = fixture().await;
    fixture
        .income
        .record_dividend(NewDividend {
            date: date("2023-06-01"),
            asset_id: fixture.asset.id.clone(),
            shares: None,
            net: dec!(80),
            tax: Some(dec!(20)),
            fingerprint: None,
        })
        .await
        .unwrap();
    fixture
        .income
        .record_interest(NewInterest {
            date: date("2023-12-31"),
            account_id: fixture.account.id.clone(),
            gross: dec!(50),
            net: Some(dec!(40)),
            tax: None,
            balance: None,
            annual_rate: None,
            fingerprint: None,
        })
        .await
        .unwrap();

    // One 2024 round trip: bought at 100, sold at 110, gain 100.
    for (sequence, day, tx_type, price) in [
        (1u64, "2024-01-02", TransactionType::Buy, dec!(100)),
        (2, "2024-02-02", TransactionType::Sell, dec!(110)),
    ] {
        fixture
            .store
            .insert_transaction(Transaction {
                id: format!("tx-{sequence}"),
                date: date(day),
                tx_type,
                asset_id: fixture.asset.id.clone(),
                account_id: fixture.account.id.clone(),
                quantity: dec!(10),
                price: Some(price),
                commission: Decimal::ZERO,
                tax: Decimal::ZERO,
                notes: None,
                fingerprint: None,
                sequence,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    let summary = fixture.income.year_summary().unwrap();
    assert_eq!(summary.len(), 2);

    let y2023 = &summary[0];
    assert_eq!(y2023.year, 2023);
    assert_eq!(y2023.dividends_gross, dec!(100.00));
    assert_eq!(y2023.interests_net, dec!(40.00));
    assert_eq!(y2023.sales_pnl, Decimal::ZERO);
    assert_eq!(y2023.total_net, dec!(120.00));

    let y2024 = &summary[1];
    assert_eq!(y2024.year, 2024);
    assert_eq!(y2024.sales_pnl, dec!(100.00));
    assert_eq!(y2024.total_net, dec!(100.00));
}
