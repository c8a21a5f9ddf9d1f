use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::accounts::{Account, AccountRepositoryTrait, AccountType, NewAccount};
use crate::assets::{Asset, AssetRepositoryTrait, NewAsset};
use crate::errors::Error;
use crate::ledger::{
    LedgerError, LedgerService, LedgerServiceTrait, NewTransaction, TransactionType,
    TransactionUpdate,
};
use crate::portfolio::positions::{PositionService, PositionServiceTrait};
use crate::settings::{SettingsService, SettingsServiceTrait};
use crate::store::MemoryStore;

struct Fixture {
    store: Arc<MemoryStore>,
    ledger: LedgerService,
    positions: Arc<dyn PositionServiceTrait>,
    asset: Asset,
    account: Account,
}

async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let settings: Arc<dyn SettingsServiceTrait> = Arc::new(SettingsService::new(store.clone()));
    let positions: Arc<dyn PositionServiceTrait> =
        Arc::new(PositionService::new(store.clone(), settings.clone()));
    let ledger = LedgerService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        positions.clone(),
        settings,
    );
    let asset = store
        .create_asset(NewAsset {
            name: "Apple".to_string(),
            ticker: Some("AAPL".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    let account = store
        .create_account(NewAccount {
            name: "Broker".to_string(),
            account_type: AccountType::Investment,
            ..Default::default()
        })
        .await
        .unwrap();
    Fixture {
        store,
        ledger,
        positions,
        asset,
        account,
    }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn new_tx(
    fixture: &Fixture,
    day: &str,
    tx_type: TransactionType,
    quantity: Decimal,
    price: Decimal,
) -> NewTransaction {
    NewTransaction {
        date: date(day),
        tx_type,
        asset_id: fixture.asset.id.clone(),
        account_id: Some(fixture.account.id.clone()),
        quantity,
        price: Some(price),
        commission: None,
        tax: None,
        notes: None,
        fingerprint: None,
    }
}

#[tokio::test]
async fn record_buy_and_derive_position() {
    let fixture = fixture().await;
    fixture
        .ledger
        .record(new_tx(&fixture, "2024-01-02", TransactionType::Buy, dec!(10), dec!(100)))
        .await
        .unwrap();

    let position = fixture
        .positions
        .position(&fixture.asset.id, &fixture.account.id)
        .unwrap()
        .unwrap();
    assert_eq!(position.quantity, dec!(10));
    assert_eq!(position.average_cost, dec!(100));
}

#[tokio::test]
async fn buy_without_price_is_rejected() {
    let fixture = fixture().await;
    let mut tx = new_tx(&fixture, "2024-01-02", TransactionType::Buy, dec!(10), dec!(100));
    tx.price = None;
    let result = fixture.ledger.record(tx).await;
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[tokio::test]
async fn oversell_is_rejected_and_nothing_is_stored() {
    let fixture = fixture().await;
    fixture
        .ledger
        .record(new_tx(&fixture, "2024-01-02", TransactionType::Buy, dec!(10), dec!(100)))
        .await
        .unwrap();

    let result = fixture
        .ledger
        .record(new_tx(&fixture, "2024-02-02", TransactionType::Sell, dec!(11), dec!(100)))
        .await;
    assert!(matches!(
        result,
        Err(Error::Ledger(LedgerError::InsufficientPosition { .. }))
    ));

    let position = fixture
        .positions
        .position(&fixture.asset.id, &fixture.account.id)
        .unwrap()
        .unwrap();
    assert_eq!(position.quantity, dec!(10));
}

#[tokio::test]
async fn sell_without_account_is_inferred_from_largest_position() {
    let fixture = fixture().await;
    let second = fixture
        .store
        .create_account(NewAccount {
            name: "Second Broker".to_string(),
            account_type: AccountType::Investment,
            ..Default::default()
        })
        .await
        .unwrap();

    fixture
        .ledger
        .record(new_tx(&fixture, "2024-01-02", TransactionType::Buy, dec!(5), dec!(100)))
        .await
        .unwrap();
    let mut bigger = new_tx(&fixture, "2024-01-03", TransactionType::Buy, dec!(20), dec!(100));
    bigger.account_id = Some(second.id.clone());
    fixture.ledger.record(bigger).await.unwrap();

    let mut sale = new_tx(&fixture, "2024-02-02", TransactionType::Sell, dec!(8), dec!(110));
    sale.account_id = None;
    let recorded = fixture.ledger.record(sale).await.unwrap();
    assert_eq!(recorded.account_id, second.id);
}

#[tokio::test]
async fn sell_with_no_open_position_is_rejected() {
    let fixture = fixture().await;
    let mut sale = new_tx(&fixture, "2024-02-02", TransactionType::Sell, dec!(1), dec!(110));
    sale.account_id = None;
    let result = fixture.ledger.record(sale).await;
    assert!(matches!(
        result,
        Err(Error::Ledger(LedgerError::NoOpenPosition(_)))
    ));
}

#[tokio::test]
async fn backdated_amend_starving_a_later_sell_is_rejected() {
    let fixture = fixture().await;
    let purchase = fixture
        .ledger
        .record(new_tx(&fixture, "2024-01-02", TransactionType::Buy, dec!(10), dec!(100)))
        .await
        .unwrap();
    fixture
        .ledger
        .record(new_tx(&fixture, "2024-02-02", TransactionType::Sell, dec!(8), dec!(110)))
        .await
        .unwrap();

    // Shrinking the opening BUY below the later SELL must fail.
    let result = fixture
        .ledger
        .amend(TransactionUpdate {
            id: purchase.id.clone(),
            quantity: Some(dec!(5)),
            ..Default::default()
        })
        .await;
    assert!(matches!(
        result,
        Err(Error::Ledger(LedgerError::InsufficientPosition { .. }))
    ));

    // The rejected amend left the history unchanged.
    let unchanged = fixture.ledger.get_transaction(&purchase.id).unwrap();
    assert_eq!(unchanged.quantity, dec!(10));
}

#[tokio::test]
async fn remove_invalidates_the_derived_position() {
    let fixture = fixture().await;
    fixture
        .ledger
        .record(new_tx(&fixture, "2024-01-02", TransactionType::Buy, dec!(10), dec!(100)))
        .await
        .unwrap();
    let sale = fixture
        .ledger
        .record(new_tx(&fixture, "2024-02-02", TransactionType::Sell, dec!(10), dec!(110)))
        .await
        .unwrap();

    assert!(fixture
        .positions
        .position(&fixture.asset.id, &fixture.account.id)
        .unwrap()
        .is_none());

    fixture.ledger.remove(&sale.id).await.unwrap();
    let restored = fixture
        .positions
        .position(&fixture.asset.id, &fixture.account.id)
        .unwrap()
        .unwrap();
    assert_eq!(restored.quantity, dec!(10));
}

#[tokio::test]
async fn same_day_entries_replay_in_insertion_order() {
    let fixture = fixture().await;
    // BUY and full SELL on the same date; insertion order makes it valid.
    fixture
        .ledger
        .record(new_tx(&fixture, "2024-01-02", TransactionType::Buy, dec!(10), dec!(100)))
        .await
        .unwrap();
    fixture
        .ledger
        .record(new_tx(&fixture, "2024-01-02", TransactionType::Sell, dec!(10), dec!(110)))
        .await
        .unwrap();

    assert!(fixture
        .positions
        .position(&fixture.asset.id, &fixture.account.id)
        .unwrap()
        .is_none());
}
