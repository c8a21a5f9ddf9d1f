//! In-process store.
//!
//! One `RwLock`-guarded map per entity, plus an atomic insertion counter
//! that assigns the transaction `sequence` used as the same-day ledger
//! tie-break. All repository traits are implemented on the one struct so
//! a single `Arc<MemoryStore>` can back every service.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::accounts::{Account, AccountRepositoryTrait, AccountUpdate, NewAccount};
use crate::assets::{
    Asset, AssetRepositoryTrait, AssetUpdate, NewAsset, PriceMode, PriceStatus,
};
use crate::errors::StoreError;
use crate::income::{
    Dividend, DividendRepositoryTrait, Interest, InterestRepositoryTrait,
};
use crate::ledger::{Transaction, TransactionFilter, TransactionRepositoryTrait};
use crate::settings::{Settings, SettingsRepositoryTrait, SettingsUpdate};
use crate::Result;

#[derive(Default)]
pub struct MemoryStore {
    settings: RwLock<Settings>,
    accounts: RwLock<HashMap<String, Account>>,
    assets: RwLock<HashMap<String, Asset>>,
    transactions: RwLock<HashMap<String, Transaction>>,
    dividends: RwLock<HashMap<String, Dividend>>,
    interests: RwLock<HashMap<String, Interest>>,
    sequence: AtomicU64,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| StoreError::Internal("store lock poisoned".to_string()).into())
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| StoreError::Internal("store lock poisoned".to_string()).into())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn base_currency(&self) -> Result<String> {
        Ok(read(&self.settings)?.base_currency.clone())
    }
}

#[async_trait]
impl SettingsRepositoryTrait for MemoryStore {
    fn get_settings(&self) -> Result<Settings> {
        Ok(read(&self.settings)?.clone())
    }

    async fn update_settings(&self, update: &SettingsUpdate) -> Result<Settings> {
        let mut settings = write(&self.settings)?;
        if let Some(ref currency) = update.base_currency {
            settings.base_currency = currency.trim().to_uppercase();
        }
        if let Some(mode) = update.gift_cost_mode {
            settings.gift_cost_mode = mode;
        }
        if let Some(scale) = update.rounding_money {
            settings.rounding_money = scale;
        }
        if let Some(scale) = update.rounding_qty {
            settings.rounding_qty = scale;
        }
        if let Some(interval) = update.price_update_interval {
            settings.price_update_interval = interval;
        }
        Ok(settings.clone())
    }
}

#[async_trait]
impl AccountRepositoryTrait for MemoryStore {
    fn get_account(&self, account_id: &str) -> Result<Account> {
        read(&self.accounts)?
            .get(account_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("account {account_id}")).into())
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        let mut accounts: Vec<Account> = read(&self.accounts)?.values().cloned().collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(accounts)
    }

    fn find_account_by_name(&self, name: &str) -> Result<Option<Account>> {
        let needle = name.trim().to_lowercase();
        Ok(read(&self.accounts)?
            .values()
            .find(|a| a.name.to_lowercase() == needle)
            .cloned())
    }

    async fn create_account(&self, new_account: NewAccount) -> Result<Account> {
        if self.find_account_by_name(&new_account.name)?.is_some() {
            return Err(
                StoreError::UniqueViolation(format!("account name '{}'", new_account.name)).into(),
            );
        }
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4().to_string(),
            name: new_account.name.trim().to_string(),
            account_type: new_account.account_type,
            currency: match new_account.currency {
                Some(c) => c,
                None => self.base_currency()?,
            },
            balance: new_account.balance.unwrap_or(Decimal::ZERO),
            created_at: now,
            updated_at: now,
        };
        write(&self.accounts)?.insert(account.id.clone(), account.clone());
        Ok(account)
    }

    async fn update_account(&self, update: AccountUpdate) -> Result<Account> {
        let mut accounts = write(&self.accounts)?;
        let account = accounts
            .get_mut(&update.id)
            .ok_or_else(|| StoreError::NotFound(format!("account {}", update.id)))?;
        if let Some(name) = update.name {
            account.name = name.trim().to_string();
        }
        if let Some(account_type) = update.account_type {
            account.account_type = account_type;
        }
        if let Some(currency) = update.currency {
            account.currency = currency;
        }
        if let Some(balance) = update.balance {
            account.balance = balance;
        }
        account.updated_at = Utc::now();
        Ok(account.clone())
    }

    async fn delete_account(&self, account_id: &str) -> Result<Account> {
        write(&self.accounts)?
            .remove(account_id)
            .ok_or_else(|| StoreError::NotFound(format!("account {account_id}")).into())
    }
}

#[async_trait]
impl AssetRepositoryTrait for MemoryStore {
    fn get_asset(&self, asset_id: &str) -> Result<Asset> {
        read(&self.assets)?
            .get(asset_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("asset {asset_id}")).into())
    }

    fn list_assets(&self) -> Result<Vec<Asset>> {
        let mut assets: Vec<Asset> = read(&self.assets)?.values().cloned().collect();
        assets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(assets)
    }

    fn find_asset_by_name(&self, name: &str) -> Result<Option<Asset>> {
        let needle = name.trim().to_lowercase();
        Ok(read(&self.assets)?
            .values()
            .find(|a| a.name.to_lowercase() == needle)
            .cloned())
    }

    fn find_asset_by_ticker(&self, ticker: &str) -> Result<Option<Asset>> {
        let needle = ticker.trim().to_uppercase();
        Ok(read(&self.assets)?
            .values()
            .find(|a| {
                a.ticker
                    .as_deref()
                    .map(|t| t.to_uppercase() == needle)
                    .unwrap_or(false)
            })
            .cloned())
    }

    async fn create_asset(&self, new_asset: NewAsset) -> Result<Asset> {
        if self.find_asset_by_name(&new_asset.name)?.is_some() {
            return Err(
                StoreError::UniqueViolation(format!("asset name '{}'", new_asset.name)).into(),
            );
        }
        let now = Utc::now();
        let ticker = new_asset
            .ticker
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty());
        let price_status = match (&ticker, &new_asset.current_price) {
            (None, _) => PriceStatus::NoTicker,
            (Some(_), Some(_)) => PriceStatus::Ok,
            (Some(_), None) => PriceStatus::Error,
        };
        let asset = Asset {
            id: Uuid::new_v4().to_string(),
            name: new_asset.name.trim().to_string(),
            ticker,
            asset_type: new_asset.asset_type,
            currency: match new_asset.currency {
                Some(c) => c,
                None => self.base_currency()?,
            },
            price_mode: new_asset.price_mode.unwrap_or(PriceMode::Auto),
            current_price: new_asset.current_price,
            price_status,
            price_updated_at: new_asset.current_price.map(|_| now),
            created_at: now,
            updated_at: now,
        };
        write(&self.assets)?.insert(asset.id.clone(), asset.clone());
        Ok(asset)
    }

    async fn update_asset(&self, update: AssetUpdate) -> Result<Asset> {
        let mut assets = write(&self.assets)?;
        let asset = assets
            .get_mut(&update.id)
            .ok_or_else(|| StoreError::NotFound(format!("asset {}", update.id)))?;
        if let Some(name) = update.name {
            asset.name = name.trim().to_string();
        }
        if let Some(ticker) = update.ticker {
            asset.ticker = ticker
                .map(|t| t.trim().to_uppercase())
                .filter(|t| !t.is_empty());
        }
        if let Some(asset_type) = update.asset_type {
            asset.asset_type = asset_type;
        }
        if let Some(currency) = update.currency {
            asset.currency = currency;
        }
        if let Some(price_mode) = update.price_mode {
            asset.price_mode = price_mode;
        }
        if let Some(price) = update.current_price {
            asset.current_price = Some(price);
            asset.price_updated_at = Some(Utc::now());
        }
        asset.reconcile_price_status();
        asset.updated_at = Utc::now();
        Ok(asset.clone())
    }

    async fn delete_asset(&self, asset_id: &str) -> Result<Asset> {
        write(&self.assets)?
            .remove(asset_id)
            .ok_or_else(|| StoreError::NotFound(format!("asset {asset_id}")).into())
    }

    async fn apply_quote(
        &self,
        asset_id: &str,
        price: Decimal,
        as_of: DateTime<Utc>,
    ) -> Result<Asset> {
        let mut assets = write(&self.assets)?;
        let asset = assets
            .get_mut(asset_id)
            .ok_or_else(|| StoreError::NotFound(format!("asset {asset_id}")))?;
        asset.current_price = Some(price);
        asset.price_status = PriceStatus::Ok;
        asset.price_updated_at = Some(as_of);
        asset.updated_at = Utc::now();
        Ok(asset.clone())
    }

    async fn mark_price_error(&self, asset_id: &str) -> Result<Asset> {
        let mut assets = write(&self.assets)?;
        let asset = assets
            .get_mut(asset_id)
            .ok_or_else(|| StoreError::NotFound(format!("asset {asset_id}")))?;
        asset.price_status = PriceStatus::Error;
        asset.updated_at = Utc::now();
        Ok(asset.clone())
    }
}

#[async_trait]
impl TransactionRepositoryTrait for MemoryStore {
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        read(&self.transactions)?
            .get(transaction_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("transaction {transaction_id}")).into())
    }

    fn list_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let mut transactions: Vec<Transaction> = read(&self.transactions)?
            .values()
            .filter(|tx| filter.matches(tx))
            .cloned()
            .collect();
        transactions.sort_by(|a, b| a.date.cmp(&b.date).then(a.sequence.cmp(&b.sequence)));
        Ok(transactions)
    }

    fn transaction_fingerprints(&self) -> Result<HashSet<String>> {
        Ok(read(&self.transactions)?
            .values()
            .filter_map(|tx| tx.fingerprint.clone())
            .collect())
    }

    async fn insert_transaction(&self, mut transaction: Transaction) -> Result<Transaction> {
        transaction.sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        write(&self.transactions)?.insert(transaction.id.clone(), transaction.clone());
        Ok(transaction)
    }

    async fn update_transaction(&self, mut transaction: Transaction) -> Result<Transaction> {
        let mut transactions = write(&self.transactions)?;
        let existing = transactions
            .get(&transaction.id)
            .ok_or_else(|| StoreError::NotFound(format!("transaction {}", transaction.id)))?;
        // The insertion sequence survives edits so same-day ordering
        // stays stable.
        transaction.sequence = existing.sequence;
        transactions.insert(transaction.id.clone(), transaction.clone());
        Ok(transaction)
    }

    async fn delete_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        write(&self.transactions)?
            .remove(transaction_id)
            .ok_or_else(|| StoreError::NotFound(format!("transaction {transaction_id}")).into())
    }
}

#[async_trait]
impl DividendRepositoryTrait for MemoryStore {
    fn get_dividend(&self, dividend_id: &str) -> Result<Dividend> {
        read(&self.dividends)?
            .get(dividend_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("dividend {dividend_id}")).into())
    }

    fn list_dividends(&self) -> Result<Vec<Dividend>> {
        let mut dividends: Vec<Dividend> = read(&self.dividends)?.values().cloned().collect();
        dividends.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(dividends)
    }

    fn list_dividends_for_asset(&self, asset_id: &str) -> Result<Vec<Dividend>> {
        let mut dividends: Vec<Dividend> = read(&self.dividends)?
            .values()
            .filter(|d| d.asset_id == asset_id)
            .cloned()
            .collect();
        dividends.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(dividends)
    }

    fn dividend_fingerprints(&self) -> Result<HashSet<String>> {
        Ok(read(&self.dividends)?
            .values()
            .filter_map(|d| d.fingerprint.clone())
            .collect())
    }

    async fn insert_dividend(&self, dividend: Dividend) -> Result<Dividend> {
        write(&self.dividends)?.insert(dividend.id.clone(), dividend.clone());
        Ok(dividend)
    }

    async fn update_dividend(&self, dividend: Dividend) -> Result<Dividend> {
        let mut dividends = write(&self.dividends)?;
        if !dividends.contains_key(&dividend.id) {
            return Err(StoreError::NotFound(format!("dividend {}", dividend.id)).into());
        }
        dividends.insert(dividend.id.clone(), dividend.clone());
        Ok(dividend)
    }

    async fn delete_dividend(&self, dividend_id: &str) -> Result<Dividend> {
        write(&self.dividends)?
            .remove(dividend_id)
            .ok_or_else(|| StoreError::NotFound(format!("dividend {dividend_id}")).into())
    }
}

#[async_trait]
impl InterestRepositoryTrait for MemoryStore {
    fn get_interest(&self, interest_id: &str) -> Result<Interest> {
        read(&self.interests)?
            .get(interest_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("interest {interest_id}")).into())
    }

    fn list_interests(&self) -> Result<Vec<Interest>> {
        let mut interests: Vec<Interest> = read(&self.interests)?.values().cloned().collect();
        interests.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(interests)
    }

    fn list_interests_for_account(&self, account_id: &str) -> Result<Vec<Interest>> {
        let mut interests: Vec<Interest> = read(&self.interests)?
            .values()
            .filter(|i| i.account_id == account_id)
            .cloned()
            .collect();
        interests.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(interests)
    }

    fn interest_fingerprints(&self) -> Result<HashSet<String>> {
        Ok(read(&self.interests)?
            .values()
            .filter_map(|i| i.fingerprint.clone())
            .collect())
    }

    async fn insert_interest(&self, interest: Interest) -> Result<Interest> {
        write(&self.interests)?.insert(interest.id.clone(), interest.clone());
        Ok(interest)
    }

    async fn update_interest(&self, interest: Interest) -> Result<Interest> {
        let mut interests = write(&self.interests)?;
        if !interests.contains_key(&interest.id) {
            return Err(StoreError::NotFound(format!("interest {}", interest.id)).into());
        }
        interests.insert(interest.id.clone(), interest.clone());
        Ok(interest)
    }

    async fn delete_interest(&self, interest_id: &str) -> Result<Interest> {
        write(&self.interests)?
            .remove(interest_id)
            .ok_or_else(|| StoreError::NotFound(format!("interest {interest_id}")).into())
    }
}
