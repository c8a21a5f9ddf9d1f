use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use log::debug;
use num_traits::Zero;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::accounts::AccountRepositoryTrait;
use crate::assets::AssetRepositoryTrait;
use crate::errors::ValidationError;
use crate::ledger::{
    LedgerError, LedgerServiceTrait, NewTransaction, Transaction, TransactionFilter,
    TransactionRepositoryTrait, TransactionType, TransactionUpdate,
};
use crate::portfolio::positions::{replay, PositionServiceTrait};
use crate::settings::SettingsServiceTrait;
use crate::utils::Page;
use crate::Result;

/// Service for ledger mutations. Mutations to a single asset+account are
/// serialized through a keyed mutex; different keys proceed concurrently.
pub struct LedgerService {
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    account_repository: Arc<dyn AccountRepositoryTrait>,
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    position_service: Arc<dyn PositionServiceTrait>,
    settings_service: Arc<dyn SettingsServiceTrait>,
    key_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LedgerService {
    pub fn new(
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        account_repository: Arc<dyn AccountRepositoryTrait>,
        asset_repository: Arc<dyn AssetRepositoryTrait>,
        position_service: Arc<dyn PositionServiceTrait>,
        settings_service: Arc<dyn SettingsServiceTrait>,
    ) -> Self {
        Self {
            transaction_repository,
            account_repository,
            asset_repository,
            position_service,
            settings_service,
            key_locks: DashMap::new(),
        }
    }

    fn key_lock(&self, asset_id: &str, account_id: &str) -> Arc<Mutex<()>> {
        self.key_locks
            .entry(format!("{asset_id}:{account_id}"))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn validate_fields(
        tx_type: TransactionType,
        quantity: Decimal,
        price: Option<Decimal>,
        commission: Decimal,
        tax: Decimal,
    ) -> Result<()> {
        if quantity <= Decimal::zero() {
            return Err(ValidationError::InvalidField {
                field: "quantity".to_string(),
                message: "must be positive".to_string(),
            }
            .into());
        }
        match tx_type {
            TransactionType::Buy | TransactionType::Sell => match price {
                None => {
                    return Err(ValidationError::MissingField("price".to_string()).into());
                }
                Some(p) if p < Decimal::zero() => {
                    return Err(ValidationError::InvalidField {
                        field: "price".to_string(),
                        message: "must not be negative".to_string(),
                    }
                    .into());
                }
                _ => {}
            },
            TransactionType::Gift => {
                if let Some(p) = price {
                    if p < Decimal::zero() {
                        return Err(ValidationError::InvalidField {
                            field: "price".to_string(),
                            message: "must not be negative".to_string(),
                        }
                        .into());
                    }
                }
            }
        }
        if commission < Decimal::zero() {
            return Err(ValidationError::InvalidField {
                field: "commission".to_string(),
                message: "must not be negative".to_string(),
            }
            .into());
        }
        if tax < Decimal::zero() {
            return Err(ValidationError::InvalidField {
                field: "tax".to_string(),
                message: "must not be negative".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Account a SELL without an explicit account belongs to: the one
    /// holding the largest open position, tie-broken by account id.
    fn infer_sell_account(&self, asset_id: &str) -> Result<String> {
        let mut positions = self.position_service.positions_for_asset(asset_id)?;
        positions.sort_by(|a, b| {
            b.quantity
                .cmp(&a.quantity)
                .then_with(|| a.account_id.cmp(&b.account_id))
        });
        positions
            .into_iter()
            .find(|p| p.quantity > Decimal::zero())
            .map(|p| p.account_id)
            .ok_or_else(|| LedgerError::NoOpenPosition(asset_id.to_string()).into())
    }

    /// Replays the asset's planned history and rejects the mutation when
    /// any SELL would exceed its derivable position at its ordering
    /// point.
    fn validate_planned(&self, mut planned: Vec<Transaction>) -> Result<()> {
        planned.sort_by(|a, b| a.date.cmp(&b.date).then(a.sequence.cmp(&b.sequence)));
        let gift_cost_mode = self.settings_service.get_settings()?.gift_cost_mode;
        replay(&planned, gift_cost_mode)?;
        Ok(())
    }
}

#[async_trait]
impl LedgerServiceTrait for LedgerService {
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        self.transaction_repository.get_transaction(transaction_id)
    }

    fn list_for(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        self.transaction_repository.list_transactions(filter)
    }

    fn search(
        &self,
        page: usize,
        page_size: usize,
        filter: &TransactionFilter,
    ) -> Result<Page<Transaction>> {
        let all = self.transaction_repository.list_transactions(filter)?;
        Ok(Page::slice(all, page, page_size))
    }

    async fn record(&self, new_transaction: NewTransaction) -> Result<Transaction> {
        let commission = new_transaction.commission.unwrap_or(Decimal::ZERO);
        let tax = new_transaction.tax.unwrap_or(Decimal::ZERO);
        Self::validate_fields(
            new_transaction.tx_type,
            new_transaction.quantity,
            new_transaction.price,
            commission,
            tax,
        )?;
        self.asset_repository.get_asset(&new_transaction.asset_id)?;

        let account_id = match (&new_transaction.account_id, new_transaction.tx_type) {
            (Some(id), _) => {
                self.account_repository.get_account(id)?;
                id.clone()
            }
            (None, TransactionType::Sell) => {
                self.infer_sell_account(&new_transaction.asset_id)?
            }
            (None, _) => {
                return Err(ValidationError::MissingField("account_id".to_string()).into());
            }
        };

        let lock = self.key_lock(&new_transaction.asset_id, &account_id);
        let _guard = lock.lock().await;

        let candidate = Transaction {
            id: Uuid::new_v4().to_string(),
            date: new_transaction.date,
            tx_type: new_transaction.tx_type,
            asset_id: new_transaction.asset_id.clone(),
            account_id,
            quantity: new_transaction.quantity,
            price: new_transaction.price,
            commission,
            tax,
            notes: new_transaction.notes,
            fingerprint: new_transaction.fingerprint,
            // Placeholder; the store assigns the real insertion sequence.
            // u64::MAX keeps the candidate after all same-day peers
            // during validation, matching its post-insert position.
            sequence: u64::MAX,
            created_at: Utc::now(),
        };

        let mut planned = self
            .transaction_repository
            .list_transactions(&TransactionFilter::for_asset(&candidate.asset_id))?;
        planned.push(candidate.clone());
        self.validate_planned(planned)?;

        let recorded = self.transaction_repository.insert_transaction(candidate).await?;
        self.position_service.invalidate_asset(&recorded.asset_id);
        debug!(
            "Recorded {} {} x{} for asset {}",
            recorded.tx_type.as_db_str(),
            recorded.date,
            recorded.quantity,
            recorded.asset_id
        );
        Ok(recorded)
    }

    async fn amend(&self, update: TransactionUpdate) -> Result<Transaction> {
        let existing = self.transaction_repository.get_transaction(&update.id)?;

        let mut amended = existing.clone();
        if let Some(date) = update.date {
            amended.date = date;
        }
        if let Some(tx_type) = update.tx_type {
            amended.tx_type = tx_type;
        }
        if let Some(ref account_id) = update.account_id {
            self.account_repository.get_account(account_id)?;
            amended.account_id = account_id.clone();
        }
        if let Some(quantity) = update.quantity {
            amended.quantity = quantity;
        }
        if let Some(price) = update.price {
            amended.price = Some(price);
        }
        if let Some(commission) = update.commission {
            amended.commission = commission;
        }
        if let Some(tax) = update.tax {
            amended.tax = tax;
        }
        if let Some(notes) = update.notes {
            amended.notes = Some(notes);
        }
        Self::validate_fields(
            amended.tx_type,
            amended.quantity,
            amended.price,
            amended.commission,
            amended.tax,
        )?;

        // Lock both affected keys in a stable order when the account
        // changes.
        let mut keys = vec![existing.account_id.clone()];
        if amended.account_id != existing.account_id {
            keys.push(amended.account_id.clone());
            keys.sort();
        }
        let locks: Vec<_> = keys
            .iter()
            .map(|account_id| self.key_lock(&amended.asset_id, account_id))
            .collect();
        let mut guards = Vec::with_capacity(locks.len());
        for lock in &locks {
            guards.push(lock.lock().await);
        }

        // Re-validate the full planned history; a backdated edit can
        // starve a later SELL.
        let mut planned = self
            .transaction_repository
            .list_transactions(&TransactionFilter::for_asset(&amended.asset_id))?;
        if let Some(slot) = planned.iter_mut().find(|tx| tx.id == amended.id) {
            *slot = amended.clone();
        }
        self.validate_planned(planned)?;

        let updated = self.transaction_repository.update_transaction(amended).await?;
        self.position_service.invalidate_asset(&updated.asset_id);
        Ok(updated)
    }

    async fn remove(&self, transaction_id: &str) -> Result<Transaction> {
        let existing = self.transaction_repository.get_transaction(transaction_id)?;
        let lock = self.key_lock(&existing.asset_id, &existing.account_id);
        let _guard = lock.lock().await;

        let removed = self
            .transaction_repository
            .delete_transaction(transaction_id)
            .await?;
        self.position_service.invalidate_asset(&removed.asset_id);
        debug!("Removed transaction {}", removed.id);
        Ok(removed)
    }
}
