use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use log::debug;

use crate::ledger::{TransactionFilter, TransactionRepositoryTrait};
use crate::portfolio::positions::{replay, Position, RealizedGain, ReplayOutcome};
use crate::settings::{GiftCostMode, SettingsServiceTrait};
use crate::Result;

/// Trait defining the contract for position queries.
pub trait PositionServiceTrait: Send + Sync {
    fn positions(&self) -> Result<Vec<Position>>;
    fn positions_for_asset(&self, asset_id: &str) -> Result<Vec<Position>>;
    fn position(&self, asset_id: &str, account_id: &str) -> Result<Option<Position>>;
    fn realized_gains(&self) -> Result<Vec<RealizedGain>>;
    /// Drops cached replay results for one asset. Called by the ledger
    /// after every mutation touching the asset.
    fn invalidate_asset(&self, asset_id: &str);
}

#[derive(Clone)]
struct CachedReplay {
    gift_cost_mode: GiftCostMode,
    positions: Vec<Position>,
    realized_gains: Vec<RealizedGain>,
}

/// Recomputes positions per asset from the ledger on read, with a
/// per-asset cache invalidated by ledger mutations.
pub struct PositionService {
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    settings_service: Arc<dyn SettingsServiceTrait>,
    cache: DashMap<String, CachedReplay>,
}

impl PositionService {
    pub fn new(
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        settings_service: Arc<dyn SettingsServiceTrait>,
    ) -> Self {
        Self {
            transaction_repository,
            settings_service,
            cache: DashMap::new(),
        }
    }

    fn replay_asset(&self, asset_id: &str) -> Result<CachedReplay> {
        let gift_cost_mode = self.settings_service.get_settings()?.gift_cost_mode;
        if let Some(cached) = self.cache.get(asset_id) {
            // A changed gift cost policy invalidates the entry in place.
            if cached.gift_cost_mode == gift_cost_mode {
                return Ok(cached.clone());
            }
        }

        let transactions = self
            .transaction_repository
            .list_transactions(&TransactionFilter::for_asset(asset_id))?;
        let ReplayOutcome {
            positions,
            realized_gains,
        } = replay(&transactions, gift_cost_mode)?;
        debug!(
            "Replayed {} transactions for asset {}: {} open position(s)",
            transactions.len(),
            asset_id,
            positions.len()
        );

        let entry = CachedReplay {
            gift_cost_mode,
            positions,
            realized_gains,
        };
        self.cache.insert(asset_id.to_string(), entry.clone());
        Ok(entry)
    }

    fn asset_ids(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .transaction_repository
            .list_transactions(&TransactionFilter::default())?
            .into_iter()
            .map(|tx| tx.asset_id)
            .collect())
    }
}

impl PositionServiceTrait for PositionService {
    fn positions(&self) -> Result<Vec<Position>> {
        let mut all = Vec::new();
        for asset_id in self.asset_ids()? {
            all.extend(self.replay_asset(&asset_id)?.positions);
        }
        Ok(all)
    }

    fn positions_for_asset(&self, asset_id: &str) -> Result<Vec<Position>> {
        Ok(self.replay_asset(asset_id)?.positions)
    }

    fn position(&self, asset_id: &str, account_id: &str) -> Result<Option<Position>> {
        Ok(self
            .replay_asset(asset_id)?
            .positions
            .into_iter()
            .find(|p| p.account_id == account_id))
    }

    fn realized_gains(&self) -> Result<Vec<RealizedGain>> {
        let mut all = Vec::new();
        for asset_id in self.asset_ids()? {
            all.extend(self.replay_asset(&asset_id)?.realized_gains);
        }
        all.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(all)
    }

    fn invalidate_asset(&self, asset_id: &str) {
        self.cache.remove(asset_id);
    }
}
