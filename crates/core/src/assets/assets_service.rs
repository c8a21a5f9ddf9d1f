use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::assets::{Asset, AssetRepositoryTrait, AssetServiceTrait, AssetUpdate, NewAsset};
use crate::errors::ValidationError;
use crate::income::DividendRepositoryTrait;
use crate::ledger::{TransactionFilter, TransactionRepositoryTrait};
use crate::Error;
use crate::Result;

/// Service for managing assets.
pub struct AssetService {
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    dividend_repository: Arc<dyn DividendRepositoryTrait>,
}

impl AssetService {
    pub fn new(
        asset_repository: Arc<dyn AssetRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        dividend_repository: Arc<dyn DividendRepositoryTrait>,
    ) -> Self {
        Self {
            asset_repository,
            transaction_repository,
            dividend_repository,
        }
    }

    fn validate_new(new_asset: &NewAsset) -> Result<()> {
        if new_asset.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name".to_string()).into());
        }
        if let Some(ref ticker) = new_asset.ticker {
            if ticker.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: "ticker".to_string(),
                    message: "must not be blank; omit it instead".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AssetServiceTrait for AssetService {
    fn get_asset(&self, asset_id: &str) -> Result<Asset> {
        self.asset_repository.get_asset(asset_id)
    }

    fn list_assets(&self) -> Result<Vec<Asset>> {
        self.asset_repository.list_assets()
    }

    async fn create_asset(&self, new_asset: NewAsset) -> Result<Asset> {
        Self::validate_new(&new_asset)?;
        if let Some(ref ticker) = new_asset.ticker {
            if self
                .asset_repository
                .find_asset_by_ticker(ticker.trim())?
                .is_some()
            {
                return Err(Error::ConstraintViolation(format!(
                    "an asset with ticker '{}' already exists",
                    ticker.trim()
                )));
            }
        }
        let asset = self.asset_repository.create_asset(new_asset).await?;
        debug!("Created asset {} ({})", asset.name, asset.id);
        Ok(asset)
    }

    async fn update_asset(&self, update: AssetUpdate) -> Result<Asset> {
        if let Some(ref name) = update.name {
            if name.trim().is_empty() {
                return Err(ValidationError::MissingField("name".to_string()).into());
            }
        }
        if let Some(Some(ref ticker)) = update.ticker {
            match self.asset_repository.find_asset_by_ticker(ticker.trim())? {
                Some(existing) if existing.id != update.id => {
                    return Err(Error::ConstraintViolation(format!(
                        "an asset with ticker '{}' already exists",
                        ticker.trim()
                    )));
                }
                _ => {}
            }
        }
        self.asset_repository.update_asset(update).await
    }

    async fn delete_asset(&self, asset_id: &str) -> Result<Asset> {
        let referenced_by_ledger = !self
            .transaction_repository
            .list_transactions(&TransactionFilter {
                asset_id: Some(asset_id.to_string()),
                ..Default::default()
            })?
            .is_empty();
        let referenced_by_dividends = !self
            .dividend_repository
            .list_dividends_for_asset(asset_id)?
            .is_empty();

        if referenced_by_ledger || referenced_by_dividends {
            return Err(Error::ConstraintViolation(
                "cannot delete an asset with transactions or dividends".to_string(),
            ));
        }

        self.asset_repository.delete_asset(asset_id).await
    }
}
