use crate::assets::{Asset, AssetUpdate, NewAsset};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Trait defining the contract for Asset repository operations.
#[async_trait]
pub trait AssetRepositoryTrait: Send + Sync {
    fn get_asset(&self, asset_id: &str) -> Result<Asset>;
    fn list_assets(&self) -> Result<Vec<Asset>>;
    fn find_asset_by_name(&self, name: &str) -> Result<Option<Asset>>;
    fn find_asset_by_ticker(&self, ticker: &str) -> Result<Option<Asset>>;
    async fn create_asset(&self, new_asset: NewAsset) -> Result<Asset>;
    async fn update_asset(&self, update: AssetUpdate) -> Result<Asset>;
    async fn delete_asset(&self, asset_id: &str) -> Result<Asset>;
    /// Applies a fresh quote: price, timestamp, `price_status = Ok`.
    async fn apply_quote(
        &self,
        asset_id: &str,
        price: Decimal,
        as_of: DateTime<Utc>,
    ) -> Result<Asset>;
    /// Marks the last refresh attempt failed, leaving the prior price
    /// untouched.
    async fn mark_price_error(&self, asset_id: &str) -> Result<Asset>;
}

/// Trait defining the contract for Asset service operations.
#[async_trait]
pub trait AssetServiceTrait: Send + Sync {
    fn get_asset(&self, asset_id: &str) -> Result<Asset>;
    fn list_assets(&self) -> Result<Vec<Asset>>;
    async fn create_asset(&self, new_asset: NewAsset) -> Result<Asset>;
    async fn update_asset(&self, update: AssetUpdate) -> Result<Asset>;
    /// Deletes an asset. Rejected with a constraint error when any
    /// transaction or dividend still references it.
    async fn delete_asset(&self, asset_id: &str) -> Result<Asset>;
}
