use crate::settings::{Settings, SettingsUpdate};
use crate::Result;
use async_trait::async_trait;

/// Trait defining the contract for Settings repository operations.
#[async_trait]
pub trait SettingsRepositoryTrait: Send + Sync {
    fn get_settings(&self) -> Result<Settings>;
    async fn update_settings(&self, update: &SettingsUpdate) -> Result<Settings>;
}

/// Trait defining the contract for Settings service operations.
#[async_trait]
pub trait SettingsServiceTrait: Send + Sync {
    fn get_settings(&self) -> Result<Settings>;
    async fn update_settings(&self, update: &SettingsUpdate) -> Result<Settings>;
}
