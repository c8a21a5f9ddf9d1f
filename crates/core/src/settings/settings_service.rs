use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::errors::ValidationError;
use crate::settings::{Settings, SettingsRepositoryTrait, SettingsServiceTrait, SettingsUpdate};
use crate::Result;

/// Maximum decimal places accepted for rounding settings.
const MAX_ROUNDING_SCALE: u32 = 8;

pub struct SettingsService {
    settings_repository: Arc<dyn SettingsRepositoryTrait>,
}

impl SettingsService {
    pub fn new(settings_repository: Arc<dyn SettingsRepositoryTrait>) -> Self {
        Self {
            settings_repository,
        }
    }

    fn validate(update: &SettingsUpdate) -> Result<()> {
        if let Some(ref currency) = update.base_currency {
            if currency.trim().len() != 3 {
                return Err(ValidationError::InvalidField {
                    field: "base_currency".to_string(),
                    message: "must be a 3-letter currency code".to_string(),
                }
                .into());
            }
        }
        for (field, scale) in [
            ("rounding_money", update.rounding_money),
            ("rounding_qty", update.rounding_qty),
        ] {
            if let Some(scale) = scale {
                if scale > MAX_ROUNDING_SCALE {
                    return Err(ValidationError::InvalidField {
                        field: field.to_string(),
                        message: format!("must be at most {MAX_ROUNDING_SCALE} decimal places"),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsServiceTrait for SettingsService {
    fn get_settings(&self) -> Result<Settings> {
        self.settings_repository.get_settings()
    }

    async fn update_settings(&self, update: &SettingsUpdate) -> Result<Settings> {
        Self::validate(update)?;
        let settings = self.settings_repository.update_settings(update).await?;
        debug!(
            "Settings updated: gift_cost_mode={}, rounding={}:{}",
            settings.gift_cost_mode.as_db_str(),
            settings.rounding_money,
            settings.rounding_qty
        );
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::GiftCostMode;
    use crate::store::MemoryStore;

    fn service() -> SettingsService {
        SettingsService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn defaults_and_patch() {
        let service = service();
        let settings = service.get_settings().unwrap();
        assert_eq!(settings.base_currency, "EUR");
        assert_eq!(settings.gift_cost_mode, GiftCostMode::Zero);

        let updated = service
            .update_settings(&SettingsUpdate {
                gift_cost_mode: Some(GiftCostMode::Market),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.gift_cost_mode, GiftCostMode::Market);
        assert_eq!(updated.base_currency, "EUR");
    }

    #[tokio::test]
    async fn rejects_bad_currency_and_scale() {
        let service = service();
        assert!(service
            .update_settings(&SettingsUpdate {
                base_currency: Some("EURO".to_string()),
                ..Default::default()
            })
            .await
            .is_err());
        assert!(service
            .update_settings(&SettingsUpdate {
                rounding_money: Some(12),
                ..Default::default()
            })
            .await
            .is_err());
    }
}
