use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::entities::platform_settings::Entity as PlatformSettingsEntity;

/// Store-wide fee schedule as the pricing engine consumes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSettings {
    pub tax_percentage: Decimal,
    pub shipping_fee: Decimal,
    pub min_shipping: Decimal,
}

/// Fresh read of the platform settings. No caching here: administrators
/// change fees out-of-band and every checkout must price against the
/// schedule in force at that moment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn platform_settings(&self) -> Result<PlatformSettings, DbErr>;
}

#[derive(Clone)]
pub struct SqlSettingsStore {
    db: Arc<DatabaseConnection>,
}

impl SqlSettingsStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SettingsStore for SqlSettingsStore {
    async fn platform_settings(&self) -> Result<PlatformSettings, DbErr> {
        let row = PlatformSettingsEntity::find().one(&*self.db).await?;
        match row {
            Some(settings) => Ok(PlatformSettings {
                tax_percentage: settings.tax_percentage,
                shipping_fee: settings.shipping_fee,
                min_shipping: settings.min_shipping,
            }),
            None => {
                // Unseeded install: zero fees beat a hard-failed checkout.
                warn!("platform settings row missing, pricing with zero tax and fees");
                Ok(PlatformSettings::default())
            }
        }
    }
}
