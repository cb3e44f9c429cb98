use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Store-wide fee schedule, maintained by administrators. A single row;
/// checkout reads it fresh on every order so fee changes apply immediately.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "platform_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    /// Percentage in 0..=100.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub tax_percentage: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub shipping_fee: Decimal,
    /// Subtotal at or above which delivery is free.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub min_shipping: Decimal,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
