use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A placed order. The row and its items are written together in one
/// transaction and the item set never changes afterwards; later status
/// transitions (fulfillment, cancellation) are owned elsewhere.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Customer-facing identifier, unique for the lifetime of the store and
    /// never reused even if the order is later cancelled.
    #[sea_orm(unique)]
    pub order_number: String,

    pub customer_id: Uuid,
    pub address_id: Uuid,
    pub shift_id: Uuid,
    pub status: OrderStatus,

    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,

    /// Recorded as a label only; payment is not processed here.
    pub payment_method: String,

    /// Snapshot of the address' delivery instructions at creation time, not
    /// a live reference.
    #[sea_orm(nullable)]
    pub delivery_instructions: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}
