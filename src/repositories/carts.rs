use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::{cart_item, product};

/// One line of a cart as checkout sees it. `unit_price` is already resolved
/// at snapshot time (discounted price if present, else list price); `None`
/// marks a line whose product reference no longer resolves, and the pricing
/// engine drops such lines instead of failing the whole checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub unit_price: Option<Decimal>,
    pub quantity: i32,
}

/// Ordered, merged, deduplicated cart contents. This core never mutates a
/// cart; merging happens upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
}

impl CartSnapshot {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn get_cart(&self, customer_id: Uuid) -> Result<CartSnapshot, DbErr>;
}

#[derive(Clone)]
pub struct SqlCartStore {
    db: Arc<DatabaseConnection>,
}

impl SqlCartStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CartStore for SqlCartStore {
    async fn get_cart(&self, customer_id: Uuid) -> Result<CartSnapshot, DbErr> {
        let rows = cart_item::Entity::find()
            .filter(cart_item::Column::CustomerId.eq(customer_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .find_also_related(product::Entity)
            .all(&*self.db)
            .await?;

        let lines = rows
            .into_iter()
            .map(|(item, product)| CartLine {
                product_id: item.product_id,
                unit_price: product.map(|p| p.effective_price()),
                quantity: item.quantity,
            })
            .collect();

        Ok(CartSnapshot { lines })
    }
}
