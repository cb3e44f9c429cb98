use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::entities::user::{self, Entity as User};

/// Best-effort update of the denormalized name/phone on the customer row.
/// Checkout calls this off the critical path; a failure here never blocks
/// or fails an order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn reconcile(&self, customer_id: Uuid, name: &str, phone: &str) -> Result<(), DbErr>;
}

#[derive(Clone)]
pub struct SqlProfileStore {
    db: Arc<DatabaseConnection>,
}

impl SqlProfileStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileStore for SqlProfileStore {
    async fn reconcile(&self, customer_id: Uuid, name: &str, phone: &str) -> Result<(), DbErr> {
        let Some(customer) = User::find_by_id(customer_id).one(&*self.db).await? else {
            return Ok(());
        };

        let name_changed = customer.name != name;
        let phone_changed = customer.phone.as_deref() != Some(phone);
        if !name_changed && !phone_changed {
            return Ok(());
        }

        let mut active: user::ActiveModel = customer.into();
        if name_changed {
            active.name = Set(name.to_string());
        }
        if phone_changed {
            active.phone = Set(Some(phone.to_string()));
        }
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await?;

        info!(%customer_id, "customer profile reconciled from checkout input");
        Ok(())
    }
}
