use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::customer_address::{self, Entity as CustomerAddress};

/// Read access to a customer's address book.
///
/// Ownership is part of the lookup signature: an address that exists but
/// belongs to another customer answers `None`, indistinguishable from an
/// address that never existed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AddressBook: Send + Sync {
    async fn find_address(
        &self,
        address_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<customer_address::Model>, DbErr>;
}

#[derive(Clone)]
pub struct SqlAddressBook {
    db: Arc<DatabaseConnection>,
}

impl SqlAddressBook {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AddressBook for SqlAddressBook {
    async fn find_address(
        &self,
        address_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<customer_address::Model>, DbErr> {
        CustomerAddress::find_by_id(address_id)
            .filter(customer_address::Column::CustomerId.eq(owner_id))
            .one(&*self.db)
            .await
    }
}
