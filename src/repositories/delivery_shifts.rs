use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::delivery_shift::{self, Entity as DeliveryShift};

/// Read access to the global delivery-shift catalog. Shifts carry no
/// ownership; any customer may select any active shift.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShiftDirectory: Send + Sync {
    async fn find_shift(&self, shift_id: Uuid) -> Result<Option<delivery_shift::Model>, DbErr>;
}

#[derive(Clone)]
pub struct SqlShiftDirectory {
    db: Arc<DatabaseConnection>,
}

impl SqlShiftDirectory {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ShiftDirectory for SqlShiftDirectory {
    async fn find_shift(&self, shift_id: Uuid) -> Result<Option<delivery_shift::Model>, DbErr> {
        DeliveryShift::find_by_id(shift_id)
            .filter(delivery_shift::Column::IsActive.eq(true))
            .one(&*self.db)
            .await
    }
}
