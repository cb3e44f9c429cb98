use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::user::{self, Entity as User, UserRole};

/// Who should hear about new orders.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    async fn admin_ids(&self) -> Result<Vec<Uuid>, DbErr>;
}

#[derive(Clone)]
pub struct SqlAdminDirectory {
    db: Arc<DatabaseConnection>,
}

impl SqlAdminDirectory {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AdminDirectory for SqlAdminDirectory {
    async fn admin_ids(&self) -> Result<Vec<Uuid>, DbErr> {
        let admins = User::find()
            .filter(user::Column::Role.eq(UserRole::Admin))
            .all(&*self.db)
            .await?;
        Ok(admins.into_iter().map(|admin| admin.id).collect())
    }
}
