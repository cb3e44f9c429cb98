use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema,
};
use std::time::Duration;
use tracing::info;

use crate::config::AppConfig;
use crate::entities;

/// Type alias for a database connection pool.
pub type DbPool = DatabaseConnection;

pub async fn connect(config: &AppConfig) -> Result<DbPool, DbErr> {
    connect_url(&config.database_url).await
}

pub async fn connect_url(database_url: &str) -> Result<DbPool, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_string());
    options
        .max_connections(10)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    info!("database connection established");
    Ok(db)
}

/// Create any missing tables from the entity definitions. Used by the dev
/// server (`ensure_schema = true`) and the test harness; production schema
/// is managed out-of-band.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut statements = vec![
        schema.create_table_from_entity(entities::user::Entity),
        schema.create_table_from_entity(entities::customer_address::Entity),
        schema.create_table_from_entity(entities::delivery_shift::Entity),
        schema.create_table_from_entity(entities::product::Entity),
        schema.create_table_from_entity(entities::cart_item::Entity),
        schema.create_table_from_entity(entities::platform_settings::Entity),
        schema.create_table_from_entity(entities::order::Entity),
        schema.create_table_from_entity(entities::order_item::Entity),
        schema.create_table_from_entity(entities::order_sequence::Entity),
        schema.create_table_from_entity(entities::admin_notification::Entity),
    ];

    for statement in statements.iter_mut() {
        statement.if_not_exists();
        db.execute(backend.build(&*statement)).await?;
    }
    Ok(())
}
