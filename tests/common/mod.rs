//! Shared harness: checkout service wired against an in-memory SQLite
//! database with the schema built from the entity definitions.
#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use tokio::sync::Mutex;
use uuid::Uuid;

use storefront_checkout::cache::ViewInvalidator;
use storefront_checkout::entities::user::UserRole;
use storefront_checkout::entities::{
    cart_item, customer_address, delivery_shift, order, platform_settings, product, user,
};
use storefront_checkout::notifications::{
    NotificationFanout, RealtimeChannel, RealtimeError, SqlNotificationStore,
};
use storefront_checkout::repositories::{
    CartSnapshot, CartStore, SqlAddressBook, SqlAdminDirectory, SqlCartStore, SqlProfileStore,
    SqlSettingsStore, SqlShiftDirectory,
};
use storefront_checkout::services::checkout::{CheckoutService, CheckoutTimeouts};
use storefront_checkout::services::order_numbers::OrderNumberGenerator;
use storefront_checkout::services::validation::CheckoutInput;

/// Realtime channel double: records publishes, or fails every publish when
/// constructed with `failing()`.
#[derive(Default)]
pub struct RecordingRealtime {
    fail: bool,
    pub published: Mutex<Vec<(String, String)>>,
}

impl RecordingRealtime {
    pub fn failing() -> Self {
        Self {
            fail: true,
            published: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RealtimeChannel for RecordingRealtime {
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        _payload: serde_json::Value,
    ) -> Result<(), RealtimeError> {
        if self.fail {
            let parse_err = serde_json::from_str::<serde_json::Value>("").unwrap_err();
            return Err(RealtimeError::Serialization(parse_err));
        }
        self.published
            .lock()
            .await
            .push((channel.to_string(), event.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub checkout: CheckoutService,
    pub views: Arc<ViewInvalidator>,
    pub realtime: Arc<RecordingRealtime>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_realtime(Arc::new(RecordingRealtime::default())).await
    }

    pub async fn with_realtime(realtime: Arc<RecordingRealtime>) -> Self {
        let db = Arc::new(memory_db().await);
        let views = Arc::new(ViewInvalidator::new());

        let fanout = Arc::new(NotificationFanout::new(
            Arc::new(SqlNotificationStore::new(db.clone())),
            Arc::new(SqlAdminDirectory::new(db.clone())),
            realtime.clone(),
        ));

        let checkout = CheckoutService::new(
            db.clone(),
            Arc::new(SqlAddressBook::new(db.clone())),
            Arc::new(SqlShiftDirectory::new(db.clone())),
            Arc::new(SqlSettingsStore::new(db.clone())),
            Arc::new(SqlProfileStore::new(db.clone())),
            Arc::new(OrderNumberGenerator::new(db.clone())),
            fanout,
            views.clone(),
            None,
            CheckoutTimeouts::default(),
        );

        Self {
            db,
            checkout,
            views,
            realtime,
        }
    }

    /// Snapshot the customer's cart the way the handler does.
    pub async fn cart_for(&self, customer_id: Uuid) -> CartSnapshot {
        SqlCartStore::new(self.db.clone())
            .get_cart(customer_id)
            .await
            .expect("cart read")
    }
}

/// A single shared-connection in-memory database. One connection keeps every
/// session on the same SQLite database.
pub async fn memory_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.expect("sqlite connect");
    storefront_checkout::db::ensure_schema(&db)
        .await
        .expect("schema");
    db
}

pub async fn seed_settings(db: &DatabaseConnection, tax: Decimal, fee: Decimal, min: Decimal) {
    platform_settings::ActiveModel {
        id: Set(1),
        tax_percentage: Set(tax),
        shipping_fee: Set(fee),
        min_shipping: Set(min),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("seed settings");
}

pub async fn seed_user(db: &DatabaseConnection, name: &str, role: UserRole) -> Uuid {
    let id = Uuid::new_v4();
    user::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        phone: Set(None),
        role: Set(role),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("seed user");
    id
}

pub async fn seed_address(db: &DatabaseConnection, customer_id: Uuid) -> Uuid {
    let id = Uuid::new_v4();
    customer_address::ActiveModel {
        id: Set(id),
        customer_id: Set(customer_id),
        label: Set(Some("Home".to_string())),
        address_line_1: Set("12 Harbor Street".to_string()),
        address_line_2: Set(None),
        city: Set("Haifa".to_string()),
        delivery_instructions: Set(Some("Ring twice".to_string())),
        is_default: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("seed address");
    id
}

pub async fn seed_shift(db: &DatabaseConnection) -> Uuid {
    let id = Uuid::new_v4();
    delivery_shift::ActiveModel {
        id: Set(id),
        label: Set("Morning".to_string()),
        start_hour: Set(9),
        end_hour: Set(12),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("seed shift");
    id
}

pub async fn seed_product(
    db: &DatabaseConnection,
    price: Decimal,
    discounted_price: Option<Decimal>,
) -> Uuid {
    let id = Uuid::new_v4();
    product::ActiveModel {
        id: Set(id),
        name: Set("Olive oil".to_string()),
        price: Set(price),
        discounted_price: Set(discounted_price),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("seed product");
    id
}

pub async fn seed_cart_item(
    db: &DatabaseConnection,
    customer_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) {
    cart_item::ActiveModel {
        id: Set(Uuid::new_v4()),
        customer_id: Set(customer_id),
        product_id: Set(product_id),
        quantity: Set(quantity),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("seed cart item");
}

/// Insert an order row directly, e.g. to occupy an order number.
pub async fn seed_order_with_number(
    db: &DatabaseConnection,
    customer_id: Uuid,
    address_id: Uuid,
    shift_id: Uuid,
    number: &str,
) {
    order::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_number: Set(number.to_string()),
        customer_id: Set(customer_id),
        address_id: Set(address_id),
        shift_id: Set(shift_id),
        status: Set(order::OrderStatus::Pending),
        amount: Set(Decimal::ZERO),
        payment_method: Set("card".to_string()),
        delivery_instructions: Set(None),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("seed order");
}

pub fn checkout_input(address_id: Uuid, shift_id: Uuid) -> CheckoutInput {
    CheckoutInput {
        full_name: "Dana Levy".to_string(),
        phone: "+972 52-123-4567".to_string(),
        address_id: address_id.to_string(),
        shift_id: shift_id.to_string(),
        payment_method: "cash_on_delivery".to_string(),
        accepted_terms: Some(true),
    }
}

/// Poll for a condition produced by a detached task.
pub async fn eventually<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}
