//! Admin notification fan-out.
//!
//! For every committed order, each administrator gets a durable notification
//! row first; a realtime push follows as a best-effort accelerator. The
//! durable rows are the source of truth: if the realtime channel is down
//! the push is abandoned with a log line and the admin simply sees the
//! notification on next page load. Nothing in this module can fail the
//! checkout that triggered it.

use async_trait::async_trait;
use chrono::Utc;
use metrics::counter;
use redis::AsyncCommands;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::entities::admin_notification::{self, NotificationKind};
use crate::repositories::AdminDirectory;

/// Channel an admin's realtime events are published on.
fn admin_channel(admin_id: Uuid) -> String {
    format!("admin:{admin_id}")
}

/// What fan-out needs to know about a committed order.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub amount: Decimal,
}

impl PlacedOrder {
    fn action_url(&self) -> String {
        format!("/admin/orders/{}", self.order_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewAdminNotification {
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    pub action_url: Option<String>,
}

/// Durable notification records, read back by the admin console.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create(&self, notification: NewAdminNotification) -> Result<(), DbErr>;
}

#[derive(Clone)]
pub struct SqlNotificationStore {
    db: Arc<DatabaseConnection>,
}

impl SqlNotificationStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationStore for SqlNotificationStore {
    async fn create(&self, notification: NewAdminNotification) -> Result<(), DbErr> {
        admin_notification::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(notification.user_id),
            title: Set(notification.title),
            body: Set(notification.body),
            kind: Set(notification.kind),
            read: Set(false),
            action_url: Set(notification.action_url),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Best-effort push channel. Callers must treat a failure as a logged no-op.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RealtimeChannel: Send + Sync {
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), RealtimeError>;
}

/// Redis pub/sub backed realtime channel.
#[derive(Clone)]
pub struct RedisRealtime {
    client: Arc<redis::Client>,
}

impl RedisRealtime {
    pub fn new(client: Arc<redis::Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RealtimeChannel for RedisRealtime {
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), RealtimeError> {
        let message = serde_json::to_string(&json!({ "event": event, "payload": payload }))?;
        let mut conn = self.client.get_async_connection().await?;
        let _receivers: i64 = conn.publish(channel, message).await?;
        Ok(())
    }
}

/// Fans a committed order out to every administrator.
pub struct NotificationFanout {
    store: Arc<dyn NotificationStore>,
    admins: Arc<dyn AdminDirectory>,
    realtime: Arc<dyn RealtimeChannel>,
}

impl NotificationFanout {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        admins: Arc<dyn AdminDirectory>,
        realtime: Arc<dyn RealtimeChannel>,
    ) -> Self {
        Self {
            store,
            admins,
            realtime,
        }
    }

    /// Durable records first, realtime second. Runs detached from the
    /// request; every failure ends here as a log line and a counter.
    #[instrument(skip(self, order), fields(order_number = %order.order_number))]
    pub async fn order_placed(&self, order: &PlacedOrder) {
        let admin_ids = match self.admins.admin_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "could not list admins, order notifications skipped");
                counter!("checkout.notifications.failed", 1, "stage" => "admin_directory");
                return;
            }
        };

        let mut stored: Vec<Uuid> = Vec::with_capacity(admin_ids.len());
        for admin_id in admin_ids {
            let notification = NewAdminNotification {
                user_id: admin_id,
                title: format!("New order {}", order.order_number),
                body: format!(
                    "{} placed an order for {}",
                    order.customer_name, order.amount
                ),
                kind: NotificationKind::OrderPlaced,
                action_url: Some(order.action_url()),
            };
            match self.store.create(notification).await {
                Ok(()) => stored.push(admin_id),
                Err(e) => {
                    error!(error = %e, %admin_id, "failed to store admin notification");
                    counter!("checkout.notifications.failed", 1, "stage" => "durable");
                }
            }
        }

        for admin_id in stored {
            let payload = json!({
                "order_number": order.order_number,
                "amount": order.amount,
                "action_url": order.action_url(),
            });
            if let Err(e) = self
                .realtime
                .publish(&admin_channel(admin_id), "order_placed", payload)
                .await
            {
                // Abandoned, not retried: the durable row already exists.
                warn!(error = %e, %admin_id, "realtime push failed, admin will see the stored notification");
                counter!("checkout.notifications.failed", 1, "stage" => "realtime");
            }
        }
    }
}
