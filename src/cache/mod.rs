//! Read-view invalidation.
//!
//! Aggregate views (admin dashboard, order lists, per-customer statistics,
//! product and promotion listings) cache against a tag epoch. Placing an
//! order bumps the epochs for the affected tags; readers holding an older
//! epoch recompute instead of serving pre-order data. Bumping is in-process,
//! cheap, and infallible, so it runs synchronously before the checkout
//! response is returned.

use dashmap::DashMap;
use uuid::Uuid;

pub mod tags {
    use uuid::Uuid;

    pub const DASHBOARD: &str = "dashboard";
    pub const ORDERS: &str = "orders";
    pub const PRODUCTS: &str = "products";
    pub const PROMOTIONS: &str = "promotions";

    pub fn customer_orders(customer_id: Uuid) -> String {
        format!("customer-orders:{customer_id}")
    }
}

#[derive(Debug, Default)]
pub struct ViewInvalidator {
    epochs: DashMap<String, u64>,
}

impl ViewInvalidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark one view tag stale.
    pub fn invalidate(&self, tag: &str) {
        *self.epochs.entry(tag.to_string()).or_insert(0) += 1;
    }

    /// Current epoch for a tag; readers compare against the epoch they
    /// cached at.
    pub fn epoch(&self, tag: &str) -> u64 {
        self.epochs.get(tag).map(|e| *e).unwrap_or(0)
    }

    /// The fixed set of views affected by a newly placed order.
    pub fn order_views_changed(&self, customer_id: Uuid) {
        self.invalidate(tags::DASHBOARD);
        self.invalidate(tags::ORDERS);
        self.invalidate(tags::PRODUCTS);
        self.invalidate(tags::PROMOTIONS);
        self.invalidate(&tags::customer_orders(customer_id));
    }
}
