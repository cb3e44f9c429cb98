//! Order persistence orchestrator.
//!
//! The single entry point that turns a validated cart, address, and shift
//! selection into a durable, uniquely-numbered order. Validation strictly
//! precedes persistence; persistence strictly precedes notification and
//! view invalidation. Failures before the transactional write abort the
//! whole operation with no side effects; failures after the commit are
//! isolated and never change the success already owed to the caller.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set, TransactionTrait};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::cache::ViewInvalidator;
use crate::entities::customer_address;
use crate::entities::order::{self, OrderStatus};
use crate::entities::order_item;
use crate::errors::{is_unique_violation, CheckoutError, Violation};
use crate::events::{Event, EventSender};
use crate::notifications::{NotificationFanout, PlacedOrder};
use crate::repositories::{AddressBook, CartSnapshot, ProfileStore, SettingsStore, ShiftDirectory};
use crate::services::order_numbers::OrderNumberGenerator;
use crate::services::pricing::{self, PricedCart};
use crate::services::validation::{self, CheckoutInput, CheckoutRequest};
use crate::tasks;

const ADDRESS_RESELECT: &str = "The selected address is no longer available, please choose another";
const SHIFT_RESELECT: &str = "The selected delivery shift is no longer available, please choose another";

/// Deadlines applied by the orchestrator. The persistence deadline bounds
/// the transactional write; the side-effect deadline bounds each detached
/// task so an unavailable collaborator cannot leak work.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutTimeouts {
    pub persist: Duration,
    pub side_effect: Duration,
}

impl Default for CheckoutTimeouts {
    fn default() -> Self {
        Self {
            persist: Duration::from_secs(10),
            side_effect: Duration::from_secs(5),
        }
    }
}

#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    addresses: Arc<dyn AddressBook>,
    shifts: Arc<dyn ShiftDirectory>,
    settings: Arc<dyn SettingsStore>,
    profiles: Arc<dyn ProfileStore>,
    order_numbers: Arc<OrderNumberGenerator>,
    fanout: Arc<NotificationFanout>,
    views: Arc<ViewInvalidator>,
    event_sender: Option<Arc<EventSender>>,
    timeouts: CheckoutTimeouts,
}

impl CheckoutService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Arc<DatabaseConnection>,
        addresses: Arc<dyn AddressBook>,
        shifts: Arc<dyn ShiftDirectory>,
        settings: Arc<dyn SettingsStore>,
        profiles: Arc<dyn ProfileStore>,
        order_numbers: Arc<OrderNumberGenerator>,
        fanout: Arc<NotificationFanout>,
        views: Arc<ViewInvalidator>,
        event_sender: Option<Arc<EventSender>>,
        timeouts: CheckoutTimeouts,
    ) -> Self {
        Self {
            db,
            addresses,
            shifts,
            settings,
            profiles,
            order_numbers,
            fanout,
            views,
            event_sender,
            timeouts,
        }
    }

    /// Place an order for `customer_id` from their current cart.
    ///
    /// Returns the new order number, or a structured failure: a list of
    /// field violations, a "please reselect" not-found, or a retryable
    /// transient failure. A second submission with identical input places a
    /// second order; callers needing idempotency must deduplicate upstream.
    #[instrument(skip(self, input, cart), fields(customer_id = %customer_id))]
    pub async fn place_order(
        &self,
        customer_id: Uuid,
        input: CheckoutInput,
        cart: CartSnapshot,
    ) -> Result<String, CheckoutError> {
        let request = validation::validate(input).map_err(CheckoutError::Validation)?;

        // Independent reads, checked concurrently.
        let (address, shift) = tokio::try_join!(
            self.addresses.find_address(request.address_id, customer_id),
            self.shifts.find_shift(request.shift_id),
        )?;
        let address = address.ok_or_else(|| {
            warn!(address_id = %request.address_id, "checkout referenced an unknown or foreign address");
            CheckoutError::NotFound(ADDRESS_RESELECT.to_string())
        })?;
        if shift.is_none() {
            warn!(shift_id = %request.shift_id, "checkout referenced an unknown delivery shift");
            return Err(CheckoutError::NotFound(SHIFT_RESELECT.to_string()));
        }

        self.reconcile_profile(customer_id, &request);

        // Fresh settings every time: fee changes apply to the next checkout.
        let settings = self.settings.platform_settings().await?;
        let priced = pricing::price_cart(&cart, &settings);
        if priced.dropped > 0 {
            warn!(
                dropped = priced.dropped,
                "cart lines without a resolvable product were dropped from pricing"
            );
            counter!("checkout.cart_lines.dropped", priced.dropped as u64);
        }
        if priced.lines.is_empty() {
            return Err(CheckoutError::Validation(vec![Violation::new(
                "cart",
                "Your cart is empty",
            )]));
        }

        let order_number = self.order_numbers.generate().await?;
        let order_id = Uuid::new_v4();

        let write = self.write_order(order_id, &order_number, customer_id, &request, &address, &priced);
        match tokio::time::timeout(self.timeouts.persist, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                if is_unique_violation(&e) {
                    warn!(%order_number, "order number collided at commit");
                    counter!("checkout.order_numbers.collisions", 1);
                } else {
                    error!(error = %e, %order_id, "order write failed and rolled back");
                }
                return Err(CheckoutError::Transient {
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                error!(%order_id, "order write exceeded its deadline");
                return Err(CheckoutError::Transient {
                    reason: "persistence timed out".to_string(),
                });
            }
        }

        info!(%order_id, %order_number, "order placed");
        counter!("checkout.orders.placed", 1);

        self.after_commit(order_id, &order_number, customer_id, &request, &priced)
            .await;

        Ok(order_number)
    }

    /// Order row and all item rows in one transaction: a failure anywhere
    /// rolls everything back, so a partial order is never observable.
    async fn write_order(
        &self,
        order_id: Uuid,
        order_number: &str,
        customer_id: Uuid,
        request: &CheckoutRequest,
        address: &customer_address::Model,
        priced: &PricedCart,
    ) -> Result<(), DbErr> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        order::ActiveModel {
            id: Set(order_id),
            order_number: Set(order_number.to_string()),
            customer_id: Set(customer_id),
            address_id: Set(address.id),
            shift_id: Set(request.shift_id),
            status: Set(OrderStatus::Pending),
            amount: Set(priced.totals.rounded_total()),
            payment_method: Set(request.payment_method.to_string()),
            delivery_instructions: Set(address.delivery_instructions.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for (position, line) in priced.lines.iter().enumerate() {
            order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                position: Set(position as i32),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await
    }

    /// Denormalized profile fields catch up with what the customer typed.
    /// Detached: never on the order's critical path, never a failure cause.
    fn reconcile_profile(&self, customer_id: Uuid, request: &CheckoutRequest) {
        let profiles = self.profiles.clone();
        let name = request.full_name.clone();
        let phone = request.phone.clone();
        tasks::spawn_detached("profile-reconcile", self.timeouts.side_effect, async move {
            if let Err(e) = profiles.reconcile(customer_id, &name, &phone).await {
                warn!(error = %e, %customer_id, "profile reconciliation failed");
                counter!("checkout.profile_reconcile.failed", 1);
            }
        });
    }

    /// Post-commit side effects. The order is already durable; nothing in
    /// here may change the result returned to the customer.
    async fn after_commit(
        &self,
        order_id: Uuid,
        order_number: &str,
        customer_id: Uuid,
        request: &CheckoutRequest,
        priced: &PricedCart,
    ) {
        let amount = priced.totals.rounded_total();

        if let Some(events) = &self.event_sender {
            let event = Event::OrderPlaced {
                order_id,
                order_number: order_number.to_string(),
                customer_id,
                amount,
            };
            if let Err(e) = events.send(event).await {
                warn!(error = %e, %order_id, "failed to emit order placed event");
            }
        }

        let fanout = self.fanout.clone();
        let placed = PlacedOrder {
            order_id,
            order_number: order_number.to_string(),
            customer_id,
            customer_name: request.full_name.clone(),
            amount,
        };
        tasks::spawn_detached("admin-notify", self.timeouts.side_effect, async move {
            fanout.order_placed(&placed).await;
        });

        // Cheap and in-process: runs to completion before we return.
        self.views.order_views_changed(customer_id);
    }
}
