//! Pricing engine.
//!
//! A pure function of cart and settings: no I/O, no clock, no side effects.
//! All arithmetic stays in `Decimal`; nothing is rounded until the one
//! rounding point at persistence (`OrderTotals::rounded_total`), so the
//! stored total always equals the sum of the displayed breakdown.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use uuid::Uuid;

use crate::repositories::{CartSnapshot, PlatformSettings};

const PERCENT: Decimal = Decimal::ONE_HUNDRED;

/// Monetary breakdown of an order. Invariant:
/// `total == subtotal + delivery_fee + tax_amount`, exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// The amount actually charged and persisted: half-up to the currency's
    /// minor unit. This is the only place a pricing figure is rounded.
    pub fn rounded_total(&self) -> Decimal {
        self.total
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// A cart line that survived price resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub unit_price: Decimal,
    pub quantity: i32,
}

/// Output of the engine: the surviving lines in cart order, the totals, and
/// how many lines were dropped for lacking a resolvable price. Dropping is
/// not an error here; the caller logs it as a data-quality signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub totals: OrderTotals,
    pub dropped: usize,
}

pub fn price_cart(cart: &CartSnapshot, settings: &PlatformSettings) -> PricedCart {
    let mut lines = Vec::with_capacity(cart.lines.len());
    let mut dropped = 0usize;
    let mut subtotal = Decimal::ZERO;

    for line in &cart.lines {
        let Some(unit_price) = line.unit_price else {
            dropped += 1;
            continue;
        };
        subtotal += unit_price * Decimal::from(line.quantity);
        lines.push(PricedLine {
            product_id: line.product_id,
            unit_price,
            quantity: line.quantity,
        });
    }

    let delivery_fee = if subtotal >= settings.min_shipping {
        Decimal::ZERO
    } else {
        settings.shipping_fee
    };
    let tax_amount = subtotal * settings.tax_percentage / PERCENT;
    let total = subtotal + delivery_fee + tax_amount;

    PricedCart {
        lines,
        totals: OrderTotals {
            subtotal,
            delivery_fee,
            tax_amount,
            total,
        },
        dropped,
    }
}
