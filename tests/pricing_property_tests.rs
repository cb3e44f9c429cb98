//! Property-based tests for the pricing engine.
//!
//! The engine is pure, so these run wide input sweeps: the total identity,
//! the free-shipping threshold, determinism, and the single-rounding-point
//! guarantee must hold for every cart and fee schedule.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use storefront_checkout::repositories::{CartLine, CartSnapshot, PlatformSettings};
use storefront_checkout::services::pricing::price_cart;

fn settings_strategy() -> impl Strategy<Value = PlatformSettings> {
    // Tax 0.00..=100.00%, fee and threshold 0.00..=1000.00.
    (0i64..=10_000, 0i64..=100_000, 0i64..=100_000).prop_map(|(tax, fee, min)| PlatformSettings {
        tax_percentage: Decimal::new(tax, 2),
        shipping_fee: Decimal::new(fee, 2),
        min_shipping: Decimal::new(min, 2),
    })
}

fn cart_strategy() -> impl Strategy<Value = CartSnapshot> {
    prop::collection::vec((0i64..=1_000_000, 1i32..=20, any::<bool>()), 0..12).prop_map(|lines| {
        CartSnapshot {
            lines: lines
                .into_iter()
                .map(|(cents, quantity, resolved)| CartLine {
                    product_id: Uuid::new_v4(),
                    unit_price: resolved.then(|| Decimal::new(cents, 2)),
                    quantity,
                })
                .collect(),
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn total_is_exactly_the_sum_of_its_parts(
        cart in cart_strategy(),
        settings in settings_strategy(),
    ) {
        let priced = price_cart(&cart, &settings);
        prop_assert_eq!(
            priced.totals.total,
            priced.totals.subtotal + priced.totals.delivery_fee + priced.totals.tax_amount
        );
    }

    #[test]
    fn delivery_fee_follows_the_threshold(
        cart in cart_strategy(),
        settings in settings_strategy(),
    ) {
        let priced = price_cart(&cart, &settings);
        if priced.totals.subtotal >= settings.min_shipping {
            prop_assert_eq!(priced.totals.delivery_fee, Decimal::ZERO);
        } else {
            prop_assert_eq!(priced.totals.delivery_fee, settings.shipping_fee);
        }
    }

    #[test]
    fn pricing_is_deterministic(
        cart in cart_strategy(),
        settings in settings_strategy(),
    ) {
        prop_assert_eq!(price_cart(&cart, &settings), price_cart(&cart, &settings));
    }

    #[test]
    fn amounts_are_never_negative(
        cart in cart_strategy(),
        settings in settings_strategy(),
    ) {
        let priced = price_cart(&cart, &settings);
        prop_assert!(priced.totals.subtotal >= Decimal::ZERO);
        prop_assert!(priced.totals.delivery_fee >= Decimal::ZERO);
        prop_assert!(priced.totals.tax_amount >= Decimal::ZERO);
        prop_assert!(priced.totals.total >= Decimal::ZERO);
    }

    #[test]
    fn every_line_is_either_priced_or_counted_dropped(
        cart in cart_strategy(),
        settings in settings_strategy(),
    ) {
        let priced = price_cart(&cart, &settings);
        prop_assert_eq!(priced.lines.len() + priced.dropped, cart.lines.len());
    }

    #[test]
    fn rounding_happens_once_and_moves_at_most_half_a_cent(
        cart in cart_strategy(),
        settings in settings_strategy(),
    ) {
        let priced = price_cart(&cart, &settings);
        let rounded = priced.totals.rounded_total();
        let drift = (rounded - priced.totals.total).abs();
        prop_assert!(drift <= Decimal::new(5, 3), "drift {} too large", drift);
        prop_assert_eq!(rounded.scale().min(2), rounded.scale());
    }
}
