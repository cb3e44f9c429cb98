pub mod admin_notification;
pub mod cart_item;
pub mod customer_address;
pub mod delivery_shift;
pub mod order;
pub mod order_item;
pub mod order_sequence;
pub mod platform_settings;
pub mod product;
pub mod user;
