//! Storefront checkout core.
//!
//! Turns a validated cart, address, and delivery-shift selection into a
//! durable, uniquely-numbered order: field validation, decimal-safe
//! pricing, atomic order numbering, an all-or-nothing transactional write,
//! and detached admin notification fan-out. Everything around this pipeline
//! (catalog, carts, auth, CMS) lives in other services and is reached
//! through the collaborator traits in [`repositories`].
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod cache;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod notifications;
pub mod repositories;
pub mod services;
pub mod tasks;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state behind every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub carts: Arc<dyn repositories::CartStore>,
    pub checkout: Arc<services::checkout::CheckoutService>,
}

pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/checkout", handlers::checkout::checkout_routes())
        .route("/health", get(handlers::health::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
