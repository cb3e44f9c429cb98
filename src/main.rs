use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use tokio::{signal, sync::mpsc};
use tracing::info;

use storefront_checkout as checkout;

use checkout::cache::ViewInvalidator;
use checkout::notifications::{NotificationFanout, RedisRealtime, SqlNotificationStore};
use checkout::repositories::{
    SqlAddressBook, SqlAdminDirectory, SqlCartStore, SqlProfileStore, SqlSettingsStore,
    SqlShiftDirectory,
};
use checkout::services::checkout::CheckoutService;
use checkout::services::order_numbers::OrderNumberGenerator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = checkout::config::load_config().context("failed to load configuration")?;
    checkout::config::init_tracing(&cfg.log_level, cfg.log_json);

    let db = Arc::new(
        checkout::db::connect(&cfg)
            .await
            .context("failed to connect to the database")?,
    );
    if cfg.ensure_schema {
        checkout::db::ensure_schema(&db)
            .await
            .context("failed to ensure schema")?;
    }

    let redis_client =
        Arc::new(redis::Client::open(cfg.redis_url.clone()).context("invalid redis url")?);

    let (event_tx, event_rx) = mpsc::channel(1024);
    let event_sender = Arc::new(checkout::events::EventSender::new(event_tx));
    tokio::spawn(checkout::events::process_events(event_rx));

    let fanout = Arc::new(NotificationFanout::new(
        Arc::new(SqlNotificationStore::new(db.clone())),
        Arc::new(SqlAdminDirectory::new(db.clone())),
        Arc::new(RedisRealtime::new(redis_client)),
    ));

    let checkout_service = Arc::new(CheckoutService::new(
        db.clone(),
        Arc::new(SqlAddressBook::new(db.clone())),
        Arc::new(SqlShiftDirectory::new(db.clone())),
        Arc::new(SqlSettingsStore::new(db.clone())),
        Arc::new(SqlProfileStore::new(db.clone())),
        Arc::new(OrderNumberGenerator::new(db.clone())),
        fanout,
        Arc::new(ViewInvalidator::new()),
        Some(event_sender),
        cfg.checkout_timeouts(),
    ));

    let state = Arc::new(checkout::AppState {
        db: db.clone(),
        config: cfg.clone(),
        carts: Arc::new(SqlCartStore::new(db)),
        checkout: checkout_service,
    });

    let addr = SocketAddr::new(
        cfg.host.parse::<IpAddr>().context("invalid host address")?,
        cfg.port,
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, environment = %cfg.environment, "storefront checkout listening");

    axum::serve(listener, checkout::app_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}
