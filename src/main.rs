//! slotbook server entry point.
//!
//! Starts the Axum HTTP server backed by PostgreSQL.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use slotbook::api;
use slotbook::app_state::AppState;
use slotbook::config::BookingConfig;
use slotbook::notify::{LogNotifier, NotificationDispatcher};
use slotbook::persistence::PostgresStore;
use slotbook::service::{ReservationService, SlotService, TokenService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = BookingConfig::from_env()
        .map_err(|e| anyhow::anyhow!(e.to_string()))
        .context("loading configuration")?;
    tracing::info!(addr = %config.listen_addr, "starting slotbook");

    // Connect to PostgreSQL and apply migrations
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await
        .context("connecting to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("applying migrations")?;

    // Build persistence and notification layers
    let store = Arc::new(PostgresStore::new(pool, config.lock_wait_ms));
    let dispatcher = NotificationDispatcher::spawn(LogNotifier::new(), config.notify_queue_capacity);

    // Build service layer
    let tokens = Arc::new(TokenService::new(
        Arc::clone(&store),
        dispatcher,
        config.token_ttl_days,
        config.booking_base_url.clone(),
    ));
    let slots = Arc::new(SlotService::new(Arc::clone(&store), Arc::clone(&tokens)));
    let reservations = Arc::new(ReservationService::new(
        Arc::clone(&store),
        Arc::clone(&tokens),
    ));

    // Build application state
    let app_state = AppState {
        slots,
        reservations,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .context("binding listen address")?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await.context("serving")?;

    Ok(())
}
