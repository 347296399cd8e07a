// Main entry point for the FoundersWall API server

use std::sync::Arc;

use anyhow::{Context, Result};
use founderswall_core::domains::identity::SessionIdentityProvider;
use founderswall_core::domains::mugshots::PostgresMugshotStore;
use founderswall_core::domains::payments::{
    HostedCheckoutClient, PostgresPaymentStore, PostgresWebhookStore,
};
use founderswall_core::server::{build_app, AppState};
use founderswall_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,founderswall_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting FoundersWall API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // Wire collaborators
    let identity = Arc::new(SessionIdentityProvider::new());
    let mugshots = Arc::new(PostgresMugshotStore::new(pool.clone()));
    let payments = Arc::new(PostgresPaymentStore::new(pool.clone()));
    let webhooks = Arc::new(PostgresWebhookStore::new(pool.clone()));
    let gateway = Arc::new(
        HostedCheckoutClient::new(
            config.payment_api_key.clone(),
            config.payment_api_base.clone(),
            config.payment_product_id.clone(),
        )
        .context("Failed to create payment gateway client")?,
    );

    let port = config.port;
    let state = AppState::new(
        Some(pool),
        config,
        identity,
        mugshots,
        payments,
        webhooks,
        gateway,
    );

    let app = build_app(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
