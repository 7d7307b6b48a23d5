//! StayHub Wallet Service
//!
//! Entry point for the wallet and funds-request backend. The service owns
//! the balance ledger and the admin approval workflow; authentication and
//! the moderation UI live in the surrounding back office.

use anyhow::Context;
use stayhub_wallet::api;
use stayhub_wallet::config::AppConfig;
use stayhub_wallet::database::{create_pool, run_migrations};
use stayhub_wallet::AppState;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables first
    dotenvy::dotenv().ok();

    // Load configuration
    let config =
        AppConfig::from_env().map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    // Initialize tracing/logging with config
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "stayhub_wallet={},sqlx=warn,tower_http=info",
                    config.log_level
                )
                .into()
            }),
        )
        .init();

    info!("Starting StayHub wallet service");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);

    // =========================================================================
    // DATABASE SETUP
    // =========================================================================
    info!("Connecting to database...");

    let pool = create_pool(&config.database)
        .await
        .context("Failed to create database pool")?;

    info!(
        "Database connection pool created (max connections: {})",
        config.database.max_connections
    );

    info!("Running database migrations...");
    run_migrations(&pool, None)
        .await
        .context("Database migration failed")?;
    info!("Database migrations completed successfully");

    // =========================================================================
    // SERVICES + HTTP SURFACE
    // =========================================================================
    let state = Arc::new(AppState::new(pool));
    info!("Application state initialized with repositories and services");

    let app = api::router(state);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        "StayHub wallet service listening on {}",
        listener.local_addr()?
    );
    info!("Press Ctrl+C to shutdown gracefully");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received, shutting down gracefully...");
        })
        .await
        .context("Server error")?;

    info!("StayHub wallet service shutdown complete");
    Ok(())
}
