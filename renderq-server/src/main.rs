use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use renderq_server::{
    api, config::ServerConfig, db, repository::BackingProvider, service::Sweeper,
    tenant::TenantDirectory,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "renderq_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting renderq server...");

    let config = ServerConfig::parse();
    config.validate()?;

    let provider = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");

            let pool = db::create_pool(database_url, config.max_connections)
                .await
                .context("Failed to create database pool")?;
            db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;

            BackingProvider::Postgres(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, jobs will not survive a restart");
            BackingProvider::Memory
        }
    };

    let directory = Arc::new(
        TenantDirectory::from_configs(config.tenant_configs()?, &provider)
            .context("Invalid tenant configuration")?,
    );
    tracing::info!("Serving {} tenant(s)", directory.len());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweepers = Sweeper::spawn_all(&directory, shutdown_rx);

    // Build router with all API endpoints
    let app = api::create_router(directory);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    tracing::info!("Shutting down retention sweeps...");
    let _ = shutdown_tx.send(true);
    for sweeper in sweepers {
        let _ = sweeper.await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
