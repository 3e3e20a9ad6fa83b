//! # Tessera API Server
//!
//! Account service: registration, login with bearer tokens, profile updates
//! and profile reads through a Redis cache in front of PostgreSQL.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p tessera-api
//! ```

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tessera_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat},
};
use tessera_shared::{
    cache::{RedisClient, RedisProfileCache},
    db::{
        migrations::{ensure_database_exists, run_migrations},
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    store::PgUserStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "tessera_api=debug,tessera_shared=debug,tower_http=debug";

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(LogFormat::from_env());

    tracing::info!(
        "Tessera API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env().context("failed to load configuration")?;

    if let Err(e) = ensure_database_exists(&config.database.url).await {
        tracing::warn!(error = %e, "Could not verify that the database exists");
    }

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await
    .context("failed to connect to PostgreSQL")?;

    run_migrations(&pool).await.context("failed to run migrations")?;

    let redis = RedisClient::new(config.redis.clone())
        .await
        .context("failed to connect to Redis")?;

    let users = PgUserStore::with_timeout(
        pool.clone(),
        Duration::from_secs(config.database.query_timeout_secs),
    );
    let cache = RedisProfileCache::new(redis);

    let bind_address = config.bind_address();
    let state = AppState::new(config, Arc::new(users), Arc::new(cache))?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped, releasing resources");
    close_pool(pool).await;

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
