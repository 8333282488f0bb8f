//! # UpTask API Server
//!
//! Serves the project, task, team and note endpoints under `/api/projects`.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/uptask JWT_SECRET=... cargo run -p uptask-api
//! STORE_BACKEND=memory JWT_SECRET=... cargo run -p uptask-api
//! ```

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uptask_api::{
    app::{build_router, AppState},
    config::{Config, StoreBackend},
};
use uptask_shared::{
    db::{
        migrations::{ensure_database_exists, run_migrations},
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    store::{MemoryStore, PgStore, Store},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("UpTask API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("invalid configuration")?;
    let (store, pool) = open_store(&config).await?;

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        close_pool(&pool).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Installs the global subscriber; `LOG_FORMAT=json` switches to JSON lines
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "uptask_api=debug,uptask_shared=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Builds the configured store; PostgreSQL is migrated before use
async fn open_store(config: &Config) -> anyhow::Result<(Arc<dyn Store>, Option<sqlx::PgPool>)> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on shutdown");
            Ok((Arc::new(MemoryStore::new()), None))
        }
        StoreBackend::Postgres => {
            if !config.api.production {
                ensure_database_exists(&config.store.database_url).await?;
            }

            let db_config = DatabaseConfig::from_url(config.store.database_url.clone())
                .with_max_connections(config.store.max_connections);
            let pool = create_pool(db_config).await?;

            run_migrations(&pool).await?;

            Ok((Arc::new(PgStore::new(pool.clone())), Some(pool)))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }

    tracing::info!("Shutdown signal received, draining connections...");
}
