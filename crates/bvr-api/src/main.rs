//! # bvr-api: Binary Entry Point
//!
//! Starts the Axum HTTP server. Configuration comes from the environment;
//! see [`bvr_api::config`].

use std::sync::Arc;

use bvr_api::config::AppConfig;
use bvr_api::db::PgRoleStore;
use bvr_api::state::AppState;
use bvr_core::{MemoryRoleStore, RoleResolver, RoleStore, TokenVerifier};

/// `LOG_FORMAT=json` switches to JSON log lines; anything else is the
/// human-readable format. Levels come from `RUST_LOG` (default `info`).
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {e}");
        e
    })?;
    tracing::info!(?config, "configuration loaded");

    let verifier = TokenVerifier::from_public_key_file(
        &config.public_key_path,
        config.token_issuer.clone(),
    )
    .map_err(|e| {
        tracing::error!("Token verification key unavailable: {e}");
        e
    })?;

    let pool = bvr_api::db::init_pool(config.database_url.as_deref())
        .await
        .map_err(|e| {
            tracing::error!("Database initialization failed: {e}");
            e
        })?;

    let store: Arc<dyn RoleStore> = match pool {
        Some(pool) => Arc::new(PgRoleStore::new(pool, config.tables.clone())),
        None => Arc::new(MemoryRoleStore::new()),
    };

    let port = config.port;
    let state = AppState::new(config, RoleResolver::new(store), verifier);
    let app = bvr_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("bv role service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
