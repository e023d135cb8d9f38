//! # Database Persistence Layer
//!
//! Postgres storage for the role cache and grant tables via SQLx.
//!
//! The database is **optional**. When `DATABASE_URL` is set the service
//! resolves roles through [`PgRoleStore`]; when absent it falls back to the
//! in-memory store from `bvr-core`, whose grant table starts empty.
//!
//! Embedded migrations create `role_cache` and `role_grant`. Deployments
//! that point `BV_ROLE_CACHE_TABLE` / `BV_ROLE_GRANT_TABLE` at other tables
//! must create those themselves with the same columns.

pub mod roles;

use sqlx::postgres::{PgPool, PgPoolOptions};

pub use roles::PgRoleStore;

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `database_url` is `None` (in-memory mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool(database_url: Option<&str>) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(url) = database_url else {
        tracing::warn!(
            "DATABASE_URL not set, using the in-memory role store. \
             Grants must be loaded by the embedding process and cached roles \
             do not survive restarts."
        );
        return Ok(None);
    };

    let pool = connect_pool(url).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Connect to an existing role database without touching its schema.
pub async fn connect_pool(url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");
    Ok(pool)
}
