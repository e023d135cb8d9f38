//! # Store Selection
//!
//! Chooses the role store for role subcommands: a JSON grant file loaded
//! into memory, or Postgres via `DATABASE_URL`.
//!
//! The Postgres store connects to an existing schema. Migrations are the
//! server's job and never run from here.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use bvr_api::config::{TableNames, DEFAULT_CACHE_TABLE, DEFAULT_GRANT_TABLE};
use bvr_api::db::{connect_pool, PgRoleStore};
use bvr_core::{Grant, MemoryRoleStore, RoleResolver, RoleStore};
use clap::Args;

/// Where role data comes from.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Postgres connection string holding the role tables.
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    pub database_url: Option<String>,

    /// JSON file with grant rows (`[{"role", "given_to", "inherit"}]`),
    /// resolved in memory. Takes precedence over `--database-url`.
    #[arg(long, global = true)]
    pub grants: Option<PathBuf>,

    /// Role cache table in the database.
    #[arg(
        long,
        env = "BV_ROLE_CACHE_TABLE",
        global = true,
        default_value = DEFAULT_CACHE_TABLE
    )]
    pub cache_table: String,

    /// Grant table in the database.
    #[arg(
        long,
        env = "BV_ROLE_GRANT_TABLE",
        global = true,
        default_value = DEFAULT_GRANT_TABLE
    )]
    pub grant_table: String,
}

impl Default for StoreArgs {
    fn default() -> Self {
        Self {
            database_url: None,
            grants: None,
            cache_table: DEFAULT_CACHE_TABLE.to_string(),
            grant_table: DEFAULT_GRANT_TABLE.to_string(),
        }
    }
}

/// Read grant rows from a JSON file.
pub fn load_grant_file(path: &Path) -> Result<Vec<Grant>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read grant file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse grant file: {}", path.display()))
}

/// Open the configured store.
pub async fn open_store(args: &StoreArgs) -> Result<Arc<dyn RoleStore>> {
    if let Some(path) = &args.grants {
        let grants = load_grant_file(path)?;
        tracing::info!(
            grants = grants.len(),
            file = %path.display(),
            "using in-memory grant table"
        );
        return Ok(Arc::new(MemoryRoleStore::with_grants(grants)));
    }

    let Some(url) = args.database_url.as_deref() else {
        bail!("no role store: set DATABASE_URL or pass --grants FILE");
    };

    let tables = TableNames::new(&args.cache_table, &args.grant_table)
        .context("invalid role table configuration")?;
    let pool = connect_pool(url)
        .await
        .context("failed to connect to the role database")?;
    Ok(Arc::new(PgRoleStore::new(pool, tables)))
}

/// Open the configured store and wrap it in a resolver.
pub async fn open_resolver(args: &StoreArgs) -> Result<RoleResolver> {
    Ok(RoleResolver::new(open_store(args).await?))
}
