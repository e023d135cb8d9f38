//! Role cache and grant table persistence.
//!
//! Table names come from [`TableNames`], which only admits plain SQL
//! identifiers, so they are formatted into the statements directly.

use async_trait::async_trait;
use bvr_core::{Grant, Login, RoleSet, RoleStore, StoreError};
use sqlx::PgPool;

use crate::config::TableNames;

/// [`RoleStore`] backed by Postgres.
#[derive(Debug, Clone)]
pub struct PgRoleStore {
    pool: PgPool,
    tables: TableNames,
}

impl PgRoleStore {
    /// Store over `pool` using `tables`.
    pub fn new(pool: PgPool, tables: TableNames) -> Self {
        Self { pool, tables }
    }
}

#[derive(sqlx::FromRow)]
struct GrantRow {
    role: String,
    given_to: String,
    inherit: bool,
}

impl From<GrantRow> for Grant {
    fn from(row: GrantRow) -> Self {
        Grant::new(row.role, row.given_to, row.inherit)
    }
}

fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Connection(err.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}

fn cache_select_sql(tables: &TableNames) -> String {
    format!("SELECT roles FROM {} WHERE login = $1", tables.cache())
}

fn grant_select_sql(tables: &TableNames) -> String {
    format!("SELECT role, given_to, inherit FROM {}", tables.grants())
}

fn cache_upsert_sql(tables: &TableNames) -> String {
    format!(
        "INSERT INTO {} (login, roles) VALUES ($1, $2) \
         ON CONFLICT (login) DO UPDATE SET roles = EXCLUDED.roles",
        tables.cache()
    )
}

fn cache_delete_sql(tables: &TableNames) -> String {
    format!("DELETE FROM {} WHERE login = $1", tables.cache())
}

#[async_trait]
impl RoleStore for PgRoleStore {
    async fn cached_roles(&self, login: &Login) -> Result<Option<RoleSet>, StoreError> {
        let sql = cache_select_sql(&self.tables);
        let row: Option<Option<Vec<String>>> = sqlx::query_scalar(&sql)
            .bind(login.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        match row {
            None => Ok(None),
            Some(Some(roles)) => Ok(Some(RoleSet::from(roles))),
            Some(None) => Err(StoreError::Corrupt {
                key: login.to_string(),
                reason: "roles column is NULL".into(),
            }),
        }
    }

    async fn load_grants(&self) -> Result<Vec<Grant>, StoreError> {
        let sql = grant_select_sql(&self.tables);
        let rows = sqlx::query_as::<_, GrantRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(Grant::from).collect())
    }

    async fn store_roles(&self, login: &Login, roles: &RoleSet) -> Result<(), StoreError> {
        let sql = cache_upsert_sql(&self.tables);
        sqlx::query(&sql)
            .bind(login.as_str())
            .bind(roles.to_vec())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn evict_roles(&self, login: &Login) -> Result<bool, StoreError> {
        let sql = cache_delete_sql(&self.tables);
        let result = sqlx::query(&sql)
            .bind(login.as_str())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}
