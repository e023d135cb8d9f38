//! # Role Store
//!
//! The two tables role resolution reads and writes: the role cache
//! `(login, roles)` and the grant table `(role, given_to, inherit)`.
//!
//! The resolver receives a store object at construction. [`MemoryRoleStore`]
//! is the in-process implementation used when no database is configured and
//! in tests; the Postgres implementation lives in the API crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::grant::Grant;
use crate::login::Login;
use crate::roles::RoleSet;

/// Access to the role cache and grant tables.
///
/// Writes to the cache are idempotent for a fixed grant-table snapshot, so
/// implementations need no locking across calls: concurrent resolutions of
/// the same login may both write, and the last write wins.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Cached role set for `login`, if one has been stored.
    async fn cached_roles(&self, login: &Login) -> Result<Option<RoleSet>, StoreError>;

    /// Every row of the grant table.
    async fn load_grants(&self) -> Result<Vec<Grant>, StoreError>;

    /// Store (or replace) the cached role set for `login`.
    async fn store_roles(&self, login: &Login, roles: &RoleSet) -> Result<(), StoreError>;

    /// Delete the cached role set for `login`. Returns whether a row existed.
    async fn evict_roles(&self, login: &Login) -> Result<bool, StoreError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// In-memory role store.
///
/// Cloning shares the underlying tables. Every call to
/// [`load_grants`](RoleStore::load_grants) is counted so callers can observe
/// cache hits.
#[derive(Debug, Clone, Default)]
pub struct MemoryRoleStore {
    cache: Arc<RwLock<HashMap<Login, RoleSet>>>,
    grants: Arc<RwLock<Vec<Grant>>>,
    grant_loads: Arc<AtomicU64>,
}

impl MemoryRoleStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given grant rows.
    pub fn with_grants(grants: impl IntoIterator<Item = Grant>) -> Self {
        let store = Self::new();
        store.grants.write().extend(grants);
        store
    }

    /// Append a grant row.
    ///
    /// Cached role sets are left untouched.
    pub fn add_grant(&self, grant: Grant) {
        self.grants.write().push(grant);
    }

    /// Number of times the grant table has been loaded.
    pub fn grant_loads(&self) -> u64 {
        self.grant_loads.load(Ordering::Relaxed)
    }

    /// Number of cached logins.
    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn cached_roles(&self, login: &Login) -> Result<Option<RoleSet>, StoreError> {
        Ok(self.cache.read().get(login).cloned())
    }

    async fn load_grants(&self) -> Result<Vec<Grant>, StoreError> {
        self.grant_loads.fetch_add(1, Ordering::Relaxed);
        Ok(self.grants.read().clone())
    }

    async fn store_roles(&self, login: &Login, roles: &RoleSet) -> Result<(), StoreError> {
        self.cache.write().insert(login.clone(), roles.clone());
        Ok(())
    }

    async fn evict_roles(&self, login: &Login) -> Result<bool, StoreError> {
        Ok(self.cache.write().remove(login).is_some())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
