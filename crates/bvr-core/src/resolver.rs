//! # Role Resolver
//!
//! Resolves the role set of a login through the cache, computing and writing
//! through the grant closure on a miss. At most one computation happens per
//! login until its cache row is evicted.

use std::sync::Arc;

use crate::error::AccessError;
use crate::grant::{Grant, GrantGraph};
use crate::login::Login;
use crate::roles::RoleSet;
use crate::store::RoleStore;

/// Cached role resolution over an injected [`RoleStore`].
#[derive(Clone)]
pub struct RoleResolver {
    store: Arc<dyn RoleStore>,
}

impl std::fmt::Debug for RoleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleResolver").finish_non_exhaustive()
    }
}

impl RoleResolver {
    /// Create a resolver over `store`.
    pub fn new(store: Arc<dyn RoleStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn RoleStore> {
        &self.store
    }

    /// All roles held by `login`, including inherited ones.
    ///
    /// A cached set is returned unchanged without reading the grant table.
    /// On a miss the whole grant table is loaded, the closure computed and
    /// the result stored before it is returned.
    ///
    /// # Errors
    ///
    /// [`AccessError::StoreUnavailable`] if any store call fails. Nothing is
    /// cached in that case.
    pub async fn resolve_roles(&self, login: &Login) -> Result<RoleSet, AccessError> {
        if let Some(roles) = self.store.cached_roles(login).await? {
            tracing::debug!(login = %login, roles = roles.len(), "role cache hit");
            return Ok(roles);
        }

        let grants = self.store.load_grants().await?;
        let roles = GrantGraph::from_grants(&grants).closure(login);
        self.store.store_roles(login, &roles).await?;

        tracing::info!(
            login = %login,
            grants = grants.len(),
            roles = roles.len(),
            "resolved and cached roles"
        );
        Ok(roles)
    }

    /// Whether `login` holds `role`, directly or through inheritance.
    pub async fn require_role(&self, role: &str, login: &Login) -> Result<bool, AccessError> {
        Ok(self.resolve_roles(login).await?.contains(role))
    }

    /// Like [`require_role`](Self::require_role), but a missing role is an
    /// [`AccessError::Forbidden`].
    pub async fn authorize(&self, role: &str, login: &Login) -> Result<(), AccessError> {
        if self.require_role(role, login).await? {
            Ok(())
        } else {
            tracing::warn!(login = %login, role, "role check failed");
            Err(AccessError::Forbidden {
                login: login.to_string(),
                role: role.to_string(),
            })
        }
    }

    /// Drop the cached role set of `login` so the next resolution recomputes
    /// it. Returns whether a cached set existed.
    pub async fn evict(&self, login: &Login) -> Result<bool, AccessError> {
        let evicted = self.store.evict_roles(login).await?;
        tracing::info!(login = %login, evicted, "role cache eviction");
        Ok(evicted)
    }

    /// The current grant table.
    pub async fn grants(&self) -> Result<Vec<Grant>, AccessError> {
        Ok(self.store.load_grants().await?)
    }
}
