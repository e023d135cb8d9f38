//! # Application State
//!
//! Shared state for the Axum application, passed to route handlers and
//! middleware via the `State` extractor. Cloning is cheap: everything is
//! behind an `Arc`.

use std::sync::Arc;

use bvr_core::{RoleResolver, TokenVerifier};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Start-up configuration.
    pub config: Arc<AppConfig>,
    /// Cached role resolution over the configured store.
    pub resolver: RoleResolver,
    /// `api_key` token verifier.
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    /// Assemble the state from its parts.
    pub fn new(config: AppConfig, resolver: RoleResolver, verifier: TokenVerifier) -> Self {
        Self {
            config: Arc::new(config),
            resolver,
            verifier: Arc::new(verifier),
        }
    }
}
