//! # Authentication & Role Gating Middleware
//!
//! ## Token
//!
//! Callers send an RS256-signed JWT in the `api_key` request header. The
//! verifier checks signature, issuer and expiry and yields the login named by
//! the `sub` claim.
//!
//! ## CallerIdentity
//!
//! Every authenticated request gets a [`CallerIdentity`] injected into the
//! request extensions. Handlers extract it via the `FromRequestParts` impl.
//!
//! ## Role gates
//!
//! A [`RoleGate`] holds one required role and the resolver. Mounted with
//! `route_layer(from_fn_with_state(gate, require_role_middleware))`, it runs
//! after authentication and before the handler:
//!
//! | Outcome                          | Status |
//! |----------------------------------|--------|
//! | no identity in the request       | 401    |
//! | role not held (even inherited)   | 403    |
//! | role store unreachable           | 500    |

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use bvr_core::{Login, RoleResolver, TokenVerifier};

use crate::error::AppError;

/// Request header carrying the token.
pub const API_KEY_HEADER: &str = "api_key";

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// Identity of the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// The login named by the verified token.
    pub login: Login,
}

/// Extracts the identity that the auth middleware injected into extensions.
/// Returns 401 if no identity is present.
#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub verifier: Arc<TokenVerifier>,
}

/// Verify the `api_key` header and inject a [`CallerIdentity`].
///
/// Fails closed: a request that reaches this middleware without an
/// [`AuthConfig`] extension is rejected with 401.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let Some(config) = request.extensions().get::<AuthConfig>().cloned() else {
        tracing::error!("auth middleware mounted without AuthConfig");
        return AppError::Unauthorized("authentication is not configured".into()).into_response();
    };

    let token = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match config.verifier.verify(token) {
        Ok(login) => {
            tracing::debug!(login = %login, "api_key token accepted");
            request.extensions_mut().insert(CallerIdentity { login });
            next.run(request).await
        }
        Err(err) => AppError::from(err).into_response(),
    }
}

// ── Role Gate ───────────────────────────────────────────────────────────────

/// A required role plus the resolver that decides it.
#[derive(Debug, Clone)]
pub struct RoleGate {
    role: Arc<str>,
    resolver: RoleResolver,
}

impl RoleGate {
    /// Gate on `role`.
    pub fn new(role: impl Into<String>, resolver: RoleResolver) -> Self {
        Self {
            role: Arc::from(role.into()),
            resolver,
        }
    }

    /// The required role.
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Decide whether `caller` may pass.
    pub async fn check(&self, caller: Option<&CallerIdentity>) -> Result<(), AppError> {
        let caller = caller.ok_or_else(|| {
            AppError::Unauthorized(format!("role '{}' requires an api_key token", self.role))
        })?;
        self.resolver.authorize(&self.role, &caller.login).await?;
        Ok(())
    }
}

/// Admit the request only if the caller holds the gate's role.
pub async fn require_role_middleware(
    State(gate): State<RoleGate>,
    request: Request,
    next: Next,
) -> Response {
    let caller = request.extensions().get::<CallerIdentity>().cloned();
    match gate.check(caller.as_ref()).await {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}
