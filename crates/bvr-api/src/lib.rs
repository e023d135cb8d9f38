//! # bvr-api: Axum Layer for bv REST Services
//!
//! Turns a token, a required role and a handler into an HTTP endpoint:
//! authenticate the `api_key` token, resolve the caller's roles through
//! `bvr-core`, and either run the handler or answer 401/403/500 with a
//! uniform JSON error body.
//!
//! ## API Surface
//!
//! | Route                             | Module                | Gate          |
//! |-----------------------------------|-----------------------|---------------|
//! | `GET /health/liveness`            | here                  | none          |
//! | `GET /health/readiness`           | here                  | none          |
//! | `GET /api`                        | [`openapi`]           | none          |
//! | `GET /v1/me/roles`                | [`routes::me`]        | token         |
//! | `POST /v1/me/roles/check`         | [`routes::me`]        | token         |
//! | `GET /v1/logins/{login}/roles`    | [`routes::logins`]    | admin role    |
//! | `DELETE /v1/logins/{login}/roles` | [`routes::logins`]    | admin role    |
//! | `GET /v1/grants`                  | [`routes::logins`]    | admin role    |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → CORS → Diagnostics → CatchPanic → Auth (/v1) → RoleGate → Handler
//! ```

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::error::AppError;
use crate::middleware::diagnostics::{diagnostics_middleware, panic_response, ErrorDiagnostics};
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes and the OpenAPI document are mounted outside the auth
/// middleware so they remain accessible without credentials. Unknown paths
/// and unsupported methods answer with the same JSON error body as handlers.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        verifier: state.verifier.clone(),
    };
    let diagnostics = ErrorDiagnostics {
        enabled: state.config.error_diagnostics,
    };
    let cors = middleware::cors::cors_layer(&state.config.cors_origins);

    // Authenticated API routes.
    let api = Router::new()
        .merge(routes::me::router())
        .merge(routes::logins::router(&state))
        .layer(from_fn(auth::auth_middleware))
        .layer(axum::Extension(auth_config));

    // Unauthenticated probes and the API document.
    let public = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .merge(openapi::router());

    Router::new()
        .merge(public)
        .merge(api)
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn_with_state(diagnostics, diagnostics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn route_not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}

async fn method_not_allowed(method: Method, uri: Uri) -> AppError {
    AppError::MethodNotAllowed(format!("{method} is not supported on {}", uri.path()))
}

/// Liveness probe: 200 while the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 when the role store answers, 503 otherwise.
async fn readiness(State(state): State<AppState>) -> Response {
    match state.resolver.store().ping().await {
        Ok(()) => "ready".into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed: role store unreachable");
            (StatusCode::SERVICE_UNAVAILABLE, "role store unreachable").into_response()
        }
    }
}
