//! # Login Administration API
//!
//! Inspect any login's resolved roles, evict its cached set after grants
//! change, and list the grant table. Every route here sits behind a
//! [`RoleGate`] on the configured admin role.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::{Json, Router};
use bvr_core::{Grant, Login};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{require_role_middleware, RoleGate};
use crate::error::AppError;
use crate::routes::me::RolesResponse;
use crate::state::AppState;

/// One row of the grant table.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GrantRecord {
    /// The granted role.
    pub role: String,
    /// Receiving principal: `$login` or a role name.
    pub given_to: String,
    /// Whether holders of `given_to` also receive `role`'s own grants.
    pub inherit: bool,
}

impl From<Grant> for GrantRecord {
    fn from(grant: Grant) -> Self {
        Self {
            role: grant.role,
            given_to: grant.given_to,
            inherit: grant.inherit,
        }
    }
}

/// The grant table.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GrantsResponse {
    pub count: usize,
    pub grants: Vec<GrantRecord>,
}

/// Build the login administration router, gated on `state.config.admin_role`.
pub fn router(state: &AppState) -> Router<AppState> {
    let gate = RoleGate::new(state.config.admin_role.clone(), state.resolver.clone());
    Router::new()
        .route(
            "/v1/logins/:login/roles",
            get(login_roles).delete(evict_login_roles),
        )
        .route("/v1/grants", get(list_grants))
        .route_layer(from_fn_with_state(gate, require_role_middleware))
}

/// Undecodable segments (bad percent-encoding, invalid UTF-8) are a 400;
/// decoded but invalid logins are a 422.
fn parse_login(path: Result<Path<String>, PathRejection>) -> Result<Login, AppError> {
    let Path(raw) = path.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    Ok(Login::new(raw)?)
}

/// GET /v1/logins/{login}/roles: Resolved roles of any login.
#[utoipa::path(
    get,
    path = "/v1/logins/{login}/roles",
    params(("login" = String, Path, description = "Login whose roles are resolved")),
    responses(
        (status = 200, description = "Resolved roles", body = RolesResponse),
        (status = 400, description = "Undecodable login segment", body = crate::error::ErrorBody),
        (status = 401, description = "Missing or invalid api_key token", body = crate::error::ErrorBody),
        (status = 403, description = "Caller lacks the admin role", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid login", body = crate::error::ErrorBody),
    ),
    security(("api_key" = [])),
    tag = "admin"
)]
async fn login_roles(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<RolesResponse>, AppError> {
    let login = parse_login(path)?;
    let roles = state.resolver.resolve_roles(&login).await?;
    Ok(Json(RolesResponse {
        login: login.to_string(),
        roles: roles.to_vec(),
    }))
}

/// DELETE /v1/logins/{login}/roles: Evict a login's cached role set.
#[utoipa::path(
    delete,
    path = "/v1/logins/{login}/roles",
    params(("login" = String, Path, description = "Login whose cached roles are evicted")),
    responses(
        (status = 204, description = "Cached role set removed"),
        (status = 400, description = "Undecodable login segment", body = crate::error::ErrorBody),
        (status = 401, description = "Missing or invalid api_key token", body = crate::error::ErrorBody),
        (status = 403, description = "Caller lacks the admin role", body = crate::error::ErrorBody),
        (status = 404, description = "No cached role set for the login", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid login", body = crate::error::ErrorBody),
    ),
    security(("api_key" = [])),
    tag = "admin"
)]
async fn evict_login_roles(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let login = parse_login(path)?;
    if state.resolver.evict(&login).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("no cached roles for login '{login}'")))
    }
}

/// GET /v1/grants: The full grant table.
#[utoipa::path(
    get,
    path = "/v1/grants",
    responses(
        (status = 200, description = "Grant table rows", body = GrantsResponse),
        (status = 401, description = "Missing or invalid api_key token", body = crate::error::ErrorBody),
        (status = 403, description = "Caller lacks the admin role", body = crate::error::ErrorBody),
    ),
    security(("api_key" = [])),
    tag = "admin"
)]
async fn list_grants(State(state): State<AppState>) -> Result<Json<GrantsResponse>, AppError> {
    let grants: Vec<GrantRecord> = state
        .resolver
        .grants()
        .await?
        .into_iter()
        .map(GrantRecord::from)
        .collect();
    Ok(Json(GrantsResponse {
        count: grants.len(),
        grants,
    }))
}
