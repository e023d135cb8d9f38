//! # Caller Roles API
//!
//! Lets an authenticated caller see the roles it holds and test a list of
//! roles against them without hitting a gated route.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// A login and its resolved roles.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RolesResponse {
    pub login: String,
    /// Resolved roles in sorted order, including the `$login` principal.
    pub roles: Vec<String>,
}

/// Roles to test against the caller's resolved set.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckRolesRequest {
    pub roles: Vec<String>,
}

impl Validate for CheckRolesRequest {
    fn validate(&self) -> Result<(), String> {
        if self.roles.is_empty() {
            return Err("roles must not be empty".into());
        }
        if self.roles.iter().any(|r| r.trim().is_empty()) {
            return Err("role names must be non-empty".into());
        }
        Ok(())
    }
}

/// Which of the requested roles the caller holds.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckRolesResponse {
    pub granted: Vec<String>,
    pub missing: Vec<String>,
}

/// Build the caller roles router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/me/roles", get(my_roles))
        .route("/v1/me/roles/check", post(check_roles))
}

/// GET /v1/me/roles: The caller's resolved roles.
#[utoipa::path(
    get,
    path = "/v1/me/roles",
    responses(
        (status = 200, description = "Resolved roles", body = RolesResponse),
        (status = 401, description = "Missing or invalid api_key token", body = crate::error::ErrorBody),
    ),
    security(("api_key" = [])),
    tag = "roles"
)]
async fn my_roles(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<RolesResponse>, AppError> {
    let roles = state.resolver.resolve_roles(&caller.login).await?;
    Ok(Json(RolesResponse {
        login: caller.login.to_string(),
        roles: roles.to_vec(),
    }))
}

/// POST /v1/me/roles/check: Split requested roles into granted and missing.
#[utoipa::path(
    post,
    path = "/v1/me/roles/check",
    request_body = CheckRolesRequest,
    responses(
        (status = 200, description = "Role check result", body = CheckRolesResponse),
        (status = 400, description = "Malformed JSON body", body = crate::error::ErrorBody),
        (status = 401, description = "Missing or invalid api_key token", body = crate::error::ErrorBody),
        (status = 422, description = "Empty role list", body = crate::error::ErrorBody),
    ),
    security(("api_key" = [])),
    tag = "roles"
)]
async fn check_roles(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CheckRolesRequest>, JsonRejection>,
) -> Result<Json<CheckRolesResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let held = state.resolver.resolve_roles(&caller.login).await?;

    let (granted, missing): (Vec<String>, Vec<String>) =
        req.roles.into_iter().partition(|role| held.contains(role));
    Ok(Json(CheckRolesResponse { granted, missing }))
}
