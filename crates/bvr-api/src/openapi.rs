//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI document
//! served unauthenticated at `GET /api`.
//!
//! Two modifiers finish the derived document:
//!
//! - [`SecurityAddon`] registers the `api_key` header scheme that every
//!   `/v1` operation references.
//! - [`DefaultErrorResponse`] gives every operation a `default` response
//!   pointing at [`ErrorBody`](crate::error::ErrorBody).

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::openapi::{Components, ContentBuilder, Ref, RefOr, ResponseBuilder};
use utoipa::{Modify, OpenApi};

use crate::auth::API_KEY_HEADER;
use crate::state::AppState;

/// Path the document is served at.
pub const OPENAPI_PATH: &str = "/api";

/// Name of the security scheme in `components.securitySchemes`.
pub const SECURITY_SCHEME: &str = "api_key";

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "bv REST role service",
        description = "Role resolution and role-gated administration for bv REST services. Authenticate with an RS256 JWT in the `api_key` header."
    ),
    paths(
        crate::routes::me::my_roles,
        crate::routes::me::check_roles,
        crate::routes::logins::login_roles,
        crate::routes::logins::evict_login_roles,
        crate::routes::logins::list_grants,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::me::RolesResponse,
        crate::routes::me::CheckRolesRequest,
        crate::routes::me::CheckRolesResponse,
        crate::routes::logins::GrantRecord,
        crate::routes::logins::GrantsResponse,
    )),
    modifiers(&SecurityAddon, &DefaultErrorResponse),
    tags(
        (name = "roles", description = "The caller's own roles"),
        (name = "admin", description = "Role lookups, cache eviction and grants; admin role required"),
    )
)]
pub struct ApiDoc;

/// Registers the `api_key` header security scheme.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Components::new);
        components.add_security_scheme(
            SECURITY_SCHEME,
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                API_KEY_HEADER,
                "a JWT obtained with `/api_key` service",
            ))),
        );
    }
}

/// Adds a `default` "Unexpected error" response to every operation.
pub struct DefaultErrorResponse;

impl Modify for DefaultErrorResponse {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        for path_item in openapi.paths.paths.values_mut() {
            for operation in path_item.operations.values_mut() {
                operation
                    .responses
                    .responses
                    .entry("default".to_string())
                    .or_insert_with(|| {
                        RefOr::T(
                            ResponseBuilder::new()
                                .description("Unexpected error")
                                .content(
                                    "application/json",
                                    ContentBuilder::new()
                                        .schema(Ref::from_schema_name("ErrorBody"))
                                        .build(),
                                )
                                .build(),
                        )
                    });
            }
        }
    }
}

/// The generated document.
pub fn document() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route(OPENAPI_PATH, get(openapi_json))
}

/// GET /api: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(document())
}
