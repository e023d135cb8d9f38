//! # Integration Tests for bvr-api
//!
//! Drives the assembled router in-process: token authentication, role
//! gating with direct and inherited roles, cache eviction, request body
//! errors, routing errors, the OpenAPI document, health probes and CORS.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use bvr_api::auth::API_KEY_HEADER;
use bvr_api::config::AppConfig;
use bvr_api::state::AppState;
use bvr_core::{
    Claims, Grant, Login, MemoryRoleStore, RoleResolver, RoleSet, RoleStore, StoreError,
    TokenVerifier, DEFAULT_ISSUER,
};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use tower::ServiceExt;

const PUBLIC_PEM: &str = include_str!("../../bvr-core/tests/fixtures/token_public.pem");
const PRIVATE_PEM: &str = include_str!("../../bvr-core/tests/fixtures/token_private.pem");
const ROGUE_PEM: &str = include_str!("../../bvr-core/tests/fixtures/rogue_private.pem");

// -- Helpers ------------------------------------------------------------------

fn sign(private_pem: &str, login: &str) -> String {
    let claims = Claims {
        sub: login.to_string(),
        iss: DEFAULT_ISSUER.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as u64,
    };
    let key = EncodingKey::from_rsa_pem(private_pem.as_bytes()).unwrap();
    encode(&Header::new(Algorithm::RS256), &claims, &key).unwrap()
}

fn token(login: &str) -> String {
    sign(PRIVATE_PEM, login)
}

fn verifier() -> TokenVerifier {
    TokenVerifier::from_public_key_pem(PUBLIC_PEM.as_bytes(), DEFAULT_ISSUER).unwrap()
}

fn state_with(store: Arc<dyn RoleStore>, config: AppConfig) -> AppState {
    AppState::new(config, RoleResolver::new(store), verifier())
}

/// Grants used by most tests:
/// - `root` holds `admin` directly;
/// - `carol` holds `staff` inheritably, and `staff` grants `editor`;
/// - `dave` holds `reader` only.
fn standard_grants() -> Vec<Grant> {
    vec![
        Grant::new("admin", "$root", false),
        Grant::new("staff", "$carol", true),
        Grant::new("editor", "staff", false),
        Grant::new("reader", "$dave", false),
    ]
}

/// Build the test app over an in-memory store holding `grants`.
fn test_app(grants: Vec<Grant>) -> (axum::Router, MemoryRoleStore) {
    let store = MemoryRoleStore::with_grants(grants);
    let state = state_with(Arc::new(store.clone()), AppConfig::default());
    (bvr_api::app(state), store)
}

fn get(uri: &str, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(key) = api_key {
        builder = builder.header(API_KEY_HEADER, key);
    }
    builder.body(Body::empty()).unwrap()
}

fn send(method: Method, uri: &str, api_key: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(API_KEY_HEADER, api_key)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap()
}

async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let (app, _) = test_app(vec![]);
    let response = app.oneshot(get("/health/liveness", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let (app, _) = test_app(vec![]);
    let response = app.oneshot(get("/health/readiness", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

/// A store whose backend is down.
struct DownStore;

#[async_trait]
impl RoleStore for DownStore {
    async fn cached_roles(&self, _: &Login) -> Result<Option<RoleSet>, StoreError> {
        Err(StoreError::Connection("connection refused".into()))
    }
    async fn load_grants(&self) -> Result<Vec<Grant>, StoreError> {
        Err(StoreError::Connection("connection refused".into()))
    }
    async fn store_roles(&self, _: &Login, _: &RoleSet) -> Result<(), StoreError> {
        Err(StoreError::Connection("connection refused".into()))
    }
    async fn evict_roles(&self, _: &Login) -> Result<bool, StoreError> {
        Err(StoreError::Connection("connection refused".into()))
    }
    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Connection("connection refused".into()))
    }
}

#[tokio::test]
async fn test_readiness_probe_store_down() {
    let app = bvr_api::app(state_with(Arc::new(DownStore), AppConfig::default()));
    let response = app.oneshot(get("/health/readiness", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// -- Authentication -----------------------------------------------------------

#[tokio::test]
async fn test_missing_token_is_401() {
    let (app, _) = test_app(standard_grants());
    let response = app.oneshot(get("/v1/me/roles", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_foreign_signature_is_401() {
    let (app, _) = test_app(standard_grants());
    let forged = sign(ROGUE_PEM, "root");
    let response = app
        .oneshot(get("/v1/grants", Some(&forged)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_route_without_token_is_401_not_403() {
    let (app, _) = test_app(standard_grants());
    let response = app
        .oneshot(get("/v1/logins/dave/roles", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// -- Caller Roles -------------------------------------------------------------

#[tokio::test]
async fn test_my_roles_includes_inherited_roles() {
    let (app, _) = test_app(standard_grants());
    let response = app
        .oneshot(get("/v1/me/roles", Some(&token("carol"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["login"], "carol");
    assert_eq!(
        body["roles"],
        serde_json::json!(["$carol", "editor", "staff"])
    );
}

#[tokio::test]
async fn test_login_without_grants_gets_principal_only() {
    let (app, _) = test_app(vec![]);
    let response = app
        .oneshot(get("/v1/me/roles", Some(&token("ghost"))))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["roles"], serde_json::json!(["$ghost"]));
}

#[tokio::test]
async fn test_check_roles_splits_granted_and_missing() {
    let (app, _) = test_app(standard_grants());
    let body = Body::from(r#"{"roles": ["editor", "admin", "staff"]}"#);
    let response = app
        .oneshot(send(Method::POST, "/v1/me/roles/check", &token("carol"), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["granted"], serde_json::json!(["editor", "staff"]));
    assert_eq!(body["missing"], serde_json::json!(["admin"]));
}

#[tokio::test]
async fn test_check_roles_malformed_json_is_400() {
    let (app, _) = test_app(standard_grants());
    let response = app
        .oneshot(send(
            Method::POST,
            "/v1/me/roles/check",
            &token("carol"),
            Body::from("{not json"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_check_roles_empty_list_is_422() {
    let (app, _) = test_app(standard_grants());
    let response = app
        .oneshot(send(
            Method::POST,
            "/v1/me/roles/check",
            &token("carol"),
            Body::from(r#"{"roles": []}"#),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// -- Role Gating --------------------------------------------------------------

#[tokio::test]
async fn test_admin_route_forbidden_without_role() {
    let (app, _) = test_app(standard_grants());
    let response = app
        .oneshot(get("/v1/grants", Some(&token("dave"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    assert!(body["error"]["message"].as_str().unwrap().contains("admin"));
}

#[tokio::test]
async fn test_admin_route_allowed_with_direct_role() {
    let (app, _) = test_app(standard_grants());
    let response = app
        .oneshot(get("/v1/grants", Some(&token("root"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["count"], 4);
    assert_eq!(body["grants"][1]["given_to"], "$carol");
    assert_eq!(body["grants"][1]["inherit"], true);
}

#[tokio::test]
async fn test_admin_route_allowed_with_inherited_role() {
    let grants = vec![
        Grant::new("ops", "$erin", true),
        Grant::new("admin", "ops", false),
    ];
    let (app, _) = test_app(grants);
    let response = app
        .oneshot(get("/v1/logins/erin/roles", Some(&token("erin"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_role_is_configurable() {
    let store = MemoryRoleStore::with_grants(vec![Grant::new("superuser", "$sam", false)]);
    let config = AppConfig {
        admin_role: "superuser".into(),
        ..AppConfig::default()
    };
    let app = bvr_api::app(state_with(Arc::new(store), config));
    let response = app
        .oneshot(get("/v1/grants", Some(&token("sam"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_store_failure_behind_gate_is_500() {
    let app = bvr_api::app(state_with(Arc::new(DownStore), AppConfig::default()));
    let response = app
        .oneshot(get("/v1/grants", Some(&token("root"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
    assert!(body["error"].get("details").is_none());
}

#[tokio::test]
async fn test_store_failure_trace_with_diagnostics() {
    let config = AppConfig {
        error_diagnostics: true,
        ..AppConfig::default()
    };
    let app = bvr_api::app(state_with(Arc::new(DownStore), config));
    let response = app
        .oneshot(get("/v1/me/roles", Some(&token("root"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    let trace = body["error"]["details"]["trace"].as_str().unwrap();
    assert!(trace.contains("connection refused"));
}

// -- Cache Eviction -----------------------------------------------------------

#[tokio::test]
async fn test_cached_roles_survive_grant_changes_until_evicted() {
    let (app, store) = test_app(standard_grants());

    let response = app
        .clone()
        .oneshot(get("/v1/me/roles", Some(&token("dave"))))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["roles"], serde_json::json!(["$dave", "reader"]));

    store.add_grant(Grant::new("writer", "$dave", false));
    let response = app
        .clone()
        .oneshot(get("/v1/me/roles", Some(&token("dave"))))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["roles"], serde_json::json!(["$dave", "reader"]));

    let response = app
        .clone()
        .oneshot(send(
            Method::DELETE,
            "/v1/logins/dave/roles",
            &token("root"),
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(get("/v1/me/roles", Some(&token("dave"))))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(
        body["roles"],
        serde_json::json!(["$dave", "reader", "writer"])
    );
}

#[tokio::test]
async fn test_evict_uncached_login_is_404() {
    let (app, _) = test_app(standard_grants());
    let response = app
        .oneshot(send(
            Method::DELETE,
            "/v1/logins/nobody/roles",
            &token("root"),
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_repeated_requests_load_grants_once() {
    let (app, store) = test_app(standard_grants());
    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(get("/v1/me/roles", Some(&token("carol"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(store.grant_loads(), 1);
}

#[tokio::test]
async fn test_marked_login_in_path_is_422() {
    let (app, _) = test_app(standard_grants());
    let response = app
        .oneshot(get("/v1/logins/$root/roles", Some(&token("root"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// -- Routing Errors -----------------------------------------------------------

#[tokio::test]
async fn test_unknown_path_is_json_404() {
    let (app, _) = test_app(standard_grants());
    let response = app
        .oneshot(get("/nope", Some(&token("root"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(body["error"]["message"].as_str().unwrap().contains("/nope"));
}

#[tokio::test]
async fn test_unsupported_method_is_json_405() {
    let (app, _) = test_app(standard_grants());
    let response = app
        .oneshot(send(Method::PUT, "/v1/grants", &token("root"), Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "METHOD_NOT_ALLOWED");
    assert!(body["error"]["message"].as_str().unwrap().contains("PUT"));
}

#[tokio::test]
async fn test_undecodable_login_segment_is_json_400() {
    let (app, _) = test_app(standard_grants());
    let response = app
        .oneshot(get("/v1/logins/%FF/roles", Some(&token("root"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

// -- OpenAPI ------------------------------------------------------------------

#[tokio::test]
async fn test_openapi_document_is_public() {
    let (app, _) = test_app(vec![]);
    let response = app.oneshot(get("/api", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["openapi"].as_str().unwrap().starts_with("3."));
    assert_eq!(
        doc["components"]["securitySchemes"]["api_key"]["type"],
        "apiKey"
    );
    assert!(doc["paths"]["/v1/grants"]["get"]["responses"]["default"].is_object());
    assert!(doc["components"]["schemas"]["ErrorBody"].is_object());
}

// -- CORS ---------------------------------------------------------------------

#[tokio::test]
async fn test_cors_headers_on_error_responses() {
    let (app, _) = test_app(vec![]);
    let request = Request::builder()
        .uri("/v1/me/roles")
        .header(header::ORIGIN, "https://console.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_cors_preflight_skips_auth() {
    let (app, _) = test_app(vec![]);
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/v1/me/roles")
        .header(header::ORIGIN, "https://console.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "api_key")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
