//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps role-resolution and token errors from bvr-core to HTTP status codes
//! and returns the same JSON body for every failure.
//!
//! 500-class responses carry a fixed message. The real cause is logged and
//! attached to the response as an [`ErrorTrace`] extension, which the
//! diagnostics middleware copies into `details.trace` when diagnostics are
//! enabled.

use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bvr_core::{AccessError, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Message returned for every 500 response.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred";

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "UNAUTHORIZED", "FORBIDDEN").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details. For 500 responses this holds `{"trace": ...}`
    /// only when error diagnostics are enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Build a body without details.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }
}

/// Diagnostic text for a 500 response, carried in response extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorTrace(pub String);

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body or path could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Path exists but not for this method (405).
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Missing or invalid `api_key` token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks the required role (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A backing service is unreachable (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::MethodNotAllowed(_) => (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Build an [`AppError::Internal`] whose message is `err` followed by its
    /// source chain. Causes already spelled out by their parent are skipped.
    pub fn internal(err: &(dyn StdError + 'static)) -> Self {
        let mut trace = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            let text = cause.to_string();
            if !trace.contains(&text) {
                trace.push_str("\ncaused by: ");
                trace.push_str(&text);
            }
            source = cause.source();
        }
        Self::Internal(trace)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if let Self::Internal(trace) = self {
            tracing::error!(error = %trace, "internal server error");
            let mut response =
                (status, Json(ErrorBody::new(code, INTERNAL_ERROR_MESSAGE))).into_response();
            response.extensions_mut().insert(ErrorTrace(trace));
            return response;
        }

        (status, Json(ErrorBody::new(code, self.to_string()))).into_response()
    }
}

/// Unauthenticated → 401, Forbidden → 403, store failure → 500.
impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Unauthenticated(reason) => Self::Unauthorized(reason),
            AccessError::Forbidden { login, role } => {
                Self::Forbidden(format!("role '{role}' required, not held by '{login}'"))
            }
            AccessError::StoreUnavailable(_) => Self::internal(&err),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}
