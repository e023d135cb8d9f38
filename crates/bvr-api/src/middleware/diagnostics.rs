//! # 500 Diagnostics
//!
//! Every unexpected failure reaches the client as the same 500 body:
//!
//! ```json
//! {"error": {"code": "INTERNAL_ERROR", "message": "An internal error occurred"}}
//! ```
//!
//! Handler errors attach the underlying cause as an [`ErrorTrace`] response
//! extension; handler panics are caught by `tower-http`'s `CatchPanicLayer`
//! and turned into the same body by [`panic_response`]. When diagnostics are
//! enabled (`BV_ERROR_DIAGNOSTICS=true`), [`diagnostics_middleware`] copies
//! the trace into `details.trace`. Otherwise the trace only reaches the log.

use std::any::Any;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::CONTENT_LENGTH;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::{AppError, ErrorBody, ErrorTrace};

/// Whether 500 responses expose their diagnostic trace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorDiagnostics {
    pub enabled: bool,
}

/// Convert a caught panic payload into the uniform 500 response.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    AppError::Internal(format!("handler panicked: {message}")).into_response()
}

/// Copy [`ErrorTrace`] into the body of 500 responses when enabled, and drop
/// it from the response either way.
pub async fn diagnostics_middleware(
    State(diagnostics): State<ErrorDiagnostics>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let Some(ErrorTrace(trace)) = response.extensions_mut().remove::<ErrorTrace>() else {
        return response;
    };
    if !diagnostics.enabled {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let mut error_body = match axum::body::to_bytes(body, usize::MAX)
        .await
        .ok()
        .and_then(|bytes| serde_json::from_slice::<ErrorBody>(&bytes).ok())
    {
        Some(parsed) => parsed,
        None => ErrorBody::new("INTERNAL_ERROR", crate::error::INTERNAL_ERROR_MESSAGE),
    };
    error_body.error.details = Some(serde_json::json!({ "trace": trace }));

    match serde_json::to_vec(&error_body) {
        Ok(bytes) => {
            parts.headers.remove(CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to encode diagnostic error body");
            Response::from_parts(parts, Body::empty())
        }
    }
}
