//! # Middleware
//!
//! Response-shaping layers shared by every route: CORS and 500-response
//! diagnostics (including captured handler panics). Authentication and role
//! gating live in [`crate::auth`].

pub mod cors;
pub mod diagnostics;
