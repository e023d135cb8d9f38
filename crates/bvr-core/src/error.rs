//! # Error Hierarchy
//!
//! Structured errors for role resolution, built with `thiserror`.
//!
//! [`AccessError`] is the taxonomy callers translate into transport status
//! codes: `Unauthenticated` (no or bad token), `Forbidden` (valid identity,
//! role absent) and `StoreUnavailable` (cache or grant table unreachable).
//! Resolution is all-or-nothing: no variant carries a partial role set.

use thiserror::Error;

/// Failure to establish or authorize a caller.
#[derive(Error, Debug)]
pub enum AccessError {
    /// Missing, malformed, expired, or wrongly signed token.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The caller is known but does not hold the required role.
    #[error("login '{login}' does not hold role '{role}'")]
    Forbidden {
        /// The verified login.
        login: String,
        /// The role that was required.
        role: String,
    },

    /// The role store failed during lookup or write-through.
    #[error("role store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

/// Errors raised by a [`RoleStore`](crate::RoleStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend rejected or failed a query.
    #[error("query failed: {0}")]
    Query(String),

    /// The backend could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A stored row could not be decoded.
    #[error("corrupt row for '{key}': {reason}")]
    Corrupt {
        /// Row key (login or table name).
        key: String,
        /// Why the row was rejected.
        reason: String,
    },
}

/// Validation errors for identifiers.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Logins must be non-empty.
    #[error("login must be non-empty")]
    EmptyLogin,

    /// Logins may not start with the principal marker.
    #[error("invalid login \"{0}\" (must not start with '$')")]
    MarkedLogin(String),
}

/// Errors loading the token verification key.
#[derive(Error, Debug)]
pub enum KeyError {
    /// The key file could not be read.
    #[error("cannot read public key {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a usable RSA public key in PEM form.
    #[error("invalid RSA public key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),
}
