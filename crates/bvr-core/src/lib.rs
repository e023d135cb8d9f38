#![deny(missing_docs)]

//! # bvr-core: Role Resolution for the bv REST Layer
//!
//! Computes the complete set of roles held by a caller and decides whether a
//! caller may reach a role-gated handler. Nothing in this crate knows about
//! HTTP: the API crate feeds it a token string and maps its errors to status
//! codes.
//!
//! ## Pieces
//!
//! - [`Login`]: the caller identity carried in a verified token. Its
//!   principal identifier in the grant table is `"$" + login`.
//! - [`Grant`] / [`GrantGraph`]: rows of the grant table and the two
//!   adjacency maps the closure walks (all grants, inheritable links).
//! - [`RoleSet`]: the resolved, ordered set of role names.
//! - [`RoleStore`]: the cache table and grant table, injected into the
//!   resolver. [`MemoryRoleStore`] is the in-process implementation.
//! - [`RoleResolver`]: cache lookup, closure on miss, write-through.
//! - [`TokenVerifier`]: RS256 `api_key` token verification.
//!
//! ## Cache semantics
//!
//! A resolved set stays cached until it is evicted explicitly
//! ([`RoleResolver::evict`]). Grant changes are not observed by cached
//! logins; there is no expiry.

pub mod error;
pub mod grant;
pub mod login;
pub mod resolver;
pub mod roles;
pub mod store;
pub mod token;

pub use error::{AccessError, KeyError, StoreError, ValidationError};
pub use grant::{Grant, GrantGraph};
pub use login::{Login, PRINCIPAL_MARKER};
pub use resolver::RoleResolver;
pub use roles::RoleSet;
pub use store::{MemoryRoleStore, RoleStore};
pub use token::{Claims, TokenVerifier, DEFAULT_ISSUER, DEFAULT_PUBLIC_KEY_PATH};
