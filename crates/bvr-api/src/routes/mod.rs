//! # API Route Modules
//!
//! - `me`: the caller's own resolved roles and role checks. Any
//!   authenticated caller.
//! - `logins`: role lookups and cache eviction for arbitrary logins, plus
//!   the grant table listing. Gated on the configured admin role.

pub mod logins;
pub mod me;
