//! # bvr-cli: Operator CLI for bv REST Role Resolution
//!
//! ## Subcommands
//!
//! - `bvr roles`: resolve, check and evict a login's roles; list grants.
//! - `bvr token verify`: verify an `api_key` token and print its login.
//! - `bvr openapi`: write the service's OpenAPI document.
//!
//! Role commands read the same environment as the server (`DATABASE_URL`,
//! `BV_ROLE_CACHE_TABLE`, `BV_ROLE_GRANT_TABLE`). Passing `--grants FILE`
//! instead resolves against a JSON grant table held in memory, which is
//! handy for checking a grant change before applying it.
//!
//! ```bash
//! bvr roles resolve alice
//! bvr roles check alice editor admin
//! bvr --grants grants.json roles resolve alice
//! bvr token verify --key api_key_public.pem "$TOKEN"
//! ```

pub mod openapi;
pub mod roles;
pub mod store;
pub mod token;
