//! # Service Configuration
//!
//! Read once at start-up from the environment. Every variable has a default
//! except `DATABASE_URL`, whose absence selects the in-memory role store.
//!
//! | Variable                | Default                            |
//! |-------------------------|------------------------------------|
//! | `PORT`                  | `8080`                             |
//! | `DATABASE_URL`          | unset (in-memory store)            |
//! | `BV_API_KEY_PUBLIC_KEY` | `/bv_services/api_key_public.pem`  |
//! | `BV_TOKEN_ISSUER`       | `bv_rest`                          |
//! | `BV_ADMIN_ROLE`         | `admin`                            |
//! | `BV_CORS_ORIGINS`       | `*`                                |
//! | `BV_ERROR_DIAGNOSTICS`  | `false`                            |
//! | `BV_ROLE_CACHE_TABLE`   | `role_cache`                       |
//! | `BV_ROLE_GRANT_TABLE`   | `role_grant`                       |

use std::path::PathBuf;

use axum::http::HeaderValue;
use bvr_core::{DEFAULT_ISSUER, DEFAULT_PUBLIC_KEY_PATH};
use thiserror::Error;

/// Role required by the `/v1/logins/*` and `/v1/grants` routes by default.
pub const DEFAULT_ADMIN_ROLE: &str = "admin";

/// Default name of the role cache table.
pub const DEFAULT_CACHE_TABLE: &str = "role_cache";

/// Default name of the grant table.
pub const DEFAULT_GRANT_TABLE: &str = "role_grant";

/// Errors raised while reading configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but could not be parsed.
    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

fn invalid(name: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Names of the two role tables.
///
/// Table names are interpolated into SQL, so construction only accepts plain
/// identifiers, optionally schema-qualified (`schema.table`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    cache: String,
    grants: String,
}

impl TableNames {
    /// Validate and wrap the two table names.
    pub fn new(cache: &str, grants: &str) -> Result<Self, ConfigError> {
        if !is_sql_identifier(cache) {
            return Err(invalid("BV_ROLE_CACHE_TABLE", cache, "not a SQL identifier"));
        }
        if !is_sql_identifier(grants) {
            return Err(invalid("BV_ROLE_GRANT_TABLE", grants, "not a SQL identifier"));
        }
        Ok(Self {
            cache: cache.to_string(),
            grants: grants.to_string(),
        })
    }

    /// Role cache table.
    pub fn cache(&self) -> &str {
        &self.cache
    }

    /// Grant table.
    pub fn grants(&self) -> &str {
        &self.grants
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            cache: DEFAULT_CACHE_TABLE.to_string(),
            grants: DEFAULT_GRANT_TABLE.to_string(),
        }
    }
}

fn is_sql_identifier(name: &str) -> bool {
    let mut parts = 0;
    for part in name.split('.') {
        parts += 1;
        let mut chars = part.chars();
        let head_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
        if !head_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return false;
        }
    }
    parts <= 2
}

/// Origins allowed by the CORS layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    /// Any origin (`*`).
    Any,
    /// An explicit list of origins.
    List(Vec<HeaderValue>),
}

impl CorsOrigins {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return Ok(Self::Any);
        }
        let origins = trimmed
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(|o| {
                HeaderValue::from_str(o).map_err(|e| invalid("BV_CORS_ORIGINS", o, e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::List(origins))
    }
}

/// Service configuration.
///
/// Custom `Debug` redacts the database URL, which may carry a password.
#[derive(Clone)]
pub struct AppConfig {
    /// Listening port.
    pub port: u16,
    /// Postgres connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// PEM file holding the token verification key.
    pub public_key_path: PathBuf,
    /// Issuer claim required on tokens.
    pub token_issuer: String,
    /// Role required by the administrative routes.
    pub admin_role: String,
    /// CORS allowed origins.
    pub cors_origins: CorsOrigins,
    /// Include diagnostic traces in 500 responses.
    pub error_diagnostics: bool,
    /// Role table names.
    pub tables: TableNames,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("public_key_path", &self.public_key_path)
            .field("token_issuer", &self.token_issuer)
            .field("admin_role", &self.admin_role)
            .field("cors_origins", &self.cors_origins)
            .field("error_diagnostics", &self.error_diagnostics)
            .field("tables", &self.tables)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            database_url: None,
            public_key_path: PathBuf::from(DEFAULT_PUBLIC_KEY_PATH),
            token_issuer: DEFAULT_ISSUER.to_string(),
            admin_role: DEFAULT_ADMIN_ROLE.to_string(),
            cors_origins: CorsOrigins::Any,
            error_diagnostics: false,
            tables: TableNames::default(),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value
    /// if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| invalid("PORT", &raw, e.to_string()))?,
            None => defaults.port,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let public_key_path = lookup("BV_API_KEY_PUBLIC_KEY")
            .map(PathBuf::from)
            .unwrap_or(defaults.public_key_path);

        let token_issuer = non_empty(&lookup, "BV_TOKEN_ISSUER")?.unwrap_or(defaults.token_issuer);
        let admin_role = non_empty(&lookup, "BV_ADMIN_ROLE")?.unwrap_or(defaults.admin_role);

        let cors_origins = match lookup("BV_CORS_ORIGINS") {
            Some(raw) => CorsOrigins::parse(&raw)?,
            None => defaults.cors_origins,
        };

        let error_diagnostics = match lookup("BV_ERROR_DIAGNOSTICS") {
            Some(raw) => parse_bool("BV_ERROR_DIAGNOSTICS", &raw)?,
            None => defaults.error_diagnostics,
        };

        let tables = TableNames::new(
            &lookup("BV_ROLE_CACHE_TABLE").unwrap_or_else(|| DEFAULT_CACHE_TABLE.into()),
            &lookup("BV_ROLE_GRANT_TABLE").unwrap_or_else(|| DEFAULT_GRANT_TABLE.into()),
        )?;

        Ok(Self {
            port,
            database_url,
            public_key_path,
            token_issuer,
            admin_role,
            cors_origins,
            error_diagnostics,
            tables,
        })
    }
}

fn non_empty(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<String>, ConfigError> {
    match lookup(name) {
        Some(raw) if raw.trim().is_empty() => Err(invalid(name, &raw, "must not be empty")),
        Some(raw) => Ok(Some(raw.trim().to_string())),
        None => Ok(None),
    }
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(invalid(name, raw, "expected true or false")),
    }
}
