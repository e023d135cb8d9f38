//! # Login Identity
//!
//! The login is the identity a verified token carries. In the grant table a
//! login appears as a principal: the login prefixed with [`PRINCIPAL_MARKER`],
//! which keeps logins and role names in disjoint namespaces.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Prefix that turns a login into its principal identifier.
pub const PRINCIPAL_MARKER: char = '$';

/// A verified caller login.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Login(String);

impl Login {
    /// Create a login, rejecting empty and marker-prefixed values.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyLogin`] for empty or whitespace-only
    /// input, and [`ValidationError::MarkedLogin`] when the value already
    /// starts with [`PRINCIPAL_MARKER`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.trim().is_empty() {
            return Err(ValidationError::EmptyLogin);
        }
        if s.starts_with(PRINCIPAL_MARKER) {
            return Err(ValidationError::MarkedLogin(s));
        }
        Ok(Self(s))
    }

    /// The login as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The principal identifier used as `given_to` in the grant table.
    pub fn principal(&self) -> String {
        format!("{PRINCIPAL_MARKER}{}", self.0)
    }
}

impl std::fmt::Display for Login {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Login {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Login> for String {
    fn from(login: Login) -> Self {
        login.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_prefixes_marker() {
        let login = Login::new("alice").unwrap();
        assert_eq!(login.principal(), "$alice");
        assert_eq!(login.as_str(), "alice");
        assert_eq!(login.to_string(), "alice");
    }

    #[test]
    fn empty_login_rejected() {
        assert_eq!(Login::new(""), Err(ValidationError::EmptyLogin));
        assert_eq!(Login::new("   "), Err(ValidationError::EmptyLogin));
    }

    #[test]
    fn marked_login_rejected() {
        assert_eq!(
            Login::new("$alice"),
            Err(ValidationError::MarkedLogin("$alice".into()))
        );
    }

    #[test]
    fn serde_roundtrip_validates() {
        let login: Login = serde_json::from_str("\"bob\"").unwrap();
        assert_eq!(login.as_str(), "bob");
        assert_eq!(serde_json::to_string(&login).unwrap(), "\"bob\"");
        assert!(serde_json::from_str::<Login>("\"\"").is_err());
    }
}
