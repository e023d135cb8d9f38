//! # api_key Token Verification
//!
//! Callers present an RS256-signed JWT. Verification checks the signature
//! against a PEM public key, the fixed issuer and the expiry, then turns the
//! `sub` claim into a [`Login`]. Every failure is
//! [`AccessError::Unauthenticated`]; the reason is logged, not returned in
//! detail.

use std::path::Path;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AccessError, KeyError};
use crate::login::Login;

/// Where the verification key lives unless configured otherwise.
pub const DEFAULT_PUBLIC_KEY_PATH: &str = "/bv_services/api_key_public.pem";

/// Issuer claim expected unless configured otherwise.
pub const DEFAULT_ISSUER: &str = "bv_rest";

/// Claims carried by an `api_key` token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The caller's login.
    pub sub: String,
    /// Token issuer.
    pub iss: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
}

/// Verifies `api_key` tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithm", &Algorithm::RS256)
            .field("issuer", &self.issuer)
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl TokenVerifier {
    /// Build a verifier from an RSA public key in PEM form.
    ///
    /// # Errors
    ///
    /// [`KeyError::InvalidKey`] if the PEM does not hold an RSA public key.
    pub fn from_public_key_pem(pem: &[u8], issuer: impl Into<String>) -> Result<Self, KeyError> {
        let issuer = issuer.into();
        let decoding_key = DecodingKey::from_rsa_pem(pem)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_aud = false;

        Ok(Self {
            decoding_key,
            validation,
            issuer,
        })
    }

    /// Build a verifier from a PEM file.
    ///
    /// # Errors
    ///
    /// [`KeyError::Io`] if the file cannot be read, [`KeyError::InvalidKey`]
    /// if its content is not an RSA public key.
    pub fn from_public_key_file(
        path: impl AsRef<Path>,
        issuer: impl Into<String>,
    ) -> Result<Self, KeyError> {
        let path = path.as_ref();
        let pem = std::fs::read(path).map_err(|source| KeyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_public_key_pem(&pem, issuer)
    }

    /// The issuer this verifier accepts.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Verify a token and return the login it names.
    ///
    /// `None` (no token presented) is unauthenticated, like a bad token.
    pub fn verify(&self, token: Option<&str>) -> Result<Login, AccessError> {
        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => {
                return Err(AccessError::Unauthenticated(
                    "missing api_key token".into(),
                ))
            }
        };

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::warn!(reason = %e, "api_key token rejected");
            AccessError::Unauthenticated(format!("invalid api_key token: {e}"))
        })?;

        Login::new(data.claims.sub).map_err(|e| {
            tracing::warn!(reason = %e, "api_key token carries no usable login");
            AccessError::Unauthenticated(format!("invalid api_key token: {e}"))
        })
    }
}
