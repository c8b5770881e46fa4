//! Authentication providers

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing credential")]
    MissingToken,

    #[error("credential expired")]
    TokenExpired,

    #[error("invalid credential: {0}")]
    InvalidToken(String),
}

/// Authentication provider trait
///
/// Implementations validate an opaque bearer credential and return the
/// authenticated subject id. No other identity details cross this boundary.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Validate a credential and return the subject id
    async fn validate(&self, token: &str) -> Result<String, AuthError>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Claims carried by locally-issued tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Local JWT provider using HMAC-SHA256
///
/// Validates tokens signed with a shared secret; the default for
/// self-hosted deployments.
pub struct LocalJwtProvider {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for LocalJwtProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalJwtProvider")
            .field("algorithm", &"HS256")
            .finish()
    }
}

impl LocalJwtProvider {
    /// Create a new provider with an HMAC-SHA256 secret
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.required_spec_claims.clear();

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

#[async_trait]
impl AuthProvider for LocalJwtProvider {
    async fn validate(&self, token: &str) -> Result<String, AuthError> {
        let data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken(e.to_string()),
                }
            })?;

        if data.claims.sub.is_empty() {
            return Err(AuthError::InvalidToken("empty subject".to_string()));
        }

        Ok(data.claims.sub)
    }

    fn name(&self) -> &'static str {
        "local-jwt"
    }
}
