//! Capability tokens
//!
//! Time-bounded, path-scoped write credentials. The token embeds its scope
//! and expiry and carries an HMAC-SHA256 signature over both, so the server
//! can verify a write request without any token state:
//!
//! ```text
//! <scope-path>:<expires-unix>:<signature-hex>
//! ```
//!
//! Expired tokens are never refreshed in place - the client re-requests
//! session creation (idempotent) and receives a fresh grant.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Result, StoreError};

type HmacSha256 = Hmac<Sha256>;

/// Reference token lifetime: 2 hours
pub fn default_token_ttl() -> Duration {
    Duration::hours(2)
}

/// Mints and verifies capability tokens with a shared secret
#[derive(Clone)]
pub struct CapabilitySigner {
    key: Vec<u8>,
}

impl std::fmt::Debug for CapabilitySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilitySigner")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl CapabilitySigner {
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        Self {
            key: key.as_ref().to_vec(),
        }
    }

    /// Mint a token granting writes under `scope` until `now + ttl`.
    ///
    /// Returns the token string and its expiry instant.
    pub fn mint(&self, scope: &str, ttl: Duration) -> (String, DateTime<Utc>) {
        let expires_at = Utc::now() + ttl;
        let expires_unix = expires_at.timestamp();
        let sig = self.sign(scope, expires_unix);
        (format!("{}:{}:{}", scope, expires_unix, sig), expires_at)
    }

    /// Verify a token and check that `path` falls inside its scope.
    ///
    /// Returns the scope on success. `TokenExpired` is a recoverable
    /// condition for callers; every other failure is a rejection.
    pub fn verify(&self, token: &str, path: &str) -> Result<String> {
        // Scope may itself contain ':'-free path segments only; split from
        // the right so the signature and expiry parse unambiguously.
        let mut parts = token.rsplitn(3, ':');
        let sig = parts.next().ok_or(StoreError::InvalidToken)?;
        let expires: i64 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or(StoreError::InvalidToken)?;
        let scope = parts.next().ok_or(StoreError::InvalidToken)?;

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|_| StoreError::InvalidToken)?;
        mac.update(payload(scope, expires).as_bytes());
        let raw = hex::decode(sig).map_err(|_| StoreError::InvalidToken)?;
        mac.verify_slice(&raw).map_err(|_| StoreError::InvalidToken)?;

        if expires < Utc::now().timestamp() {
            return Err(StoreError::TokenExpired);
        }

        if !path.starts_with(scope) {
            return Err(StoreError::OutsideScope {
                path: path.to_string(),
                scope: scope.to_string(),
            });
        }

        Ok(scope.to_string())
    }

    fn sign(&self, scope: &str, expires_unix: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .expect("HMAC can take key of any size");
        mac.update(payload(scope, expires_unix).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

fn payload(scope: &str, expires_unix: i64) -> String {
    format!("{}\n{}", scope, expires_unix)
}
