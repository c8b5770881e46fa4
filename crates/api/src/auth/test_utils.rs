//! Test helpers for authentication
//!
//! Mints valid tokens against a fixed secret so integration tests can
//! exercise authenticated routes without an identity provider.

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};

use super::provider::Claims;

/// Shared secret for tests
pub const TEST_SECRET: &[u8] = b"suburi-test-secret-at-least-32-bytes!";

/// Mint a token for the given user id, valid for one hour
pub fn token_for(user_id: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + 3600,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET),
    )
    .expect("token encoding cannot fail with a valid secret")
}

/// Mint an already-expired token
pub fn expired_token_for(user_id: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now - 3600,
        iat: now - 7200,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET),
    )
    .expect("token encoding cannot fail with a valid secret")
}
