//! Bearer-token issuance and verification.
//!
//! DESIGN
//! ======
//! Tokens are HS256 JWTs carrying the username plus issued-at/expiry claims.
//! The server keeps no session table: a token's only authority is "this
//! username authenticated successfully before `exp`". Verification is a pure
//! function of the keys, the token, and the clock — no I/O and no shared
//! mutable state, so it is safe to run on every request without contention.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Fixed expiry window for issued tokens.
const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("malformed token")]
    Malformed,
    #[error("expired token")]
    Expired,
    #[error("invalid token signature")]
    SignatureInvalid,
}

/// Signed token claims. `sub` is the username the token authenticates.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

fn unix_now() -> i64 {
    i64::try_from(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0),
    )
    .unwrap_or(i64::MAX)
}

/// Encoding/decoding key pair, built once at startup and shared read-only.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Load the signing secret from `JWT_SECRET`.
    ///
    /// Returns `None` if the variable is missing or empty; startup treats
    /// that as fatal rather than falling back to a guessable default.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let secret = std::env::var("JWT_SECRET").ok()?;
        if secret.is_empty() {
            return None;
        }
        Some(Self::new(secret.as_bytes()))
    }

    /// Issue a token for `username` with the fixed expiry window.
    ///
    /// # Errors
    ///
    /// Returns an error if claim serialization fails.
    pub fn issue(&self, username: &str) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_with_ttl(username, TOKEN_TTL_SECS)
    }

    pub(crate) fn issue_with_ttl(
        &self,
        username: &str,
        ttl_secs: i64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = unix_now();
        let claims = Claims { sub: username.to_owned(), iat: now, exp: now + ttl_secs };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// `Expired` past the expiry instant (no leeway), `SignatureInvalid` for
    /// tampered tokens or a wrong key, `Malformed` for anything that is not
    /// structurally a token.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
                _ => AuthError::Malformed,
            })
    }
}

#[cfg(test)]
#[path = "token_test.rs"]
mod tests;
