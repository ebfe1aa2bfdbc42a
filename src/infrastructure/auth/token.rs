//! Signed session token issuance and verification
//!
//! Tokens are compact `header.claims.signature` JWTs signed with HMAC-SHA256.
//! They are self-contained bearer credentials: possession plus a valid
//! signature plus an unexpired `exp` claim is the whole proof. Revocation is
//! handled one level up by comparing against the token stored on the account
//! record.

use std::fmt::Debug;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Claims embedded in a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user id)
    pub sub: i64,
    /// Expiration timestamp (Unix epoch seconds)
    pub exp: i64,
}

impl TokenClaims {
    fn new(subject_id: i64, ttl_hours: u32) -> Self {
        let exp = Utc::now() + Duration::hours(i64::from(ttl_hours));

        Self {
            sub: subject_id,
            exp: exp.timestamp(),
        }
    }
}

/// Configuration for the token codec
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token lifetime in hours
    pub ttl_hours: u32,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>, ttl_hours: u32) -> Self {
        Self {
            secret: secret.into(),
            ttl_hours,
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            ttl_hours: 24,
        }
    }
}

/// Trait for token operations
///
/// The lifecycle service depends on this seam so tests can substitute a stub
/// codec.
pub trait TokenIssuer: Send + Sync + Debug {
    /// Issue a token for a subject using the configured lifetime
    fn issue(&self, subject_id: i64) -> Result<String, DomainError>;

    /// Issue a token with an explicit lifetime in hours
    fn issue_with_ttl(&self, subject_id: i64, ttl_hours: u32) -> Result<String, DomainError>;

    /// Verify a token and return the subject id
    fn verify(&self, token: &str) -> Result<i64, DomainError>;
}

/// HMAC-SHA256 token codec
///
/// Stateless: a pure function of its inputs and the secret key, safe to call
/// concurrently from many tasks.
#[derive(Clone)]
pub struct TokenCodec {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("ttl_hours", &self.config.ttl_hours)
            .field("secret", &"[hidden]")
            .finish()
    }
}

impl TokenCodec {
    pub fn new(config: TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub fn ttl_hours(&self) -> u32 {
        self.config.ttl_hours
    }
}

impl TokenIssuer for TokenCodec {
    fn issue(&self, subject_id: i64) -> Result<String, DomainError> {
        self.issue_with_ttl(subject_id, self.config.ttl_hours)
    }

    fn issue_with_ttl(&self, subject_id: i64, ttl_hours: u32) -> Result<String, DomainError> {
        if ttl_hours == 0 {
            return Err(DomainError::configuration(
                "token lifetime must be greater than zero hours",
            ));
        }

        let claims = TokenClaims::new(subject_id, ttl_hours);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| DomainError::internal(format!("failed to sign token: {e}")))
    }

    fn verify(&self, token: &str) -> Result<i64, DomainError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // No leeway: the expiry instant is the boundary, exactly.
        validation.leeway = 0;

        match decode::<TokenClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims.sub),
            Err(e) => match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(DomainError::TokenExpired),
                _ => Err(DomainError::TokenInvalid),
            },
        }
    }
}
