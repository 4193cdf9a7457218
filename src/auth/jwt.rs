//! JWT access tokens
//!
//! Tokens are signed with HS256 and carry the username and role of the
//! caller. Expiry is checked with zero leeway: a token is rejected as soon
//! as `now > exp`.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::auth::Role;
use crate::types::CatalogError;

/// Minimum accepted length of the signing secret outside dev mode
pub const MIN_SECRET_LEN: usize = 32;

/// Default token lifetime
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Longest token lifetime accepted from configuration: 30 days
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Payload stored in a token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    /// Role granted at login
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Issues and verifies access tokens with a process-wide key
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service. The secret must be at least 32 characters.
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Result<Self, CatalogError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(CatalogError::Config(
                "JWT_SECRET is required in production mode".into(),
            ));
        }

        if secret.len() < MIN_SECRET_LEN {
            return Err(CatalogError::Config(format!(
                "JWT_SECRET must be at least {MIN_SECRET_LEN} characters"
            )));
        }

        Ok(Self { secret, ttl })
    }

    /// Token service for dev mode and tests
    pub fn new_dev() -> Self {
        Self {
            secret: "dev-mode-secret-not-for-production-use-123456".into(),
            ttl: DEFAULT_TOKEN_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for a user, valid for the configured TTL
    pub fn issue(&self, subject: &str, role: Role) -> Result<String, CatalogError> {
        let now = unix_now()?;
        let exp = now
            .checked_add(self.ttl.as_secs())
            .ok_or_else(|| CatalogError::Internal("token expiry is out of range".into()))?;
        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat: now,
            exp,
        };
        self.sign(&claims)
    }

    /// Sign arbitrary claims
    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, CatalogError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| CatalogError::Internal(format!("cannot generate access token: {e}")))
    }

    /// Verify signature and expiry, returning the embedded claims
    pub fn verify(&self, token: &str) -> Result<Claims, CatalogError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|err| {
            use jsonwebtoken::errors::ErrorKind;
            let reason = match err.kind() {
                ErrorKind::ExpiredSignature => "token expired",
                ErrorKind::InvalidSignature => "invalid signature",
                ErrorKind::InvalidToken => "invalid token",
                _ => "token validation failed",
            };
            CatalogError::Unauthenticated(format!("access token is invalid: {reason}"))
        })
    }
}

pub(crate) fn unix_now() -> Result<u64, CatalogError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| CatalogError::Internal(format!("system time error: {e}")))
}
