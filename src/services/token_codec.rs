//! Token codec - signs and verifies the access/refresh token pair.
//!
//! Access and refresh tokens use independent secrets so a refresh-token
//! compromise cannot be used to mint further refresh tokens without also
//! matching the revocation value stored on the user record. Expiry is
//! enforced here; callers get a distinct error kind for expiry so only
//! expired-but-otherwise-valid credentials are routed into renewal.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{Config, ACCESS_TOKEN_TTL_MINUTES, REFRESH_TOKEN_TTL_DAYS};
use crate::errors::{AppError, AppResult};

/// JWT claims payload
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: i64,
    pub iat: i64,
}

/// Token verification failure kind.
///
/// `Expired` means the signature checked out but the token aged past its
/// lifetime; anything else (corruption, wrong secret, malformed structure)
/// is `Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        }
    }
}

/// Keys and lifetime for one token role.
struct TokenRole {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl TokenRole {
    fn new(secret: &[u8], lifetime: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            lifetime,
        }
    }

    fn sign(&self, user_id: Uuid) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            exp: (now + self.lifetime).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(AppError::from)
    }

    fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims.sub)
    }
}

/// Signs and verifies both token roles.
pub struct TokenCodec {
    access: TokenRole,
    refresh: TokenRole,
}

impl TokenCodec {
    pub fn new(config: &Config) -> Self {
        Self {
            access: TokenRole::new(
                config.access_secret_bytes(),
                Duration::minutes(ACCESS_TOKEN_TTL_MINUTES),
            ),
            refresh: TokenRole::new(
                config.refresh_secret_bytes(),
                Duration::days(REFRESH_TOKEN_TTL_DAYS),
            ),
        }
    }

    /// Mint a short-lived access token for a user.
    pub fn sign_access(&self, user_id: Uuid) -> AppResult<String> {
        self.access.sign(user_id)
    }

    /// Mint a long-lived refresh token for a user.
    pub fn sign_refresh(&self, user_id: Uuid) -> AppResult<String> {
        self.refresh.sign(user_id)
    }

    /// Verify an access token and extract the subject user id.
    pub fn verify_access(&self, token: &str) -> Result<Uuid, TokenError> {
        self.access.verify(token)
    }

    /// Verify a refresh token and extract the subject user id.
    ///
    /// Note: signature/expiry only. The revocation check against the value
    /// stored on the user record is the caller's responsibility.
    pub fn verify_refresh(&self, token: &str) -> Result<Uuid, TokenError> {
        self.refresh.verify(token)
    }
}
