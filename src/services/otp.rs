//! One-time code gateway.
//!
//! The rest of the system treats OTPs as an external capability:
//! `create(user_id) -> code` and `verify(user_id, code)`. The concrete
//! implementation stores six-digit codes in Redis with a TTL; a code is
//! consumed on successful verification.

use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{CACHE_PREFIX_OTP, OTP_TTL_SECONDS};
use crate::errors::{AppError, AppResult};
use crate::infra::Cache;

/// OTP gateway trait for dependency injection.
#[async_trait]
pub trait OtpGateway: Send + Sync {
    /// Issue a fresh code for a user, replacing any previous one.
    async fn create(&self, user_id: Uuid) -> AppResult<String>;

    /// Verify a presented code; consumes it on success.
    async fn verify(&self, user_id: Uuid, code: &str) -> AppResult<()>;
}

/// Redis-backed OTP gateway.
pub struct RedisOtpGateway {
    cache: Arc<Cache>,
}

impl RedisOtpGateway {
    pub fn new(cache: Arc<Cache>) -> Self {
        Self { cache }
    }

    fn key(user_id: Uuid) -> String {
        format!("{}{}", CACHE_PREFIX_OTP, user_id)
    }
}

#[async_trait]
impl OtpGateway for RedisOtpGateway {
    async fn create(&self, user_id: Uuid) -> AppResult<String> {
        let code: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
        let code = code.to_string();

        self.cache
            .set_with_ttl(&Self::key(user_id), &code, OTP_TTL_SECONDS)
            .await?;

        tracing::debug!(user_id = %user_id, "OTP created");
        Ok(code)
    }

    async fn verify(&self, user_id: Uuid, code: &str) -> AppResult<()> {
        let key = Self::key(user_id);
        let stored: Option<String> = self.cache.get(&key).await?;

        match stored {
            Some(expected) if expected == code => {
                self.cache.delete(&key).await?;
                Ok(())
            }
            _ => Err(AppError::BadRequest(
                "Invalid or expired verification code".to_string(),
            )),
        }
    }
}
