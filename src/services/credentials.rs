//! Credential flows - login, email verification, and password reset.
//!
//! Thin orchestration over the token codec, user store, OTP gateway, and
//! notification queue. Login is the only path that replaces the stored
//! refresh token value outside explicit revocation.

use async_trait::async_trait;
use std::sync::Arc;

use super::otp::OtpGateway;
use super::token_codec::TokenCodec;
use crate::domain::{Password, User};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{NotificationQueue, UserRepository};
use crate::jobs::NotificationJob;

/// Result of a successful login.
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Credential flow operations for dependency injection.
#[async_trait]
pub trait CredentialFlows: Send + Sync {
    /// Authenticate with email/password, mint both tokens, and persist the
    /// new refresh token value (invalidating the previous session).
    async fn login(&self, email: &str, password: &str) -> AppResult<LoginOutcome>;

    /// Verify an email address with an OTP code, then queue the welcome
    /// email.
    async fn verify_email(&self, email: &str, code: &str) -> AppResult<()>;

    /// Issue a fresh OTP and queue another verification email.
    async fn resend_verify_email(&self, email: &str) -> AppResult<()>;

    /// Issue a reset OTP, record it as the pending reset token, and queue
    /// the forgot-password email.
    async fn forgot_password(&self, email: &str) -> AppResult<()>;

    /// Replace the password matching a pending reset token.
    async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()>;
}

/// Concrete credential flows implementation.
pub struct CredentialService {
    users: Arc<dyn UserRepository>,
    codec: Arc<TokenCodec>,
    otp: Arc<dyn OtpGateway>,
    queue: Arc<dyn NotificationQueue>,
}

impl CredentialService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        codec: Arc<TokenCodec>,
        otp: Arc<dyn OtpGateway>,
        queue: Arc<dyn NotificationQueue>,
    ) -> Self {
        Self {
            users,
            codec,
            otp,
            queue,
        }
    }

    async fn require_user(&self, email: &str) -> AppResult<User> {
        self.users.find_by_email(email).await?.ok_or_not_found()
    }
}

#[async_trait]
impl CredentialFlows for CredentialService {
    async fn login(&self, email: &str, password: &str) -> AppResult<LoginOutcome> {
        let user_result = self.users.find_by_email(email).await?;

        // SECURITY: Perform password verification even if user doesn't exist
        // to prevent timing attacks that could enumerate valid emails.
        let dummy_hash =
            "$argon2id$v=19$m=19456,t=2,p=1$dummysalt123456$dummyhash1234567890123456789012";

        let (password_hash, user_exists) = match &user_result {
            Some(user) => (user.password_hash.as_str(), true),
            None => (dummy_hash, false),
        };

        let password_valid = Password::from_hash(password_hash.to_string()).verify(password);

        // Missing user and bad password collapse into one signal so callers
        // cannot learn which check failed.
        if !user_exists || !password_valid {
            return Err(AppError::InvalidCredentials);
        }

        // Safe to unwrap since we verified user_exists is true
        let user = user_result.unwrap();

        let access_token = self.codec.sign_access(user.id)?;
        let refresh_token = self.codec.sign_refresh(user.id)?;

        // The single stored value is the revocation source of truth; writing
        // it here invalidates any previously issued refresh token.
        self.users
            .update_refresh_token(&user.email, &refresh_token)
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginOutcome {
            user,
            access_token,
            refresh_token,
        })
    }

    async fn verify_email(&self, email: &str, code: &str) -> AppResult<()> {
        let user = self.require_user(email).await?;

        self.otp.verify(user.id, code).await?;
        self.users.set_email_verified(user.id).await?;

        self.queue.enqueue(NotificationJob::welcome(&user)).await?;

        tracing::info!(user_id = %user.id, "Email verified");
        Ok(())
    }

    async fn resend_verify_email(&self, email: &str) -> AppResult<()> {
        let user = self.require_user(email).await?;

        let code = self.otp.create(user.id).await?;
        self.queue
            .enqueue(NotificationJob::verification(&user, code))
            .await
    }

    async fn forgot_password(&self, email: &str) -> AppResult<()> {
        let user = self.require_user(email).await?;

        let code = self.otp.create(user.id).await?;
        self.users.set_reset_token(user.id, &code).await?;

        self.queue
            .enqueue(NotificationJob::password_reset(&user, code))
            .await
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        let new_hash = Password::new(new_password)?.into_string();

        // Fails NotFound when the token matches no pending reset.
        self.users
            .update_password_by_reset_token(token, &new_hash)
            .await
    }
}
