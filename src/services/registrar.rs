//! Account registrar - the atomic create-then-notify signup pipeline.
//!
//! Invariants: a user row is never created without an attempt to queue a
//! verification email, and no verification email is queued for a create
//! that did not durably commit. The notification step runs strictly after
//! commit returns; its failures are logged and swallowed since the
//! user-facing operation already succeeded. There is no durable outbox
//! behind that step, so delivery is at-least-attempted, not at-least-once.

use async_trait::async_trait;
use std::sync::Arc;

use super::otp::OtpGateway;
use crate::domain::{NewUser, Password, User};
use crate::errors::{AppError, AppResult};
use crate::infra::{NotificationQueue, UnitOfWork};
use crate::jobs::NotificationJob;

/// Signup request payload.
#[derive(Debug, Clone)]
pub struct Signup {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Account registrar trait for dependency injection.
#[async_trait]
pub trait AccountRegistrar: Send + Sync {
    /// Register a new account.
    ///
    /// Fails with Conflict when the email is taken; every other pre-commit
    /// failure surfaces as an internal error.
    async fn signup(&self, payload: Signup) -> AppResult<User>;
}

/// Concrete registrar over the Unit of Work, OTP gateway, and queue.
pub struct SignupRegistrar<U: UnitOfWork> {
    uow: Arc<U>,
    otp: Arc<dyn OtpGateway>,
    queue: Arc<dyn NotificationQueue>,
}

impl<U: UnitOfWork> SignupRegistrar<U> {
    pub fn new(uow: Arc<U>, otp: Arc<dyn OtpGateway>, queue: Arc<dyn NotificationQueue>) -> Self {
        Self { uow, otp, queue }
    }

    /// Post-commit step: issue an OTP and queue the verification email.
    async fn dispatch_verification(&self, user: &User) -> AppResult<()> {
        let code = self.otp.create(user.id).await?;
        self.queue
            .enqueue(NotificationJob::verification(user, code))
            .await
    }
}

#[async_trait]
impl<U: UnitOfWork> AccountRegistrar for SignupRegistrar<U> {
    async fn signup(&self, payload: Signup) -> AppResult<User> {
        let email = payload.email;
        let password = payload.password;
        let first_name = payload.first_name;
        let last_name = payload.last_name;

        let user = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    // Optimization only - the unique index on email is the
                    // real guard against a concurrent duplicate.
                    if ctx.users().find_by_email(&email).await?.is_some() {
                        return Err(AppError::conflict("User"));
                    }

                    // Hash only after the uniqueness check so a duplicate
                    // signup never pays the argon2 cost.
                    let password_hash = Password::new(&password)?.into_string();

                    ctx.users()
                        .create(NewUser {
                            email,
                            password_hash,
                            first_name,
                            last_name,
                        })
                        .await
                })
            })
            .await
            .map_err(|e| match e {
                conflict @ AppError::Conflict(_) => conflict,
                other => {
                    tracing::error!(error = %other, "Account registration failed before commit");
                    AppError::internal("Account registration failed")
                }
            })?;

        tracing::info!(user_id = %user.id, "User registration committed");

        // Strictly after commit. Failure here never unwinds the committed
        // create and is not retried.
        if let Err(e) = self.dispatch_verification(&user).await {
            tracing::error!(
                user_id = %user.id,
                error = %e,
                "Failed to dispatch verification email after commit"
            );
        }

        Ok(user)
    }
}
