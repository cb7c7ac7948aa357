//! Request authenticator - the per-request session state machine.
//!
//! Decides whether a request is authenticated from the two token cookies,
//! minting a fresh access token through the renewal procedure when the
//! presented access token is expired, corrupt, or absent. The authenticator
//! performs no I/O beyond the user lookup and never writes: concurrent
//! renewals against the same still-valid refresh token are idempotent, each
//! yielding a fresh access token.

use std::sync::Arc;
use uuid::Uuid;

use super::token_codec::TokenCodec;
use crate::errors::{AppError, AppResult};
use crate::infra::UserRepository;

/// Result of a successful authentication.
#[derive(Debug)]
pub struct AuthOutcome {
    /// Authenticated user id, attached to the request context downstream
    pub principal_id: Uuid,
    /// Freshly minted access token the HTTP layer must set as a cookie.
    /// None when the presented access token was still valid.
    pub new_access_token: Option<String>,
}

/// Per-request authenticator over the token codec and user store.
pub struct RequestAuthenticator {
    codec: Arc<TokenCodec>,
    users: Arc<dyn UserRepository>,
}

impl RequestAuthenticator {
    pub fn new(codec: Arc<TokenCodec>, users: Arc<dyn UserRepository>) -> Self {
        Self { codec, users }
    }

    /// Authenticate a request from its access/refresh cookie values.
    ///
    /// State machine (recomputed per call, nothing persisted):
    /// - both cookies absent: unauthorized;
    /// - access present and valid: load the user, succeed with no new token;
    /// - access expired or corrupt (or absent) with refresh present: run the
    ///   renewal procedure;
    /// - anything else: unauthorized.
    ///
    /// Storage failures surface as internal errors, never as token errors.
    pub async fn authenticate(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> AppResult<AuthOutcome> {
        match (access_token, refresh_token) {
            (None, None) => Err(AppError::Unauthorized),
            (Some(access), refresh) => match self.codec.verify_access(access) {
                Ok(user_id) => {
                    let user = self
                        .users
                        .find_by_id(user_id)
                        .await?
                        .ok_or(AppError::Unauthorized)?;

                    // Future checks, not enforced here: suspended account,
                    // unverified email, password changed after issuance.
                    Ok(AuthOutcome {
                        principal_id: user.id,
                        new_access_token: None,
                    })
                }
                // Expired and corrupt access tokens both fall through to
                // renewal; the refresh token's own verification decides.
                Err(_) => match refresh {
                    Some(refresh) => self.renew(refresh).await,
                    None => Err(AppError::Unauthorized),
                },
            },
            (None, Some(refresh)) => self.renew(refresh).await,
        }
    }

    /// Renewal procedure: verify the refresh token, compare it against the
    /// single value stored on the user record (revocation check), and mint a
    /// new access token. A stored-value mismatch means the session was
    /// rotated or revoked elsewhere and is unauthorized, not missing.
    async fn renew(&self, refresh_token: &str) -> AppResult<AuthOutcome> {
        let user_id = self.codec.verify_refresh(refresh_token).map_err(|e| {
            tracing::debug!(error = ?e, "Session renewal rejected: refresh token failed verification");
            AppError::Unauthorized
        })?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if user.refresh_token.as_deref() != Some(refresh_token) {
            tracing::debug!(user_id = %user.id, "Session renewal rejected: refresh token revoked or rotated");
            return Err(AppError::Unauthorized);
        }

        let access_token = self
            .codec
            .sign_access(user.id)
            .map_err(|e| AppError::internal(format!("Failed to mint access token: {}", e)))?;

        Ok(AuthOutcome {
            principal_id: user.id,
            new_access_token: Some(access_token),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::User;
    use crate::infra::repositories::MockUserRepository;
    use mockall::predicate::eq;

    fn codec() -> Arc<TokenCodec> {
        let config = Config::for_secrets(
            "unit-access-secret-0123456789abcdef",
            "unit-refresh-secret-0123456789abcde",
        );
        Arc::new(TokenCodec::new(&config))
    }

    fn user_with_refresh(id: Uuid, refresh: Option<String>) -> User {
        let mut user = User::new(
            id,
            "reader@example.com".to_string(),
            "hashed".to_string(),
            "Ada".to_string(),
            "Lovelace".to_string(),
        );
        user.refresh_token = refresh;
        user
    }

    #[tokio::test]
    async fn test_no_credentials_is_unauthorized() {
        let authenticator = RequestAuthenticator::new(codec(), Arc::new(MockUserRepository::new()));

        let result = authenticator.authenticate(None, None).await;
        assert!(matches!(result.unwrap_err(), AppError::Unauthorized));
    }

    #[tokio::test]
    async fn test_valid_access_token_with_missing_user_is_unauthorized() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let access = codec.sign_access(user_id).unwrap();

        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .with(eq(user_id))
            .returning(|_| Ok(None));

        let authenticator = RequestAuthenticator::new(codec, Arc::new(repo));
        let result = authenticator.authenticate(Some(&access), None).await;

        assert!(matches!(result.unwrap_err(), AppError::Unauthorized));
    }

    #[tokio::test]
    async fn test_storage_failure_is_not_reported_as_unauthorized() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let access = codec.sign_access(user_id).unwrap();

        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(|_| Err(AppError::internal("connection pool exhausted")));

        let authenticator = RequestAuthenticator::new(codec, Arc::new(repo));
        let result = authenticator.authenticate(Some(&access), None).await;

        assert!(matches!(result.unwrap_err(), AppError::Internal(_)));
    }

    #[tokio::test]
    async fn test_renewal_does_not_write_to_the_store() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let refresh = codec.sign_refresh(user_id).unwrap();

        let mut repo = MockUserRepository::new();
        let stored = refresh.clone();
        repo.expect_find_by_id()
            .with(eq(user_id))
            .returning(move |id| Ok(Some(user_with_refresh(id, Some(stored.clone())))));
        // No update expectations: any write would panic the mock.

        let authenticator = RequestAuthenticator::new(codec, Arc::new(repo));
        let outcome = authenticator
            .authenticate(None, Some(&refresh))
            .await
            .unwrap();

        assert_eq!(outcome.principal_id, user_id);
        assert!(outcome.new_access_token.is_some());
    }
}
