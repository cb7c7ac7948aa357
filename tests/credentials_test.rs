//! Credential flow integration tests.
//!
//! Covers login (including the refresh-token rotation it performs), email
//! verification, and the forgot/reset password round trip over in-memory
//! infrastructure.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};

use readstack::domain::Password;
use readstack::errors::AppError;
use readstack::services::Claims;
use readstack::jobs::NotificationKind;
use readstack::services::{CredentialFlows, CredentialService, RequestAuthenticator, TokenCodec};
use readstack::Config;

use common::{shared_rows, test_user, FakeOtp, InMemoryUsers, RecordingQueue};

const ACCESS_SECRET: &str = "it-access-secret-0123456789abcdefgh";
const REFRESH_SECRET: &str = "it-refresh-secret-0123456789abcdefg";

struct Harness {
    codec: Arc<TokenCodec>,
    users: Arc<InMemoryUsers>,
    otp: Arc<FakeOtp>,
    queue: Arc<RecordingQueue>,
    service: CredentialService,
}

fn harness() -> Harness {
    let codec = Arc::new(TokenCodec::new(&Config::for_secrets(
        ACCESS_SECRET,
        REFRESH_SECRET,
    )));
    let users = Arc::new(InMemoryUsers::new(shared_rows()));
    let otp = Arc::new(FakeOtp::new("123456"));
    let queue = Arc::new(RecordingQueue::new());
    let service = CredentialService::new(users.clone(), codec.clone(), otp.clone(), queue.clone());

    Harness {
        codec,
        users,
        otp,
        queue,
        service,
    }
}

fn user_with_password(email: &str, password: &str) -> readstack::User {
    let mut user = test_user(email);
    user.password_hash = Password::new(password).unwrap().into_string();
    user
}

#[tokio::test]
async fn login_mints_both_tokens_and_rotates_the_stored_refresh_token() {
    let h = harness();
    let mut user = user_with_password("ada@example.com", "correct-password");
    user.refresh_token = Some("previous-session-token".to_string());
    h.users.insert(user.clone());

    let outcome = h
        .service
        .login("ada@example.com", "correct-password")
        .await
        .unwrap();

    assert_eq!(outcome.user.id, user.id);
    assert_eq!(h.codec.verify_access(&outcome.access_token).unwrap(), user.id);
    assert_eq!(
        h.codec.verify_refresh(&outcome.refresh_token).unwrap(),
        user.id
    );

    // The stored value moved to the new token, revoking the old session.
    let stored = h.users.get(user.id).unwrap().refresh_token;
    assert_eq!(stored.as_deref(), Some(outcome.refresh_token.as_str()));
}

#[tokio::test]
async fn login_revokes_the_previous_session_for_renewal() {
    let h = harness();
    let mut user = user_with_password("ada@example.com", "correct-password");

    // A refresh token from an earlier session: valid signature, older iat so
    // it cannot collide with the one login is about to mint.
    let now = Utc::now();
    let claims = Claims {
        sub: user.id,
        exp: (now + Duration::days(29)).timestamp(),
        iat: (now - Duration::days(1)).timestamp(),
    };
    let old_refresh = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(REFRESH_SECRET.as_bytes()),
    )
    .unwrap();
    user.refresh_token = Some(old_refresh.clone());
    h.users.insert(user);

    h.service
        .login("ada@example.com", "correct-password")
        .await
        .unwrap();

    // The pre-login refresh token still verifies cryptographically but no
    // longer matches the stored value, so renewal must reject it.
    let authenticator = RequestAuthenticator::new(h.codec.clone(), h.users.clone());
    let result = authenticator.authenticate(None, Some(&old_refresh)).await;
    assert!(matches!(result.unwrap_err(), AppError::Unauthorized));
}

#[tokio::test]
async fn login_with_wrong_password_is_invalid_credentials() {
    let h = harness();
    h.users
        .insert(user_with_password("ada@example.com", "correct-password"));

    let result = h.service.login("ada@example.com", "wrong-password").await;
    assert!(matches!(result.unwrap_err(), AppError::InvalidCredentials));
}

#[tokio::test]
async fn login_with_unknown_email_is_indistinguishable_from_wrong_password() {
    let h = harness();

    let result = h.service.login("nobody@example.com", "whatever").await;
    assert!(matches!(result.unwrap_err(), AppError::InvalidCredentials));
}

#[tokio::test]
async fn verify_email_marks_the_user_and_queues_the_welcome_email() {
    let h = harness();
    let user = test_user("ada@example.com");
    h.users.insert(user.clone());

    h.service
        .verify_email("ada@example.com", "123456")
        .await
        .unwrap();

    assert!(h.users.get(user.id).unwrap().email_verified);

    let jobs = h.queue.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].name, NotificationKind::SendWelcomeEmail);
    assert!(jobs[0].code.is_none());
}

#[tokio::test]
async fn verify_email_with_bad_code_changes_nothing() {
    let h = harness();
    let user = test_user("ada@example.com");
    h.users.insert(user.clone());

    let result = h.service.verify_email("ada@example.com", "999999").await;

    assert!(matches!(result.unwrap_err(), AppError::BadRequest(_)));
    assert!(!h.users.get(user.id).unwrap().email_verified);
    assert!(h.queue.jobs().is_empty());
}

#[tokio::test]
async fn resend_verify_email_queues_a_fresh_verification_job() {
    let h = harness();
    let user = test_user("ada@example.com");
    h.users.insert(user.clone());

    h.service
        .resend_verify_email("ada@example.com")
        .await
        .unwrap();

    let jobs = h.queue.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].name, NotificationKind::SendVerificationEmail);
    assert_eq!(jobs[0].code.as_deref(), Some("123456"));
    assert_eq!(h.otp.issued_to(), vec![user.id]);
}

#[tokio::test]
async fn credential_flows_for_unknown_email_are_not_found() {
    let h = harness();

    let verify = h.service.verify_email("nobody@example.com", "123456").await;
    let resend = h.service.resend_verify_email("nobody@example.com").await;
    let forgot = h.service.forgot_password("nobody@example.com").await;

    assert!(matches!(verify.unwrap_err(), AppError::NotFound));
    assert!(matches!(resend.unwrap_err(), AppError::NotFound));
    assert!(matches!(forgot.unwrap_err(), AppError::NotFound));
}

#[tokio::test]
async fn forgot_then_reset_password_round_trip() {
    let h = harness();
    let user = user_with_password("ada@example.com", "old-password");
    h.users.insert(user.clone());

    h.service.forgot_password("ada@example.com").await.unwrap();

    // The issued code is stored as the pending reset token and mailed out.
    let stored = h.users.get(user.id).unwrap();
    assert_eq!(stored.reset_token.as_deref(), Some("123456"));

    let jobs = h.queue.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].name, NotificationKind::SendForgotPasswordEmail);
    assert_eq!(jobs[0].code.as_deref(), Some("123456"));

    h.service
        .reset_password("123456", "new-password")
        .await
        .unwrap();

    let updated = h.users.get(user.id).unwrap();
    assert!(updated.reset_token.is_none());
    assert!(updated.password_changed_at.is_some());
    assert!(Password::from_hash(updated.password_hash.clone()).verify("new-password"));

    // The consumed token cannot be replayed.
    let replay = h.service.reset_password("123456", "another-password").await;
    assert!(matches!(replay.unwrap_err(), AppError::NotFound));
}

#[tokio::test]
async fn reset_password_with_unknown_token_is_not_found() {
    let h = harness();
    h.users
        .insert(user_with_password("ada@example.com", "old-password"));

    let result = h.service.reset_password("000000", "new-password").await;
    assert!(matches!(result.unwrap_err(), AppError::NotFound));
}

#[tokio::test]
async fn reset_password_rejects_weak_passwords() {
    let h = harness();
    let mut user = user_with_password("ada@example.com", "old-password");
    user.reset_token = Some("123456".to_string());
    h.users.insert(user.clone());

    let result = h.service.reset_password("123456", "short").await;

    assert!(matches!(result.unwrap_err(), AppError::Validation(_)));
    // The pending reset survives a rejected attempt.
    assert_eq!(
        h.users.get(user.id).unwrap().reset_token.as_deref(),
        Some("123456")
    );
}
