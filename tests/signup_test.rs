//! Signup pipeline integration tests.
//!
//! Drives the registrar through the in-memory Unit of Work to pin down the
//! transactional guarantees: the verification email is queued only for a
//! committed create, and a failed signup leaves no row behind.

mod common;

use std::sync::Arc;

use readstack::errors::AppError;
use readstack::jobs::NotificationKind;
use readstack::services::{AccountRegistrar, Signup, SignupRegistrar};

use common::{shared_rows, test_user, FakeOtp, InMemoryUow, InMemoryUsers, RecordingQueue};

fn payload(email: &str) -> Signup {
    Signup {
        email: email.to_string(),
        password: "a-strong-password".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
    }
}

struct Harness {
    users: Arc<InMemoryUsers>,
    uow: Arc<InMemoryUow>,
    otp: Arc<FakeOtp>,
    queue: Arc<RecordingQueue>,
    registrar: SignupRegistrar<InMemoryUow>,
}

fn harness() -> Harness {
    let rows = shared_rows();
    let users = Arc::new(InMemoryUsers::new(rows.clone()));
    let uow = Arc::new(InMemoryUow::new(rows));
    let otp = Arc::new(FakeOtp::new("123456"));
    let queue = Arc::new(RecordingQueue::new());
    let registrar = SignupRegistrar::new(uow.clone(), otp.clone(), queue.clone());

    Harness {
        users,
        uow,
        otp,
        queue,
        registrar,
    }
}

#[tokio::test]
async fn successful_signup_creates_one_row_and_queues_one_verification_job() {
    let h = harness();

    let user = h.registrar.signup(payload("ada@example.com")).await.unwrap();

    assert_eq!(h.users.count(), 1);
    assert!(!user.email_verified);

    let jobs = h.queue.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].name, NotificationKind::SendVerificationEmail);
    assert_eq!(jobs[0].code.as_deref(), Some("123456"));
    assert_eq!(jobs[0].user.email, "ada@example.com");

    // The OTP was issued for the committed user, not some placeholder id.
    assert_eq!(h.otp.issued_to(), vec![user.id]);
}

#[tokio::test]
async fn signup_stores_a_hash_not_the_password() {
    let h = harness();

    let user = h.registrar.signup(payload("ada@example.com")).await.unwrap();

    assert_ne!(user.password_hash, "a-strong-password");
    assert!(user.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn duplicate_email_conflicts_without_row_or_job() {
    let h = harness();
    h.users.insert(test_user("ada@example.com"));

    let result = h.registrar.signup(payload("ada@example.com")).await;

    assert!(matches!(result.unwrap_err(), AppError::Conflict(_)));
    assert_eq!(h.users.count(), 1);
    assert!(h.queue.jobs().is_empty());
    assert!(h.otp.issued_to().is_empty());
}

#[tokio::test]
async fn duplicate_email_is_detected_before_password_hashing() {
    let h = harness();
    h.users.insert(test_user("ada@example.com"));

    // The password is too short to ever hash; a Conflict (not a validation
    // failure) proves the uniqueness check runs first inside the
    // transaction.
    let mut duplicate = payload("ada@example.com");
    duplicate.password = "short".to_string();

    let result = h.registrar.signup(duplicate).await;
    assert!(matches!(result.unwrap_err(), AppError::Conflict(_)));
}

#[tokio::test]
async fn commit_failure_leaves_no_row_and_queues_nothing() {
    let h = harness();
    h.uow.fail_commits();

    let result = h.registrar.signup(payload("ada@example.com")).await;

    // Pre-commit failures other than duplicates surface as internal errors.
    assert!(matches!(result.unwrap_err(), AppError::Internal(_)));
    assert_eq!(h.users.count(), 0);
    assert!(h.queue.jobs().is_empty());
    assert!(h.otp.issued_to().is_empty());
}

#[tokio::test]
async fn otp_failure_after_commit_does_not_fail_the_signup() {
    let h = harness();
    h.otp.fail_creates();

    // The create committed, so the caller still gets a success even though
    // no verification email could be dispatched.
    let user = h.registrar.signup(payload("ada@example.com")).await.unwrap();

    assert_eq!(h.users.count(), 1);
    assert_eq!(h.users.get(user.id).unwrap().email, "ada@example.com");
    assert!(h.queue.jobs().is_empty());
}

#[tokio::test]
async fn enqueue_failure_after_commit_does_not_fail_the_signup() {
    let h = harness();
    h.queue.fail_enqueues();

    let user = h.registrar.signup(payload("ada@example.com")).await.unwrap();

    assert_eq!(h.users.count(), 1);
    // The OTP was still issued; only the queue handoff failed.
    assert_eq!(h.otp.issued_to(), vec![user.id]);
}
