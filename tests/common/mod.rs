//! Shared in-memory fakes for integration tests.
//!
//! These implement the infrastructure traits over plain collections so the
//! service layer can be exercised without a database or Redis.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use readstack::domain::{NewUser, User};
use readstack::errors::{AppError, AppResult};
use readstack::infra::{
    NotificationQueue, TransactionContext, TxUserStore, UnitOfWork, UserRepository,
};
use readstack::jobs::NotificationJob;
use readstack::services::OtpGateway;

/// Rows shared between the repository fake and the unit-of-work fake,
/// standing in for the one users table both talk to.
pub type SharedRows = Arc<Mutex<Vec<User>>>;

pub fn shared_rows() -> SharedRows {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn test_user(email: &str) -> User {
    User::new(
        Uuid::new_v4(),
        email.to_string(),
        // Real hash of "correct horse" is built per-test where it matters.
        "hashed".to_string(),
        "Ada".to_string(),
        "Lovelace".to_string(),
    )
}

// =============================================================================
// User repository fake
// =============================================================================

pub struct InMemoryUsers {
    rows: SharedRows,
}

impl InMemoryUsers {
    pub fn new(rows: SharedRows) -> Self {
        Self { rows }
    }

    pub fn insert(&self, user: User) {
        self.rows.lock().unwrap().push(user);
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.rows.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_refresh_token(&self, email: &str, token: &str) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or(AppError::NotFound)?;
        user.refresh_token = Some(token.to_string());
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn set_email_verified(&self, id: Uuid) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows.iter_mut().find(|u| u.id == id).ok_or(AppError::NotFound)?;
        user.email_verified = true;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn set_reset_token(&self, id: Uuid, token: &str) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows.iter_mut().find(|u| u.id == id).ok_or(AppError::NotFound)?;
        user.reset_token = Some(token.to_string());
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_password_by_reset_token(&self, token: &str, new_hash: &str) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows
            .iter_mut()
            .find(|u| u.reset_token.as_deref() == Some(token))
            .ok_or(AppError::NotFound)?;
        let now = Utc::now();
        user.password_hash = new_hash.to_string();
        user.reset_token = None;
        user.password_changed_at = Some(now);
        user.updated_at = now;
        Ok(())
    }
}

// =============================================================================
// Unit of Work fake with staged commits
// =============================================================================

/// Transactional store that stages inserts until commit.
struct StagingStore<'a> {
    committed: &'a Mutex<Vec<User>>,
    staged: Mutex<Vec<User>>,
}

#[async_trait]
impl TxUserStore for StagingStore<'_> {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let committed = self
            .committed
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned();
        if committed.is_some() {
            return Ok(committed);
        }

        Ok(self
            .staged
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, fields: NewUser) -> AppResult<User> {
        let user = User::new(
            Uuid::new_v4(),
            fields.email,
            fields.password_hash,
            fields.first_name,
            fields.last_name,
        );
        self.staged.lock().unwrap().push(user.clone());
        Ok(user)
    }
}

/// In-memory Unit of Work: inserts become visible only when the closure
/// returns Ok and the (fake) commit succeeds.
pub struct InMemoryUow {
    rows: SharedRows,
    fail_commit: AtomicBool,
}

impl InMemoryUow {
    pub fn new(rows: SharedRows) -> Self {
        Self {
            rows,
            fail_commit: AtomicBool::new(false),
        }
    }

    /// Make the next commit fail after the closure has succeeded.
    pub fn fail_commits(&self) {
        self.fail_commit.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUow {
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(
                TransactionContext<'a>,
            ) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        let store = StagingStore {
            committed: &self.rows,
            staged: Mutex::new(Vec::new()),
        };

        let result = f(TransactionContext::new(&store)).await?;

        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(AppError::internal("commit failed"));
        }

        let staged = store.staged.into_inner().unwrap();
        self.rows.lock().unwrap().extend(staged);
        Ok(result)
    }
}

// =============================================================================
// Notification queue fake
// =============================================================================

#[derive(Default)]
pub struct RecordingQueue {
    jobs: Mutex<Vec<NotificationJob>>,
    fail: AtomicBool,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(&self) -> Vec<NotificationJob> {
        self.jobs.lock().unwrap().clone()
    }

    pub fn fail_enqueues(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationQueue for RecordingQueue {
    async fn enqueue(&self, job: NotificationJob) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::internal("queue unavailable"));
        }
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}

// =============================================================================
// OTP gateway fake
// =============================================================================

/// Hands out a fixed code and verifies against it.
pub struct FakeOtp {
    code: String,
    issued_to: Mutex<Vec<Uuid>>,
    fail_create: AtomicBool,
}

impl FakeOtp {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            issued_to: Mutex::new(Vec::new()),
            fail_create: AtomicBool::new(false),
        }
    }

    pub fn issued_to(&self) -> Vec<Uuid> {
        self.issued_to.lock().unwrap().clone()
    }

    pub fn fail_creates(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl OtpGateway for FakeOtp {
    async fn create(&self, user_id: Uuid) -> AppResult<String> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(AppError::internal("otp store unavailable"));
        }
        self.issued_to.lock().unwrap().push(user_id);
        Ok(self.code.clone())
    }

    async fn verify(&self, _user_id: Uuid, code: &str) -> AppResult<()> {
        if code == self.code {
            Ok(())
        } else {
            Err(AppError::BadRequest(
                "Invalid or expired verification code".to_string(),
            ))
        }
    }
}
