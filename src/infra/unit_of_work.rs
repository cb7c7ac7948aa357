//! Unit of Work - transaction lifecycle and in-transaction repository access.
//!
//! The signup pipeline runs its uniqueness check and insert inside one
//! transaction; commit is the durability boundary. The closure receives a
//! [`TransactionContext`] whose repositories are bound to that transaction,
//! so every operation either commits together or rolls back together.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IsolationLevel, QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use super::repositories::entities::user::{self, Entity as UserEntity};
use crate::domain::{NewUser, User};
use crate::errors::{AppError, AppResult};

/// User operations available inside a transaction.
#[async_trait]
pub trait TxUserStore: Send + Sync {
    /// Find user by email within the transaction's isolation scope
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Insert a new user row as part of the transaction
    async fn create(&self, fields: NewUser) -> AppResult<User>;
}

/// Transaction context providing repository access within a transaction.
///
/// Borrows the store to ensure no repository handle outlives the
/// transaction it is bound to.
pub struct TransactionContext<'a> {
    users: &'a (dyn TxUserStore + 'a),
}

impl<'a> TransactionContext<'a> {
    /// Create a context over any transactional user store.
    ///
    /// Public so tests can drive services through an in-memory store.
    pub fn new(users: &'a dyn TxUserStore) -> Self {
        Self { users }
    }

    /// Get user store for this transaction
    pub fn users(&self) -> &dyn TxUserStore {
        self.users
    }
}

/// Unit of Work trait for dependency injection.
///
/// Note: this trait is not mockable directly due to the generic method.
/// Tests use an in-memory implementation instead.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Execute a closure within a transaction.
    ///
    /// The transaction is committed when the closure returns Ok and rolled
    /// back when it returns Err. A commit failure surfaces as an error and
    /// the closure's result is discarded.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send;
}

/// Concrete implementation of UnitOfWork over SeaORM.
pub struct Persistence {
    db: DatabaseConnection,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        // ReadCommitted is enough here: the storage-level unique index on
        // email is the real duplicate guard, not the in-transaction check.
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::ReadCommitted), Some(AccessMode::ReadWrite))
            .await
            .map_err(AppError::from)?;

        let users = TxUserRepository::new(&txn);
        let ctx = TransactionContext::new(&users);

        match f(ctx).await {
            Ok(result) => {
                txn.commit().await.map_err(AppError::from)?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

/// Transaction-aware user repository.
///
/// Executes all operations within the provided transaction.
struct TxUserRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxUserRepository<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }
}

#[async_trait]
impl TxUserStore for TxUserRepository<'_> {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.txn)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn create(&self, fields: NewUser) -> AppResult<User> {
        let now = Utc::now();
        let active_model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(fields.email),
            password_hash: Set(fields.password_hash),
            first_name: Set(fields.first_name),
            last_name: Set(fields.last_name),
            email_verified: Set(false),
            suspended: Set(false),
            password_changed_at: Set(None),
            refresh_token: Set(None),
            reset_token: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model
            .insert(self.txn)
            .await
            .map_err(AppError::from)?;

        Ok(User::from(model))
    }
}
