//! Notification queue - durable job handoff to the out-of-process worker.
//!
//! The service layer only depends on the [`NotificationQueue`] trait; the
//! concrete implementation pushes into the apalis Postgres-backed queue
//! consumed by `jobs work`. Delivery is the worker's concern - this side
//! guarantees enqueue ordering only.

use apalis::prelude::Storage;
use apalis_sql::postgres::PostgresStorage;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::errors::{AppError, AppResult};
use crate::jobs::NotificationJob;

/// Queue handle the services enqueue notification jobs through.
#[async_trait]
pub trait NotificationQueue: Send + Sync {
    async fn enqueue(&self, job: NotificationJob) -> AppResult<()>;
}

/// apalis PostgreSQL-backed notification queue.
pub struct PostgresQueue {
    storage: Mutex<PostgresStorage<NotificationJob>>,
}

impl PostgresQueue {
    pub fn new(storage: PostgresStorage<NotificationJob>) -> Self {
        Self {
            storage: Mutex::new(storage),
        }
    }
}

#[async_trait]
impl NotificationQueue for PostgresQueue {
    async fn enqueue(&self, job: NotificationJob) -> AppResult<()> {
        let mut storage = self.storage.lock().await;
        storage
            .push(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to enqueue notification job: {}", e)))?;
        Ok(())
    }
}
