//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - Database connections and repositories
//! - Caching (Redis)
//! - The durable notification queue
//! - Unit of Work for transaction management

pub mod cache;
pub mod db;
pub mod queue;
pub mod repositories;
pub mod unit_of_work;

pub use cache::Cache;
pub use db::Database;
pub use queue::{NotificationQueue, PostgresQueue};
pub use repositories::{UserRepository, UserStore};
pub use unit_of_work::{Persistence, TransactionContext, TxUserStore, UnitOfWork};
