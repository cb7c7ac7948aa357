//! Serve command - Starts the HTTP server.

use std::sync::Arc;

use apalis_sql::postgres::PostgresStorage;
use apalis_sql::sqlx::postgres::PgPoolOptions;

use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{Cache, Database, NotificationQueue, PostgresQueue};
use crate::jobs::NotificationJob;

/// Execute the serve command
pub async fn execute(args: ServeArgs, config: Config) -> AppResult<()> {
    tracing::info!("Starting server...");

    // Initialize database
    let db = Arc::new(Database::connect(&config).await);

    // Initialize Redis cache
    let cache = Arc::new(Cache::connect(&config).await);

    // Initialize the notification queue (shares the database, separate pool)
    let queue = connect_queue(&config).await?;
    tracing::info!("Notification queue ready");

    // Create application state with centralized service container
    let app_state = AppState::from_config(db, cache, queue, config);

    // Build router
    let app = create_router(app_state);

    // Start server
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    Ok(())
}

/// Connect the apalis-backed notification queue.
async fn connect_queue(config: &Config) -> AppResult<Arc<dyn NotificationQueue>> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .map_err(|e| AppError::internal(format!("Failed to connect queue pool: {}", e)))?;

    // Creates the apalis schema if missing
    PostgresStorage::setup(&pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to setup job storage: {}", e)))?;

    let storage: PostgresStorage<NotificationJob> = PostgresStorage::new(pool);
    Ok(Arc::new(PostgresQueue::new(storage)))
}
