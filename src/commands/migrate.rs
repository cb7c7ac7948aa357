//! Migrate command - user-store schema management.

use crate::cli::args::{MigrateAction, MigrateArgs};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::Database;

/// Execute the migrate command
pub async fn execute(args: MigrateArgs, config: Config) -> AppResult<()> {
    // Schema changes only happen here, never implicitly on connect
    let db = Database::connect_without_migrations(&config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;

    match args.action {
        MigrateAction::Up => {
            db.run_migrations().await.map_err(migration_error)?;
            tracing::info!("Users schema is up to date");
        }
        MigrateAction::Down => {
            db.rollback_migration().await.map_err(migration_error)?;
            tracing::info!("Rolled back the last migration");
        }
        MigrateAction::Status => {
            let report = db.migration_status().await.map_err(migration_error)?;
            println!("readstack migrations:");
            for entry in report {
                let status = if entry.applied { "applied" } else { "pending" };
                println!("  {:<48} {}", entry.name, status);
            }
        }
        MigrateAction::Fresh => {
            tracing::warn!("Dropping and rebuilding the users schema");
            db.fresh_migrations().await.map_err(migration_error)?;
            tracing::info!("Users schema rebuilt from scratch");
        }
    }

    Ok(())
}

fn migration_error(e: sea_orm::DbErr) -> AppError {
    AppError::internal(format!("Migration failed: {}", e))
}
