//! SQLite-based report store using `SeaORM`.

pub(crate) mod entity;
mod migration;
mod report_repo;

use std::path::Path;

use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::error::{AppError, AppResult};
use migration::Migrator;

/// `ReportRepository` backed by a local `SQLite` database file.
pub struct SqliteStore {
    /// Shared `SeaORM` database connection.
    pub(crate) db: DatabaseConnection,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path` and bring the schema up to date.
    ///
    /// # Errors
    /// Returns `AppError::StorageError` if directory creation, database
    /// connection, or schema migration fails.
    pub async fn new(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::StorageError(format!("Failed to create directory: {e}")))?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let db = Database::connect(&db_url)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to connect to SQLite: {e}")))?;

        let store = Self { db };

        // Ensure schema is up to date before the store is used.
        Migrator::up(&store.db, None)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to run migrations: {e}")))?;

        log::debug!("Opened report store at {}", db_path.display());
        Ok(store)
    }
}
