//! Sync error types

use sitedata_core::{SiteDataError, TableError};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Site table error: {0}")]
    Table(#[from] TableError),

    #[error(transparent)]
    Site(#[from] SiteDataError),
}

pub type SyncResult<T> = Result<T, SyncError>;
