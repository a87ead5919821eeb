//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! rt-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `SERVER_DATABASE_URL` or `DATABASE_URL` - `PostgreSQL` connection string
//!
//! Migrations live in `crates/server/migrations/` and are embedded in the
//! server crate as `db::MIGRATOR`.

use super::{CommandError, connect};

/// Apply all pending migrations.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    rebuild_together_server::db::MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}

/// Errors from `rt-cli migrate`.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}
