//! Subcommand implementations.
//!
//! `migrate` and `roles` only need a database URL (`SERVER_DATABASE_URL`,
//! falling back to `DATABASE_URL`), so they work without the Shopify and
//! Supabase settings the server needs.

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

pub mod migrate;
pub mod receipts;
pub mod roles;

/// Errors shared by the database-backed commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Repository error.
    #[error(transparent)]
    Repository(#[from] rebuild_together_server::db::RepositoryError),

    /// Invalid argument.
    #[error("{0}")]
    InvalidArgument(String),
}

/// Connect to `DATABASE_URL`.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("SERVER_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(rebuild_together_server::db::create_pool(&database_url).await?)
}
