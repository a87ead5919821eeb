//! Database operations for the donation `PostgreSQL` schema.
//!
//! ## Tables
//!
//! - `profiles` - Donor profiles (id = Supabase auth user id)
//! - `user_roles` - `app_role` grants (admin, donor)
//! - `projects` - Fundraising projects mapped to Shopify products
//! - `project_updates` - Project timeline entries
//! - `donations` - One row per (order, project)
//! - `tax_receipts` - One annual summary per (donor, year)
//! - `project_progress_gallery`, `project_impact_items`,
//!   `project_team_members`, `project_partners` - Project page content
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p rebuild-together-cli -- migrate
//! ```

pub mod content;
pub mod donations;
pub mod profiles;
pub mod project_updates;
pub mod projects;
pub mod roles;
pub mod store;
pub mod tax_receipts;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use content::ContentRepository;
pub use donations::DonationRepository;
pub use profiles::ProfileRepository;
pub use project_updates::ProjectUpdateRepository;
pub use projects::ProjectRepository;
pub use roles::RoleRepository;
pub use store::{DonationStore, PgStore};
pub use tax_receipts::TaxReceiptRepository;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique key).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique violation to [`RepositoryError::Conflict`].
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
