//! Annual receipt generation.
//!
//! # Usage
//!
//! ```bash
//! rt-cli receipts annual --year 2025
//! rt-cli receipts annual --year 2025 --donor <uuid>
//! ```
//!
//! Runs the same service as `POST /functions/v1/generate-annual-receipts`,
//! so it needs the full server configuration (database, Supabase storage).

use std::sync::Arc;

use chrono::{Datelike, Utc};
use rebuild_together_core::DonorId;
use rebuild_together_server::config::{ConfigError, ServerConfig};
use rebuild_together_server::db::{PgStore, create_pool};
use rebuild_together_server::receipts::ReceiptError;
use rebuild_together_server::services::AnnualReceiptService;
use rebuild_together_server::supabase::{SupabaseClient, SupabaseError};
use thiserror::Error;

/// Errors from `rt-cli receipts`.
#[derive(Debug, Error)]
pub enum ReceiptCommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Supabase error: {0}")]
    Supabase(#[from] SupabaseError),

    #[error(transparent)]
    Receipt(#[from] ReceiptError),

    #[error("Invalid donor id: {0}")]
    InvalidDonor(String),
}

/// Generate annual receipts for `year` (default: current year).
pub async fn annual(year: Option<i32>, donor: Option<&str>) -> Result<(), ReceiptCommandError> {
    let donor_id = donor
        .map(|d| {
            d.parse::<DonorId>()
                .map_err(|_| ReceiptCommandError::InvalidDonor(d.to_owned()))
        })
        .transpose()?;
    let year = year.unwrap_or_else(|| Utc::now().year());

    let config = ServerConfig::from_env()?;
    tracing::info!("Connecting to database...");
    let pool = create_pool(&config.database_url).await?;
    let supabase = SupabaseClient::new(&config.supabase)?;

    let service = AnnualReceiptService::new(
        Arc::new(PgStore::new(pool)),
        Arc::new(supabase),
        config.receipts,
    );

    tracing::info!(year, donor_id = ?donor_id, "Generating annual receipts...");
    let run = service.generate(year, donor_id).await?;

    if run.donations_found == 0 {
        tracing::warn!(year, "No donations found for year");
        return Ok(());
    }

    for result in &run.results {
        tracing::info!(
            donor_id = %result.donor_id,
            receipt_number = %result.receipt_number,
            pdf_url = %result.pdf_url,
            "Receipt generated"
        );
    }
    tracing::info!(year, count = run.count, "Annual receipts complete!");
    Ok(())
}
