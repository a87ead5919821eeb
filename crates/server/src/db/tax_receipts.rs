//! Annual tax receipt repository.

use sqlx::PgPool;

use rebuild_together_core::DonorId;

use super::RepositoryError;
use crate::models::{NewTaxReceipt, TaxReceipt};

const TAX_RECEIPT_COLUMNS: &str =
    "id, donor_id, year, total_amount, receipt_number, pdf_url, created_at";

/// Repository for tax receipt database operations.
pub struct TaxReceiptRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TaxReceiptRepository<'a> {
    /// Create a new tax receipt repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace the receipt for a (donor, year).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, receipt: &NewTaxReceipt) -> Result<TaxReceipt, RepositoryError> {
        let row = sqlx::query_as::<_, TaxReceipt>(&format!(
            r"
            INSERT INTO tax_receipts (donor_id, year, total_amount, receipt_number, pdf_url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (donor_id, year) DO UPDATE SET
                total_amount = EXCLUDED.total_amount,
                receipt_number = EXCLUDED.receipt_number,
                pdf_url = EXCLUDED.pdf_url
            RETURNING {TAX_RECEIPT_COLUMNS}
            "
        ))
        .bind(receipt.donor_id)
        .bind(receipt.year)
        .bind(receipt.total_amount)
        .bind(&receipt.receipt_number)
        .bind(receipt.pdf_url.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// A donor's receipts, newest year first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_donor(
        &self,
        donor_id: DonorId,
    ) -> Result<Vec<TaxReceipt>, RepositoryError> {
        let rows = sqlx::query_as::<_, TaxReceipt>(&format!(
            "SELECT {TAX_RECEIPT_COLUMNS} FROM tax_receipts WHERE donor_id = $1 ORDER BY year DESC"
        ))
        .bind(donor_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}
