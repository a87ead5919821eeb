//! Donation repository.
//!
//! Inserts go through [`DonationRepository::insert_if_absent`], which relies
//! on the unique `(shopify_order_id, project_id)` index so that a redelivered
//! webhook can never record the same line twice.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use rebuild_together_core::{DonationId, DonorId, ProjectId};

use super::RepositoryError;
use crate::models::{AnnualDonationLine, Donation, DonationWithProject, NewDonation};

const DONATION_COLUMNS: &str = "id, donor_id, project_id, amount, status, payment_method, \
                                donation_type, transaction_id, shopify_order_id, \
                                shopify_order_name, shopify_product_handle, receipt_url, \
                                receipt_path, receipt_generated_at, created_at, updated_at";

const JOINED_COLUMNS: &str = "d.id, d.donor_id, d.project_id, d.amount, d.status, \
                              d.payment_method, d.donation_type, d.transaction_id, \
                              d.shopify_order_id, d.shopify_order_name, \
                              d.shopify_product_handle, d.receipt_url, d.receipt_path, \
                              d.receipt_generated_at, d.created_at, d.updated_at, \
                              p.title AS project_title";

/// Donation count and sum for a product handle.
#[derive(Debug, Clone, Copy, Default, serde::Serialize, sqlx::FromRow)]
pub struct DonationTotals {
    pub count: i64,
    pub total: Decimal,
}

/// Repository for donation database operations.
pub struct DonationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DonationRepository<'a> {
    /// Create a new donation repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find the donation recorded for an order line's project.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_for_order(
        &self,
        order_id: &str,
        project_id: ProjectId,
    ) -> Result<Option<Donation>, RepositoryError> {
        let donation = sqlx::query_as::<_, Donation>(&format!(
            "SELECT {DONATION_COLUMNS} FROM donations \
             WHERE shopify_order_id = $1 AND project_id = $2"
        ))
        .bind(order_id)
        .bind(project_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(donation)
    }

    /// Insert a donation unless one exists for the same (order, project).
    ///
    /// In the same transaction the project's cached `raised_amount` and
    /// `donor_count` are bumped; the donor only counts once per project.
    /// Returns `None` when the row already existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// transaction is rolled back.
    pub async fn insert_if_absent(
        &self,
        donation: &NewDonation,
    ) -> Result<Option<Donation>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, Donation>(&format!(
            r"
            INSERT INTO donations (
                donor_id, project_id, amount, status, payment_method, transaction_id,
                shopify_order_id, shopify_order_name, shopify_product_handle
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (shopify_order_id, project_id) DO NOTHING
            RETURNING {DONATION_COLUMNS}
            "
        ))
        .bind(donation.donor_id)
        .bind(donation.project_id)
        .bind(donation.amount)
        .bind(donation.status.as_str())
        .bind(donation.payment_method.as_str())
        .bind(&donation.transaction_id)
        .bind(&donation.shopify_order_id)
        .bind(&donation.shopify_order_name)
        .bind(donation.shopify_product_handle.as_deref())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(inserted) = inserted else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            r"
            UPDATE projects SET
                raised_amount = raised_amount + $2,
                donor_count = donor_count + CASE WHEN EXISTS (
                    SELECT 1 FROM donations
                    WHERE project_id = $1 AND donor_id = $3 AND id <> $4
                ) THEN 0 ELSE 1 END,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(donation.project_id)
        .bind(donation.amount)
        .bind(donation.donor_id)
        .bind(inserted.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(inserted))
    }

    /// Record the stored receipt on a donation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the donation doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn attach_receipt(
        &self,
        id: DonationId,
        receipt_url: &str,
        receipt_path: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE donations
            SET receipt_url = $2, receipt_path = $3, receipt_generated_at = $4, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(receipt_url)
        .bind(receipt_path)
        .bind(generated_at)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// A donor's donations, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_donor(
        &self,
        donor_id: DonorId,
    ) -> Result<Vec<DonationWithProject>, RepositoryError> {
        let rows = sqlx::query_as::<_, DonationWithProject>(&format!(
            "SELECT {JOINED_COLUMNS} FROM donations d \
             LEFT JOIN projects p ON p.id = d.project_id \
             WHERE d.donor_id = $1 ORDER BY d.created_at DESC"
        ))
        .bind(donor_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// The most recent donations across all donors.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_recent(
        &self,
        limit: i64,
    ) -> Result<Vec<DonationWithProject>, RepositoryError> {
        let rows = sqlx::query_as::<_, DonationWithProject>(&format!(
            "SELECT {JOINED_COLUMNS} FROM donations d \
             LEFT JOIN projects p ON p.id = d.project_id \
             ORDER BY d.created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Donations recorded for a Shopify order, matched by id or name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_order(
        &self,
        order_id: Option<&str>,
        order_name: Option<&str>,
    ) -> Result<Vec<DonationWithProject>, RepositoryError> {
        let rows = sqlx::query_as::<_, DonationWithProject>(&format!(
            "SELECT {JOINED_COLUMNS} FROM donations d \
             LEFT JOIN projects p ON p.id = d.project_id \
             WHERE ($1::text IS NOT NULL AND d.shopify_order_id = $1) \
                OR ($2::text IS NOT NULL AND d.shopify_order_name = $2) \
             ORDER BY d.created_at DESC"
        ))
        .bind(order_id)
        .bind(order_name)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Donations in `[from, to)`, optionally for a single donor, joined with
    /// project title and donor profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        donor_id: Option<DonorId>,
    ) -> Result<Vec<AnnualDonationLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, AnnualDonationLine>(
            r"
            SELECT d.id AS donation_id, d.donor_id, d.amount, d.created_at,
                   p.title AS project_title, pr.email AS donor_email,
                   pr.full_name AS donor_name
            FROM donations d
            LEFT JOIN projects p ON p.id = d.project_id
            LEFT JOIN profiles pr ON pr.id = d.donor_id
            WHERE d.created_at >= $1 AND d.created_at < $2
              AND ($3::uuid IS NULL OR d.donor_id = $3)
            ORDER BY d.donor_id, d.created_at
            ",
        )
        .bind(from)
        .bind(to)
        .bind(donor_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Count and sum of donations recorded against a product handle.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn totals_for_handle(&self, handle: &str) -> Result<DonationTotals, RepositoryError> {
        let totals = sqlx::query_as::<_, DonationTotals>(
            r"
            SELECT COUNT(*) AS count, COALESCE(SUM(amount), 0) AS total
            FROM donations
            WHERE shopify_product_handle = $1
            ",
        )
        .bind(handle)
        .fetch_one(self.pool)
        .await?;

        Ok(totals)
    }
}
