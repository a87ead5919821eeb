//! The persistence seam used by order processing and receipt generation.
//!
//! [`DonationStore`] gathers the handful of queries the order and receipt
//! services need behind one object-safe trait, so those services can run
//! against an in-memory implementation in tests. [`PgStore`] is the
//! production implementation over the repositories in this module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use rebuild_together_core::{DonationId, DonorId, Email, ProjectId, UserRole};

use super::{
    DonationRepository, ProfileRepository, ProjectRepository, RepositoryError, RoleRepository,
    TaxReceiptRepository,
};
use crate::models::{
    AnnualDonationLine, Donation, NewDonation, NewTaxReceipt, Profile, Project, TaxReceipt,
};

/// Storage operations behind webhook processing and receipts.
#[async_trait]
pub trait DonationStore: Send + Sync {
    /// Find a donor profile by normalized email.
    async fn find_profile_by_email(&self, email: &Email)
    -> Result<Option<Profile>, RepositoryError>;

    /// Create a profile for an auth user; existing profiles are left alone.
    async fn create_profile(
        &self,
        id: DonorId,
        email: &Email,
        full_name: Option<&str>,
    ) -> Result<(), RepositoryError>;

    /// Find the project mapped to a numeric Shopify product id.
    async fn find_project_by_product_id(
        &self,
        product_id: &str,
    ) -> Result<Option<Project>, RepositoryError>;

    /// Find the project mapped to a Shopify product handle.
    async fn find_project_by_handle(&self, handle: &str)
    -> Result<Option<Project>, RepositoryError>;

    /// Find the donation for an (order, project) pair.
    async fn find_donation(
        &self,
        order_id: &str,
        project_id: ProjectId,
    ) -> Result<Option<Donation>, RepositoryError>;

    /// Record a donation; `None` means the (order, project) pair already existed.
    async fn record_donation(
        &self,
        donation: &NewDonation,
    ) -> Result<Option<Donation>, RepositoryError>;

    /// Store receipt location on a donation.
    async fn attach_receipt(
        &self,
        id: DonationId,
        receipt_url: &str,
        receipt_path: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Donations in a calendar year, optionally for one donor.
    async fn donations_for_year(
        &self,
        year: i32,
        donor_id: Option<DonorId>,
    ) -> Result<Vec<AnnualDonationLine>, RepositoryError>;

    /// Insert or replace a donor's annual receipt.
    async fn upsert_tax_receipt(
        &self,
        receipt: &NewTaxReceipt,
    ) -> Result<TaxReceipt, RepositoryError>;

    /// Check whether a user holds a role.
    async fn has_role(&self, user_id: DonorId, role: UserRole) -> Result<bool, RepositoryError>;
}

/// [`DonationStore`] backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Half-open `[Jan 1 year, Jan 1 year+1)` window in UTC.
///
/// # Errors
///
/// Returns `RepositoryError::DataCorruption` if the year is out of range.
pub fn year_bounds(year: i32) -> Result<(DateTime<Utc>, DateTime<Utc>), RepositoryError> {
    let start = |y: i32| {
        chrono::NaiveDate::from_ymd_opt(y, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .ok_or_else(|| RepositoryError::DataCorruption(format!("year out of range: {y}")))
    };
    Ok((start(year)?, start(year + 1)?))
}

#[async_trait]
impl DonationStore for PgStore {
    async fn find_profile_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Profile>, RepositoryError> {
        ProfileRepository::new(&self.pool).get_by_email(email).await
    }

    async fn create_profile(
        &self,
        id: DonorId,
        email: &Email,
        full_name: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let inserted = ProfileRepository::new(&self.pool)
            .create(id, email, full_name)
            .await?;
        if !inserted {
            tracing::debug!(donor_id = %id, "Profile already existed");
        }
        Ok(())
    }

    async fn find_project_by_product_id(
        &self,
        product_id: &str,
    ) -> Result<Option<Project>, RepositoryError> {
        ProjectRepository::new(&self.pool)
            .get_by_product_id(product_id)
            .await
    }

    async fn find_project_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<Project>, RepositoryError> {
        ProjectRepository::new(&self.pool).get_by_handle(handle).await
    }

    async fn find_donation(
        &self,
        order_id: &str,
        project_id: ProjectId,
    ) -> Result<Option<Donation>, RepositoryError> {
        DonationRepository::new(&self.pool)
            .find_for_order(order_id, project_id)
            .await
    }

    async fn record_donation(
        &self,
        donation: &NewDonation,
    ) -> Result<Option<Donation>, RepositoryError> {
        DonationRepository::new(&self.pool)
            .insert_if_absent(donation)
            .await
    }

    async fn attach_receipt(
        &self,
        id: DonationId,
        receipt_url: &str,
        receipt_path: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        DonationRepository::new(&self.pool)
            .attach_receipt(id, receipt_url, receipt_path, generated_at)
            .await
    }

    async fn donations_for_year(
        &self,
        year: i32,
        donor_id: Option<DonorId>,
    ) -> Result<Vec<AnnualDonationLine>, RepositoryError> {
        let (from, to) = year_bounds(year)?;
        DonationRepository::new(&self.pool)
            .list_between(from, to, donor_id)
            .await
    }

    async fn upsert_tax_receipt(
        &self,
        receipt: &NewTaxReceipt,
    ) -> Result<TaxReceipt, RepositoryError> {
        TaxReceiptRepository::new(&self.pool).upsert(receipt).await
    }

    async fn has_role(&self, user_id: DonorId, role: UserRole) -> Result<bool, RepositoryError> {
        RoleRepository::new(&self.pool).has_role(user_id, role).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Datelike;

    use super::*;

    #[test]
    fn test_year_bounds_half_open() {
        let (from, to) = year_bounds(2024).unwrap();
        assert_eq!(from.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(to.year(), 2025);
        assert_eq!(to.ordinal(), 1);
    }
}
