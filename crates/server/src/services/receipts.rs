//! Receipt generation and storage.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use rebuild_together_core::DonorId;

use crate::config::ReceiptConfig;
use crate::db::DonationStore;
use crate::models::NewTaxReceipt;
use crate::receipts::donation::DonationReceipt;
use crate::receipts::{ReceiptError, annual, donation};
use crate::supabase::ObjectStore;

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Where a generated receipt was stored.
#[derive(Debug, Clone, Serialize)]
pub struct StoredReceipt {
    /// Signed (or public fallback) download URL.
    pub receipt_url: String,
    /// Object path inside the receipts bucket.
    pub receipt_path: String,
    /// Printed receipt number.
    pub receipt_number: String,
}

/// Renders donation receipts and uploads them to object storage.
#[derive(Clone)]
pub struct ReceiptService {
    objects: Arc<dyn ObjectStore>,
    config: ReceiptConfig,
}

impl ReceiptService {
    /// Create a receipt service.
    #[must_use]
    pub fn new(objects: Arc<dyn ObjectStore>, config: ReceiptConfig) -> Self {
        Self { objects, config }
    }

    /// Render, upload and sign a donation receipt.
    ///
    /// The object is written to `receipts/{donation_id}-{unix millis}.pdf`
    /// without overwrite. If signing fails the public URL is returned.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptError` if rendering or the upload fails.
    #[instrument(skip_all, fields(donation_id = %receipt.donation_id))]
    pub async fn generate(&self, receipt: &DonationReceipt) -> Result<StoredReceipt, ReceiptError> {
        let now = Utc::now();
        let receipt_number = donation::receipt_number(receipt.donation_id, now.year());
        let bytes = donation::render(receipt, &self.config, now.year())?;

        let path = format!(
            "receipts/{}-{}.pdf",
            receipt.donation_id,
            now.timestamp_millis()
        );
        self.objects
            .upload(&self.config.bucket, &path, bytes, PDF_CONTENT_TYPE, false)
            .await?;

        let receipt_url = match self
            .objects
            .create_signed_url(&self.config.bucket, &path, self.config.url_ttl_secs)
            .await
        {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, path = %path, "Signing receipt URL failed, using public URL");
                self.objects.public_url(&self.config.bucket, &path)
            }
        };

        tracing::info!(receipt_number = %receipt_number, path = %path, "Receipt stored");

        Ok(StoredReceipt {
            receipt_url,
            receipt_path: path,
            receipt_number,
        })
    }
}

/// One donor's annual receipt.
#[derive(Debug, Clone, Serialize)]
pub struct AnnualReceiptResult {
    pub donor_id: DonorId,
    pub receipt_number: String,
    pub pdf_url: String,
}

/// Outcome of an annual receipt run.
#[derive(Debug, Clone, Serialize)]
pub struct AnnualRun {
    pub year: i32,
    /// Donation rows found in the year window.
    #[serde(skip)]
    pub donations_found: usize,
    pub count: usize,
    pub results: Vec<AnnualReceiptResult>,
}

/// Builds yearly summaries and records them as tax receipts.
#[derive(Clone)]
pub struct AnnualReceiptService {
    store: Arc<dyn DonationStore>,
    objects: Arc<dyn ObjectStore>,
    config: ReceiptConfig,
}

impl AnnualReceiptService {
    /// Create an annual receipt service.
    #[must_use]
    pub fn new(
        store: Arc<dyn DonationStore>,
        objects: Arc<dyn ObjectStore>,
        config: ReceiptConfig,
    ) -> Self {
        Self {
            store,
            objects,
            config,
        }
    }

    /// Generate summaries for every donor with donations in `year`, or only
    /// for `donor_id` when given. Donors whose total is not positive are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptError` on the first failing query, render, upload or
    /// upsert.
    #[instrument(skip(self))]
    pub async fn generate(
        &self,
        year: i32,
        donor_id: Option<DonorId>,
    ) -> Result<AnnualRun, ReceiptError> {
        let lines = self.store.donations_for_year(year, donor_id).await?;
        let donations_found = lines.len();
        let mut results = Vec::new();

        for summary in annual::group_by_donor(year, lines) {
            if summary.total <= Decimal::ZERO {
                tracing::debug!(donor_id = %summary.donor_id, "Skipping donor with no positive total");
                continue;
            }

            let bytes = annual::render(&summary, &self.config)?;
            let path = format!("annual/{}-{year}.pdf", summary.donor_id);
            self.objects
                .upload(&self.config.bucket, &path, bytes, PDF_CONTENT_TYPE, true)
                .await?;
            let pdf_url = self
                .objects
                .create_signed_url(&self.config.bucket, &path, self.config.url_ttl_secs)
                .await?;

            let receipt_number = annual::receipt_number(year, summary.donor_id);
            self.store
                .upsert_tax_receipt(&NewTaxReceipt {
                    donor_id: summary.donor_id,
                    year,
                    total_amount: summary.total,
                    receipt_number: receipt_number.clone(),
                    pdf_url: Some(pdf_url.clone()),
                })
                .await?;

            results.push(AnnualReceiptResult {
                donor_id: summary.donor_id,
                receipt_number,
                pdf_url,
            });
        }

        tracing::info!(year, donors = results.len(), donations_found, "Annual receipts generated");

        Ok(AnnualRun {
            year,
            donations_found,
            count: results.len(),
            results,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use rebuild_together_core::{DonationStatus, PaymentMethod};

    use super::*;
    use crate::models::NewDonation;
    use crate::testing::{MemoryObjects, MemoryStore, project};

    fn receipt() -> DonationReceipt {
        DonationReceipt {
            donation_id: rebuild_together_core::DonationId::generate(),
            order_name: "#1001".to_string(),
            amount: Decimal::new(2500, 2),
            donor_email: "jane@example.org".to_string(),
            donor_name: None,
            project_title: "Roof Repair Fund".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_generate_uploads_and_signs() {
        let objects = Arc::new(MemoryObjects::default());
        let service = ReceiptService::new(objects.clone(), ReceiptConfig::default());
        let r = receipt();

        let stored = service.generate(&r).await.unwrap();

        assert!(stored.receipt_path.starts_with(&format!("receipts/{}-", r.donation_id)));
        assert!(stored.receipt_path.ends_with(".pdf"));
        assert!(stored.receipt_url.contains("/sign/receipts/"));
        assert!(stored.receipt_url.ends_with("expires=31536000"));
        assert!(stored.receipt_number.starts_with("RT-"));
        assert_eq!(objects.paths().len(), 1);
    }

    async fn seed(store: &MemoryStore, donor: DonorId, cents: i64) {
        let project_id = store.projects.lock().unwrap()[0].id;
        let order_id = rebuild_together_core::DonationId::generate().to_string();
        store
            .create_profile(donor, &"ada@example.org".parse().unwrap(), Some("Ada Lovelace"))
            .await
            .unwrap();
        store
            .record_donation(&NewDonation {
                donor_id: donor,
                project_id,
                amount: Decimal::new(cents, 2),
                status: DonationStatus::Completed,
                payment_method: PaymentMethod::Shopify,
                transaction_id: order_id.clone(),
                shopify_order_id: order_id,
                shopify_order_name: "#1".to_string(),
                shopify_product_handle: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_annual_run_upserts_tax_receipts() {
        let store = Arc::new(MemoryStore::with_projects(vec![project("Ramp", "ramp", "1")]));
        let objects = Arc::new(MemoryObjects::default());
        let donor = DonorId::generate();
        seed(&store, donor, 1000).await;
        seed(&store, donor, 500).await;
        let year = Utc::now().year();

        let service =
            AnnualReceiptService::new(store.clone(), objects.clone(), ReceiptConfig::default());
        let run = service.generate(year, None).await.unwrap();
        assert_eq!(run.donations_found, 2);
        assert_eq!(run.count, 1);
        assert_eq!(run.results[0].receipt_number, annual::receipt_number(year, donor));

        // Regenerating replaces both the object and the row.
        service.generate(year, Some(donor)).await.unwrap();
        let receipts = store.tax_receipts.lock().unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].total_amount, Decimal::new(1500, 2));
        assert_eq!(objects.paths(), vec![format!("receipts/annual/{donor}-{year}.pdf")]);
    }

    #[tokio::test]
    async fn test_annual_run_skips_non_positive_totals() {
        let store = Arc::new(MemoryStore::with_projects(vec![project("Ramp", "ramp", "1")]));
        let donor = DonorId::generate();
        seed(&store, donor, 0).await;
        let year = Utc::now().year();

        let service = AnnualReceiptService::new(
            store.clone(),
            Arc::new(MemoryObjects::default()),
            ReceiptConfig::default(),
        );
        let run = service.generate(year, None).await.unwrap();
        assert_eq!(run.donations_found, 1);
        assert_eq!(run.count, 0);
        assert!(store.tax_receipts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_annual_run_empty_year() {
        let service = AnnualReceiptService::new(
            Arc::new(MemoryStore::default()),
            Arc::new(MemoryObjects::default()),
            ReceiptConfig::default(),
        );
        let run = service.generate(1999, None).await.unwrap();
        assert_eq!(run.donations_found, 0);
        assert!(run.results.is_empty());
    }
}
