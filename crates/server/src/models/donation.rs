//! Donation and tax receipt types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use rebuild_together_core::{
    DonationId, DonationStatus, DonorId, PaymentMethod, ProjectId, TaxReceiptId,
};

/// A recorded donation.
///
/// `project_id` is `None` for an unlinked donation (a product with no
/// project mapping at the time it was recorded).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Donation {
    pub id: DonationId,
    pub donor_id: DonorId,
    pub project_id: Option<ProjectId>,
    pub amount: Decimal,
    #[sqlx(try_from = "String")]
    pub status: DonationStatus,
    #[sqlx(try_from = "String")]
    pub payment_method: PaymentMethod,
    pub donation_type: String,
    pub transaction_id: Option<String>,
    pub shopify_order_id: Option<String>,
    pub shopify_order_name: Option<String>,
    pub shopify_product_handle: Option<String>,
    pub receipt_url: Option<String>,
    pub receipt_path: Option<String>,
    pub receipt_generated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A donation joined with its project's title.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DonationWithProject {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub donation: Donation,
    pub project_title: Option<String>,
}

/// Values for a donation insert.
#[derive(Debug, Clone)]
pub struct NewDonation {
    pub donor_id: DonorId,
    pub project_id: ProjectId,
    pub amount: Decimal,
    pub status: DonationStatus,
    pub payment_method: PaymentMethod,
    pub transaction_id: String,
    pub shopify_order_id: String,
    pub shopify_order_name: String,
    pub shopify_product_handle: Option<String>,
}

/// One annual tax summary per donor per year.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TaxReceipt {
    pub id: TaxReceiptId,
    pub donor_id: DonorId,
    pub year: i32,
    pub total_amount: Decimal,
    pub receipt_number: String,
    pub pdf_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Values for a tax receipt upsert.
#[derive(Debug, Clone)]
pub struct NewTaxReceipt {
    pub donor_id: DonorId,
    pub year: i32,
    pub total_amount: Decimal,
    pub receipt_number: String,
    pub pdf_url: Option<String>,
}

/// A donation line for the annual summary, joined with project and donor.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnnualDonationLine {
    pub donation_id: DonationId,
    pub donor_id: DonorId,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub project_title: Option<String>,
    pub donor_email: Option<String>,
    pub donor_name: Option<String>,
}
