//! Business logic services.
//!
//! # Services
//!
//! - [`orders`] - Paid-order webhook and manual order processing
//! - [`receipts`] - Donation receipts and annual tax summaries
//!
//! Services depend on the [`crate::db::DonationStore`],
//! [`crate::supabase::AuthDirectory`] and [`crate::supabase::ObjectStore`]
//! seams rather than on concrete clients.

pub mod orders;
pub mod receipts;

pub use orders::{
    ManualOrder, ManualOutcome, OrderError, OrderProcessor, ResolvedDonor, WebhookOutcome,
    WebhookSummary,
};
pub use receipts::{
    AnnualReceiptResult, AnnualReceiptService, AnnualRun, ReceiptService, StoredReceipt,
};
