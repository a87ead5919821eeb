//! Order processing: paid-order webhooks and manual order entry.
//!
//! Both flows resolve a donor by email (profile, then auth user, then a new
//! auth user), map products to projects and record one donation per
//! (order, project). The unique constraint behind
//! [`DonationStore::record_donation`] makes redelivery harmless.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use rebuild_together_core::{
    DonationId, DonationStatus, DonorId, Email, EmailError, PaymentMethod,
};

use super::receipts::ReceiptService;
use crate::db::{DonationStore, RepositoryError};
use crate::models::{Donation, NewDonation, Project};
use crate::receipts::donation::DonationReceipt;
use crate::shopify::webhook::ShopifyOrder;
use crate::supabase::{AuthDirectory, SupabaseError};

/// Errors that can occur while processing an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Database error.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Auth service lookup failed.
    #[error("Auth service error: {0}")]
    Auth(#[from] SupabaseError),

    /// Email could not be parsed.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// A required field is missing or out of range.
    #[error("{0}")]
    InvalidInput(String),

    /// No project is mapped to the product handle.
    #[error("Project not found for handle: {0}")]
    ProjectNotFound(String),

    /// Creating the donor's auth user failed.
    #[error("Failed to create user: {0}")]
    UserCreation(String),
}

// =============================================================================
// Results
// =============================================================================

/// A donor resolved (or created) for an order.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedDonor {
    pub id: DonorId,
    pub email: Email,
    /// Whether a new auth user was created.
    #[serde(skip)]
    pub created: bool,
}

/// What a webhook delivery did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WebhookSummary {
    pub order_id: String,
    pub order_name: String,
    pub donations_created: usize,
    pub duplicates_skipped: usize,
    pub unmatched_products: usize,
    /// Line items whose price could not be read as an amount.
    pub invalid_line_items: usize,
    pub receipts_generated: usize,
}

/// Outcome of a webhook delivery.
#[derive(Debug, Clone)]
pub enum WebhookOutcome {
    /// The order is not paid; nothing was recorded.
    NotPaid,
    /// No donor could be found or created.
    NoDonor,
    /// Line items were processed.
    Processed(WebhookSummary),
}

/// Manual order entry, as posted by an operator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManualOrder {
    pub order_id: Option<String>,
    pub order_name: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub product_handle: Option<String>,
    pub amount: Option<Decimal>,
}

/// Outcome of a manual order.
#[derive(Debug, Clone)]
pub enum ManualOutcome {
    /// A donation for this (order, project) already exists.
    Existing(DonationId),
    /// A new donation was recorded.
    Created {
        donation: Box<Donation>,
        project_title: String,
        donor: ResolvedDonor,
    },
}

// =============================================================================
// Processor
// =============================================================================

/// Records donations from paid orders.
#[derive(Clone)]
pub struct OrderProcessor {
    store: Arc<dyn DonationStore>,
    auth: Arc<dyn AuthDirectory>,
    receipts: ReceiptService,
}

impl OrderProcessor {
    /// Create an order processor.
    #[must_use]
    pub fn new(
        store: Arc<dyn DonationStore>,
        auth: Arc<dyn AuthDirectory>,
        receipts: ReceiptService,
    ) -> Self {
        Self {
            store,
            auth,
            receipts,
        }
    }

    /// Find the donor for `email`, creating the profile and auth user as
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::UserCreation` if a new auth user cannot be
    /// created, and other variants for lookup failures.
    #[instrument(skip(self, full_name), fields(email = %email))]
    pub async fn resolve_donor(
        &self,
        email: &Email,
        full_name: Option<&str>,
    ) -> Result<ResolvedDonor, OrderError> {
        if let Some(profile) = self.store.find_profile_by_email(email).await? {
            return Ok(ResolvedDonor {
                id: profile.id,
                email: profile.email,
                created: false,
            });
        }

        if let Some(user) = self.auth.find_user_by_email(email).await? {
            tracing::info!(donor_id = %user.id, "Auth user found without profile");
            self.store.create_profile(user.id, email, full_name).await?;
            return Ok(ResolvedDonor {
                id: user.id,
                email: email.clone(),
                created: false,
            });
        }

        let user = self
            .auth
            .create_user(email, full_name)
            .await
            .map_err(|e| OrderError::UserCreation(e.to_string()))?;
        self.store.create_profile(user.id, email, full_name).await?;
        tracing::info!(donor_id = %user.id, "Created donor");

        Ok(ResolvedDonor {
            id: user.id,
            email: email.clone(),
            created: true,
        })
    }

    /// Record donations for a paid Shopify order.
    ///
    /// Unmatched products and duplicates are skipped with a log line.
    /// Receipts are best effort: failures are logged and the donation stays.
    ///
    /// # Errors
    ///
    /// Returns `OrderError` on database or auth service failures.
    #[instrument(skip(self, order), fields(order_id = order.id, order_name = %order.name))]
    pub async fn process_webhook(&self, order: &ShopifyOrder) -> Result<WebhookOutcome, OrderError> {
        if !order.financial_status.is_paid() {
            tracing::info!(status = ?order.financial_status, "Order not paid, skipping");
            return Ok(WebhookOutcome::NotPaid);
        }

        let Some(email) = order.donor_email().and_then(|e| Email::parse(e).ok()) else {
            tracing::warn!("Order has no usable email");
            return Ok(WebhookOutcome::NoDonor);
        };
        let donor_name = order.customer_name();

        let donor = match self.resolve_donor(&email, donor_name.as_deref()).await {
            Ok(donor) => donor,
            Err(OrderError::UserCreation(message)) => {
                tracing::error!(error = %message, "Could not create donor");
                return Ok(WebhookOutcome::NoDonor);
            }
            Err(e) => return Err(e),
        };

        let order_id = order.order_id();
        let mut summary = WebhookSummary {
            order_id: order_id.clone(),
            order_name: order.name.clone(),
            ..WebhookSummary::default()
        };
        let date = order.created_at.unwrap_or_else(Utc::now).date_naive();

        for item in &order.line_items {
            let Some(product_id) = item.product_id else {
                tracing::warn!(title = %item.title, "Line item has no product id");
                summary.unmatched_products += 1;
                continue;
            };

            let Some(project) = self
                .store
                .find_project_by_product_id(&product_id.to_string())
                .await?
            else {
                tracing::warn!(product_id, title = %item.title, "No project for product");
                summary.unmatched_products += 1;
                continue;
            };

            if self.store.find_donation(&order_id, project.id).await?.is_some() {
                tracing::info!(project_id = %project.id, "Donation already recorded");
                summary.duplicates_skipped += 1;
                continue;
            }

            let amount = match item.amount() {
                Ok(amount) => amount,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        price = %item.price,
                        title = %item.title,
                        "Unreadable line item price"
                    );
                    summary.invalid_line_items += 1;
                    continue;
                }
            };
            let Some(donation) = self
                .record(&donor, &project, amount, PaymentMethod::Shopify, &order_id, &order.name)
                .await?
            else {
                tracing::info!(project_id = %project.id, "Concurrent duplicate donation");
                summary.duplicates_skipped += 1;
                continue;
            };
            summary.donations_created += 1;

            let receipt = DonationReceipt {
                donation_id: donation.id,
                order_name: order.name.clone(),
                amount,
                donor_email: email.to_string(),
                donor_name: donor_name.clone(),
                project_title: project.title.clone(),
                date,
            };
            if self.attach_receipt(&receipt).await {
                summary.receipts_generated += 1;
            }
        }

        tracing::info!(
            created = summary.donations_created,
            duplicates = summary.duplicates_skipped,
            unmatched = summary.unmatched_products,
            invalid = summary.invalid_line_items,
            "Webhook processed"
        );
        Ok(WebhookOutcome::Processed(summary))
    }

    /// Record a donation for an order the webhook missed.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InvalidInput` for missing fields or a
    /// non-positive amount, `OrderError::ProjectNotFound` for an unknown
    /// handle and `OrderError::UserCreation` if the donor cannot be created.
    #[instrument(skip_all, fields(order_id = ?input.order_id))]
    pub async fn process_manual(&self, input: ManualOrder) -> Result<ManualOutcome, OrderError> {
        let order_id = required(input.order_id.as_deref(), "order_id")?;
        let email = required(input.email.as_deref(), "email")?;
        let handle = required(input.product_handle.as_deref(), "product_handle")?;
        let amount = input
            .amount
            .ok_or_else(|| OrderError::InvalidInput("Missing required field: amount".to_string()))?;
        if amount <= Decimal::ZERO {
            return Err(OrderError::InvalidInput(
                "Amount must be greater than zero".to_string(),
            ));
        }

        let email = Email::parse(email)?;
        let full_name = input
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| email.local_part())
            .to_string();

        let donor = self.resolve_donor(&email, Some(&full_name)).await?;

        let project = self
            .store
            .find_project_by_handle(handle)
            .await?
            .ok_or_else(|| OrderError::ProjectNotFound(handle.to_string()))?;

        if let Some(existing) = self.store.find_donation(order_id, project.id).await? {
            tracing::info!(donation_id = %existing.id, "Donation already exists");
            return Ok(ManualOutcome::Existing(existing.id));
        }

        let order_name = input
            .order_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map_or_else(|| format!("#{order_id}"), str::to_string);

        let Some(donation) = self
            .record(&donor, &project, amount, PaymentMethod::Manual, order_id, &order_name)
            .await?
        else {
            let existing = self
                .store
                .find_donation(order_id, project.id)
                .await?
                .ok_or(RepositoryError::NotFound)?;
            return Ok(ManualOutcome::Existing(existing.id));
        };

        tracing::info!(donation_id = %donation.id, "Manual donation recorded");
        Ok(ManualOutcome::Created {
            donation: Box::new(donation),
            project_title: project.title,
            donor,
        })
    }

    async fn record(
        &self,
        donor: &ResolvedDonor,
        project: &Project,
        amount: Decimal,
        payment_method: PaymentMethod,
        order_id: &str,
        order_name: &str,
    ) -> Result<Option<Donation>, RepositoryError> {
        self.store
            .record_donation(&NewDonation {
                donor_id: donor.id,
                project_id: project.id,
                amount,
                status: DonationStatus::Completed,
                payment_method,
                transaction_id: order_id.to_string(),
                shopify_order_id: order_id.to_string(),
                shopify_order_name: order_name.to_string(),
                shopify_product_handle: project.shopify_product_handle.clone(),
            })
            .await
    }

    /// Generate and attach a receipt; returns whether it was stored.
    async fn attach_receipt(&self, receipt: &DonationReceipt) -> bool {
        let stored = match self.receipts.generate(receipt).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, donation_id = %receipt.donation_id, "Receipt generation failed");
                return false;
            }
        };

        match self
            .store
            .attach_receipt(
                receipt.donation_id,
                &stored.receipt_url,
                &stored.receipt_path,
                Utc::now(),
            )
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, donation_id = %receipt.donation_id, "Saving receipt location failed");
                false
            }
        }
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, OrderError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| OrderError::InvalidInput(format!("Missing required field: {field}")))
}
