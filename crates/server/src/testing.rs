//! In-memory backends for the store, auth and storage seams.
//!
//! Compiled for unit tests and, through the `test-support` feature, for the
//! integration test crate.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use rebuild_together_core::{
    DonationId, DonorId, Email, ProjectId, ProjectStatus, TaxReceiptId, UserRole,
};

use crate::db::store::year_bounds;
use crate::db::{DonationStore, RepositoryError};
use crate::models::{
    AnnualDonationLine, Donation, NewDonation, NewTaxReceipt, Profile, Project, TaxReceipt,
};
use crate::supabase::{AuthDirectory, AuthUser, ObjectStore, SupabaseError};

/// Build a project row with the given Shopify mapping.
#[must_use]
pub fn project(title: &str, handle: &str, product_id: &str) -> Project {
    let now = Utc::now();
    Project {
        id: ProjectId::generate(),
        title: title.to_string(),
        description: String::new(),
        location: String::new(),
        goal_amount: Decimal::new(10_000, 0),
        raised_amount: Decimal::ZERO,
        donor_count: 0,
        image_url: None,
        status: ProjectStatus::Active,
        days_left: None,
        shopify_product_handle: Some(handle.to_string()),
        shopify_product_id: Some(product_id.to_string()),
        created_at: now,
        updated_at: now,
    }
}

/// [`DonationStore`] over vectors.
#[derive(Default)]
pub struct MemoryStore {
    pub profiles: Mutex<Vec<Profile>>,
    pub projects: Mutex<Vec<Project>>,
    pub donations: Mutex<Vec<Donation>>,
    pub tax_receipts: Mutex<Vec<TaxReceipt>>,
    pub roles: Mutex<Vec<(DonorId, UserRole)>>,
}

impl MemoryStore {
    #[must_use]
    pub fn with_projects(projects: Vec<Project>) -> Self {
        Self {
            projects: Mutex::new(projects),
            ..Self::default()
        }
    }

    pub fn grant(&self, user: DonorId, role: UserRole) {
        self.roles.lock().unwrap().push((user, role));
    }

    #[must_use]
    pub fn donation_count(&self) -> usize {
        self.donations.lock().unwrap().len()
    }

    #[must_use]
    pub fn profile_count(&self) -> usize {
        self.profiles.lock().unwrap().len()
    }
}

#[async_trait]
impl DonationStore for MemoryStore {
    async fn find_profile_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Profile>, RepositoryError> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| &p.email == email)
            .cloned())
    }

    async fn create_profile(
        &self,
        id: DonorId,
        email: &Email,
        full_name: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let mut profiles = self.profiles.lock().unwrap();
        if profiles.iter().any(|p| p.id == id) {
            return Ok(());
        }
        let now = Utc::now();
        profiles.push(Profile {
            id,
            email: email.clone(),
            full_name: full_name.map(str::to_string),
            phone: None,
            address: None,
            city: None,
            state: None,
            zip_code: None,
            created_at: now,
            updated_at: now,
        });
        Ok(())
    }

    async fn find_project_by_product_id(
        &self,
        product_id: &str,
    ) -> Result<Option<Project>, RepositoryError> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.shopify_product_id.as_deref() == Some(product_id))
            .cloned())
    }

    async fn find_project_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<Project>, RepositoryError> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.shopify_product_handle.as_deref() == Some(handle))
            .cloned())
    }

    async fn find_donation(
        &self,
        order_id: &str,
        project_id: ProjectId,
    ) -> Result<Option<Donation>, RepositoryError> {
        Ok(self
            .donations
            .lock()
            .unwrap()
            .iter()
            .find(|d| {
                d.shopify_order_id.as_deref() == Some(order_id) && d.project_id == Some(project_id)
            })
            .cloned())
    }

    async fn record_donation(
        &self,
        donation: &NewDonation,
    ) -> Result<Option<Donation>, RepositoryError> {
        let mut donations = self.donations.lock().unwrap();
        if donations.iter().any(|d| {
            d.shopify_order_id.as_deref() == Some(donation.shopify_order_id.as_str())
                && d.project_id == Some(donation.project_id)
        }) {
            return Ok(None);
        }

        let now = Utc::now();
        let row = Donation {
            id: DonationId::generate(),
            donor_id: donation.donor_id,
            project_id: Some(donation.project_id),
            amount: donation.amount,
            status: donation.status,
            payment_method: donation.payment_method,
            donation_type: "one-time".to_string(),
            transaction_id: Some(donation.transaction_id.clone()),
            shopify_order_id: Some(donation.shopify_order_id.clone()),
            shopify_order_name: Some(donation.shopify_order_name.clone()),
            shopify_product_handle: donation.shopify_product_handle.clone(),
            receipt_url: None,
            receipt_path: None,
            receipt_generated_at: None,
            created_at: now,
            updated_at: now,
        };
        donations.push(row.clone());
        drop(donations);

        if let Some(project) = self
            .projects
            .lock()
            .unwrap()
            .iter_mut()
            .find(|p| p.id == donation.project_id)
        {
            project.raised_amount += donation.amount;
            project.donor_count += 1;
        }
        Ok(Some(row))
    }

    async fn attach_receipt(
        &self,
        id: DonationId,
        receipt_url: &str,
        receipt_path: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut donations = self.donations.lock().unwrap();
        let donation = donations
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(RepositoryError::NotFound)?;
        donation.receipt_url = Some(receipt_url.to_string());
        donation.receipt_path = Some(receipt_path.to_string());
        donation.receipt_generated_at = Some(generated_at);
        Ok(())
    }

    async fn donations_for_year(
        &self,
        year: i32,
        donor_id: Option<DonorId>,
    ) -> Result<Vec<AnnualDonationLine>, RepositoryError> {
        let (start, end) = year_bounds(year)?;
        let profiles = self.profiles.lock().unwrap();
        let projects = self.projects.lock().unwrap();
        Ok(self
            .donations
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.created_at >= start && d.created_at < end)
            .filter(|d| donor_id.is_none_or(|id| d.donor_id == id))
            .map(|d| {
                let profile = profiles.iter().find(|p| p.id == d.donor_id);
                AnnualDonationLine {
                    donation_id: d.id,
                    donor_id: d.donor_id,
                    amount: d.amount,
                    created_at: d.created_at,
                    project_title: d
                        .project_id
                        .and_then(|id| projects.iter().find(|p| p.id == id))
                        .map(|p| p.title.clone()),
                    donor_email: profile.map(|p| p.email.to_string()),
                    donor_name: profile.and_then(|p| p.full_name.clone()),
                }
            })
            .collect())
    }

    async fn upsert_tax_receipt(
        &self,
        receipt: &NewTaxReceipt,
    ) -> Result<TaxReceipt, RepositoryError> {
        let mut receipts = self.tax_receipts.lock().unwrap();
        receipts.retain(|r| !(r.donor_id == receipt.donor_id && r.year == receipt.year));
        let row = TaxReceipt {
            id: TaxReceiptId::generate(),
            donor_id: receipt.donor_id,
            year: receipt.year,
            total_amount: receipt.total_amount,
            receipt_number: receipt.receipt_number.clone(),
            pdf_url: receipt.pdf_url.clone(),
            created_at: Utc::now(),
        };
        receipts.push(row.clone());
        Ok(row)
    }

    async fn has_role(&self, user_id: DonorId, role: UserRole) -> Result<bool, RepositoryError> {
        Ok(self
            .roles
            .lock()
            .unwrap()
            .iter()
            .any(|(u, r)| *u == user_id && *r == role))
    }
}

/// [`AuthDirectory`] over a vector of users and a token table.
#[derive(Default)]
pub struct MemoryAuth {
    pub users: Mutex<Vec<AuthUser>>,
    pub tokens: Mutex<Vec<(String, DonorId)>>,
    /// When set, `create_user` fails with this message.
    pub fail_create: Option<String>,
}

impl MemoryAuth {
    /// Register a user reachable through `token`.
    pub fn sign_in(&self, token: &str, email: &str) -> DonorId {
        let id = DonorId::generate();
        self.users.lock().unwrap().push(AuthUser {
            id,
            email: Some(email.to_string()),
        });
        self.tokens.lock().unwrap().push((token.to_string(), id));
        id
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl AuthDirectory for MemoryAuth {
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<AuthUser>, SupabaseError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.has_email(email))
            .cloned())
    }

    async fn create_user(
        &self,
        email: &Email,
        _full_name: Option<&str>,
    ) -> Result<AuthUser, SupabaseError> {
        if let Some(message) = &self.fail_create {
            return Err(SupabaseError::Api {
                status: 500,
                message: message.clone(),
            });
        }
        let mut users = self.users.lock().unwrap();
        if let Some(existing) = users.iter().find(|u| u.has_email(email)) {
            return Ok(existing.clone());
        }
        let user = AuthUser {
            id: DonorId::generate(),
            email: Some(email.to_string()),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn user_for_token(&self, access_token: &str) -> Result<Option<AuthUser>, SupabaseError> {
        let tokens = self.tokens.lock().unwrap();
        let Some((_, id)) = tokens.iter().find(|(t, _)| t == access_token) else {
            return Ok(None);
        };
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == *id)
            .cloned())
    }
}

/// [`ObjectStore`] that keeps uploads in memory.
#[derive(Default)]
pub struct MemoryObjects {
    pub objects: Mutex<Vec<(String, Vec<u8>)>>,
    /// When set, signing fails so callers exercise the public URL path.
    pub fail_signing: bool,
}

impl MemoryObjects {
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjects {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
        upsert: bool,
    ) -> Result<(), SupabaseError> {
        let key = format!("{bucket}/{path}");
        let mut objects = self.objects.lock().unwrap();
        if let Some(existing) = objects.iter_mut().find(|(p, _)| *p == key) {
            if !upsert {
                return Err(SupabaseError::Api {
                    status: 409,
                    message: "The resource already exists".to_string(),
                });
            }
            existing.1 = bytes;
        } else {
            objects.push((key, bytes));
        }
        Ok(())
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, SupabaseError> {
        if self.fail_signing {
            return Err(SupabaseError::Api {
                status: 400,
                message: "signing disabled".to_string(),
            });
        }
        Ok(format!(
            "https://storage.test/sign/{bucket}/{path}?expires={expires_in_secs}"
        ))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("https://storage.test/public/{bucket}/{path}")
    }
}
