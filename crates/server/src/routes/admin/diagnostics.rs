//! Donation/project consistency checks.
//!
//! Webhook processing tolerates unmapped products and missing fields; these
//! endpoints surface what slipped through.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use rebuild_together_core::Email;

use crate::db::{DonationRepository, ProfileRepository, ProjectRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{DonationWithProject, Profile, Project};
use crate::state::AppState;

/// Donations inspected by the overview.
const RECENT_DONATIONS: i64 = 50;

/// Overview of recent donations and all projects.
#[derive(Debug, Serialize)]
pub struct DiagnosticsReport {
    pub donations: Vec<DonationWithProject>,
    pub projects: Vec<Project>,
    pub issues: Vec<String>,
}

/// Problems in recent donations and in the project mapping.
#[must_use]
pub fn find_issues(donations: &[DonationWithProject], projects: &[Project]) -> Vec<String> {
    let mut issues = Vec::new();

    for row in donations {
        let d = &row.donation;
        if d.shopify_order_id.as_deref().is_none_or(str::is_empty) {
            issues.push(format!("Donation {} missing shopify_order_id", d.id));
        }
        if d.shopify_product_handle.as_deref().is_none_or(str::is_empty) {
            issues.push(format!("Donation {} missing shopify_product_handle", d.id));
        }
        match d.project_id {
            None => issues.push(format!(
                "Donation {} missing project_id (product not linked to project)",
                d.id
            )),
            Some(project_id) if !projects.iter().any(|p| p.id == project_id) => issues.push(
                format!("Donation {} has project_id but project not found", d.id),
            ),
            Some(_) => {}
        }
    }

    for project in projects {
        if project
            .shopify_product_handle
            .as_deref()
            .is_none_or(str::is_empty)
        {
            issues.push(format!(
                "Project \"{}\" ({}) is not linked to a Shopify product",
                project.title, project.id
            ));
        }
    }

    issues
}

/// `GET /api/admin/diagnostics`
#[instrument(skip_all)]
pub async fn overview(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<DiagnosticsReport>> {
    let donation_repo = DonationRepository::new(state.pool());
    let project_repo = ProjectRepository::new(state.pool());
    let (donations, projects) = tokio::try_join!(
        donation_repo.list_recent(RECENT_DONATIONS),
        project_repo.list(),
    )?;
    let issues = find_issues(&donations, &projects);

    tracing::info!(issues = issues.len(), "Diagnostics run");
    Ok(Json(DiagnosticsReport {
        donations,
        projects,
        issues,
    }))
}

/// What to look up for a single order.
#[derive(Debug, Default, Deserialize)]
pub struct OrderLookup {
    pub order_id: Option<String>,
    pub order_name: Option<String>,
    pub email: Option<String>,
    pub product_handle: Option<String>,
}

/// Findings for a single order.
#[derive(Debug, Serialize)]
pub struct OrderReport {
    pub donations: Vec<DonationWithProject>,
    pub profile: Option<Profile>,
    pub project: Option<Project>,
    pub issues: Vec<String>,
    pub fixes: Vec<String>,
}

impl OrderReport {
    /// Cross-check what was found and explain each gap.
    #[must_use]
    pub fn new(
        lookup: &OrderLookup,
        donations: Vec<DonationWithProject>,
        profile: Option<Profile>,
        project: Option<Project>,
    ) -> Self {
        let mut issues = Vec::new();
        let mut fixes = Vec::new();
        let order = lookup
            .order_name
            .as_deref()
            .or(lookup.order_id.as_deref())
            .unwrap_or_default();
        let handle = lookup.product_handle.as_deref().unwrap_or_default();

        if donations.is_empty() {
            issues.push(format!("Donation not found for order {order}"));
            fixes.push(
                "The webhook may not have processed this order yet, or the order wasn't paid"
                    .to_string(),
            );
        }

        if lookup.email.is_some() && profile.is_none() {
            issues.push(format!(
                "User profile not found for email: {}",
                lookup.email.as_deref().unwrap_or_default()
            ));
            fixes.push("The webhook should create a user profile when processing the order".to_string());
        }

        if !handle.is_empty() && project.is_none() {
            if donations.is_empty() {
                issues.push(format!("Project not found for product handle: {handle}"));
            } else {
                issues.push(format!("Donation exists but project not found for handle: {handle}"));
            }
            fixes.push(format!(
                "Link the product handle \"{handle}\" to a project in the admin dashboard"
            ));
        }

        for row in &donations {
            let d = &row.donation;
            if let Some(profile) = &profile
                && d.donor_id != profile.id
            {
                issues.push(format!(
                    "Donation donor_id ({}) doesn't match user ID ({})",
                    d.donor_id, profile.id
                ));
                fixes.push(
                    "The donation was created for a different user. Check the order email."
                        .to_string(),
                );
            }
            if let Some(project) = &project
                && d.project_id != Some(project.id)
            {
                issues.push(format!(
                    "Donation project_id ({}) doesn't match project ID ({})",
                    d.project_id.map(|id| id.to_string()).unwrap_or_default(),
                    project.id
                ));
                fixes.push(
                    "The donation is linked to a different project. This may be correct if the \
                     order covered several projects."
                        .to_string(),
                );
            }
        }

        Self {
            donations,
            profile,
            project,
            issues,
            fixes,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `GET /api/admin/diagnostics/order`
#[instrument(skip_all, fields(order_id = ?lookup.order_id, order_name = ?lookup.order_name))]
pub async fn order(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(lookup): Query<OrderLookup>,
) -> Result<Json<OrderReport>> {
    let pool = state.pool();
    let order_id = non_empty(lookup.order_id.as_deref());
    let order_name = non_empty(lookup.order_name.as_deref());
    if order_id.is_none() && order_name.is_none() {
        return Err(AppError::BadRequest(
            "order_id or order_name is required".to_string(),
        ));
    }

    let donations = DonationRepository::new(pool)
        .list_for_order(order_id, order_name)
        .await?;

    let profile = match non_empty(lookup.email.as_deref()) {
        Some(email) => {
            let email = Email::parse(email)
                .map_err(|_| AppError::BadRequest("Invalid email address".to_string()))?;
            ProfileRepository::new(pool).get_by_email(&email).await?
        }
        None => None,
    };

    let project = match non_empty(lookup.product_handle.as_deref()) {
        Some(handle) => ProjectRepository::new(pool).get_by_handle(handle).await?,
        None => None,
    };

    Ok(Json(OrderReport::new(&lookup, donations, profile, project)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use rebuild_together_core::{DonationId, DonationStatus, DonorId, PaymentMethod, ProjectId};

    use super::*;
    use crate::models::Donation;
    use crate::testing::project;

    fn donation(project_id: Option<ProjectId>, handle: Option<&str>) -> DonationWithProject {
        let now = Utc::now();
        DonationWithProject {
            donation: Donation {
                id: DonationId::generate(),
                donor_id: DonorId::generate(),
                project_id,
                amount: Decimal::new(10, 0),
                status: DonationStatus::Completed,
                payment_method: PaymentMethod::Shopify,
                donation_type: "one-time".to_string(),
                transaction_id: Some("1".to_string()),
                shopify_order_id: Some("1".to_string()),
                shopify_order_name: Some("#1".to_string()),
                shopify_product_handle: handle.map(str::to_string),
                receipt_url: None,
                receipt_path: None,
                receipt_generated_at: None,
                created_at: now,
                updated_at: now,
            },
            project_title: None,
        }
    }

    #[test]
    fn test_find_issues_flags_unlinked_and_dangling() {
        let linked = project("Roof", "roof", "1");
        let mut unmapped = project("Porch", "porch", "2");
        unmapped.shopify_product_handle = None;

        let donations = vec![
            donation(Some(linked.id), Some("roof")),
            donation(None, None),
            donation(Some(ProjectId::generate()), Some("gone")),
        ];
        let issues = find_issues(&donations, &[linked, unmapped]);

        assert_eq!(issues.len(), 4);
        assert!(issues[0].ends_with("missing shopify_product_handle"));
        assert!(issues[1].contains("product not linked to project"));
        assert!(issues[2].ends_with("has project_id but project not found"));
        assert!(issues[3].starts_with("Project \"Porch\""));
    }

    #[test]
    fn test_order_report_missing_everything() {
        let lookup = OrderLookup {
            order_name: Some("#1001".to_string()),
            email: Some("jane@example.org".to_string()),
            product_handle: Some("roof".to_string()),
            ..OrderLookup::default()
        };
        let report = OrderReport::new(&lookup, Vec::new(), None, None);

        assert_eq!(report.issues.len(), 3);
        assert_eq!(report.issues[0], "Donation not found for order #1001");
        assert_eq!(report.fixes.len(), 3);
    }

    #[test]
    fn test_order_report_project_mismatch() {
        let lookup = OrderLookup {
            order_id: Some("1".to_string()),
            product_handle: Some("roof".to_string()),
            ..OrderLookup::default()
        };
        let roof = project("Roof", "roof", "1");
        let report = OrderReport::new(
            &lookup,
            vec![donation(Some(ProjectId::generate()), Some("roof"))],
            None,
            Some(roof),
        );

        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].starts_with("Donation project_id"));
    }
}
