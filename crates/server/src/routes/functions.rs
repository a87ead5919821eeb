//! Operator and server-to-server endpoints under `/functions/v1`.

use axum::{Json, extract::State};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use rebuild_together_core::{DonationId, DonorId, ProjectUpdateId, ProjectUpdateStatus};

use crate::db::ProjectUpdateRepository;
use crate::db::project_updates::NewProjectUpdate;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireServiceRole};
use crate::models::ProjectUpdatePatch;
use crate::receipts::donation::DonationReceipt;
use crate::services::{ManualOrder, ManualOutcome, StoredReceipt};
use crate::state::AppState;

// =============================================================================
// Receipts
// =============================================================================

/// Body of `generate-receipt`. Every field is required.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateReceiptRequest {
    pub donation_id: Option<String>,
    pub order_id: Option<String>,
    pub order_name: Option<String>,
    pub amount: Option<Decimal>,
    pub donor_email: Option<String>,
    pub donor_name: Option<String>,
    pub project_title: Option<String>,
    pub date: Option<String>,
}

fn require<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing required field: {field}")))
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp.
fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

impl GenerateReceiptRequest {
    fn into_receipt(self) -> Result<DonationReceipt> {
        let donation_id: DonationId = require(self.donation_id.as_deref(), "donation_id")?
            .parse()
            .map_err(|_| AppError::BadRequest("Invalid donation_id".to_string()))?;
        require(self.order_id.as_deref(), "order_id")?;
        let order_name = require(self.order_name.as_deref(), "order_name")?.to_string();
        let amount = self
            .amount
            .ok_or_else(|| AppError::BadRequest("Missing required field: amount".to_string()))?;
        let donor_email = require(self.donor_email.as_deref(), "donor_email")?.to_string();
        let project_title = require(self.project_title.as_deref(), "project_title")?.to_string();
        let date = parse_date(require(self.date.as_deref(), "date")?)
            .ok_or_else(|| AppError::BadRequest("Invalid date".to_string()))?;

        Ok(DonationReceipt {
            donation_id,
            order_name,
            amount,
            donor_email,
            donor_name: self.donor_name,
            project_title,
            date,
        })
    }
}

/// `POST /functions/v1/generate-receipt`
#[instrument(skip_all)]
pub async fn generate_receipt(
    _service: RequireServiceRole,
    State(state): State<AppState>,
    Json(request): Json<GenerateReceiptRequest>,
) -> Result<Json<StoredReceipt>> {
    let receipt = request.into_receipt()?;
    let stored = state.receipts().generate(&receipt).await?;
    Ok(Json(stored))
}

/// Tax years accepted by `generate-annual-receipts`.
const RECEIPT_YEARS: std::ops::RangeInclusive<i32> = 1900..=9999;

/// Body of `generate-annual-receipts`.
#[derive(Debug, Default, Deserialize)]
pub struct AnnualReceiptsRequest {
    pub year: Option<i32>,
    pub donor_id: Option<DonorId>,
}

impl AnnualReceiptsRequest {
    /// The requested tax year, defaulting to the current one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a year outside 1900 through 9999.
    pub fn tax_year(&self) -> Result<i32> {
        let year = self.year.unwrap_or_else(|| Utc::now().year());
        if RECEIPT_YEARS.contains(&year) {
            Ok(year)
        } else {
            Err(AppError::BadRequest(format!("Invalid year: {year}")))
        }
    }
}

/// `POST /functions/v1/generate-annual-receipts`
#[instrument(skip_all)]
pub async fn generate_annual_receipts(
    _service: RequireServiceRole,
    State(state): State<AppState>,
    Json(request): Json<AnnualReceiptsRequest>,
) -> Result<Json<Value>> {
    let year = request.tax_year()?;
    let run = state
        .annual_receipts()
        .generate(year, request.donor_id)
        .await?;

    if run.donations_found == 0 {
        return Ok(Json(json!({ "message": "No donations found for year" })));
    }

    Ok(Json(json!({
        "year": run.year,
        "count": run.count,
        "results": run.results,
    })))
}

// =============================================================================
// Manual orders
// =============================================================================

/// `POST /functions/v1/manual-order-process`
#[instrument(skip_all)]
pub async fn manual_order_process(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(order): Json<ManualOrder>,
) -> Result<Json<Value>> {
    tracing::info!(admin_id = %admin.id, "Manual order submitted");

    let response = match state.orders().process_manual(order).await? {
        ManualOutcome::Existing(donation_id) => json!({
            "message": "Donation already exists",
            "donation_id": donation_id,
        }),
        ManualOutcome::Created {
            donation,
            project_title,
            donor,
        } => json!({
            "message": "Order processed successfully",
            "donation": {
                "id": donation.id,
                "amount": donation.amount,
                "project_title": project_title,
            },
            "user": {
                "id": donor.id,
                "email": donor.email,
            },
        }),
    };

    Ok(Json(response))
}

// =============================================================================
// Project timeline
// =============================================================================

/// Body of `admin-project-updates`.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectUpdatesRequest {
    pub action: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Default, Deserialize)]
struct CreateUpdatePayload {
    shopify_product_handle: Option<String>,
    date: Option<String>,
    title: Option<String>,
    description: Option<String>,
    status: Option<ProjectUpdateStatus>,
    image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UpdateTarget {
    id: Option<ProjectUpdateId>,
    shopify_product_handle: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn payload<T: for<'de> Deserialize<'de> + Default>(value: &Value) -> Result<T> {
    if value.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(value.clone())
        .map_err(|e| AppError::BadRequest(format!("Invalid payload: {e}")))
}

/// `POST /functions/v1/admin-project-updates`
///
/// `{action, payload}` with `action` one of `create`, `update`, `delete`,
/// `list`.
#[instrument(skip_all, fields(action = ?request.action))]
pub async fn admin_project_updates(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<ProjectUpdatesRequest>,
) -> Result<Json<Value>> {
    let repo = ProjectUpdateRepository::new(state.pool());

    match request.action.as_deref() {
        Some("create") => {
            let p: CreateUpdatePayload = payload(&request.payload)?;
            let (Some(handle), Some(date), Some(title), Some(description), Some(status)) = (
                non_empty(p.shopify_product_handle),
                non_empty(p.date),
                non_empty(p.title),
                non_empty(p.description),
                p.status,
            ) else {
                return Err(AppError::BadRequest("Missing required fields".to_string()));
            };
            let data = repo
                .create(&NewProjectUpdate {
                    shopify_product_handle: handle,
                    date,
                    title,
                    description,
                    status,
                    image_url: non_empty(p.image_url),
                })
                .await?;
            Ok(Json(json!({ "data": data })))
        }
        Some("update") => {
            let target: UpdateTarget = payload(&request.payload)?;
            let id = target
                .id
                .ok_or_else(|| AppError::BadRequest("Update id is required".to_string()))?;
            let mut patch: ProjectUpdatePatch = payload(&request.payload)?;
            patch.shopify_product_handle = non_empty(patch.shopify_product_handle);
            patch.date = non_empty(patch.date);
            patch.title = non_empty(patch.title);
            patch.description = non_empty(patch.description);
            if patch.is_empty() {
                return Err(AppError::BadRequest("No fields to update".to_string()));
            }
            let data = repo.update(id, &patch).await?;
            Ok(Json(json!({ "data": data })))
        }
        Some("delete") => {
            let target: UpdateTarget = payload(&request.payload)?;
            let id = target
                .id
                .ok_or_else(|| AppError::BadRequest("Delete id is required".to_string()))?;
            repo.delete(id).await?;
            Ok(Json(json!({ "success": true })))
        }
        Some("list") => {
            let target: UpdateTarget = payload(&request.payload)?;
            let handle = non_empty(target.shopify_product_handle);
            let data = repo.list(handle.as_deref()).await?;
            Ok(Json(json!({ "data": data })))
        }
        Some(other) => Err(AppError::BadRequest(format!("Unsupported action: {other}"))),
        None => Err(AppError::BadRequest("Action is required".to_string())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn full_request() -> GenerateReceiptRequest {
        serde_json::from_value(json!({
            "donation_id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "order_id": "5550001",
            "order_name": "#1001",
            "amount": 25,
            "donor_email": "jane@example.org",
            "donor_name": "Jane Donor",
            "project_title": "Roof Repair Fund",
            "date": "2024-05-01T15:30:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_annual_request_year() {
        let request: AnnualReceiptsRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(request.tax_year().unwrap(), Utc::now().year());

        let request: AnnualReceiptsRequest =
            serde_json::from_value(json!({ "year": 2024 })).unwrap();
        assert_eq!(request.tax_year().unwrap(), 2024);

        for year in [0, -5, 10_000, i32::MAX] {
            let request = AnnualReceiptsRequest {
                year: Some(year),
                donor_id: None,
            };
            assert!(matches!(request.tax_year(), Err(AppError::BadRequest(_))));
        }
    }

    #[test]
    fn test_receipt_request_converts() {
        let receipt = full_request().into_receipt().unwrap();
        assert_eq!(receipt.amount, Decimal::new(25, 0));
        assert_eq!(receipt.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(receipt.donor_name.as_deref(), Some("Jane Donor"));
    }

    #[test]
    fn test_receipt_request_missing_field() {
        let mut request = full_request();
        request.project_title = Some(String::new());
        let err = request.into_receipt().unwrap_err();
        assert_eq!(err.to_string(), "Bad request: Missing required field: project_title");
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1);
        assert_eq!(parse_date("2024-05-01"), expected);
        assert_eq!(parse_date("2024-05-01T23:00:00-04:00"), expected);
        assert_eq!(parse_date("May 1"), None);
    }

    #[test]
    fn test_update_payload_parses_target_and_patch() {
        let value = json!({
            "id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "title": "",
            "image_url": null
        });
        let target: UpdateTarget = payload(&value).unwrap();
        assert!(target.id.is_some());
        let patch: ProjectUpdatePatch = payload(&value).unwrap();
        assert_eq!(patch.image_url, Some(None));
        assert_eq!(non_empty(patch.title), None);
    }

    #[test]
    fn test_create_payload_rejects_bad_status() {
        let value = json!({ "status": "done" });
        assert!(payload::<CreateUpdatePayload>(&value).is_err());
    }
}
