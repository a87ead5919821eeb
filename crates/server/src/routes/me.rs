//! Donor dashboard: the signed-in donor's own records.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::{DonationRepository, ProfileRepository, TaxReceiptRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireDonor;
use crate::models::{DonationWithProject, Profile, ProfileUpdate, TaxReceipt};
use crate::state::AppState;

/// `GET /api/me`
#[instrument(skip_all, fields(donor_id = %user.id))]
pub async fn profile(
    RequireDonor(user): RequireDonor,
    State(state): State<AppState>,
) -> Result<Json<Profile>> {
    let profile = ProfileRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
    Ok(Json(profile))
}

/// `PUT /api/me`
#[instrument(skip_all, fields(donor_id = %user.id))]
pub async fn update_profile(
    RequireDonor(user): RequireDonor,
    State(state): State<AppState>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>> {
    let profile = ProfileRepository::new(state.pool())
        .update(user.id, &update)
        .await?;
    tracing::info!("Profile updated");
    Ok(Json(profile))
}

/// `GET /api/me/donations`
#[instrument(skip_all, fields(donor_id = %user.id))]
pub async fn donations(
    RequireDonor(user): RequireDonor,
    State(state): State<AppState>,
) -> Result<Json<Vec<DonationWithProject>>> {
    Ok(Json(
        DonationRepository::new(state.pool())
            .list_for_donor(user.id)
            .await?,
    ))
}

/// `GET /api/me/tax-receipts`
#[instrument(skip_all, fields(donor_id = %user.id))]
pub async fn tax_receipts(
    RequireDonor(user): RequireDonor,
    State(state): State<AppState>,
) -> Result<Json<Vec<TaxReceipt>>> {
    Ok(Json(
        TaxReceiptRepository::new(state.pool())
            .list_for_donor(user.id)
            .await?,
    ))
}
