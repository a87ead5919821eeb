//! Public project pages.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use crate::db::donations::DonationTotals;
use crate::db::{ContentRepository, DonationRepository, ProjectRepository, ProjectUpdateRepository};
use crate::error::{AppError, Result};
use crate::models::{ContentItem, ContentKind, Project, ProjectUpdate};
use crate::state::AppState;

/// `GET /api/projects`
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Project>>> {
    Ok(Json(ProjectRepository::new(state.pool()).list().await?))
}

/// Everything shown on a project page.
#[derive(Debug, Serialize)]
pub struct ProjectPage {
    pub project: Project,
    pub updates: Vec<ProjectUpdate>,
    pub gallery: Vec<ContentItem>,
    pub impact: Vec<ContentItem>,
    pub team: Vec<ContentItem>,
    pub partners: Vec<ContentItem>,
    pub donations: DonationTotals,
}

/// `GET /api/projects/{handle}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<ProjectPage>> {
    let pool = state.pool();
    let project = ProjectRepository::new(pool)
        .get_by_handle(&handle)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project not found: {handle}")))?;

    let updates_repo = ProjectUpdateRepository::new(pool);
    let donation_repo = DonationRepository::new(pool);
    let content = ContentRepository::new(pool);
    let (updates, gallery, impact, team, partners, donations) = tokio::try_join!(
        updates_repo.list(Some(&handle)),
        content.list(ContentKind::Gallery, Some(&handle)),
        content.list(ContentKind::Impact, Some(&handle)),
        content.list(ContentKind::Team, Some(&handle)),
        content.list(ContentKind::Partners, Some(&handle)),
        donation_repo.totals_for_handle(&handle),
    )?;

    Ok(Json(ProjectPage {
        project,
        updates,
        gallery,
        impact,
        team,
        partners,
        donations,
    }))
}
