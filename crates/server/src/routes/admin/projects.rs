//! Project CRUD.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use rebuild_together_core::{ProjectId, ProjectStatus};

use crate::db::ProjectRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{NewProject, Project};
use crate::state::AppState;

fn validate(project: &mut NewProject) -> Result<()> {
    project.title = project.title.trim().to_string();
    if project.title.is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }
    if project.goal_amount.is_sign_negative() {
        return Err(AppError::BadRequest("Goal amount cannot be negative".to_string()));
    }
    for field in [
        &mut project.shopify_product_handle,
        &mut project.shopify_product_id,
        &mut project.image_url,
    ] {
        if field.as_deref().is_some_and(|v| v.trim().is_empty()) {
            *field = None;
        }
    }
    Ok(())
}

/// `GET /api/admin/projects`
#[instrument(skip_all)]
pub async fn list(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Project>>> {
    Ok(Json(ProjectRepository::new(state.pool()).list().await?))
}

/// `POST /api/admin/projects`
///
/// New projects start active with zeroed counters.
#[instrument(skip_all)]
pub async fn create(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(mut project): Json<NewProject>,
) -> Result<(StatusCode, Json<Project>)> {
    validate(&mut project)?;
    project.status = ProjectStatus::Active;

    let created = ProjectRepository::new(state.pool()).create(&project).await?;
    tracing::info!(project_id = %created.id, "Project created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PUT /api/admin/projects/{id}`
#[instrument(skip(_admin, state, project))]
pub async fn update(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    Json(mut project): Json<NewProject>,
) -> Result<Json<Project>> {
    validate(&mut project)?;
    let updated = ProjectRepository::new(state.pool())
        .update(id, &project)
        .await?;
    tracing::info!("Project updated");
    Ok(Json(updated))
}

/// `DELETE /api/admin/projects/{id}`
#[instrument(skip(_admin, state))]
pub async fn delete(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<StatusCode> {
    ProjectRepository::new(state.pool()).delete(id).await?;
    tracing::info!("Project deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trims_and_clears_blank_mapping() {
        let mut project: NewProject = serde_json::from_str(
            r#"{"title": "  Porch repair ", "shopify_product_handle": " ", "shopify_product_id": "7001"}"#,
        )
        .unwrap();
        validate(&mut project).unwrap();
        assert_eq!(project.title, "Porch repair");
        assert_eq!(project.shopify_product_handle, None);
        assert_eq!(project.shopify_product_id.as_deref(), Some("7001"));
    }

    #[test]
    fn test_validate_rejects_blank_title() {
        let mut project: NewProject = serde_json::from_str(r#"{"title": " "}"#).unwrap();
        assert!(matches!(validate(&mut project), Err(AppError::BadRequest(_))));
    }
}
