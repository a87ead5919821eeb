//! Project repository.

use sqlx::PgPool;

use rebuild_together_core::ProjectId;

use super::{RepositoryError, conflict_on_unique};
use crate::models::{NewProject, Project};

const PROJECT_COLUMNS: &str = "id, title, description, location, goal_amount, raised_amount, \
                               donor_count, image_url, status, days_left, \
                               shopify_product_handle, shopify_product_id, created_at, updated_at";

/// Repository for project database operations.
pub struct ProjectRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProjectRepository<'a> {
    /// Create a new project repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all projects, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Project>, RepositoryError> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(projects)
    }

    /// Get a project by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(project)
    }

    /// Get the project mapped to a numeric Shopify product id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_product_id(
        &self,
        product_id: &str,
    ) -> Result<Option<Project>, RepositoryError> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE shopify_product_id = $1 \
             ORDER BY created_at LIMIT 1"
        ))
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(project)
    }

    /// Get the project mapped to a Shopify product handle.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_handle(&self, handle: &str) -> Result<Option<Project>, RepositoryError> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE shopify_product_handle = $1 \
             ORDER BY created_at LIMIT 1"
        ))
        .bind(handle)
        .fetch_optional(self.pool)
        .await?;

        Ok(project)
    }

    /// Create a project with zeroed counters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, project: &NewProject) -> Result<Project, RepositoryError> {
        sqlx::query_as::<_, Project>(&format!(
            r"
            INSERT INTO projects (
                title, description, location, goal_amount, raised_amount, donor_count,
                image_url, status, days_left, shopify_product_handle, shopify_product_id
            )
            VALUES ($1, $2, $3, $4, 0, 0, $5, $6, $7, $8, $9)
            RETURNING {PROJECT_COLUMNS}
            "
        ))
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.location)
        .bind(project.goal_amount)
        .bind(project.image_url.as_deref())
        .bind(project.status.as_str())
        .bind(project.days_left)
        .bind(project.shopify_product_handle.as_deref())
        .bind(project.shopify_product_id.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "project"))
    }

    /// Replace a project's editable fields; counters are preserved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the project doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProjectId,
        project: &NewProject,
    ) -> Result<Project, RepositoryError> {
        sqlx::query_as::<_, Project>(&format!(
            r"
            UPDATE projects SET
                title = $2,
                description = $3,
                location = $4,
                goal_amount = $5,
                image_url = $6,
                status = $7,
                days_left = $8,
                shopify_product_handle = $9,
                shopify_product_id = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.location)
        .bind(project.goal_amount)
        .bind(project.image_url.as_deref())
        .bind(project.status.as_str())
        .bind(project.days_left)
        .bind(project.shopify_product_handle.as_deref())
        .bind(project.shopify_product_id.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a project. Its donations become unlinked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the project doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: ProjectId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
