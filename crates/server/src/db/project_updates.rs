//! Project timeline repository.

use sqlx::PgPool;

use rebuild_together_core::{ProjectUpdateId, ProjectUpdateStatus};

use super::RepositoryError;
use crate::models::{ProjectUpdate, ProjectUpdatePatch};

const UPDATE_COLUMNS: &str = "id, shopify_product_handle, date, title, description, status, \
                              image_url, created_at, updated_at";

/// Values for a new timeline entry.
#[derive(Debug, Clone)]
pub struct NewProjectUpdate {
    pub shopify_product_handle: String,
    pub date: String,
    pub title: String,
    pub description: String,
    pub status: ProjectUpdateStatus,
    pub image_url: Option<String>,
}

/// Repository for `project_updates` operations.
pub struct ProjectUpdateRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProjectUpdateRepository<'a> {
    /// Create a new project update repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List entries by date, newest first, optionally for one handle.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, handle: Option<&str>) -> Result<Vec<ProjectUpdate>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProjectUpdate>(&format!(
            "SELECT {UPDATE_COLUMNS} FROM project_updates \
             WHERE ($1::text IS NULL OR shopify_product_handle = $1) \
             ORDER BY date DESC, created_at DESC"
        ))
        .bind(handle)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Insert a timeline entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, update: &NewProjectUpdate) -> Result<ProjectUpdate, RepositoryError> {
        let row = sqlx::query_as::<_, ProjectUpdate>(&format!(
            r"
            INSERT INTO project_updates
                (shopify_product_handle, date, title, description, status, image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {UPDATE_COLUMNS}
            "
        ))
        .bind(&update.shopify_product_handle)
        .bind(&update.date)
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.status.as_str())
        .bind(update.image_url.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Apply a partial update; `image_url: Some(None)` clears the image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the entry doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProjectUpdateId,
        patch: &ProjectUpdatePatch,
    ) -> Result<ProjectUpdate, RepositoryError> {
        let (set_image, image_url) = match &patch.image_url {
            Some(value) => (true, value.as_deref()),
            None => (false, None),
        };

        sqlx::query_as::<_, ProjectUpdate>(&format!(
            r"
            UPDATE project_updates SET
                shopify_product_handle = COALESCE($2, shopify_product_handle),
                date = COALESCE($3, date),
                title = COALESCE($4, title),
                description = COALESCE($5, description),
                status = COALESCE($6, status),
                image_url = CASE WHEN $7 THEN $8 ELSE image_url END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {UPDATE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(patch.shopify_product_handle.as_deref())
        .bind(patch.date.as_deref())
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.status.map(ProjectUpdateStatus::as_str))
        .bind(set_image)
        .bind(image_url)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a timeline entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the entry doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: ProjectUpdateId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM project_updates WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
