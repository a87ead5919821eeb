//! Project page content repository.
//!
//! The four content tables are addressed through [`ContentKind`]; column
//! names come from its static lists, never from request input.

use sqlx::{PgPool, Postgres, QueryBuilder};

use rebuild_together_core::ContentItemId;

use super::RepositoryError;
use crate::models::{ContentItem, ContentKind, GalleryItem, ImpactItem, Partner, TeamMember};

/// Column/value pairs for an insert or update. Columns must be drawn from
/// [`ContentKind::columns`].
pub type ContentFields = Vec<(&'static str, Option<String>)>;

/// Repository for the project content tables.
pub struct ContentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContentRepository<'a> {
    /// Create a new content repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List rows ordered by `display_order`, optionally for one handle.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        kind: ContentKind,
        handle: Option<&str>,
    ) -> Result<Vec<ContentItem>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM ");
        qb.push(kind.table());
        if let Some(handle) = handle {
            qb.push(" WHERE shopify_product_handle = ").push_bind(handle);
        }
        qb.push(" ORDER BY display_order, created_at");

        self.fetch_all(kind, &mut qb).await
    }

    /// Insert a row at the end of the handle's list.
    ///
    /// Fields set to `None` are left to the column default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        kind: ContentKind,
        handle: &str,
        fields: &ContentFields,
    ) -> Result<ContentItem, RepositoryError> {
        let present: Vec<_> = fields
            .iter()
            .filter_map(|(column, value)| value.as_deref().map(|v| (*column, v)))
            .collect();

        let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO ");
        qb.push(kind.table()).push(" (shopify_product_handle, display_order");
        for (column, _) in &present {
            qb.push(", ").push(*column);
        }
        qb.push(") VALUES (").push_bind(handle);
        qb.push(", (SELECT COUNT(*)::int FROM ")
            .push(kind.table())
            .push(" WHERE shopify_product_handle = ")
            .push_bind(handle)
            .push(")");
        for (_, value) in &present {
            qb.push(", ").push_bind(*value);
        }
        qb.push(") RETURNING *");

        self.fetch_one(kind, &mut qb)
            .await?
            .ok_or_else(|| RepositoryError::DataCorruption("insert returned no row".to_owned()))
    }

    /// Update the given fields (and optionally the position) of a row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        kind: ContentKind,
        id: ContentItemId,
        fields: &ContentFields,
        display_order: Option<i32>,
    ) -> Result<ContentItem, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE ");
        qb.push(kind.table()).push(" SET updated_at = NOW()");
        for (column, value) in fields {
            qb.push(", ")
                .push(*column)
                .push(" = ")
                .push_bind(value.clone());
        }
        if let Some(order) = display_order {
            qb.push(", display_order = ").push_bind(order);
        }
        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        self.fetch_one(kind, &mut qb)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete a row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, kind: ContentKind, id: ContentItemId) -> Result<(), RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM ");
        qb.push(kind.table()).push(" WHERE id = ").push_bind(id);

        let result = qb.build().execute(self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn fetch_all(
        &self,
        kind: ContentKind,
        qb: &mut QueryBuilder<'_, Postgres>,
    ) -> Result<Vec<ContentItem>, RepositoryError> {
        let items = match kind {
            ContentKind::Gallery => qb
                .build_query_as::<GalleryItem>()
                .fetch_all(self.pool)
                .await?
                .into_iter()
                .map(ContentItem::Gallery)
                .collect(),
            ContentKind::Impact => qb
                .build_query_as::<ImpactItem>()
                .fetch_all(self.pool)
                .await?
                .into_iter()
                .map(ContentItem::Impact)
                .collect(),
            ContentKind::Team => qb
                .build_query_as::<TeamMember>()
                .fetch_all(self.pool)
                .await?
                .into_iter()
                .map(ContentItem::Team)
                .collect(),
            ContentKind::Partners => qb
                .build_query_as::<Partner>()
                .fetch_all(self.pool)
                .await?
                .into_iter()
                .map(ContentItem::Partner)
                .collect(),
        };

        Ok(items)
    }

    async fn fetch_one(
        &self,
        kind: ContentKind,
        qb: &mut QueryBuilder<'_, Postgres>,
    ) -> Result<Option<ContentItem>, RepositoryError> {
        let item = match kind {
            ContentKind::Gallery => qb
                .build_query_as::<GalleryItem>()
                .fetch_optional(self.pool)
                .await?
                .map(ContentItem::Gallery),
            ContentKind::Impact => qb
                .build_query_as::<ImpactItem>()
                .fetch_optional(self.pool)
                .await?
                .map(ContentItem::Impact),
            ContentKind::Team => qb
                .build_query_as::<TeamMember>()
                .fetch_optional(self.pool)
                .await?
                .map(ContentItem::Team),
            ContentKind::Partners => qb
                .build_query_as::<Partner>()
                .fetch_optional(self.pool)
                .await?
                .map(ContentItem::Partner),
        };

        Ok(item)
    }
}
