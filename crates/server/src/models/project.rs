//! Project and project timeline types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use rebuild_together_core::{ProjectId, ProjectStatus, ProjectUpdateId, ProjectUpdateStatus};

/// A fundraising project.
///
/// `raised_amount` and `donor_count` are cached counters maintained by the
/// donation insert; admin edits never touch them.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub goal_amount: Decimal,
    pub raised_amount: Decimal,
    pub donor_count: i32,
    pub image_url: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ProjectStatus,
    pub days_left: Option<i32>,
    pub shopify_product_handle: Option<String>,
    pub shopify_product_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable project fields, used for both create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub goal_amount: Decimal,
    pub image_url: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    pub days_left: Option<i32>,
    pub shopify_product_handle: Option<String>,
    pub shopify_product_id: Option<String>,
}

/// A dated entry on a project's public timeline.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProjectUpdate {
    pub id: ProjectUpdateId,
    pub shopify_product_handle: String,
    pub date: String,
    pub title: String,
    pub description: String,
    #[sqlx(try_from = "String")]
    pub status: ProjectUpdateStatus,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of a timeline entry.
///
/// `image_url` distinguishes "absent" (leave as is) from `null` (clear).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdatePatch {
    pub shopify_product_handle: Option<String>,
    pub date: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectUpdateStatus>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub image_url: Option<Option<String>>,
}

impl ProjectUpdatePatch {
    /// True when no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.shopify_product_handle.is_none()
            && self.date.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.image_url.is_none()
    }
}

/// Maps a present field to `Some(value)`, including an explicit `null`.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
