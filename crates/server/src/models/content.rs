//! Display content shown on a project page.
//!
//! Four small tables share one shape: rows keyed by Shopify product handle
//! and ordered by `display_order`. [`ContentKind`] describes each table so
//! the admin API can handle them uniformly.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rebuild_together_core::ContentItemId;

/// Which auxiliary table a content row lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Gallery,
    Impact,
    Team,
    Partners,
}

impl ContentKind {
    /// All kinds, in page order.
    pub const ALL: [Self; 4] = [Self::Gallery, Self::Impact, Self::Team, Self::Partners];

    /// Backing table name.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Gallery => "project_progress_gallery",
            Self::Impact => "project_impact_items",
            Self::Team => "project_team_members",
            Self::Partners => "project_partners",
        }
    }

    /// Editable text columns.
    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Gallery => &["image_url", "caption", "date"],
            Self::Impact => &["text"],
            Self::Team => &["name", "role", "image_url"],
            Self::Partners => &["name", "logo_url", "website_url"],
        }
    }

    /// Columns that must be present and non-empty on create.
    #[must_use]
    pub const fn required(self) -> &'static [&'static str] {
        match self {
            Self::Gallery => &["image_url"],
            Self::Impact => &["text"],
            Self::Team | Self::Partners => &["name"],
        }
    }

    /// Columns that may be set to `NULL`.
    #[must_use]
    pub const fn nullable(self) -> &'static [&'static str] {
        match self {
            Self::Gallery | Self::Impact => &[],
            Self::Team => &["image_url"],
            Self::Partners => &["logo_url", "website_url"],
        }
    }

    /// Path segment used by the admin API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gallery => "gallery",
            Self::Impact => "impact",
            Self::Team => "team",
            Self::Partners => "partners",
        }
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gallery" => Ok(Self::Gallery),
            "impact" => Ok(Self::Impact),
            "team" => Ok(Self::Team),
            "partners" => Ok(Self::Partners),
            _ => Err(format!("unknown content kind: {s}")),
        }
    }
}

/// A progress photo.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GalleryItem {
    pub id: ContentItemId,
    pub shopify_product_handle: String,
    pub image_url: String,
    pub caption: String,
    pub date: String,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A bullet in the "impact" list.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ImpactItem {
    pub id: ContentItemId,
    pub shopify_product_handle: String,
    pub text: String,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A volunteer or staff member on the project.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TeamMember {
    pub id: ContentItemId,
    pub shopify_product_handle: String,
    pub name: String,
    pub role: String,
    pub image_url: Option<String>,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A sponsoring organization.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Partner {
    pub id: ContentItemId,
    pub shopify_product_handle: String,
    pub name: String,
    pub logo_url: Option<String>,
    pub website_url: Option<String>,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from any of the content tables.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ContentItem {
    Gallery(GalleryItem),
    Impact(ImpactItem),
    Team(TeamMember),
    Partner(Partner),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_path() {
        for kind in ContentKind::ALL {
            assert_eq!(kind.as_str().parse::<ContentKind>().unwrap(), kind);
        }
        assert!("videos".parse::<ContentKind>().is_err());
    }

    #[test]
    fn test_required_columns_are_editable() {
        for kind in ContentKind::ALL {
            for column in kind.required() {
                assert!(kind.columns().contains(column), "{column} on {kind:?}");
            }
        }
    }
}
