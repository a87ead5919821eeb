//! Status enums for donations, projects and roles.
//!
//! Columns backed by plain `text` expose `as_str()`/`FromStr` so the
//! repositories can bind and parse them; `app_role` is a real Postgres enum.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a status string is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct StatusParseError {
    kind: &'static str,
    value: String,
}

impl StatusParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Implements `as_str`, `Display` and `FromStr` for a text-backed enum.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Database/wire representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = StatusParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(StatusParseError::new($kind, s)),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = StatusParseError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

/// State of a donation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    Pending,
    #[default]
    Completed,
    Refunded,
}

text_enum!(DonationStatus, "donation status", {
    Pending => "pending",
    Completed => "completed",
    Refunded => "refunded",
});

/// How a donation was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Checked out through the Shopify storefront.
    #[default]
    Shopify,
    /// Entered by an operator.
    Manual,
}

text_enum!(PaymentMethod, "payment method", {
    Shopify => "shopify",
    Manual => "manual",
});

/// Application role stored in `user_roles.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "app_role", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Can manage projects, content and run operator tools.
    Admin,
    /// Regular signed-in donor.
    Donor,
}

text_enum!(UserRole, "role", {
    Admin => "admin",
    Donor => "donor",
});

/// Progress marker on a project timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectUpdateStatus {
    Completed,
    InProgress,
    Upcoming,
}

text_enum!(ProjectUpdateStatus, "project update status", {
    Completed => "completed",
    InProgress => "in-progress",
    Upcoming => "upcoming",
});

/// Lifecycle state of a fundraising project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    Paused,
}

text_enum!(ProjectStatus, "project status", {
    Active => "active",
    Completed => "completed",
    Paused => "paused",
});

/// Order financial status as sent in Shopify's REST webhook payloads.
///
/// Only `paid` orders become donations; any value Shopify adds later
/// deserializes as [`FinancialStatus::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FinancialStatus {
    #[default]
    Pending,
    Authorized,
    PartiallyPaid,
    Paid,
    PartiallyRefunded,
    Refunded,
    Voided,
    #[serde(other)]
    Unknown,
}

impl FinancialStatus {
    /// Whether the order has been fully paid.
    #[must_use]
    pub const fn is_paid(self) -> bool {
        matches!(self, Self::Paid)
    }
}
