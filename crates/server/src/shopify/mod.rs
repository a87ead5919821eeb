//! Shopify Storefront API client and order webhook types.
//!
//! # Architecture
//!
//! - `graphql_client` request/response envelopes with hand-written query documents
//! - Shopify is the source of truth for the catalog, no local sync
//! - In-memory caching via `moka` (products 10 minutes, lists, collections
//!   and carts 5 minutes)
//!
//! # Example
//!
//! ```rust,ignore
//! use rebuild_together_server::shopify::{StorefrontClient, smallest_variant};
//!
//! let client = StorefrontClient::new(&config.shopify)?;
//! let product = client.get_product_by_handle("roof-repair-fund").await?;
//! let variant = smallest_variant(&product);
//! ```

mod storefront;
pub mod types;
mod variants;
pub mod webhook;

pub use storefront::StorefrontClient;
pub use types::*;
pub use variants::{default_variant, is_product_available, smallest_variant};

use thiserror::Error;

/// Errors that can occur when interacting with Shopify APIs.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// User error from a cart mutation (e.g., invalid merchandise id).
    #[error("User error: {0}")]
    UserError(String),

    /// The store domain or API version produced an invalid endpoint.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

impl ShopifyError {
    pub(crate) fn message(message: impl Into<String>) -> Self {
        Self::GraphQL(vec![GraphQLError {
            message: message.into(),
            ..GraphQLError::default()
        }])
    }
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphQLError {
    pub message: String,
    /// Dotted response path, e.g. `cart.lines.0`.
    pub path: Option<String>,
    /// First reported `(line, column)` in the query document.
    pub location: Option<(i32, i32)>,
}

impl From<graphql_client::Error> for GraphQLError {
    fn from(e: graphql_client::Error) -> Self {
        let path = e.path.filter(|p| !p.is_empty()).map(|p| {
            p.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(".")
        });
        let location = e
            .locations
            .and_then(|l| l.first().map(|l| (l.line, l.column)));
        Self {
            message: e.message,
            path,
            location,
        }
    }
}

impl std::fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut sep = "";
        if !self.message.is_empty() {
            f.write_str(&self.message)?;
            sep = " ";
        }
        if let Some(path) = &self.path {
            write!(f, "{sep}path: {path}")?;
            sep = " ";
        }
        if let Some((line, column)) = self.location {
            write!(f, "{sep}at line {line}:{column}")?;
            sep = " ";
        }
        if sep.is_empty() {
            f.write_str("(no details)")?;
        }
        Ok(())
    }
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
