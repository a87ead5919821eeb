//! Cache types for Storefront API responses.

use std::time::{Duration, Instant};

use moka::Expiry;

use crate::shopify::types::{Collection, Product, ProductConnection};

/// Time-to-live for a single product.
pub const PRODUCT_TTL: Duration = Duration::from_secs(600);

/// Time-to-live for product lists and collections.
pub const LISTING_TTL: Duration = Duration::from_secs(300);

/// Time-to-live for carts.
pub const CART_TTL: Duration = Duration::from_secs(300);

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(String),
    Products {
        first: i64,
        cursor: Option<String>,
        query: Option<String>,
    },
    Collection {
        handle: String,
        first: i64,
        cursor: Option<String>,
    },
}

/// Cached catalog values.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(ProductConnection),
    Collection(Box<Collection>),
}

/// Per-entry expiry: products live longer than listings.
pub struct CatalogExpiry;

impl Expiry<CacheKey, CacheValue> for CatalogExpiry {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &CacheValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(match value {
            CacheValue::Product(_) => PRODUCT_TTL,
            CacheValue::Products(_) | CacheValue::Collection(_) => LISTING_TTL,
        })
    }
}
