//! Shopify Storefront API client implementation.
//!
//! Uses `graphql_client` request/response envelopes with `reqwest` 0.13 for
//! HTTP. Catalog reads are cached in `moka` with per-entry TTLs; carts are
//! cached separately and the whole cart cache is dropped on any mutation.

mod cache;
pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{GraphQLQuery, Response};
use moka::future::Cache;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ShopifyConfig;
use crate::shopify::types::{
    Cart, CartLineInput, CartLineUpdateInput, Collection, Product, ProductConnection,
};
use crate::shopify::{GraphQLError, ShopifyError};

use cache::{CART_TTL, CacheKey, CacheValue, CatalogExpiry};
use queries::{
    AddToCart, CartPayload, CreateCart, GetCart, GetCollectionByHandle, GetProductByHandle,
    GetProducts, RemoveFromCart, UpdateCartLines, add_to_cart, create_cart, get_cart,
    get_collection_by_handle, get_product_by_handle, get_products, remove_from_cart,
    update_cart_lines,
};

/// Outbound request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default page size for product listings.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: Url,
    access_token: String,
    catalog: Cache<CacheKey, CacheValue>,
    carts: Cache<String, Cart>,
}

impl StorefrontClient {
    /// Create a client for the configured store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store domain yields an invalid URL or the HTTP
    /// client cannot be built.
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        let endpoint = Url::parse(&format!(
            "https://{}/api/{}/graphql.json",
            config.store, config.api_version
        ))?;
        Self::with_endpoint(endpoint, &config.storefront_token)
    }

    /// Create a client against an explicit GraphQL endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_endpoint(endpoint: Url, access_token: &str) -> Result<Self, ShopifyError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let catalog = Cache::builder()
            .max_capacity(1000)
            .expire_after(CatalogExpiry)
            .build();

        let carts = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CART_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(StorefrontClientInner {
                client,
                endpoint,
                access_token: access_token.to_string(),
                catalog,
                carts,
            }),
        })
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            // Public (browser-safe) storefront token
            .header("X-Shopify-Storefront-Access-Token", &self.inner.access_token)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::message(format!(
                "HTTP {status}: {}",
                response_text.chars().take(200).collect::<String>()
            )));
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");

            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(GraphQLError::from).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::message("No data in response")
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if no product has this handle, or an
    /// error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<Product, ShopifyError> {
        let cache_key = CacheKey::Product(handle.to_string());

        if let Some(CacheValue::Product(product)) = self.inner.catalog.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let data = self
            .execute::<GetProductByHandle>(get_product_by_handle::Variables {
                handle: handle.to_string(),
            })
            .await?;

        let product = data
            .product
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))?;

        self.inner
            .catalog
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get a page of products, optionally filtered by a search query.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(
        &self,
        first: Option<i64>,
        after: Option<String>,
        query: Option<String>,
    ) -> Result<ProductConnection, ShopifyError> {
        let first = first.unwrap_or(DEFAULT_PAGE_SIZE);
        let cache_key = CacheKey::Products {
            first,
            cursor: after.clone(),
            query: query.clone(),
        };

        if let Some(CacheValue::Products(products)) = self.inner.catalog.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let data = self
            .execute::<GetProducts>(get_products::Variables {
                first,
                after,
                query,
            })
            .await?;

        self.inner
            .catalog
            .insert(cache_key, CacheValue::Products(data.products.clone()))
            .await;

        Ok(data.products)
    }

    // =========================================================================
    // Collection Methods
    // =========================================================================

    /// Get a collection and a page of its products.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if no collection has this handle, or
    /// an error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_collection_by_handle(
        &self,
        handle: &str,
        first: Option<i64>,
        after: Option<String>,
    ) -> Result<Collection, ShopifyError> {
        let first = first.unwrap_or(DEFAULT_PAGE_SIZE);
        let cache_key = CacheKey::Collection {
            handle: handle.to_string(),
            first,
            cursor: after.clone(),
        };

        if let Some(CacheValue::Collection(collection)) = self.inner.catalog.get(&cache_key).await
        {
            debug!("Cache hit for collection");
            return Ok(*collection);
        }

        let data = self
            .execute::<GetCollectionByHandle>(get_collection_by_handle::Variables {
                handle: handle.to_string(),
                first,
                after,
            })
            .await?;

        let collection = data
            .collection
            .ok_or_else(|| ShopifyError::NotFound(format!("Collection not found: {handle}")))?;

        self.inner
            .catalog
            .insert(
                cache_key,
                CacheValue::Collection(Box::new(collection.clone())),
            )
            .await;

        Ok(collection)
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Get an existing cart.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if the cart doesn't exist, or an error
    /// if the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &str) -> Result<Cart, ShopifyError> {
        if let Some(cart) = self.inner.carts.get(cart_id).await {
            debug!("Cache hit for cart");
            return Ok(cart);
        }

        let data = self
            .execute::<GetCart>(get_cart::Variables {
                cart_id: cart_id.to_string(),
            })
            .await?;

        let cart = data
            .cart
            .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {cart_id}")))?;

        self.inner
            .carts
            .insert(cart_id.to_string(), cart.clone())
            .await;

        Ok(cart)
    }

    /// Create a new cart with the given lines.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserError` with the first user error message, or
    /// an error if the API request fails.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn create_cart(&self, lines: Vec<CartLineInput>) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<CreateCart>(create_cart::Variables {
                input: create_cart::CartInput { lines },
            })
            .await?;

        self.finish_mutation(data.cart_create, "Failed to create cart")
            .await
    }

    /// Add lines to a cart.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserError` with the first user error message, or
    /// an error if the API request fails.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn add_to_cart(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<AddToCart>(add_to_cart::Variables {
                cart_id: cart_id.to_string(),
                lines,
            })
            .await?;

        self.finish_mutation(data.cart_lines_add, "Failed to add to cart")
            .await
    }

    /// Change quantities of existing cart lines.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserError` with the first user error message, or
    /// an error if the API request fails.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn update_cart(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<UpdateCartLines>(update_cart_lines::Variables {
                cart_id: cart_id.to_string(),
                lines,
            })
            .await?;

        self.finish_mutation(data.cart_lines_update, "Failed to update cart")
            .await
    }

    /// Remove lines from a cart.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserError` with the first user error message, or
    /// an error if the API request fails.
    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    pub async fn remove_from_cart(
        &self,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<RemoveFromCart>(remove_from_cart::Variables {
                cart_id: cart_id.to_string(),
                line_ids,
            })
            .await?;

        self.finish_mutation(data.cart_lines_remove, "Failed to remove from cart")
            .await
    }

    /// Surface user errors, then replace the cart cache with the new cart.
    async fn finish_mutation(
        &self,
        payload: Option<CartPayload>,
        failure: &str,
    ) -> Result<Cart, ShopifyError> {
        let Some(payload) = payload else {
            return Err(ShopifyError::message(failure));
        };

        if let Some(error) = payload.user_errors.into_iter().next() {
            return Err(ShopifyError::UserError(error.message));
        }

        let cart = payload.cart.ok_or_else(|| ShopifyError::message(failure))?;

        self.inner.carts.invalidate_all();
        self.inner.carts.run_pending_tasks().await;
        self.inner.carts.insert(cart.id.clone(), cart.clone()).await;

        Ok(cart)
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Drop a cached product.
    pub async fn invalidate_product(&self, handle: &str) {
        self.inner
            .catalog
            .invalidate(&CacheKey::Product(handle.to_string()))
            .await;
    }

    /// Drop every cached catalog read and cart.
    pub async fn invalidate_all(&self) {
        self.inner.catalog.invalidate_all();
        self.inner.carts.invalidate_all();
        self.inner.catalog.run_pending_tasks().await;
        self.inner.carts.run_pending_tasks().await;
    }
}
