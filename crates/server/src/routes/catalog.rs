//! Shopify catalog and cart pass-through.
//!
//! Thin JSON wrappers over [`crate::shopify::StorefrontClient`]; caching
//! happens in the client. The browser keeps the cart id and sends it back.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::shopify::{
    Cart, CartLineInput, CartLineUpdateInput, Collection, Product, ProductConnection,
    ProductVariant, default_variant, is_product_available, smallest_variant,
};
use crate::state::AppState;

// =============================================================================
// Products and collections
// =============================================================================

/// Pagination and search parameters for product listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub first: Option<i64>,
    pub after: Option<String>,
    pub query: Option<String>,
}

/// `GET /api/products`
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ProductConnection>> {
    let products = state
        .storefront()
        .get_products(params.first, params.after, params.query)
        .await?;
    Ok(Json(products))
}

/// A product with its donation variants resolved.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub is_available: bool,
    pub smallest_variant: Option<ProductVariant>,
    pub default_variant: Option<ProductVariant>,
}

impl From<Product> for ProductDetail {
    fn from(product: Product) -> Self {
        Self {
            is_available: is_product_available(&product),
            smallest_variant: smallest_variant(&product).cloned(),
            default_variant: default_variant(&product).cloned(),
            product,
        }
    }
}

/// `GET /api/products/{handle}`
#[instrument(skip(state))]
pub async fn show_product(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<ProductDetail>> {
    let product = state.storefront().get_product_by_handle(&handle).await?;
    Ok(Json(product.into()))
}

/// `GET /api/collections/{handle}`
#[instrument(skip(state))]
pub async fn show_collection(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Collection>> {
    let collection = state
        .storefront()
        .get_collection_by_handle(&handle, params.first, params.after)
        .await?;
    Ok(Json(collection))
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CartQuery {
    pub id: Option<String>,
}

/// `GET /api/cart?id=`
#[instrument(skip(state))]
pub async fn show_cart(
    State(state): State<AppState>,
    Query(query): Query<CartQuery>,
) -> Result<Json<Cart>> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("Cart id is required".to_string()))?;
    Ok(Json(state.storefront().get_cart(&id).await?))
}

/// Body of `POST /api/cart/add`.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    /// Existing cart; a new cart is created when absent.
    pub cart_id: Option<String>,
    pub lines: Vec<CartLineInput>,
}

/// `POST /api/cart/add`
#[instrument(skip_all, fields(cart_id = ?request.cart_id))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<Cart>> {
    if request.lines.is_empty() {
        return Err(AppError::BadRequest("At least one line is required".to_string()));
    }

    let cart = match request.cart_id.filter(|id| !id.is_empty()) {
        Some(id) => state.storefront().add_to_cart(&id, request.lines).await?,
        None => state.storefront().create_cart(request.lines).await?,
    };
    Ok(Json(cart))
}

/// Body of `POST /api/cart/update`.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub cart_id: String,
    pub lines: Vec<CartLineUpdateInput>,
}

/// `POST /api/cart/update`
#[instrument(skip_all, fields(cart_id = %request.cart_id))]
pub async fn update_cart(
    State(state): State<AppState>,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<Cart>> {
    let cart = state
        .storefront()
        .update_cart(&request.cart_id, request.lines)
        .await?;
    Ok(Json(cart))
}

/// Body of `POST /api/cart/remove`.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub cart_id: String,
    pub line_ids: Vec<String>,
}

/// `POST /api/cart/remove`
#[instrument(skip_all, fields(cart_id = %request.cart_id))]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<Cart>> {
    let cart = state
        .storefront()
        .remove_from_cart(&request.cart_id, request.line_ids)
        .await?;
    Ok(Json(cart))
}
