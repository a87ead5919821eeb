//! Domain types for the Shopify Storefront API.
//!
//! Types deserialize straight from Storefront API JSON (camelCase, with
//! `edges { node }` connections flattened to `Vec`s) and serialize as
//! `snake_case` for this service's own API responses.

use serde::{Deserialize, Deserializer, Serialize};

/// Flatten a GraphQL `{ edges: [{ node }] }` connection.
fn nodes<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    struct Edge<T> {
        node: T,
    }

    #[derive(Deserialize)]
    struct Connection<T> {
        edges: Vec<Edge<T>>,
    }

    let connection = Connection::<T>::deserialize(deserializer)?;
    Ok(connection.edges.into_iter().map(|e| e.node).collect())
}

// =============================================================================
// Money Types
// =============================================================================

/// Monetary amount with currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct Money {
    /// Decimal amount as string (preserves precision).
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

/// Price range for a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct PriceRange {
    /// Minimum price among all variants.
    pub min_variant_price: Money,
    /// Maximum price among all variants.
    pub max_variant_price: Money,
}

// =============================================================================
// Image Types
// =============================================================================

/// Product or collection image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct Image {
    /// Shopify image ID.
    #[serde(default)]
    pub id: Option<String>,
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    #[serde(default)]
    pub alt_text: Option<String>,
    /// Image width in pixels.
    #[serde(default)]
    pub width: Option<i64>,
    /// Image height in pixels.
    #[serde(default)]
    pub height: Option<i64>,
}

// =============================================================================
// Product Types
// =============================================================================

/// Selected option on a product variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedOption {
    /// Option name (e.g., "Amount").
    pub name: String,
    /// Selected value (e.g., "$25").
    pub value: String,
}

/// A purchasable variant of a product. For donation products each variant
/// is a giving level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct ProductVariant {
    /// Variant global ID (the cart merchandise id).
    pub id: String,
    /// Variant title.
    pub title: String,
    /// Current price.
    pub price: Money,
    /// Compare-at price, if discounted.
    #[serde(default)]
    pub compare_at_price: Option<Money>,
    /// Whether the variant can be purchased.
    pub available_for_sale: bool,
    /// Inventory on hand, when tracked.
    #[serde(default)]
    pub quantity_available: Option<i64>,
    /// Option values selecting this variant.
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
    /// Variant image.
    #[serde(default)]
    pub image: Option<Image>,
    /// Stock keeping unit.
    #[serde(default)]
    pub sku: Option<String>,
}

/// A Shopify product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct Product {
    /// Product global ID.
    pub id: String,
    /// Product title.
    pub title: String,
    /// URL handle, the join key to projects.
    pub handle: String,
    /// Plain-text description.
    #[serde(default)]
    pub description: String,
    /// HTML description.
    #[serde(default)]
    pub description_html: String,
    /// Whether any variant can be purchased.
    pub available_for_sale: bool,
    /// Product tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Vendor (used as the campaign location).
    #[serde(default)]
    pub vendor: String,
    /// Product type.
    #[serde(default)]
    pub product_type: String,
    /// Price range across variants.
    pub price_range: PriceRange,
    /// Product images.
    #[serde(deserialize_with = "nodes")]
    pub images: Vec<Image>,
    /// Product variants.
    #[serde(deserialize_with = "nodes")]
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// The first image, if any.
    #[must_use]
    pub fn featured_image(&self) -> Option<&Image> {
        self.images.first()
    }

    /// Shopify's numeric product id (the `gid://shopify/Product/{id}` tail),
    /// as stored in `projects.shopify_product_id`.
    #[must_use]
    pub fn numeric_id(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or(&self.id)
    }
}

/// Pagination info for connections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct PageInfo {
    /// Whether there are more items after.
    pub has_next_page: bool,
    /// Whether there are more items before.
    #[serde(default)]
    pub has_previous_page: bool,
    /// Cursor for the last item.
    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// A page of products.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct ProductConnection {
    /// Products on this page.
    #[serde(rename(deserialize = "edges"), deserialize_with = "product_edges")]
    pub products: Vec<Product>,
    /// Pagination info.
    pub page_info: PageInfo,
}

fn product_edges<'de, D>(deserializer: D) -> Result<Vec<Product>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Edge {
        node: Product,
    }

    let edges = Vec::<Edge>::deserialize(deserializer)?;
    Ok(edges.into_iter().map(|e| e.node).collect())
}

// =============================================================================
// Collection Types
// =============================================================================

/// A Shopify collection with its first page of products.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct Collection {
    /// Collection global ID.
    pub id: String,
    /// Collection title.
    pub title: String,
    /// URL handle.
    pub handle: String,
    /// Plain-text description.
    #[serde(default)]
    pub description: String,
    /// HTML description.
    #[serde(default)]
    pub description_html: String,
    /// Collection image.
    #[serde(default)]
    pub image: Option<Image>,
    /// Products in the collection.
    pub products: ProductConnection,
}

// =============================================================================
// Cart Types
// =============================================================================

/// Cart totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct CartCost {
    /// Subtotal before taxes.
    pub subtotal_amount: Money,
    /// Grand total.
    pub total_amount: Money,
    /// Taxes, when estimated.
    #[serde(default)]
    pub total_tax_amount: Option<Money>,
}

/// Cost of one cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct CartLineCost {
    /// Line total.
    pub total_amount: Money,
}

/// Product summary on a cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartProduct {
    /// Product global ID.
    pub id: String,
    /// Product title.
    pub title: String,
    /// URL handle.
    pub handle: String,
    /// Product images.
    #[serde(deserialize_with = "nodes")]
    pub images: Vec<Image>,
}

/// The variant a cart line refers to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct CartMerchandise {
    /// Variant global ID.
    pub id: String,
    /// Variant title.
    pub title: String,
    /// Unit price.
    pub price: Money,
    /// Option values selecting this variant.
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
    /// Owning product.
    pub product: CartProduct,
}

/// A line in a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Cart line ID (used for update/remove).
    pub id: String,
    /// Quantity.
    pub quantity: i64,
    /// Line cost.
    pub cost: CartLineCost,
    /// Purchased variant.
    pub merchandise: CartMerchandise,
}

/// A Shopify cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct Cart {
    /// Cart global ID.
    pub id: String,
    /// Hosted checkout URL.
    pub checkout_url: String,
    /// Total quantity across lines.
    pub total_quantity: i64,
    /// Cart totals.
    pub cost: CartCost,
    /// Cart lines.
    #[serde(deserialize_with = "nodes")]
    pub lines: Vec<CartLine>,
}

/// A line to add to a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct CartLineInput {
    /// Variant global ID.
    pub merchandise_id: String,
    /// Quantity to add.
    #[serde(default = "one")]
    pub quantity: i64,
}

/// A quantity change for an existing cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineUpdateInput {
    /// Cart line ID.
    pub id: String,
    /// New quantity.
    pub quantity: i64,
}

const fn one() -> i64 {
    1
}

/// A user error from a cart mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartUserError {
    /// Input field path the error applies to.
    #[serde(default)]
    pub field: Option<Vec<String>>,
    /// Error message.
    pub message: String,
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
}
