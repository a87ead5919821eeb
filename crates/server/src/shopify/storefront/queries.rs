//! GraphQL documents for the Shopify Storefront API.
//!
//! Each operation is a unit struct implementing [`GraphQLQuery`] with its
//! variables and response data types. Response types reuse the domain types
//! in [`crate::shopify::types`], which deserialize Storefront JSON directly.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

use crate::shopify::types::{
    Cart, CartLineInput, CartLineUpdateInput, CartUserError, Collection, Product,
    ProductConnection,
};

macro_rules! product_fields {
    () => {
        r"
fragment ProductFields on Product {
  id
  title
  handle
  description
  descriptionHtml
  availableForSale
  tags
  vendor
  productType
  priceRange {
    minVariantPrice { amount currencyCode }
    maxVariantPrice { amount currencyCode }
  }
  images(first: 10) {
    edges { node { id url altText width height } }
  }
  variants(first: 100) {
    edges {
      node {
        id
        title
        price { amount currencyCode }
        compareAtPrice { amount currencyCode }
        availableForSale
        quantityAvailable
        selectedOptions { name value }
        image { id url altText width height }
        sku
      }
    }
  }
}
"
    };
}

macro_rules! cart_fields {
    () => {
        r"
fragment CartFields on Cart {
  id
  checkoutUrl
  totalQuantity
  cost {
    subtotalAmount { amount currencyCode }
    totalAmount { amount currencyCode }
    totalTaxAmount { amount currencyCode }
  }
  lines(first: 250) {
    edges {
      node {
        id
        quantity
        cost { totalAmount { amount currencyCode } }
        merchandise {
          ... on ProductVariant {
            id
            title
            price { amount currencyCode }
            selectedOptions { name value }
            product {
              id
              title
              handle
              images(first: 1) { edges { node { id url altText width height } } }
            }
          }
        }
      }
    }
  }
}
"
    };
}

/// Payload shared by every cart mutation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPayload {
    /// The cart after the mutation.
    pub cart: Option<Cart>,
    /// Validation errors.
    #[serde(default)]
    pub user_errors: Vec<CartUserError>,
}

// =============================================================================
// Products
// =============================================================================

pub struct GetProductByHandle;

pub mod get_product_by_handle {
    use super::{Deserialize, Product, Serialize};

    pub const OPERATION_NAME: &str = "GetProductByHandle";
    pub const QUERY: &str = concat!(
        "query GetProductByHandle($handle: String!) {\n  product(handle: $handle) { ...ProductFields }\n}\n",
        product_fields!()
    );

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub handle: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub product: Option<Product>,
    }
}

impl GraphQLQuery for GetProductByHandle {
    type Variables = get_product_by_handle::Variables;
    type ResponseData = get_product_by_handle::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: get_product_by_handle::QUERY,
            operation_name: get_product_by_handle::OPERATION_NAME,
        }
    }
}

pub struct GetProducts;

pub mod get_products {
    use super::{Deserialize, ProductConnection, Serialize};

    pub const OPERATION_NAME: &str = "GetProducts";
    pub const QUERY: &str = concat!(
        "query GetProducts($first: Int!, $after: String, $query: String) {\n",
        "  products(first: $first, after: $after, query: $query) {\n",
        "    edges { node { ...ProductFields } }\n",
        "    pageInfo { hasNextPage hasPreviousPage endCursor }\n",
        "  }\n}\n",
        product_fields!()
    );

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub first: i64,
        pub after: Option<String>,
        pub query: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub products: ProductConnection,
    }
}

impl GraphQLQuery for GetProducts {
    type Variables = get_products::Variables;
    type ResponseData = get_products::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: get_products::QUERY,
            operation_name: get_products::OPERATION_NAME,
        }
    }
}

// =============================================================================
// Collections
// =============================================================================

pub struct GetCollectionByHandle;

pub mod get_collection_by_handle {
    use super::{Collection, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "GetCollectionByHandle";
    pub const QUERY: &str = concat!(
        "query GetCollectionByHandle($handle: String!, $first: Int!, $after: String) {\n",
        "  collection(handle: $handle) {\n",
        "    id title handle description descriptionHtml\n",
        "    image { id url altText width height }\n",
        "    products(first: $first, after: $after) {\n",
        "      edges { node { ...ProductFields } }\n",
        "      pageInfo { hasNextPage hasPreviousPage endCursor }\n",
        "    }\n  }\n}\n",
        product_fields!()
    );

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub handle: String,
        pub first: i64,
        pub after: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub collection: Option<Collection>,
    }
}

impl GraphQLQuery for GetCollectionByHandle {
    type Variables = get_collection_by_handle::Variables;
    type ResponseData = get_collection_by_handle::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: get_collection_by_handle::QUERY,
            operation_name: get_collection_by_handle::OPERATION_NAME,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

pub struct GetCart;

pub mod get_cart {
    use super::{Cart, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "GetCart";
    pub const QUERY: &str = concat!(
        "query GetCart($cartId: ID!) {\n  cart(id: $cartId) { ...CartFields }\n}\n",
        cart_fields!()
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub cart: Option<Cart>,
    }
}

impl GraphQLQuery for GetCart {
    type Variables = get_cart::Variables;
    type ResponseData = get_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: get_cart::QUERY,
            operation_name: get_cart::OPERATION_NAME,
        }
    }
}

pub struct CreateCart;

pub mod create_cart {
    use super::{CartLineInput, CartPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "CreateCart";
    pub const QUERY: &str = concat!(
        "mutation CreateCart($input: CartInput!) {\n",
        "  cartCreate(input: $input) {\n",
        "    cart { ...CartFields }\n",
        "    userErrors { field message code }\n",
        "  }\n}\n",
        cart_fields!()
    );

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub input: CartInput,
    }

    #[derive(Debug, Serialize)]
    pub struct CartInput {
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<CartPayload>,
    }
}

impl GraphQLQuery for CreateCart {
    type Variables = create_cart::Variables;
    type ResponseData = create_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: create_cart::QUERY,
            operation_name: create_cart::OPERATION_NAME,
        }
    }
}

pub struct AddToCart;

pub mod add_to_cart {
    use super::{CartLineInput, CartPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "AddToCart";
    pub const QUERY: &str = concat!(
        "mutation AddToCart($cartId: ID!, $lines: [CartLineInput!]!) {\n",
        "  cartLinesAdd(cartId: $cartId, lines: $lines) {\n",
        "    cart { ...CartFields }\n",
        "    userErrors { field message code }\n",
        "  }\n}\n",
        cart_fields!()
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_add: Option<CartPayload>,
    }
}

impl GraphQLQuery for AddToCart {
    type Variables = add_to_cart::Variables;
    type ResponseData = add_to_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: add_to_cart::QUERY,
            operation_name: add_to_cart::OPERATION_NAME,
        }
    }
}

pub struct UpdateCartLines;

pub mod update_cart_lines {
    use super::{CartLineUpdateInput, CartPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "UpdateCartLines";
    pub const QUERY: &str = concat!(
        "mutation UpdateCartLines($cartId: ID!, $lines: [CartLineUpdateInput!]!) {\n",
        "  cartLinesUpdate(cartId: $cartId, lines: $lines) {\n",
        "    cart { ...CartFields }\n",
        "    userErrors { field message code }\n",
        "  }\n}\n",
        cart_fields!()
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineUpdateInput>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_update: Option<CartPayload>,
    }
}

impl GraphQLQuery for UpdateCartLines {
    type Variables = update_cart_lines::Variables;
    type ResponseData = update_cart_lines::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: update_cart_lines::QUERY,
            operation_name: update_cart_lines::OPERATION_NAME,
        }
    }
}

pub struct RemoveFromCart;

pub mod remove_from_cart {
    use super::{CartPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "RemoveFromCart";
    pub const QUERY: &str = concat!(
        "mutation RemoveFromCart($cartId: ID!, $lineIds: [ID!]!) {\n",
        "  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {\n",
        "    cart { ...CartFields }\n",
        "    userErrors { field message code }\n",
        "  }\n}\n",
        cart_fields!()
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub line_ids: Vec<String>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_remove: Option<CartPayload>,
    }
}

impl GraphQLQuery for RemoveFromCart {
    type Variables = remove_from_cart::Variables;
    type ResponseData = remove_from_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: remove_from_cart::QUERY,
            operation_name: remove_from_cart::OPERATION_NAME,
        }
    }
}
