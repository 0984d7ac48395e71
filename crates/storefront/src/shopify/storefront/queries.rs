//! GraphQL operations for the Shopify Storefront API.
//!
//! Each operation implements `graphql_client::GraphQLQuery` by hand: the
//! document is a string constant and the response shapes are plain serde
//! types. Leaf objects whose wire shape already matches a domain type
//! (`Money`, `Image`, `SelectedOption`, `PriceRange`) are decoded directly
//! into it; only the connection/edge wrappers need converting.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};
use shopfront_core::Money;

use crate::shopify::types::{CartUserError, Image, PriceRange, SelectedOption};

/// Max page size the Storefront API accepts for a connection.
pub const MAX_PAGE_SIZE: i64 = 250;

macro_rules! product_fields {
    () => {
        r"
fragment ProductFields on Product {
  id
  handle
  title
  description
  availableForSale
  productType
  vendor
  tags
  priceRange {
    minVariantPrice { amount currencyCode }
    maxVariantPrice { amount currencyCode }
  }
  featuredImage { id url altText width height }
  images(first: 10) {
    edges { node { id url altText width height } }
  }
  variants(first: 50) {
    edges {
      node {
        id
        title
        availableForSale
        price { amount currencyCode }
        selectedOptions { name value }
      }
    }
  }
}
"
    };
}

macro_rules! cart_mutation_fields {
    () => {
        r"
    cart { id checkoutUrl }
    userErrors { code field message }
"
    };
}

macro_rules! impl_query {
    ($name:ident, $operation:literal, $document:expr, $vars:ty, $data:ty) => {
        impl GraphQLQuery for $name {
            type Variables = $vars;
            type ResponseData = $data;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $document,
                    operation_name: $operation,
                }
            }
        }
    };
}

// =============================================================================
// Shared response shapes
// =============================================================================

/// A GraphQL connection (`edges { node }` plus optional page info).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    #[serde(default)]
    pub page_info: Option<RawPageInfo>,
}

impl<T> Connection<T> {
    /// Flatten `edges[].node` into a list.
    pub fn into_nodes(self) -> Vec<T> {
        self.edges.into_iter().map(|e| e.node).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    pub id: String,
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub available_for_sale: bool,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub price_range: PriceRange,
    pub featured_image: Option<Image>,
    pub images: Connection<Image>,
    pub variants: Connection<RawVariant>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVariant {
    pub id: String,
    pub title: String,
    pub available_for_sale: bool,
    pub price: Money,
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCheckoutCart {
    pub id: String,
    pub checkout_url: String,
}

/// Payload shared by `cartCreate`, `cartLinesAdd` and `cartLinesRemove`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutationPayload {
    pub cart: Option<RawCheckoutCart>,
    #[serde(default)]
    pub user_errors: Vec<CartUserError>,
}

/// A line to put into a Shopify cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    pub merchandise_id: String,
    pub quantity: i64,
}

// =============================================================================
// Product queries
// =============================================================================

pub struct GetProducts;

pub mod get_products {
    use super::{Connection, Deserialize, RawProduct, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
        pub query: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub products: Connection<RawProduct>,
    }
}

impl_query!(
    GetProducts,
    "GetProducts",
    concat!(
        r"
query GetProducts($first: Int!, $query: String) {
  products(first: $first, query: $query) {
    edges { node { ...ProductFields } }
    pageInfo { hasNextPage endCursor }
  }
}
",
        product_fields!()
    ),
    get_products::Variables,
    get_products::ResponseData
);

pub struct GetCollectionProducts;

pub mod get_collection_products {
    use super::{Connection, Deserialize, RawProduct, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub handle: String,
        pub first: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub collection: Option<Collection>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Collection {
        pub products: Connection<RawProduct>,
    }
}

impl_query!(
    GetCollectionProducts,
    "GetCollectionProducts",
    concat!(
        r"
query GetCollectionProducts($handle: String!, $first: Int!) {
  collection(handle: $handle) {
    products(first: $first) {
      edges { node { ...ProductFields } }
      pageInfo { hasNextPage endCursor }
    }
  }
}
",
        product_fields!()
    ),
    get_collection_products::Variables,
    get_collection_products::ResponseData
);

pub struct GetProductByHandle;

pub mod get_product_by_handle {
    use super::{Deserialize, RawProduct, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub handle: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub product: Option<RawProduct>,
    }
}

impl_query!(
    GetProductByHandle,
    "GetProductByHandle",
    concat!(
        r"
query GetProductByHandle($handle: String!) {
  product(handle: $handle) { ...ProductFields }
}
",
        product_fields!()
    ),
    get_product_by_handle::Variables,
    get_product_by_handle::ResponseData
);

// =============================================================================
// Checkout (cart) operations
// =============================================================================

pub struct CreateCheckoutCart;

pub mod create_checkout_cart {
    use super::{CartLineInput, CartMutationPayload, Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<CartMutationPayload>,
    }
}

impl_query!(
    CreateCheckoutCart,
    "CreateCheckoutCart",
    concat!(
        r"
mutation CreateCheckoutCart($lines: [CartLineInput!]!) {
  cartCreate(input: { lines: $lines }) {",
        cart_mutation_fields!(),
        r"  }
}
"
    ),
    create_checkout_cart::Variables,
    create_checkout_cart::ResponseData
);

pub struct GetCheckoutCart;

pub mod get_checkout_cart {
    use super::{Connection, Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub cart: Option<Cart>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Cart {
        pub id: String,
        pub checkout_url: String,
        pub lines: Connection<Line>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Line {
        pub id: String,
    }
}

impl_query!(
    GetCheckoutCart,
    "GetCheckoutCart",
    r"
query GetCheckoutCart($cartId: ID!) {
  cart(id: $cartId) {
    id
    checkoutUrl
    lines(first: 250) { edges { node { id } } }
  }
}
",
    get_checkout_cart::Variables,
    get_checkout_cart::ResponseData
);

pub struct ReplaceCheckoutLines;

pub mod replace_checkout_lines {
    use super::{CartLineInput, CartMutationPayload, Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub remove_line_ids: Vec<String>,
        pub lines: Vec<CartLineInput>,
    }

    /// Root fields of a mutation run in order, so the old lines are gone
    /// before the new ones are added.
    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub removed: Option<CartMutationPayload>,
        pub added: Option<CartMutationPayload>,
    }
}

impl_query!(
    ReplaceCheckoutLines,
    "ReplaceCheckoutLines",
    concat!(
        r"
mutation ReplaceCheckoutLines($cartId: ID!, $removeLineIds: [ID!]!, $lines: [CartLineInput!]!) {
  removed: cartLinesRemove(cartId: $cartId, lineIds: $removeLineIds) {",
        cart_mutation_fields!(),
        r"  }
  added: cartLinesAdd(cartId: $cartId, lines: $lines) {",
        cart_mutation_fields!(),
        r"  }
}
"
    ),
    replace_checkout_lines::Variables,
    replace_checkout_lines::ResponseData
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_include_fragment() {
        let body = GetProducts::build_query(get_products::Variables {
            first: 3,
            query: None,
        });
        assert_eq!(body.operation_name, "GetProducts");
        assert!(body.query.contains("fragment ProductFields on Product"));
        assert!(body.query.contains("...ProductFields"));
    }

    #[test]
    fn test_variables_serialize_camel_case() {
        let body = ReplaceCheckoutLines::build_query(replace_checkout_lines::Variables {
            cart_id: "gid://shopify/Cart/1".to_string(),
            remove_line_ids: vec!["line-1".to_string()],
            lines: vec![CartLineInput {
                merchandise_id: "V1".to_string(),
                quantity: 2,
            }],
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["variables"]["cartId"], "gid://shopify/Cart/1");
        assert_eq!(json["variables"]["removeLineIds"][0], "line-1");
        assert_eq!(json["variables"]["lines"][0]["merchandiseId"], "V1");
        assert_eq!(json["operationName"], "ReplaceCheckoutLines");
    }

    #[test]
    fn test_cart_mutation_payload_decodes() {
        let json = r#"{
            "cartCreate": {
                "cart": { "id": "gid://shopify/Cart/1", "checkoutUrl": "https://shop.test/cart/c/1" },
                "userErrors": []
            }
        }"#;
        let data: create_checkout_cart::ResponseData = serde_json::from_str(json).unwrap();
        let cart = data.cart_create.unwrap().cart.unwrap();
        assert_eq!(cart.checkout_url, "https://shop.test/cart/c/1");
    }
}
