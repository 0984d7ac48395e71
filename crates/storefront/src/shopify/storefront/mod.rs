//! Shopify Storefront API client implementation.
//!
//! Uses hand-written `graphql_client` operations with `reqwest` 0.13 for HTTP.
//! Caching is left to the catalog layer; this client always goes to Shopify.

mod conversions;
pub mod queries;

use std::sync::Arc;

use async_trait::async_trait;
use graphql_client::{GraphQLQuery, Response};
use secrecy::{ExposeSecret, SecretString};
use shopfront_core::CheckoutId;
use tracing::{debug, instrument};

use crate::cart::{CheckoutBackend, CheckoutLine, CheckoutSession};
use crate::catalog::{ProductFilter, ProductSource};
use crate::config::{ConfigError, ShopifyStorefrontConfig};
use crate::shopify::ShopifyError;
use crate::shopify::types::{CartUserError, Product, ProductConnection};

use conversions::{convert_product, convert_product_connection, join_user_errors};
use queries::{
    CartLineInput, CartMutationPayload, CreateCheckoutCart, GetCheckoutCart,
    GetCollectionProducts, GetProductByHandle, GetProducts, MAX_PAGE_SIZE, ReplaceCheckoutLines,
    create_checkout_cart, get_checkout_cart, get_collection_products, get_product_by_handle,
    get_products, replace_checkout_lines,
};

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Provides type-safe access to products, collections, and checkout carts.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the store domain does not form a valid endpoint URL.
    pub fn new(config: &ShopifyStorefrontConfig) -> Result<Self, ConfigError> {
        let endpoint = config.endpoint()?;

        Ok(Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint: endpoint.into(),
                access_token: config.storefront_private_token.clone(),
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
            .post(&self.inner.endpoint)
            // Private access tokens use a different header than public tokens
            .header(
                "Shopify-Storefront-Private-Token",
                self.inner.access_token.expose_secret(),
            )
            .header("Content-Type", "application/json")
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

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                operation = request_body.operation_name,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::message(format!(
                "HTTP {status}: {}",
                response_text.chars().take(200).collect::<String>()
            )));
        }

        let response: Response<Q::ResponseData> = serde_json::from_str(&response_text)
            .inspect_err(|e| {
                tracing::error!(
                    error = %e,
                    operation = request_body.operation_name,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse Shopify GraphQL response"
                );
            })?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(Into::into).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                operation = request_body.operation_name,
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::message("No data in response")
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get up to `first` products matching an optional search query.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn fetch_products(
        &self,
        first: i64,
        query: Option<String>,
    ) -> Result<ProductConnection, ShopifyError> {
        let variables = get_products::Variables {
            first: first.clamp(1, MAX_PAGE_SIZE),
            query,
        };

        let data = self.execute::<GetProducts>(variables).await?;
        Ok(convert_product_connection(data.products))
    }

    /// Get up to `first` products from a collection.
    ///
    /// Returns `None` when no collection has this handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn fetch_collection_products(
        &self,
        handle: &str,
        first: i64,
    ) -> Result<Option<ProductConnection>, ShopifyError> {
        let variables = get_collection_products::Variables {
            handle: handle.to_string(),
            first: first.clamp(1, MAX_PAGE_SIZE),
        };

        let data = self.execute::<GetCollectionProducts>(variables).await?;
        Ok(data
            .collection
            .map(|c| convert_product_connection(c.products)))
    }

    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn fetch_product_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<Product>, ShopifyError> {
        let variables = get_product_by_handle::Variables {
            handle: handle.to_string(),
        };

        let data = self.execute::<GetProductByHandle>(variables).await?;
        Ok(data.product.map(convert_product))
    }

    // =========================================================================
    // Checkout Methods (never cached - mutable state)
    // =========================================================================

    /// Create a new Shopify cart holding `lines`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart creation fails or user errors are returned.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn create_checkout_cart(
        &self,
        lines: Vec<CartLineInput>,
    ) -> Result<CheckoutSession, ShopifyError> {
        let variables = create_checkout_cart::Variables { lines };
        let data = self.execute::<CreateCheckoutCart>(variables).await?;
        session_from_payload(data.cart_create, "Failed to create checkout")
    }

    /// Replace every line of an existing Shopify cart with `lines`.
    ///
    /// Returns `None` if the cart no longer exists (expired or completed).
    ///
    /// # Errors
    ///
    /// Returns an error if either step fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id, line_count = lines.len()))]
    pub async fn replace_checkout_lines(
        &self,
        cart_id: &CheckoutId,
        lines: Vec<CartLineInput>,
    ) -> Result<Option<CheckoutSession>, ShopifyError> {
        let existing = self
            .execute::<GetCheckoutCart>(get_checkout_cart::Variables {
                cart_id: cart_id.to_string(),
            })
            .await?;

        let Some(cart) = existing.cart else {
            debug!("Checkout cart no longer exists");
            return Ok(None);
        };

        let variables = replace_checkout_lines::Variables {
            cart_id: cart.id,
            remove_line_ids: cart.lines.into_nodes().into_iter().map(|l| l.id).collect(),
            lines,
        };

        let data = self.execute::<ReplaceCheckoutLines>(variables).await?;

        if let Some(removed) = &data.removed {
            check_user_errors(&removed.user_errors)?;
        }
        session_from_payload(data.added, "Failed to update checkout").map(Some)
    }
}

fn check_user_errors(errors: &[CartUserError]) -> Result<(), ShopifyError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ShopifyError::UserError(join_user_errors(errors)))
    }
}

fn session_from_payload(
    payload: Option<CartMutationPayload>,
    failure: &str,
) -> Result<CheckoutSession, ShopifyError> {
    let Some(payload) = payload else {
        return Err(ShopifyError::message(failure));
    };
    check_user_errors(&payload.user_errors)?;

    payload
        .cart
        .map(|cart| CheckoutSession {
            checkout_id: CheckoutId::new(cart.id),
            checkout_url: cart.checkout_url,
        })
        .ok_or_else(|| ShopifyError::message(failure))
}

fn line_inputs(lines: &[CheckoutLine]) -> Vec<CartLineInput> {
    lines
        .iter()
        .map(|line| CartLineInput {
            merchandise_id: line.variant_id.to_string(),
            quantity: i64::from(line.quantity),
        })
        .collect()
}

// =============================================================================
// Catalog / checkout seams
// =============================================================================

#[async_trait]
impl ProductSource for StorefrontClient {
    async fn products(
        &self,
        limit: i64,
        filter: Option<&ProductFilter>,
    ) -> Result<Vec<Product>, ShopifyError> {
        let connection = match filter {
            Some(ProductFilter::Collection(handle)) => self
                .fetch_collection_products(handle, limit)
                .await?
                .unwrap_or_default(),
            other => {
                self.fetch_products(limit, other.map(ProductFilter::to_search_query))
                    .await?
            }
        };
        Ok(connection.products)
    }

    async fn product_by_handle(&self, handle: &str) -> Result<Option<Product>, ShopifyError> {
        self.fetch_product_by_handle(handle).await
    }
}

#[async_trait]
impl CheckoutBackend for StorefrontClient {
    async fn create_checkout(
        &self,
        lines: &[CheckoutLine],
        existing: Option<&CheckoutId>,
    ) -> Result<CheckoutSession, ShopifyError> {
        if let Some(cart_id) = existing
            && let Some(session) = self.replace_checkout_lines(cart_id, line_inputs(lines)).await?
        {
            return Ok(session);
        }
        self.create_checkout_cart(line_inputs(lines)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> Option<CartMutationPayload> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_session_from_payload_success() {
        let session = session_from_payload(
            payload(
                r#"{"cart": {"id": "gid://shopify/Cart/9", "checkoutUrl": "https://shop.test/c/9"}, "userErrors": []}"#,
            ),
            "failed",
        )
        .unwrap();
        assert_eq!(session.checkout_id.as_str(), "gid://shopify/Cart/9");
        assert_eq!(session.checkout_url, "https://shop.test/c/9");
    }

    #[test]
    fn test_session_from_payload_user_errors() {
        let err = session_from_payload(
            payload(
                r#"{"cart": null, "userErrors": [{"code": "INVALID", "field": ["lines"], "message": "Bad variant"}]}"#,
            ),
            "failed",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "User error: Bad variant (lines)");
    }

    #[test]
    fn test_session_from_payload_missing() {
        let err = session_from_payload(None, "Failed to create checkout").unwrap_err();
        assert!(err.to_string().contains("Failed to create checkout"));
    }

    #[test]
    fn test_line_inputs() {
        let lines = vec![CheckoutLine {
            variant_id: "V1".into(),
            quantity: 3,
        }];
        assert_eq!(
            line_inputs(&lines),
            vec![CartLineInput {
                merchandise_id: "V1".to_string(),
                quantity: 3,
            }]
        );
    }
}
