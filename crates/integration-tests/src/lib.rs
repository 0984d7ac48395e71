//! Integration tests for Shopfront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_checkout` - Cart store, persistence and checkout working together
//! - `catalog` - Catalog caching, filters and image fallbacks
//!
//! Nothing here talks to Shopify; the backends below stand in for the
//! Storefront API.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use shopfront_core::{CheckoutId, Money, ProductId, VariantId};
use shopfront_storefront::cart::{CheckoutBackend, CheckoutLine, CheckoutSession};
use shopfront_storefront::catalog::{ProductFilter, ProductSource};
use shopfront_storefront::shopify::{PriceRange, Product, ProductVariant, ShopifyError};

// =============================================================================
// Fixtures
// =============================================================================

/// A product with one variant per `(variant_id, price)` pair, priced in USD.
#[must_use]
pub fn product(handle: &str, product_type: &str, variants: &[(&str, &str)]) -> Product {
    let prices: Vec<Money> = variants
        .iter()
        .map(|(_, price)| Money::new(*price, "USD"))
        .collect();
    let first = prices
        .first()
        .cloned()
        .unwrap_or_else(|| Money::zero("USD"));

    Product {
        id: ProductId::new(format!("gid://shopify/Product/{handle}")),
        handle: handle.to_string(),
        title: handle.replace('-', " "),
        description: String::new(),
        available_for_sale: true,
        product_type: product_type.to_string(),
        vendor: "Shopfront".to_string(),
        tags: vec![],
        price_range: PriceRange {
            min_variant_price: first.clone(),
            max_variant_price: prices.last().cloned().unwrap_or(first),
        },
        featured_image: None,
        images: vec![],
        variants: variants
            .iter()
            .map(|(id, price)| ProductVariant {
                id: VariantId::new(*id),
                title: "Default Title".to_string(),
                available_for_sale: true,
                price: Money::new(*price, "USD"),
                selected_options: vec![],
            })
            .collect(),
    }
}

/// A directory under the system temp dir, removed on drop.
#[derive(Debug)]
pub struct TempDir(PathBuf);

impl TempDir {
    #[must_use]
    pub fn new() -> Self {
        Self(std::env::temp_dir().join(format!("shopfront-it-{}", uuid::Uuid::new_v4())))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Default for TempDir {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

// =============================================================================
// Fake checkout backend
// =============================================================================

/// Checkout backend that records every call.
///
/// Sessions are numbered per call; an existing session ID is kept.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: AtomicUsize,
    failing: AtomicBool,
    requests: Mutex<Vec<(Vec<CheckoutLine>, Option<CheckoutId>)>>,
}

impl RecordingBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make later calls fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Lines and existing session of every request so far.
    #[must_use]
    pub fn requests(&self) -> Vec<(Vec<CheckoutLine>, Option<CheckoutId>)> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CheckoutBackend for RecordingBackend {
    async fn create_checkout(
        &self,
        lines: &[CheckoutLine],
        existing: Option<&CheckoutId>,
    ) -> Result<CheckoutSession, ShopifyError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((lines.to_vec(), existing.cloned()));

        if self.failing.load(Ordering::SeqCst) {
            return Err(ShopifyError::UserError("service unavailable".to_string()));
        }

        Ok(CheckoutSession {
            checkout_url: format!("https://shop.test/checkouts/{n}"),
            checkout_id: existing
                .cloned()
                .unwrap_or_else(|| CheckoutId::new(format!("gid://shopify/Cart/{n}"))),
        })
    }
}

// =============================================================================
// Fake product source
// =============================================================================

/// Product source serving a fixed product list.
#[derive(Debug, Default)]
pub struct StaticSource {
    products: Vec<Product>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl StaticSource {
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products,
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), ShopifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ShopifyError::RateLimited(1));
        }
        Ok(())
    }
}

fn matches_filter(product: &Product, filter: &ProductFilter) -> bool {
    match filter {
        ProductFilter::Tag(tag) => product.tags.iter().any(|t| t == tag),
        ProductFilter::ProductType(kind) => &product.product_type == kind,
        ProductFilter::Vendor(vendor) => &product.vendor == vendor,
        ProductFilter::Collection(_) => false,
        ProductFilter::Query(raw) => product.title.contains(raw.as_str()),
    }
}

#[async_trait]
impl ProductSource for StaticSource {
    async fn products(
        &self,
        limit: i64,
        filter: Option<&ProductFilter>,
    ) -> Result<Vec<Product>, ShopifyError> {
        self.check()?;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .products
            .iter()
            .filter(|p| filter.is_none_or(|f| matches_filter(p, f)))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn product_by_handle(&self, handle: &str) -> Result<Option<Product>, ShopifyError> {
        self.check()?;
        Ok(self.products.iter().find(|p| p.handle == handle).cloned())
    }
}
