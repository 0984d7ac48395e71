//! Catalog access: product listings, product detail, and image fallbacks.
//!
//! [`Catalog`] sits in front of a [`ProductSource`] (the Storefront API in
//! production) and caches responses in memory via `moka`. It is a pure read
//! path; the only failure it reports is the source being unreachable.

mod filter;
pub mod images;

pub use filter::ProductFilter;
pub use images::{FallbackKind, ImageSource, ResolvedImage, product_image, resolve_product_image};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::shopify::ShopifyError;
use crate::shopify::types::Product;

/// Largest listing the Storefront API returns in one page.
pub const MAX_PRODUCTS: usize = 250;

const CACHE_CAPACITY: u64 = 1000;

/// Errors from catalog reads.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The product backend could not be reached or rejected the query.
    #[error("Catalog fetch failed: {0}")]
    Fetch(#[from] ShopifyError),
}

/// Where product data comes from.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Up to `limit` products, optionally filtered. Unknown collections
    /// yield an empty list.
    async fn products(
        &self,
        limit: i64,
        filter: Option<&ProductFilter>,
    ) -> Result<Vec<Product>, ShopifyError>;

    /// A single product, or `None` if no product has this handle.
    async fn product_by_handle(&self, handle: &str) -> Result<Option<Product>, ShopifyError>;
}

/// Cached values.
#[derive(Debug, Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Option<Box<Product>>),
}

/// Cached, read-only access to products.
#[derive(Clone)]
pub struct Catalog {
    source: Arc<dyn ProductSource>,
    cache: Cache<String, CacheValue>,
}

impl Catalog {
    /// Create a catalog over `source` with the given cache lifetime.
    #[must_use]
    pub fn new(source: Arc<dyn ProductSource>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();

        Self { source, cache }
    }

    /// Up to `limit` products (clamped to `1..=250`), optionally filtered.
    ///
    /// Returns an empty list when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Fetch`] on network or backend failure.
    #[instrument(skip(self, filter), fields(filter = ?filter.map(ToString::to_string)))]
    pub async fn get_products(
        &self,
        limit: usize,
        filter: Option<&ProductFilter>,
    ) -> Result<Vec<Product>, CatalogError> {
        let limit = limit.clamp(1, MAX_PRODUCTS);
        // Debug keeps the variant, so a raw query never shares an entry
        // with the filter it renders to
        let cache_key = format!("products:{limit}:{filter:?}");

        if let Some(CacheValue::Products(products)) = self.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products.as_ref().clone());
        }

        // Bounded by MAX_PRODUCTS, so the cast cannot truncate
        #[allow(clippy::cast_possible_wrap)]
        let mut products = self.source.products(limit as i64, filter).await?;
        products.truncate(limit);

        self.cache
            .insert(cache_key, CacheValue::Products(Arc::new(products.clone())))
            .await;

        Ok(products)
    }

    /// A product by handle, or `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Fetch`] on network or backend failure.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product(&self, handle: &str) -> Result<Option<Product>, CatalogError> {
        let cache_key = format!("product:{handle}");

        if let Some(CacheValue::Product(product)) = self.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(product.map(|p| *p));
        }

        let product = self.source.product_by_handle(handle).await?;

        self.cache
            .insert(
                cache_key,
                CacheValue::Product(product.clone().map(Box::new)),
            )
            .await;

        Ok(product)
    }

    /// Drop every cached response.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}
