//! Application state shared across commands.

use std::sync::Arc;

use crate::cart::{CartStore, FileStorage};
use crate::catalog::Catalog;
use crate::config::{ConfigError, StorefrontConfig};
use crate::shopify::StorefrontClient;

/// Application state.
///
/// This struct is cheaply cloneable via `Arc` and owns the catalog and the
/// cart, which share one Shopify client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    catalog: Catalog,
    cart: CartStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The cart is rehydrated from `config.cart_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the Shopify endpoint cannot be built from the config.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ConfigError> {
        let storefront = StorefrontClient::new(&config.shopify)?;
        let catalog = Catalog::new(Arc::new(storefront.clone()), config.catalog_cache_ttl);
        let cart = CartStore::new(
            Arc::new(FileStorage::new(&config.cart_dir)),
            Arc::new(storefront),
        );

        Ok(Self {
            inner: Arc::new(AppStateInner { catalog, cart }),
        })
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }
}
