//! Checkout orchestration: turning the cart into a hosted checkout session.
//!
//! At most one checkout request is in flight per cart. A second call while
//! one is pending is rejected instead of racing the first, so a stale
//! response can never overwrite a newer checkout URL.

use async_trait::async_trait;
use serde::Serialize;
use shopfront_core::{CheckoutId, VariantId};
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::store::{CartStore, CheckoutAttempt};
use crate::error::add_breadcrumb;
use crate::shopify::ShopifyError;

/// A line sent to the backend when creating a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    pub variant_id: VariantId,
    pub quantity: u32,
}

/// A checkout session created by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    /// Hosted checkout page to send the shopper to.
    pub checkout_url: String,
    /// Backend session ID, reused by later checkouts of the same cart.
    pub checkout_id: CheckoutId,
}

/// Errors from [`CartStore::create_checkout`].
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart has no items.
    #[error("Cart is empty, add items before checking out")]
    EmptyCart,

    /// Another checkout request for this cart has not finished.
    #[error("A checkout is already in progress")]
    InProgress,

    /// The backend failed or rejected the request.
    #[error("Checkout creation failed: {0}")]
    Creation(#[from] ShopifyError),
}

/// The remote side of checkout.
#[async_trait]
pub trait CheckoutBackend: Send + Sync {
    /// Create a checkout session for `lines`, or update `existing` in place
    /// so that repeated calls do not leave duplicate sessions behind.
    async fn create_checkout(
        &self,
        lines: &[CheckoutLine],
        existing: Option<&CheckoutId>,
    ) -> Result<CheckoutSession, ShopifyError>;
}

/// Clears the loading flag if a checkout future is dropped before finishing.
struct PendingCheckout<'a> {
    store: &'a CartStore,
    previous_url: Option<String>,
    generation: u64,
    finished: bool,
}

impl PendingCheckout<'_> {
    fn finish(mut self, result: &Result<CheckoutSession, ShopifyError>) {
        self.finished = true;
        self.store
            .finish_checkout(result, self.previous_url.take(), self.generation);
    }
}

impl Drop for PendingCheckout<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!("Checkout request abandoned before completion");
            let abandoned = Err(ShopifyError::message("checkout abandoned"));
            self.store
                .finish_checkout(&abandoned, self.previous_url.take(), self.generation);
        }
    }
}

impl CartStore {
    /// Create (or refresh) the checkout session for the current cart.
    ///
    /// On success the checkout URL and ID are stored on the cart; the items
    /// are left untouched so the shopper can come back from the hosted page.
    /// On failure the cart is exactly as it was and the call can be retried.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::InProgress`] if a checkout is already pending
    /// - [`CheckoutError::EmptyCart`] if there is nothing to check out
    /// - [`CheckoutError::Creation`] if the backend call fails
    #[instrument(skip(self))]
    pub async fn create_checkout(&self) -> Result<CheckoutSession, CheckoutError> {
        let CheckoutAttempt {
            lines,
            existing,
            previous_url,
            generation,
        } = self.begin_checkout()?;
        add_breadcrumb("checkout", "Checkout started", None);
        info!(
            line_count = lines.len(),
            reusing_session = existing.is_some(),
            "Creating checkout"
        );

        let pending = PendingCheckout {
            store: self,
            previous_url,
            generation,
            finished: false,
        };

        let result = self
            .backend()
            .create_checkout(&lines, existing.as_ref())
            .await;
        pending.finish(&result);

        match result {
            Ok(session) => {
                info!(checkout_id = %session.checkout_id, "Checkout created");
                Ok(session)
            }
            Err(e) => {
                warn!(error = %e, "Checkout creation failed");
                Err(CheckoutError::Creation(e))
            }
        }
    }
}
