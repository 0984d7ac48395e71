//! The cart store: single owner of cart contents.
//!
//! Mutations never fail. Invalid input (non-positive quantities, blank
//! variant IDs) is ignored, and storage failures are logged rather than
//! returned, so UI call sites need no error handling. Every change is
//! written through to storage before the call returns.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use serde::Serialize;
use shopfront_core::{CheckoutId, Money, VariantId};
use tracing::{debug, warn};

use super::checkout::{CheckoutBackend, CheckoutError, CheckoutLine, CheckoutSession};
use super::item::{CartItem, CartItemInput, clamp_quantity};
use super::storage::{CART_KEY, CartStorage, PersistedCart};
use super::subscription::{Listeners, Subscription};
use crate::error::add_breadcrumb;
use crate::shopify::ShopifyError;

/// Currency reported for the total of an empty cart.
pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Default)]
struct CartState {
    items: Vec<CartItem>,
    is_loading: bool,
    checkout_url: Option<String>,
    checkout_id: Option<CheckoutId>,
    /// Bumped by `clear_cart`; a checkout begun under an older value is stale.
    generation: u64,
}

/// What `begin_checkout` hands to the pending request.
#[derive(Debug)]
pub(super) struct CheckoutAttempt {
    pub lines: Vec<CheckoutLine>,
    pub existing: Option<CheckoutId>,
    /// Checkout URL hidden while the request is pending.
    pub previous_url: Option<String>,
    pub generation: u64,
}

/// Point-in-time view of the cart handed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub is_loading: bool,
    pub checkout_url: Option<String>,
    pub checkout_id: Option<CheckoutId>,
    pub total_items: u64,
    pub total_price: Money,
}

impl CartSnapshot {
    fn of(state: &CartState) -> Self {
        Self {
            items: state.items.clone(),
            is_loading: state.is_loading,
            checkout_url: state.checkout_url.clone(),
            checkout_id: state.checkout_id.clone(),
            total_items: total_items(&state.items),
            total_price: total_price(&state.items),
        }
    }
}

/// Shopping cart with write-through persistence and checkout orchestration.
pub struct CartStore {
    state: Mutex<CartState>,
    storage: Arc<dyn CartStorage>,
    backend: Arc<dyn CheckoutBackend>,
    listeners: Arc<Listeners>,
}

impl CartStore {
    /// Open the cart persisted in `storage`, or an empty one.
    ///
    /// Unreadable or corrupt state is discarded with a warning. Loading and
    /// checkout URL always start cleared.
    pub fn new(storage: Arc<dyn CartStorage>, backend: Arc<dyn CheckoutBackend>) -> Self {
        let (items, checkout_id) = rehydrate(storage.as_ref());
        debug!(line_count = items.len(), "Cart loaded");

        Self {
            state: Mutex::new(CartState {
                items,
                is_loading: false,
                checkout_url: None,
                checkout_id,
                generation: 0,
            }),
            storage,
            backend,
            listeners: Arc::new(Listeners::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CartState> {
        // A panicking listener must not brick the cart
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn backend(&self) -> &dyn CheckoutBackend {
        self.backend.as_ref()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add an item, or increase the quantity of the existing line for the
    /// same variant. Non-positive quantities and blank variant IDs are ignored.
    pub fn add_item(&self, input: CartItemInput) {
        let variant_id = input.variant_id.clone();
        let Some(item) = input.into_item() else {
            debug!(variant_id = %variant_id, "Ignoring invalid add");
            return;
        };

        self.mutate("add_item", Some(&variant_id), |state| {
            match state
                .items
                .iter_mut()
                .find(|existing| existing.variant_id == item.variant_id)
            {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                }
                None => state.items.push(item),
            }
            true
        });
    }

    /// Set a line's quantity. Zero or negative removes the line; an unknown
    /// variant is a no-op.
    pub fn update_quantity(&self, variant_id: &VariantId, quantity: i64) {
        let Some(quantity) = clamp_quantity(quantity) else {
            self.remove_item(variant_id);
            return;
        };

        self.mutate("update_quantity", Some(variant_id), |state| {
            match state
                .items
                .iter_mut()
                .find(|item| &item.variant_id == variant_id)
            {
                Some(item) if item.quantity != quantity => {
                    item.quantity = quantity;
                    true
                }
                _ => false,
            }
        });
    }

    /// Remove a line if present.
    pub fn remove_item(&self, variant_id: &VariantId) {
        self.mutate("remove_item", Some(variant_id), |state| {
            let before = state.items.len();
            state.items.retain(|item| &item.variant_id != variant_id);
            state.items.len() != before
        });
    }

    /// Remove every line and forget the checkout session.
    pub fn clear_cart(&self) {
        self.mutate("clear_cart", None, |state| {
            state.generation = state.generation.wrapping_add(1);
            let changed = !state.items.is_empty()
                || state.checkout_url.is_some()
                || state.checkout_id.is_some();
            state.items.clear();
            state.checkout_url = None;
            state.checkout_id = None;
            changed
        });
    }

    /// Apply `change` under the lock; if it reports a change, persist and
    /// notify subscribers.
    fn mutate(
        &self,
        op: &str,
        variant_id: Option<&VariantId>,
        change: impl FnOnce(&mut CartState) -> bool,
    ) {
        let variant = variant_id.map_or("", VariantId::as_str);
        let snapshot = {
            let mut state = self.lock();
            if !change(&mut state) {
                debug!(op, variant_id = variant, "Cart unchanged");
                return;
            }
            self.persist(&state);
            CartSnapshot::of(&state)
        };

        debug!(op, variant_id = variant, total_items = snapshot.total_items, "Cart updated");
        match variant_id {
            Some(id) => add_breadcrumb("cart", op, Some(&[("variant_id", id.as_str())])),
            None => add_breadcrumb("cart", op, None),
        }
        self.listeners.notify(&snapshot);
    }

    /// Write items and checkout ID through to storage.
    fn persist(&self, state: &CartState) {
        let doc = PersistedCart::new(state.items.clone(), state.checkout_id.clone());
        let result = doc
            .encode()
            .and_then(|raw| self.storage.save(CART_KEY, &raw));
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist cart");
        }
    }

    // =========================================================================
    // Checkout state transitions
    // =========================================================================

    /// Enter the pending state, returning the lines to send, the session to
    /// reuse, and the checkout URL hidden while pending.
    pub(super) fn begin_checkout(&self) -> Result<CheckoutAttempt, CheckoutError> {
        let (begun, snapshot) = {
            let mut state = self.lock();
            if state.is_loading {
                return Err(CheckoutError::InProgress);
            }
            if state.items.is_empty() {
                return Err(CheckoutError::EmptyCart);
            }

            state.is_loading = true;
            let previous_url = state.checkout_url.take();
            let lines = state
                .items
                .iter()
                .map(|item| CheckoutLine {
                    variant_id: item.variant_id.clone(),
                    quantity: item.quantity,
                })
                .collect();

            let attempt = CheckoutAttempt {
                lines,
                existing: state.checkout_id.clone(),
                previous_url,
                generation: state.generation,
            };
            (attempt, CartSnapshot::of(&state))
        };

        self.listeners.notify(&snapshot);
        Ok(begun)
    }

    /// Leave the pending state. Success records the session; failure
    /// restores the checkout URL that was hidden and keeps the old ID.
    ///
    /// If the cart was cleared since `generation`, the outcome is dropped:
    /// the session belongs to items that are gone.
    pub(super) fn finish_checkout(
        &self,
        result: &Result<CheckoutSession, ShopifyError>,
        previous_url: Option<String>,
        generation: u64,
    ) {
        let snapshot = {
            let mut state = self.lock();
            state.is_loading = false;
            if state.generation == generation {
                match result {
                    Ok(session) => {
                        state.checkout_url = Some(session.checkout_url.clone());
                        state.checkout_id = Some(session.checkout_id.clone());
                        self.persist(&state);
                    }
                    Err(_) => state.checkout_url = previous_url,
                }
            } else {
                debug!("Cart cleared during checkout, discarding session");
            }
            CartSnapshot::of(&state)
        };

        self.listeners.notify(&snapshot);
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current lines in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.lock().items.clone()
    }

    /// The line for a variant, if present.
    #[must_use]
    pub fn item(&self, variant_id: &VariantId) -> Option<CartItem> {
        self.lock()
            .items
            .iter()
            .find(|item| &item.variant_id == variant_id)
            .cloned()
    }

    #[must_use]
    pub fn contains(&self, variant_id: &VariantId) -> bool {
        self.lock()
            .items
            .iter()
            .any(|item| &item.variant_id == variant_id)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lock().items.len()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        total_items(&self.lock().items)
    }

    /// Sum of unit price times quantity, in the first line's currency.
    ///
    /// Advisory only: mixed currencies are not converted.
    #[must_use]
    pub fn total_price(&self) -> Money {
        total_price(&self.lock().items)
    }

    /// Whether a checkout request is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().is_loading
    }

    #[must_use]
    pub fn checkout_url(&self) -> Option<String> {
        self.lock().checkout_url.clone()
    }

    #[must_use]
    pub fn checkout_id(&self) -> Option<CheckoutId> {
        self.lock().checkout_id.clone()
    }

    /// Everything at once, consistent with itself.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot::of(&self.lock())
    }

    /// Call `listener` with a fresh snapshot after every change.
    pub fn subscribe(
        &self,
        listener: impl Fn(&CartSnapshot) + Send + Sync + 'static,
    ) -> Subscription {
        self.listeners.add(Arc::new(listener))
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("state", &*self.lock())
            .field("subscribers", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn total_items(items: &[CartItem]) -> u64 {
    items.iter().map(|item| u64::from(item.quantity)).sum()
}

fn total_price(items: &[CartItem]) -> Money {
    let currency = items
        .first()
        .map_or(DEFAULT_CURRENCY, |item| item.price.currency_code.as_str());

    let total = items
        .iter()
        .filter_map(|item| match item.price.decimal() {
            Ok(unit) => {
                let line = unit.checked_mul(Decimal::from(item.quantity));
                if line.is_none() {
                    warn!(variant_id = %item.variant_id, quantity = item.quantity, "Line total overflows, skipping in total");
                }
                line
            }
            Err(e) => {
                warn!(variant_id = %item.variant_id, error = %e, "Skipping unpriced line in total");
                None
            }
        })
        .fold(Decimal::new(0, 2), Decimal::saturating_add);

    Money::from_decimal(total, currency)
}

fn rehydrate(storage: &dyn CartStorage) -> (Vec<CartItem>, Option<CheckoutId>) {
    let raw = match storage.load(CART_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return (Vec::new(), None),
        Err(e) => {
            warn!(error = %e, "Could not read persisted cart, starting empty");
            return (Vec::new(), None);
        }
    };

    match PersistedCart::decode(&raw) {
        Ok(doc) => (normalize_items(doc.items), doc.checkout_id),
        Err(e) => {
            warn!(error = %e, "Discarding unreadable persisted cart");
            (Vec::new(), None)
        }
    }
}

/// Re-establish cart invariants on data read from storage: no zero
/// quantities, no blank IDs, one line per variant (first position wins).
fn normalize_items(items: Vec<CartItem>) -> Vec<CartItem> {
    let mut normalized: Vec<CartItem> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity == 0 || item.variant_id.is_blank() {
            continue;
        }
        match normalized
            .iter_mut()
            .find(|existing| existing.variant_id == item.variant_id)
        {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            }
            None => normalized.push(item),
        }
    }
    normalized
}
