//! Integration tests for the cart store, its file persistence, and checkout.

use std::sync::Arc;

use shopfront_core::VariantId;
use shopfront_integration_tests::{RecordingBackend, TempDir, product};
use shopfront_storefront::cart::{
    CART_KEY, CartItemInput, CartStorage, CartStore, CheckoutError, FileStorage, PersistedCart,
};
use shopfront_storefront::shopify::Product;

fn input(product: &Product, variant: &str, quantity: i64) -> CartItemInput {
    let variant = product
        .variant(&VariantId::new(variant))
        .expect("fixture variant exists");
    CartItemInput::from_variant(product, variant, quantity)
}

fn file_store(dir: &TempDir, backend: &Arc<RecordingBackend>) -> CartStore {
    CartStore::new(Arc::new(FileStorage::new(dir.path())), backend.clone())
}

// =============================================================================
// Scenario
// =============================================================================

#[tokio::test]
async fn test_add_update_then_checkout_empty_cart() {
    let dir = TempDir::new();
    let backend = Arc::new(RecordingBackend::new());
    let cart = file_store(&dir, &backend);
    let sock = product("donning-sock", "Donning Sock", &[("V1", "20.00")]);

    cart.add_item(input(&sock, "V1", 1));
    assert_eq!(cart.total_items(), 1);
    assert_eq!(cart.total_price().display(), "$20.00");

    cart.add_item(input(&sock, "V1", 1));
    assert_eq!(cart.total_items(), 2);
    assert_eq!(cart.line_count(), 1);
    assert_eq!(cart.items()[0].quantity, 2);

    cart.update_quantity(&VariantId::new("V1"), 0);
    assert!(cart.items().is_empty());

    let err = cart.create_checkout().await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_totals_for_mixed_lines() {
    let dir = TempDir::new();
    let backend = Arc::new(RecordingBackend::new());
    let cart = file_store(&dir, &backend);
    let sock = product("donning-sock", "Donning Sock", &[("V1", "10.00"), ("V2", "5.50")]);

    cart.add_item(input(&sock, "V1", 2));
    cart.add_item(input(&sock, "V2", 1));

    assert_eq!(cart.total_items(), 3);
    assert_eq!(cart.total_price().display(), "$25.50");
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_cart_survives_restart() {
    let dir = TempDir::new();
    let backend = Arc::new(RecordingBackend::new());
    let sock = product("donning-sock", "Donning Sock", &[("V1", "10.00"), ("V2", "5.50")]);

    let before = {
        let cart = file_store(&dir, &backend);
        cart.add_item(input(&sock, "V1", 2));
        cart.add_item(input(&sock, "V2", 1));
        let session = cart.create_checkout().await.unwrap();
        assert_eq!(cart.checkout_url(), Some(session.checkout_url));
        cart.snapshot()
    };

    let reopened = file_store(&dir, &backend);
    assert_eq!(reopened.items(), before.items);
    assert_eq!(reopened.checkout_id(), before.checkout_id);
    assert!(!reopened.is_loading());
    assert!(reopened.checkout_url().is_none());
}

#[test]
fn test_storage_holds_versioned_document() {
    let dir = TempDir::new();
    let backend = Arc::new(RecordingBackend::new());
    let cart = file_store(&dir, &backend);
    let sock = product("donning-sock", "Donning Sock", &[("V1", "10.00")]);

    cart.add_item(input(&sock, "V1", 3));

    let raw = FileStorage::new(dir.path())
        .load(CART_KEY)
        .unwrap()
        .expect("cart was written");
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["version"], 1);
    assert_eq!(json["items"][0]["variantId"], "V1");
    assert_eq!(json["items"][0]["quantity"], 3);
    assert!(json.get("isLoading").is_none());
    assert!(json.get("checkoutUrl").is_none());

    let doc = PersistedCart::decode(&raw).unwrap();
    assert_eq!(doc.items, cart.items());
}

#[test]
fn test_corrupt_file_starts_empty() {
    let dir = TempDir::new();
    FileStorage::new(dir.path())
        .save(CART_KEY, "[[[ definitely not a cart")
        .unwrap();

    let backend = Arc::new(RecordingBackend::new());
    let cart = file_store(&dir, &backend);
    assert!(cart.items().is_empty());
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout_reuses_session_across_restarts() {
    let dir = TempDir::new();
    let backend = Arc::new(RecordingBackend::new());
    let sock = product("donning-sock", "Donning Sock", &[("V1", "10.00")]);

    let first = {
        let cart = file_store(&dir, &backend);
        cart.add_item(input(&sock, "V1", 1));
        cart.create_checkout().await.unwrap()
    };

    let cart = file_store(&dir, &backend);
    cart.update_quantity(&VariantId::new("V1"), 4);
    let second = cart.create_checkout().await.unwrap();

    assert_eq!(second.checkout_id, first.checkout_id);
    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].0[0].quantity, 4);
    assert_eq!(requests[1].1.as_ref(), Some(&first.checkout_id));
}

#[tokio::test]
async fn test_failed_checkout_keeps_previous_session() {
    let dir = TempDir::new();
    let backend = Arc::new(RecordingBackend::new());
    let cart = file_store(&dir, &backend);
    let sock = product("donning-sock", "Donning Sock", &[("V1", "10.00")]);
    cart.add_item(input(&sock, "V1", 1));

    let ok = cart.create_checkout().await.unwrap();

    backend.set_failing(true);
    let items = cart.items();
    let err = cart.create_checkout().await.unwrap_err();

    assert!(matches!(err, CheckoutError::Creation(_)));
    assert_eq!(cart.items(), items);
    assert_eq!(cart.checkout_id(), Some(ok.checkout_id.clone()));
    assert_eq!(cart.checkout_url(), Some(ok.checkout_url));
    assert!(!cart.is_loading());

    // A retry reuses the same remote session
    backend.set_failing(false);
    let retried = cart.create_checkout().await.unwrap();
    assert_eq!(retried.checkout_id, ok.checkout_id);
}

#[tokio::test]
async fn test_clear_after_checkout_starts_fresh_session() {
    let dir = TempDir::new();
    let backend = Arc::new(RecordingBackend::new());
    let cart = file_store(&dir, &backend);
    let sock = product("donning-sock", "Donning Sock", &[("V1", "10.00")]);

    cart.add_item(input(&sock, "V1", 1));
    cart.create_checkout().await.unwrap();
    cart.clear_cart();
    assert!(cart.checkout_id().is_none());

    cart.add_item(input(&sock, "V1", 1));
    cart.create_checkout().await.unwrap();

    let requests = backend.requests();
    assert!(requests[1].1.is_none());
}

#[tokio::test]
async fn test_subscriber_sees_checkout_transitions() {
    use std::sync::Mutex;

    let dir = TempDir::new();
    let backend = Arc::new(RecordingBackend::new());
    let cart = file_store(&dir, &backend);
    let sock = product("donning-sock", "Donning Sock", &[("V1", "10.00")]);
    cart.add_item(input(&sock, "V1", 1));

    let loading = Arc::new(Mutex::new(Vec::new()));
    let _sub = {
        let loading = loading.clone();
        cart.subscribe(move |snapshot| loading.lock().unwrap().push(snapshot.is_loading))
    };

    cart.create_checkout().await.unwrap();

    assert_eq!(*loading.lock().unwrap(), vec![true, false]);
}
