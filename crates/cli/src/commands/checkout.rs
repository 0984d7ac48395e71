//! Checkout command.

use shopfront_storefront::error::Result;
use shopfront_storefront::state::AppState;

use crate::output;

/// Create (or refresh) the hosted checkout for the cart and print its URL.
pub async fn run(state: &AppState) -> Result<()> {
    let session = state.cart().create_checkout().await?;
    tracing::info!(checkout_id = %session.checkout_id, "Checkout ready");

    output::print(&format!("Checkout: {}", session.checkout_url));
    Ok(())
}
