//! Catalog browsing commands.

use shopfront_storefront::catalog::ProductFilter;
use shopfront_storefront::error::{AppError, Result};
use shopfront_storefront::state::AppState;

use crate::output;

/// List up to `limit` products.
pub async fn list(state: &AppState, limit: usize, filter: Option<&ProductFilter>) -> Result<()> {
    let products = state.catalog().get_products(limit, filter).await?;
    tracing::info!(count = products.len(), "Fetched products");

    output::print(&output::render_products(&products));
    Ok(())
}

/// Show a product and its variants.
pub async fn show(state: &AppState, handle: &str) -> Result<()> {
    let product = state
        .catalog()
        .get_product(handle)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {handle}")))?;

    output::print(&output::render_product(&product));
    Ok(())
}
