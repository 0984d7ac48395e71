//! Cart commands.
//!
//! Every mutation is persisted by the cart store before the command prints
//! the resulting cart.

use shopfront_core::VariantId;
use shopfront_storefront::cart::CartItemInput;
use shopfront_storefront::error::{AppError, Result};
use shopfront_storefront::state::AppState;

use crate::output;

/// Notice for an add that the cart store will ignore.
fn ignored_quantity_notice(quantity: i64) -> Option<String> {
    (quantity < 1).then(|| format!("Nothing added: quantity must be at least 1, got {quantity}."))
}

pub fn show(state: &AppState) {
    output::print(&output::render_cart(&state.cart().snapshot()));
}

/// Add `quantity` of a product variant to the cart.
///
/// Without `variant`, the product's first purchasable variant is used.
pub async fn add(
    state: &AppState,
    handle: &str,
    variant: Option<&str>,
    quantity: i64,
) -> Result<()> {
    if let Some(notice) = ignored_quantity_notice(quantity) {
        output::print(&notice);
        show(state);
        return Ok(());
    }

    let product = state
        .catalog()
        .get_product(handle)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {handle}")))?;

    let chosen = match variant {
        Some(id) => product.variant(&VariantId::new(id)),
        None => product.default_variant(),
    }
    .ok_or_else(|| {
        AppError::NotFound(format!(
            "variant {} of {handle}",
            variant.unwrap_or("(default)")
        ))
    })?;

    if !chosen.available_for_sale {
        tracing::warn!(variant_id = %chosen.id, "Adding a variant that is not available for sale");
    }

    state
        .cart()
        .add_item(CartItemInput::from_variant(&product, chosen, quantity));
    show(state);
    Ok(())
}

pub fn update(state: &AppState, variant: &str, quantity: i64) {
    state.cart().update_quantity(&VariantId::new(variant), quantity);
    show(state);
}

pub fn remove(state: &AppState, variant: &str) {
    state.cart().remove_item(&VariantId::new(variant));
    show(state);
}

pub fn clear(state: &AppState) {
    state.cart().clear_cart();
    show(state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_positive_add_is_a_notice() {
        assert!(ignored_quantity_notice(1).is_none());
        assert_eq!(
            ignored_quantity_notice(0).as_deref(),
            Some("Nothing added: quantity must be at least 1, got 0.")
        );
        assert!(ignored_quantity_notice(-3).unwrap().contains("-3"));
    }
}
