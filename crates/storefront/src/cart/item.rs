//! Cart line items and the product snapshot they carry.

use serde::{Deserialize, Serialize};
use shopfront_core::{Money, MoneyError, ProductId, VariantId};

use crate::catalog::{ResolvedImage, resolve_product_image};
use crate::shopify::types::{Image, PriceRange, Product, ProductVariant, SelectedOption};

/// Catalog data needed to display a cart line.
///
/// Captured when the item is added and never refreshed; the cart does not
/// re-validate prices against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReference {
    pub id: ProductId,
    pub title: String,
    pub handle: String,
    pub product_type: String,
    pub images: Vec<Image>,
    pub price_range: PriceRange,
}

impl ProductReference {
    /// The image to render for this product.
    #[must_use]
    pub fn image(&self) -> ResolvedImage {
        resolve_product_image(&self.images, &self.product_type, &self.handle, &self.title)
    }
}

impl From<&Product> for ProductReference {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            title: product.title.clone(),
            handle: product.handle.clone(),
            product_type: product.product_type.clone(),
            images: product
                .featured_image
                .iter()
                .chain(product.images.iter())
                .cloned()
                .collect(),
            price_range: product.price_range.clone(),
        }
    }
}

/// One line of the cart: a variant and how many of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub variant_id: VariantId,
    pub variant_title: String,
    pub product: ProductReference,
    /// Unit price when the item was added.
    pub price: Money,
    /// Always at least 1 inside a cart.
    pub quantity: u32,
    pub selected_options: Vec<SelectedOption>,
}

impl CartItem {
    /// Unit price times quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored price is not a decimal number.
    pub fn line_total(&self) -> Result<Money, MoneyError> {
        self.price.times(self.quantity)
    }

    /// Variant title for display; Shopify's placeholder title is hidden.
    #[must_use]
    pub fn display_variant_title(&self) -> Option<&str> {
        let title = self.variant_title.trim();
        (!title.is_empty() && title != "Default Title").then_some(title)
    }
}

/// What the shopper asked to add.
///
/// `quantity` is signed so that bad input from the UI reaches the store,
/// which ignores anything below 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemInput {
    pub variant_id: VariantId,
    pub variant_title: String,
    pub product: ProductReference,
    pub price: Money,
    pub quantity: i64,
    pub selected_options: Vec<SelectedOption>,
}

impl CartItemInput {
    /// Build an input for `quantity` of one variant of a catalog product.
    #[must_use]
    pub fn from_variant(product: &Product, variant: &ProductVariant, quantity: i64) -> Self {
        Self {
            variant_id: variant.id.clone(),
            variant_title: variant.title.clone(),
            product: ProductReference::from(product),
            price: variant.price.clone(),
            quantity,
            selected_options: variant.selected_options.clone(),
        }
    }

    /// Turn the input into a cart line, or `None` if it must be ignored.
    pub(crate) fn into_item(self) -> Option<CartItem> {
        let quantity = clamp_quantity(self.quantity)?;
        if self.variant_id.is_blank() {
            return None;
        }
        Some(CartItem {
            variant_id: self.variant_id,
            variant_title: self.variant_title,
            product: self.product,
            price: self.price,
            quantity,
            selected_options: self.selected_options,
        })
    }
}

/// Map a requested quantity onto a valid stored quantity.
///
/// Non-positive values yield `None`; oversized values saturate.
pub(crate) fn clamp_quantity(quantity: i64) -> Option<u32> {
    if quantity < 1 {
        return None;
    }
    Some(u32::try_from(quantity).unwrap_or(u32::MAX))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn reference(handle: &str) -> ProductReference {
        ProductReference {
            id: ProductId::new(format!("gid://shopify/Product/{handle}")),
            title: handle.replace('-', " "),
            handle: handle.to_string(),
            product_type: "Donning Sock".to_string(),
            images: vec![],
            price_range: PriceRange {
                min_variant_price: Money::new("20.00", "USD"),
                max_variant_price: Money::new("20.00", "USD"),
            },
        }
    }

    pub fn input(variant_id: &str, price: &str, quantity: i64) -> CartItemInput {
        CartItemInput {
            variant_id: VariantId::new(variant_id),
            variant_title: "Medium".to_string(),
            product: reference("donning-sock"),
            price: Money::new(price, "USD"),
            quantity,
            selected_options: vec![SelectedOption {
                name: "Size".to_string(),
                value: "Medium".to_string(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::fixtures::input;
    use super::*;

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(0), None);
        assert_eq!(clamp_quantity(-5), None);
        assert_eq!(clamp_quantity(3), Some(3));
        assert_eq!(clamp_quantity(i64::MAX), Some(u32::MAX));
    }

    #[test]
    fn test_into_item_rejects_blank_variant() {
        assert!(input("  ", "1.00", 1).into_item().is_none());
        assert!(input("V1", "1.00", 0).into_item().is_none());
        assert_eq!(input("V1", "1.00", 2).into_item().unwrap().quantity, 2);
    }

    #[test]
    fn test_line_total() {
        let item = input("V1", "10.00", 2).into_item().unwrap();
        assert_eq!(
            item.line_total().unwrap().decimal().unwrap(),
            Decimal::new(2000, 2)
        );
    }

    #[test]
    fn test_display_variant_title_hides_default() {
        let mut item = input("V1", "1.00", 1).into_item().unwrap();
        assert_eq!(item.display_variant_title(), Some("Medium"));
        item.variant_title = "Default Title".to_string();
        assert_eq!(item.display_variant_title(), None);
    }

    #[test]
    fn test_reference_image_uses_fallback() {
        let image = input("V1", "1.00", 1).product.image();
        assert!(image.is_fallback());
    }
}
