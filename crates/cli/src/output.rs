//! Terminal rendering.
//!
//! Rendering is kept separate from printing so the text can be tested.

use std::fmt::Write as _;

use shopfront_storefront::cart::CartSnapshot;
use shopfront_storefront::catalog::product_image;
use shopfront_storefront::shopify::Product;

#[allow(clippy::print_stdout)]
pub fn print(text: &str) {
    println!("{text}");
}

#[allow(clippy::print_stderr)]
pub fn error(text: &str) {
    eprintln!("error: {text}");
}

fn price_label(product: &Product) -> String {
    let min = &product.price_range.min_variant_price;
    let max = &product.price_range.max_variant_price;
    if min == max {
        min.display()
    } else {
        format!("{} - {}", min.display(), max.display())
    }
}

pub fn render_products(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products found.".to_string();
    }

    let mut out = String::new();
    for product in products {
        let sold_out = if product.available_for_sale { "" } else { "  [sold out]" };
        let _ = writeln!(
            out,
            "{:<32} {:<40} {}{sold_out}",
            product.handle,
            product.title,
            price_label(product)
        );
    }
    out.trim_end().to_string()
}

pub fn render_product(product: &Product) -> String {
    let image = product_image(product);
    let mut out = String::new();

    let _ = writeln!(out, "{} ({})", product.title, product.handle);
    if !product.product_type.is_empty() {
        let _ = writeln!(out, "Type:   {}", product.product_type);
    }
    if !product.vendor.is_empty() {
        let _ = writeln!(out, "Vendor: {}", product.vendor);
    }
    let _ = writeln!(out, "Price:  {}", price_label(product));
    let _ = writeln!(
        out,
        "Image:  {}{}",
        image.url,
        if image.is_fallback() { " (placeholder)" } else { "" }
    );
    if !product.description.is_empty() {
        let _ = writeln!(out, "\n{}", product.description.trim());
    }

    if !product.variants.is_empty() {
        let _ = writeln!(out, "\nVariants:");
        for variant in &product.variants {
            let availability = if variant.available_for_sale { "" } else { "  [sold out]" };
            let _ = writeln!(
                out,
                "  {:<24} {:>10}  {}{availability}",
                variant.title,
                variant.price.display(),
                variant.id
            );
        }
    }
    out.trim_end().to_string()
}

pub fn render_cart(cart: &CartSnapshot) -> String {
    if cart.items.is_empty() {
        return "Cart is empty.".to_string();
    }

    let mut out = String::new();
    for item in &cart.items {
        let title = match item.display_variant_title() {
            Some(variant) => format!("{} - {variant}", item.product.title),
            None => item.product.title.clone(),
        };
        let line_total = item
            .line_total()
            .map_or_else(|_| item.price.display(), |total| total.display());
        let _ = writeln!(
            out,
            "{:>4} x {:<40} {:>10}  {}",
            item.quantity, title, line_total, item.variant_id
        );
    }

    let _ = writeln!(
        out,
        "\n{} item(s), total {}",
        cart.total_items,
        cart.total_price.display()
    );
    if let Some(url) = &cart.checkout_url {
        let _ = writeln!(out, "Checkout: {url}");
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use shopfront_core::{Money, ProductId, VariantId};
    use shopfront_storefront::cart::{CartItem, ProductReference};
    use shopfront_storefront::shopify::{PriceRange, ProductVariant};

    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new("gid://shopify/Product/1"),
            handle: "donning-sock".to_string(),
            title: "Donning Sock".to_string(),
            description: "Slides compression stockings on.".to_string(),
            available_for_sale: true,
            product_type: "Donning Sock".to_string(),
            vendor: "Shopfront".to_string(),
            tags: vec![],
            price_range: PriceRange {
                min_variant_price: Money::new("12.00", "USD"),
                max_variant_price: Money::new("14.00", "USD"),
            },
            featured_image: None,
            images: vec![],
            variants: vec![ProductVariant {
                id: VariantId::new("gid://shopify/ProductVariant/1"),
                title: "Medium".to_string(),
                available_for_sale: false,
                price: Money::new("12.00", "USD"),
                selected_options: vec![],
            }],
        }
    }

    #[test]
    fn test_render_products() {
        assert_eq!(render_products(&[]), "No products found.");

        let text = render_products(&[product()]);
        assert!(text.contains("donning-sock"));
        assert!(text.contains("$12.00 - $14.00"));
        assert!(!text.contains("sold out"));
    }

    #[test]
    fn test_render_product_marks_placeholder_and_sold_out_variants() {
        let text = render_product(&product());
        assert!(text.contains("(placeholder)"));
        assert!(text.contains("Medium"));
        assert!(text.contains("[sold out]"));
    }

    #[test]
    fn test_render_cart() {
        let p = product();
        let item = CartItem {
            variant_id: VariantId::new("V1"),
            variant_title: "Default Title".to_string(),
            product: ProductReference::from(&p),
            price: Money::new("10.00", "USD"),
            quantity: 2,
            selected_options: vec![],
        };
        let cart = CartSnapshot {
            items: vec![item],
            is_loading: false,
            checkout_url: Some("https://shop.test/c/1".to_string()),
            checkout_id: None,
            total_items: 2,
            total_price: Money::new("20.00", "USD"),
        };

        let text = render_cart(&cart);
        assert!(text.contains("2 x Donning Sock "));
        assert!(!text.contains("Default Title"));
        assert!(text.contains("$20.00"));
        assert!(text.contains("2 item(s), total $20.00"));
        assert!(text.contains("Checkout: https://shop.test/c/1"));
    }

    #[test]
    fn test_render_empty_cart() {
        let cart = CartSnapshot {
            items: vec![],
            is_loading: false,
            checkout_url: None,
            checkout_id: None,
            total_items: 0,
            total_price: Money::new("0.00", "USD"),
        };
        assert_eq!(render_cart(&cart), "Cart is empty.");
    }
}
