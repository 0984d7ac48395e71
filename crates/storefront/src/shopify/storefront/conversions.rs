//! Conversions from raw response shapes to domain types.

use shopfront_core::{ProductId, VariantId};

use super::queries::{Connection, RawProduct, RawVariant};
use crate::shopify::types::{CartUserError, PageInfo, Product, ProductConnection, ProductVariant};

pub fn convert_product(product: RawProduct) -> Product {
    Product {
        id: ProductId::new(product.id),
        handle: product.handle,
        title: product.title,
        description: product.description,
        available_for_sale: product.available_for_sale,
        product_type: product.product_type,
        vendor: product.vendor,
        tags: product.tags,
        price_range: product.price_range,
        featured_image: product.featured_image,
        images: product.images.into_nodes(),
        variants: product
            .variants
            .into_nodes()
            .into_iter()
            .map(convert_variant)
            .collect(),
    }
}

fn convert_variant(variant: RawVariant) -> ProductVariant {
    ProductVariant {
        id: VariantId::new(variant.id),
        title: variant.title,
        available_for_sale: variant.available_for_sale,
        price: variant.price,
        selected_options: variant.selected_options,
    }
}

pub fn convert_product_connection(conn: Connection<RawProduct>) -> ProductConnection {
    let page_info = conn
        .page_info
        .as_ref()
        .map(|p| PageInfo {
            has_next_page: p.has_next_page,
            end_cursor: p.end_cursor.clone(),
        })
        .unwrap_or_default();

    ProductConnection {
        products: conn.into_nodes().into_iter().map(convert_product).collect(),
        page_info,
    }
}

/// Join mutation user errors into one message.
pub fn join_user_errors(errors: &[CartUserError]) -> String {
    errors
        .iter()
        .map(|e| match &e.field {
            Some(field) if !field.is_empty() => format!("{} ({})", e.message, field.join(".")),
            _ => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shopify::storefront::queries::get_products;

    const PRODUCTS_JSON: &str = r#"{
        "products": {
            "edges": [
                {
                    "node": {
                        "id": "gid://shopify/Product/1",
                        "handle": "donning-sock",
                        "title": "Donning Sock",
                        "description": "Slide stockings on",
                        "availableForSale": true,
                        "productType": "Donning Aid",
                        "vendor": "Shopfront",
                        "tags": ["donning"],
                        "priceRange": {
                            "minVariantPrice": { "amount": "20.0", "currencyCode": "USD" },
                            "maxVariantPrice": { "amount": "24.0", "currencyCode": "USD" }
                        },
                        "featuredImage": null,
                        "images": { "edges": [] },
                        "variants": {
                            "edges": [
                                {
                                    "node": {
                                        "id": "gid://shopify/ProductVariant/11",
                                        "title": "Medium",
                                        "availableForSale": true,
                                        "price": { "amount": "20.0", "currencyCode": "USD" },
                                        "selectedOptions": [{ "name": "Size", "value": "Medium" }]
                                    }
                                }
                            ]
                        }
                    }
                }
            ],
            "pageInfo": { "hasNextPage": true, "endCursor": "abc" }
        }
    }"#;

    #[test]
    fn test_convert_product_connection() {
        let data: get_products::ResponseData = serde_json::from_str(PRODUCTS_JSON).unwrap();
        let conn = convert_product_connection(data.products);

        assert!(conn.page_info.has_next_page);
        assert_eq!(conn.page_info.end_cursor.as_deref(), Some("abc"));
        assert_eq!(conn.products.len(), 1);

        let product = &conn.products[0];
        assert_eq!(product.handle, "donning-sock");
        assert_eq!(product.product_type, "Donning Aid");
        assert!(product.images.is_empty());
        assert_eq!(product.variants[0].id.as_str(), "gid://shopify/ProductVariant/11");
        assert_eq!(product.variants[0].selected_options[0].value, "Medium");
        assert_eq!(product.price_range.max_variant_price.amount, "24.0");
    }

    #[test]
    fn test_join_user_errors() {
        let errors = vec![
            CartUserError {
                code: Some("INVALID".to_string()),
                field: Some(vec!["lines".to_string(), "0".to_string()]),
                message: "Merchandise does not exist".to_string(),
            },
            CartUserError {
                code: None,
                field: None,
                message: "Try again".to_string(),
            },
        ];
        assert_eq!(
            join_user_errors(&errors),
            "Merchandise does not exist (lines.0); Try again"
        );
    }
}
