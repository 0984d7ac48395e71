//! Image resolution with category-specific placeholders.
//!
//! Product pages and cart lines always render an image, so
//! [`resolve_product_image`] is total: when Shopify has no usable image for
//! a product it picks a bundled placeholder that matches what the product
//! is, falling back to a generic one.

use serde::Serialize;

use crate::shopify::types::{Image, Product};

/// Which bundled placeholder stands in for a missing product image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackKind {
    DonningAid,
    GiftCard,
    Glove,
    CompressionSleeve,
    CompressionSock,
    Generic,
}

/// Order in which keyword groups are tried. More specific groups first:
/// a "Donning Sock" is a donning aid, not a sock.
const MATCH_ORDER: [FallbackKind; 5] = [
    FallbackKind::DonningAid,
    FallbackKind::GiftCard,
    FallbackKind::Glove,
    FallbackKind::CompressionSleeve,
    FallbackKind::CompressionSock,
];

impl FallbackKind {
    /// Path of the bundled placeholder image.
    #[must_use]
    pub const fn url(self) -> &'static str {
        match self {
            Self::DonningAid => "/static/images/fallback/donning-aid.webp",
            Self::GiftCard => "/static/images/fallback/gift-card.webp",
            Self::Glove => "/static/images/fallback/compression-glove.webp",
            Self::CompressionSleeve => "/static/images/fallback/compression-sleeve.webp",
            Self::CompressionSock => "/static/images/fallback/compression-sock.webp",
            Self::Generic => "/static/images/fallback/product.webp",
        }
    }

    const fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::DonningAid => &["donning", "donner", "applicator"],
            Self::GiftCard => &["gift card", "giftcard"],
            Self::Glove => &["glove", "gauntlet"],
            Self::CompressionSleeve => &["sleeve"],
            Self::CompressionSock => &["sock", "stocking", "compression", "hosiery"],
            Self::Generic => &[],
        }
    }

    /// First keyword group that matches `text`, case-insensitively.
    /// Hyphens and underscores count as spaces so handles match too.
    fn detect(text: &str) -> Option<Self> {
        let normalized = text.to_lowercase().replace(['-', '_'], " ");
        if normalized.trim().is_empty() {
            return None;
        }
        MATCH_ORDER
            .into_iter()
            .find(|kind| kind.keywords().iter().any(|k| normalized.contains(k)))
    }
}

/// Where a resolved image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "kind", rename_all = "snake_case")]
pub enum ImageSource {
    /// A real image from the product's media.
    Product,
    /// A bundled placeholder.
    Fallback(FallbackKind),
}

/// An image that can always be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedImage {
    pub url: String,
    pub alt_text: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub source: ImageSource,
}

impl ResolvedImage {
    /// Whether this is a placeholder rather than real product media.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self.source, ImageSource::Fallback(_))
    }
}

/// Pick the image to show for a product.
///
/// Uses the first image with a non-blank URL. Otherwise chooses a
/// placeholder by product type, then by handle, then by title, and finally
/// the generic placeholder. Never fails.
#[must_use]
pub fn resolve_product_image(
    images: &[Image],
    product_type: &str,
    handle: &str,
    title: &str,
) -> ResolvedImage {
    let alt_for = |alt: Option<&str>| {
        alt.map(str::trim)
            .filter(|a| !a.is_empty())
            .or_else(|| Some(title.trim()).filter(|t| !t.is_empty()))
            .unwrap_or("Product image")
            .to_string()
    };

    if let Some(image) = images.iter().find(|i| !i.url.trim().is_empty()) {
        return ResolvedImage {
            url: image.url.clone(),
            alt_text: alt_for(image.alt_text.as_deref()),
            width: image.width,
            height: image.height,
            source: ImageSource::Product,
        };
    }

    let kind = FallbackKind::detect(product_type)
        .or_else(|| FallbackKind::detect(handle))
        .or_else(|| FallbackKind::detect(title))
        .unwrap_or(FallbackKind::Generic);

    ResolvedImage {
        url: kind.url().to_string(),
        alt_text: alt_for(None),
        width: None,
        height: None,
        source: ImageSource::Fallback(kind),
    }
}

/// [`resolve_product_image`] for a catalog product, preferring its featured image.
#[must_use]
pub fn product_image(product: &Product) -> ResolvedImage {
    let images: Vec<Image> = product
        .featured_image
        .iter()
        .chain(product.images.iter())
        .cloned()
        .collect();
    resolve_product_image(&images, &product.product_type, &product.handle, &product.title)
}
