//! Product filters and their Storefront search syntax.

use std::fmt;

/// Restricts a product listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProductFilter {
    /// Products carrying a tag.
    Tag(String),
    /// Products of a product type.
    ProductType(String),
    /// Products from a vendor.
    Vendor(String),
    /// Products in the collection with this handle.
    Collection(String),
    /// A raw Storefront search expression, passed through untouched.
    Query(String),
}

impl ProductFilter {
    /// Render as a Storefront API `query` argument.
    ///
    /// `Collection` is not expressible in search syntax; it renders as a
    /// `collection:` term for logging only, and the catalog
    /// routes it to the collection query instead.
    #[must_use]
    pub fn to_search_query(&self) -> String {
        match self {
            Self::Tag(tag) => format!("tag:{}", quote(tag)),
            Self::ProductType(kind) => format!("product_type:{}", quote(kind)),
            Self::Vendor(vendor) => format!("vendor:{}", quote(vendor)),
            Self::Collection(handle) => format!("collection:{}", quote(handle)),
            Self::Query(raw) => raw.clone(),
        }
    }
}

impl fmt::Display for ProductFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_search_query())
    }
}

/// Quote a search term, escaping backslashes and double quotes.
fn quote(term: &str) -> String {
    let escaped = term.trim().replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
