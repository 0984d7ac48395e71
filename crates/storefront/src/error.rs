//! Unified error handling with Sentry integration.
//!
//! Each module reports its own error enum; [`AppError`] wraps them for the
//! application shell, which captures server-side failures to Sentry before
//! reporting them to the user.

use thiserror::Error;

use crate::cart::CheckoutError;
use crate::catalog::CatalogError;
use crate::config::ConfigError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Product data could not be fetched.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Checkout could not be created.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Whether the user caused this error and can fix it themselves.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Checkout(CheckoutError::EmptyCart | CheckoutError::InProgress)
        )
    }

    /// Report the error: server-side failures go to Sentry, user errors are
    /// only logged.
    pub fn report(&self) {
        if self.is_user_error() {
            tracing::debug!(error = %self, "User error");
            return;
        }

        let event_id = sentry::capture_error(self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Command failed"
        );
    }

    /// Message safe to show the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Catalog(_) => "Could not load products, please try again".to_string(),
            Self::Checkout(CheckoutError::Creation(_)) => {
                "Could not start checkout, please try again".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "add_item", Some(&[("variant_id", "gid://shopify/ProductVariant/1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
