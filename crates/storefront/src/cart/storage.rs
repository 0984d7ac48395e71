//! Durable key-value storage for the cart.
//!
//! The cart is written through on every mutation, so storage is synchronous
//! and small: one JSON document under [`CART_KEY`].

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shopfront_core::CheckoutId;
use thiserror::Error;

use super::item::CartItem;

/// Key the cart document is stored under.
pub const CART_KEY: &str = "cart";

/// Current persisted document version.
pub const CART_FORMAT_VERSION: u32 = 1;

/// Errors from reading or writing persisted state.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("Unsupported cart format version {0}")]
    UnsupportedVersion(u32),
}

/// Synchronous key-value persistence.
pub trait CartStorage: Send + Sync {
    /// Read the value under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

// =============================================================================
// Persisted document
// =============================================================================

/// The cart as written to storage.
///
/// Only items and the checkout session ID survive a restart; loading and
/// checkout-URL state belong to the running session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCart {
    pub version: u32,
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub checkout_id: Option<CheckoutId>,
    pub saved_at: DateTime<Utc>,
}

impl PersistedCart {
    #[must_use]
    pub fn new(items: Vec<CartItem>, checkout_id: Option<CheckoutId>) -> Self {
        Self {
            version: CART_FORMAT_VERSION,
            items,
            checkout_id,
            saved_at: Utc::now(),
        }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a stored document.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON or a version this build cannot read.
    pub fn decode(raw: &str) -> Result<Self, StorageError> {
        let cart: Self = serde_json::from_str(raw)?;
        if cart.version > CART_FORMAT_VERSION {
            return Err(StorageError::UnsupportedVersion(cart.version));
        }
        Ok(cart)
    }
}

// =============================================================================
// File storage
// =============================================================================

/// Stores each key as `<dir>/<key>.json`.
///
/// Writes go to a temporary file that is renamed over the old one, so a
/// crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl CartStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

// =============================================================================
// Memory storage
// =============================================================================

/// In-process storage for tests and sessions that should not outlive the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with one entry.
    #[must_use]
    pub fn with_entry(key: &str, value: impl Into<String>) -> Self {
        let storage = Self::default();
        storage
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.into());
        storage
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::item::fixtures::input;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("shopfront-storage-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = temp_dir();
        let storage = FileStorage::new(&dir);

        assert!(storage.load(CART_KEY).unwrap().is_none());
        storage.save(CART_KEY, "{\"a\":1}").unwrap();
        assert_eq!(storage.load(CART_KEY).unwrap().as_deref(), Some("{\"a\":1}"));

        // Overwrite leaves no temp file behind
        storage.save(CART_KEY, "{}").unwrap();
        assert_eq!(storage.load(CART_KEY).unwrap().as_deref(), Some("{}"));
        assert!(!dir.join("cart.json.tmp").exists());

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_file_storage_rejects_path_keys() {
        let storage = FileStorage::new(temp_dir());
        assert!(matches!(
            storage.save("../cart", "{}"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(storage.load(""), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn test_persisted_cart_roundtrip() {
        let items = vec![input("V1", "10.00", 2).into_item().unwrap()];
        let doc = PersistedCart::new(items.clone(), Some(CheckoutId::new("gid://shopify/Cart/1")));

        let decoded = PersistedCart::decode(&doc.encode().unwrap()).unwrap();
        assert_eq!(decoded, doc);
        assert_eq!(decoded.items, items);
    }

    #[test]
    fn test_persisted_cart_rejects_future_version() {
        let mut doc = PersistedCart::new(vec![], None);
        doc.version = CART_FORMAT_VERSION + 1;
        let raw = serde_json::to_string(&doc).unwrap();
        assert!(matches!(
            PersistedCart::decode(&raw),
            Err(StorageError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::with_entry(CART_KEY, "x");
        assert_eq!(storage.load(CART_KEY).unwrap().as_deref(), Some("x"));
        storage.save(CART_KEY, "y").unwrap();
        assert_eq!(storage.load(CART_KEY).unwrap().as_deref(), Some("y"));
        assert!(storage.load("other").unwrap().is_none());
    }
}
