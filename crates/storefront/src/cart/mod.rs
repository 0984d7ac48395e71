//! Shopping cart: line items, write-through persistence, and checkout.
//!
//! [`CartStore`] is the single owner of cart state. UI code reads through
//! snapshots or [`CartStore::subscribe`] and mutates through the store's
//! methods, which validate input and persist every change.

mod checkout;
mod item;
pub mod storage;
mod store;
mod subscription;

pub use checkout::{CheckoutBackend, CheckoutError, CheckoutLine, CheckoutSession};
pub use item::{CartItem, CartItemInput, ProductReference};
pub use storage::{
    CART_FORMAT_VERSION, CART_KEY, CartStorage, FileStorage, MemoryStorage, PersistedCart,
    StorageError,
};
pub use store::{CartSnapshot, CartStore, DEFAULT_CURRENCY};
pub use subscription::Subscription;
