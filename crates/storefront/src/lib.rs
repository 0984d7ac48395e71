//! Shopfront storefront library.
//!
//! Catalog reads against the Shopify Storefront API, a persistent shopping
//! cart, and checkout orchestration. The `shopfront` CLI is a thin shell
//! over [`state::AppState`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod shopify;
pub mod state;
