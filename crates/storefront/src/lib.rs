//! Lumière storefront library.
//!
//! Catalog browsing, search and a Shopify-backed cart, exposed as a JSON
//! HTTP service and reused by the `lumiere` CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod commerce;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod search;
pub mod shopify;
pub mod state;
pub mod storage;
pub mod subscription;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
