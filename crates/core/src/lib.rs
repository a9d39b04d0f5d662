//! Lumière Core - Shared types library.
//!
//! This crate provides common types used across all Lumière components:
//! - `storefront` - Headless storefront server and cart store
//! - `cli` - Terminal client for catalog browsing and cart management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for backend IDs, prices, and the
//!   free-shipping threshold math

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
