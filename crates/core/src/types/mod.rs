//! Core types for Lumière.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod shipping;

pub use id::*;
pub use price::{CurrencyCode, Price, PriceError, format_price};
pub use shipping::{DEFAULT_FREE_SHIPPING_THRESHOLD, FreeShippingProgress};
