//! CLI commands.
//!
//! Every command returns its rendered output; `main` prints it.

pub mod cart;
pub mod catalog;
pub mod search;

use std::path::PathBuf;
use std::sync::Arc;

use clap::ValueEnum;
use lumiere_core::DEFAULT_FREE_SHIPPING_THRESHOLD;
use lumiere_storefront::cart::{CartError, CartStore, FileCartIdStore};
use lumiere_storefront::commerce::CommerceApi;
use lumiere_storefront::config::{ConfigError, ShopifyStorefrontConfig};
use lumiere_storefront::search::RecentSearches;
use lumiere_storefront::shopify::{ShopifyError, StorefrontClient};
use lumiere_storefront::storage::{JsonFileStorage, PersistenceError};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Missing or invalid environment configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Shopify API call failed.
    #[error(transparent)]
    Shopify(#[from] ShopifyError),

    /// Cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Storage file could not be read or written.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Output could not be encoded.
    #[error("output encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// Checkout needs at least one line.
    #[error("the cart is empty")]
    EmptyCart,

    /// Nothing matched.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// How results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// What every command runs against.
pub struct Context {
    pub api: Arc<dyn CommerceApi>,
    pub storage_path: PathBuf,
    pub free_shipping_threshold: Decimal,
    pub format: OutputFormat,
}

impl Context {
    /// Context backed by the Shopify Storefront API configured in the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Config` if Shopify is not configured.
    pub fn from_env(storage_path: PathBuf, format: OutputFormat) -> Result<Self, CliError> {
        let shopify = ShopifyStorefrontConfig::from_env()?;
        let threshold = match std::env::var("FREE_SHIPPING_THRESHOLD") {
            Ok(raw) => raw.trim().parse::<Decimal>().map_err(|e| {
                ConfigError::InvalidEnvVar("FREE_SHIPPING_THRESHOLD".to_string(), e.to_string())
            })?,
            Err(_) => DEFAULT_FREE_SHIPPING_THRESHOLD,
        };

        Ok(Self {
            api: Arc::new(StorefrontClient::new(&shopify)),
            storage_path,
            free_shipping_threshold: threshold,
            format,
        })
    }

    /// A cart store remembering its cart in the storage file.
    #[must_use]
    pub fn cart_store(&self) -> CartStore {
        CartStore::new(
            Arc::clone(&self.api),
            Arc::new(FileCartIdStore::new(&self.storage_path)),
        )
    }

    #[must_use]
    pub fn recent_searches(&self) -> RecentSearches {
        RecentSearches::new(Arc::new(JsonFileStorage::new(&self.storage_path)))
    }

    /// Render `value` as JSON, or as text with `text`.
    fn render<T: Serialize>(
        &self,
        value: &T,
        text: impl FnOnce(&T) -> String,
    ) -> Result<String, CliError> {
        match self.format {
            OutputFormat::Text => Ok(text(value)),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        }
    }
}
