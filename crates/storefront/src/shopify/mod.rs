//! Shopify Storefront API client.
//!
//! # Architecture
//!
//! - Uses `graphql_client` request/response envelopes for typed GraphQL
//!   operations sent with `reqwest`
//! - Shopify is source of truth - NO local sync, NO catalog cache; every call
//!   goes to the API and lives for one request
//! - Cart operations always return the full authoritative cart
//!
//! # Example
//!
//! ```rust,ignore
//! use lumiere_storefront::shopify::StorefrontClient;
//!
//! let client = StorefrontClient::new(&config.shopify);
//!
//! // Get a product
//! let product = client.get_product_by_handle("vanilla-bean").await?;
//!
//! // Create a cart and add items
//! let cart = client.create_cart().await?;
//! let cart = client.add_cart_lines(&cart.id, vec![CartLineInput::new(
//!     product.variants[0].id.clone(),
//!     1,
//! )]).await?;
//! ```

mod storefront;
pub mod types;

pub use storefront::StorefrontClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with the Shopify Storefront API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed (network, DNS, TLS, bad configuration).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The cart ID is unknown to the backend (expired or deleted).
    #[error("Cart not found: {0}")]
    CartNotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {0}")]
    UserError(String),
}

impl ShopifyError {
    /// The first message the backend reported for this failure.
    ///
    /// For GraphQL error lists this is the first entry's message; other
    /// variants return their display text.
    #[must_use]
    pub fn first_message(&self) -> String {
        match self {
            Self::GraphQL(errors) => errors
                .iter()
                .map(|e| e.message.as_str())
                .find(|m| !m.is_empty())
                .map_or_else(|| "Shopify API error".to_string(), ToString::to_string),
            Self::UserError(message) => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether this failure means the referenced cart no longer exists.
    #[must_use]
    pub const fn is_missing_cart(&self) -> bool {
        matches!(self, Self::CartNotFound(_))
    }

    /// Build a single-message GraphQL error.
    pub(crate) fn message(message: impl Into<String>) -> Self {
        Self::GraphQL(vec![GraphQLError {
            message: message.into(),
            locations: vec![],
            path: vec![],
        }])
    }
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
