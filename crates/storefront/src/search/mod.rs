//! Product search: threshold-gated suggestions, debounced type-ahead,
//! recent and popular searches.
//!
//! Ranking is entirely the backend's; this module only decides when to ask.

pub mod debounce;
pub mod recent;

pub use debounce::{DEFAULT_DEBOUNCE, SearchDebouncer, SearchResults};
pub use recent::{MAX_RECENT_SEARCHES, RECENT_SEARCHES_KEY, RecentSearches};

use tracing::instrument;

use crate::commerce::CommerceApi;
use crate::shopify::{Product, ProductSummary, ShopifyError};

/// Fewest characters (after trimming) worth sending to the backend.
pub const MIN_SEARCH_LENGTH: usize = 2;

/// Suggestions returned while typing.
pub const SUGGESTION_LIMIT: i64 = 6;

/// Results on the full search page.
pub const SEARCH_RESULTS_LIMIT: i64 = 20;

/// Shown before the visitor has typed anything.
pub const POPULAR_SEARCHES: &[&str] = &[
    "Candles",
    "Vanilla",
    "Lavender",
    "Gift Sets",
    "Soy Wax",
    "Home Fragrance",
];

/// A trimmed search term long enough to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm(String);

impl SearchTerm {
    /// `None` when the trimmed input is shorter than [`MIN_SEARCH_LENGTH`]
    /// characters.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (trimmed.chars().count() >= MIN_SEARCH_LENGTH).then(|| Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Type-ahead suggestions for raw input. Short input returns an empty list
/// without calling the backend.
///
/// # Errors
///
/// Returns the backend failure.
#[instrument(skip(api))]
pub async fn suggest(api: &dyn CommerceApi, raw: &str) -> Result<Vec<ProductSummary>, ShopifyError> {
    match SearchTerm::parse(raw) {
        Some(term) => api.suggest_products(term.as_str(), SUGGESTION_LIMIT).await,
        None => Ok(Vec::new()),
    }
}

/// Full search results for raw input. Short input returns an empty list
/// without calling the backend.
///
/// # Errors
///
/// Returns the backend failure.
#[instrument(skip(api))]
pub async fn search(api: &dyn CommerceApi, raw: &str) -> Result<Vec<Product>, ShopifyError> {
    match SearchTerm::parse(raw) {
        Some(term) => api.search_products(term.as_str(), SEARCH_RESULTS_LIMIT).await,
        None => Ok(Vec::new()),
    }
}
