//! Recently searched terms, most recent first.

use std::sync::Arc;

use tracing::warn;

use crate::storage::{KeyValueStorage, PersistenceError};

/// Storage key for the recent-search list.
pub const RECENT_SEARCHES_KEY: &str = "lumiere_recent_searches";

/// Terms kept.
pub const MAX_RECENT_SEARCHES: usize = 5;

/// Recent searches kept in key/value storage as a JSON array.
#[derive(Clone)]
pub struct RecentSearches {
    storage: Arc<dyn KeyValueStorage>,
}

impl RecentSearches {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Stored terms, most recent first. Unreadable or malformed data reads
    /// as an empty list.
    #[must_use]
    pub fn load(&self) -> Vec<String> {
        let raw = match self.storage.get(RECENT_SEARCHES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read recent searches");
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring malformed recent searches");
            Vec::new()
        })
    }

    /// Move `term` to the front, dropping duplicates and the oldest entries
    /// past the limit. Blank terms are ignored.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the list cannot be written.
    pub fn record(&self, term: &str) -> Result<Vec<String>, PersistenceError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(self.load());
        }

        let mut terms = self.load();
        terms.retain(|t| t != term);
        terms.insert(0, term.to_string());
        terms.truncate(MAX_RECENT_SEARCHES);

        self.storage
            .set(RECENT_SEARCHES_KEY, &serde_json::to_string(&terms)?)?;
        Ok(terms)
    }

    /// Forget every term.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the list cannot be removed.
    pub fn clear(&self) -> Result<(), PersistenceError> {
        self.storage.remove(RECENT_SEARCHES_KEY)
    }
}
