//! Debounced type-ahead search.
//!
//! Each keystroke restarts a short timer; only when the timer expires is a
//! suggestion request sent. Restarting cancels the *timer* only. A request
//! that has already been sent runs to completion in its own task, and its
//! result is published only if no newer input arrived in the meantime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::commerce::CommerceApi;
use crate::shopify::ProductSummary;

use super::{SUGGESTION_LIMIT, SearchTerm};

/// Quiet period before a request is sent.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Latest published suggestions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    /// Input the results belong to, as typed.
    pub query: String,
    pub products: Vec<ProductSummary>,
    /// A request for `query` is in flight.
    pub loading: bool,
    /// Backend failure message; `products` is empty when set.
    pub error: Option<String>,
}

/// Debounces raw input into suggestion requests.
pub struct SearchDebouncer {
    api: Arc<dyn CommerceApi>,
    window: Duration,
    limit: i64,
    generation: Arc<AtomicU64>,
    timer: Mutex<Option<JoinHandle<()>>>,
    results: Arc<watch::Sender<SearchResults>>,
}

impl SearchDebouncer {
    #[must_use]
    pub fn new(api: Arc<dyn CommerceApi>) -> Self {
        let (results, _) = watch::channel(SearchResults::default());
        Self {
            api,
            window: DEFAULT_DEBOUNCE,
            limit: SUGGESTION_LIMIT,
            generation: Arc::new(AtomicU64::new(0)),
            timer: Mutex::new(None),
            results: Arc::new(results),
        }
    }

    /// Override the quiet period.
    #[must_use]
    pub const fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Watch published results.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchResults> {
        self.results.subscribe()
    }

    /// Current results.
    #[must_use]
    pub fn results(&self) -> SearchResults {
        self.results.borrow().clone()
    }

    /// Feed the latest input.
    ///
    /// Input under the length threshold clears the results immediately and
    /// sends nothing.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn input(&self, raw: &str) {
        self.cancel_timer();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(term) = SearchTerm::parse(raw) else {
            self.results.send_replace(SearchResults {
                query: raw.to_string(),
                ..SearchResults::default()
            });
            return;
        };

        let api = Arc::clone(&self.api);
        let results = Arc::clone(&self.results);
        let current = Arc::clone(&self.generation);
        let window = self.window;
        let limit = self.limit;
        let query = raw.to_string();

        let timer = tokio::spawn(async move {
            tokio::time::sleep(window).await;

            results.send_modify(|r| {
                r.query.clone_from(&query);
                r.loading = true;
            });

            // Detached: later input must not abort a request already sent
            tokio::spawn(async move {
                debug!(term = %term, generation, "Sending suggestion request");
                let outcome = api.suggest_products(term.as_str(), limit).await;

                if current.load(Ordering::SeqCst) != generation {
                    debug!(term = %term, "Discarding stale suggestions");
                    return;
                }

                let published = match outcome {
                    Ok(products) => SearchResults {
                        query,
                        products,
                        loading: false,
                        error: None,
                    },
                    Err(e) => {
                        warn!(term = %term, error = %e, "Suggestion request failed");
                        SearchResults {
                            query,
                            products: Vec::new(),
                            loading: false,
                            error: Some(e.first_message()),
                        }
                    }
                };
                results.send_replace(published);
            });
        });

        *self.timer.lock().unwrap_or_else(PoisonError::into_inner) = Some(timer);
    }

    /// Drop any pending input and ignore in-flight responses.
    pub fn cancel(&self) {
        self.cancel_timer();
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn cancel_timer(&self) {
        if let Some(timer) = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            timer.abort();
        }
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
