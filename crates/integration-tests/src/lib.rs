//! Integration tests for the Lumière storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p lumiere-integration-tests
//! ```
//!
//! No Shopify credentials are needed: every test runs against
//! [`InMemoryCommerce`], either directly through a [`CartStore`] or
//! through the HTTP service bound to an ephemeral local port.
//!
//! # Test Categories
//!
//! - `cart_flow` - cart store lifecycle, persistence across reloads
//! - `storefront_routes` - the JSON service over real HTTP with cookies

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use lumiere_core::DEFAULT_FREE_SHIPPING_THRESHOLD;
use lumiere_storefront::cart::{CartStore, FileCartIdStore};
use lumiere_storefront::routes;
use lumiere_storefront::state::AppState;
use lumiere_storefront::testing::{InMemoryCommerce, sample_collection, sample_product};
use reqwest::Client;
use rust_decimal::Decimal;
use tokio::task::JoinHandle;

/// Variant id of the "Vanilla Bean" candle in [`catalog`].
pub const VANILLA: &str = "gid://shopify/ProductVariant/vanilla-bean";

/// Variant id of the "Lavender Fields" candle in [`catalog`].
pub const LAVENDER: &str = "gid://shopify/ProductVariant/lavender-fields";

/// A small candle catalog with one collection and a 10% `WELCOME10` code.
#[must_use]
pub fn catalog() -> Arc<InMemoryCommerce> {
    let api = InMemoryCommerce::new();
    api.add_product(sample_product("vanilla-bean", "Vanilla Bean", "32.00"));
    api.add_product(sample_product("lavender-fields", "Lavender Fields", "28.00"));
    api.add_product(sample_product("cedar-smoke", "Cedar Smoke", "36.00"));
    api.add_collection(
        sample_collection("best-sellers", "Best Sellers"),
        &["vanilla-bean", "cedar-smoke"],
    );
    api.add_discount_code("WELCOME10", Decimal::TEN);
    Arc::new(api)
}

/// A cart store persisting its id to `path`, as one CLI run would build it.
#[must_use]
pub fn file_backed_store(api: Arc<InMemoryCommerce>, path: &Path) -> CartStore {
    CartStore::new(api, Arc::new(FileCartIdStore::new(path)))
}

/// The storefront service running on a local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub api: Arc<InMemoryCommerce>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Serve the storefront over `api` on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn spawn(api: Arc<InMemoryCommerce>) -> Self {
        let state = AppState::with_api(api.clone(), DEFAULT_FREE_SHIPPING_THRESHOLD);
        let app = routes::app(state, false);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("Failed to bind test listener: {e}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("Failed to read test listener address: {e}"));

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, api, handle }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// A client keeping the session cookie and reporting redirects instead
    /// of following them, like one browser tab.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn browser(&self) -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|e| panic!("Failed to create HTTP client: {e}"))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
