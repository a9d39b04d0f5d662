//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Health check
//!
//! # Catalog
//! GET  /products                    - Product page (?first, ?after)
//! GET  /products/{handle}           - Product detail
//! GET  /collections                 - Collection listing
//! GET  /collections/{handle}        - Collection with products (?first, ?after)
//!
//! # Search
//! GET  /search                      - Full search results (?q)
//! GET  /api/search                  - Type-ahead suggestions (?q)
//! GET  /api/search/popular          - Popular search terms
//!
//! # Cart (JSON, one cart per session)
//! GET  /api/cart                    - Current cart
//! POST /api/cart/add                - Add a variant
//! POST /api/cart/update             - Set a line quantity
//! POST /api/cart/remove             - Remove a line
//! POST /api/cart/discount-codes     - Replace discount codes
//!
//! # Subscriptions
//! GET  /api/subscription/config     - Widget SDK configuration
//! POST /api/subscription/add-to-cart - Widget add-to-cart event
//!
//! # Checkout
//! GET  /checkout                    - Redirect to Shopify checkout
//! ```

pub mod cart;
pub mod collections;
pub mod products;
pub mod search;
pub mod subscription;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::session_layer;
use crate::state::AppState;

/// Products per page when `first` is not given.
pub const DEFAULT_PAGE_SIZE: i64 = 12;

/// Upper bound on `first`.
pub const MAX_PAGE_SIZE: i64 = 50;

/// Cursor pagination query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub first: Option<i64>,
    pub after: Option<String>,
}

impl PageQuery {
    /// Requested page size, clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn page_size(&self) -> i64 {
        self.first.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{handle}", get(products::show))
}

/// Create the collection routes router.
pub fn collection_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(collections::index))
        .route("/{handle}", get(collections::show))
}

/// Create the search API routes router.
pub fn search_api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(search::suggest))
        .route("/popular", get(search::popular))
}

/// Create the cart API routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/discount-codes", post(cart::discount_codes))
}

/// Create the subscription widget routes router.
pub fn subscription_routes() -> Router<AppState> {
    Router::new()
        .route("/config", get(subscription::config))
        .route("/add-to-cart", post(subscription::add_to_cart))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/products", product_routes())
        .nest("/collections", collection_routes())
        .route("/search", get(search::search_page))
        .nest("/api/search", search_api_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/subscription", subscription_routes())
        .route("/checkout", get(cart::checkout))
}

/// The full application: routes, sessions, tracing and Sentry.
///
/// `secure_cookies` sets the `Secure` flag on the session cookie.
pub fn app(state: AppState, secure_cookies: bool) -> Router {
    routes()
        .layer(session_layer(secure_cookies))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, Response, header};
    use lumiere_core::DEFAULT_FREE_SHIPPING_THRESHOLD;
    use tower::ServiceExt;

    use super::app;
    use crate::state::AppState;
    use crate::testing::{InMemoryCommerce, sample_collection, sample_product};

    /// A catalog of three candles, one collection, and a discount code.
    pub fn backend() -> Arc<InMemoryCommerce> {
        let api = InMemoryCommerce::new();
        api.add_product(sample_product("vanilla-bean", "Vanilla Bean", "32.00"));
        api.add_product(sample_product("lavender-fields", "Lavender Fields", "28.00"));
        api.add_product(sample_product("cedar-smoke", "Cedar & Smoke", "36.00"));
        api.add_collection(
            sample_collection("best-sellers", "Best Sellers"),
            &["vanilla-bean", "cedar-smoke"],
        );
        api.add_discount_code("WELCOME10", rust_decimal::Decimal::TEN);
        Arc::new(api)
    }

    pub fn router(api: Arc<InMemoryCommerce>) -> axum::Router {
        app(
            AppState::with_api(api, DEFAULT_FREE_SHIPPING_THRESHOLD),
            false,
        )
    }

    pub async fn send(router: &axum::Router, request: Request<Body>) -> Response<Body> {
        router.clone().oneshot(request).await.unwrap()
    }

    pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::get(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    pub fn post_json(uri: &str, body: &serde_json::Value, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    /// The `name=value` part of the session cookie, if one was set.
    pub fn session_cookie(response: &Response<Body>) -> Option<String> {
        response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(ToString::to_string)
    }

    pub async fn json(response: Response<Body>) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }
}
