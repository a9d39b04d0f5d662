//! Search route handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::search::{self, POPULAR_SEARCHES};
use crate::shopify::{Product, ProductSummary};
use crate::state::AppState;

/// Search query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Type-ahead response.
#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub products: Vec<ProductSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Full search response.
#[derive(Debug, Serialize)]
pub struct SearchPage {
    pub query: String,
    pub products: Vec<Product>,
}

/// Popular searches response.
#[derive(Debug, Serialize)]
pub struct PopularSearches {
    pub searches: &'static [&'static str],
}

/// Type-ahead suggestions. A backend failure is a 500 that still carries an
/// empty product list.
#[instrument(skip(state))]
pub async fn suggest(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> (StatusCode, Json<SuggestResponse>) {
    match search::suggest(state.api().as_ref(), &query.q).await {
        Ok(products) => (
            StatusCode::OK,
            Json(SuggestResponse {
                products,
                error: None,
            }),
        ),
        Err(e) => {
            warn!(error = %e, "Suggestion search failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SuggestResponse {
                    products: Vec::new(),
                    error: Some("Search failed".to_string()),
                }),
            )
        }
    }
}

/// Full search results. A backend failure degrades to no results.
#[instrument(skip(state))]
pub async fn search_page(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<SearchPage> {
    let products = match search::search(state.api().as_ref(), &query.q).await {
        Ok(products) => products,
        Err(e) => {
            warn!(error = %e, "Search failed");
            Vec::new()
        }
    };

    Json(SearchPage {
        query: query.q.trim().to_string(),
        products,
    })
}

/// Terms to offer before anything is typed.
pub async fn popular() -> Json<PopularSearches> {
    Json(PopularSearches {
        searches: POPULAR_SEARCHES,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use lumiere_core::{DEFAULT_FREE_SHIPPING_THRESHOLD, ProductId};

    use super::super::test_support::{backend, get, json, router, send};
    use crate::commerce::MockCommerceApi;
    use crate::routes::app;
    use crate::shopify::{Money, ProductSummary, ShopifyError};
    use crate::state::AppState;

    #[tokio::test]
    async fn test_suggest_short_query_is_empty() {
        let api = backend();
        let router = router(api.clone());

        let body = json(send(&router, get("/api/search?q=v", None)).await).await;
        assert!(body["products"].as_array().unwrap().is_empty());
        assert!(api.suggest_calls().is_empty());
    }

    #[tokio::test]
    async fn test_suggest_returns_products() {
        let api = backend();
        api.add_suggestion(ProductSummary {
            id: ProductId::new("gid://shopify/Product/vanilla-bean"),
            title: "Vanilla Bean".to_string(),
            handle: "vanilla-bean".to_string(),
            price: Money::new("32.0", "USD"),
            image: None,
        });
        let router = router(api.clone());

        let response = send(&router, get("/api/search?q=vanil", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["products"][0]["handle"], "vanilla-bean");
        assert_eq!(api.suggest_calls(), vec!["vanil".to_string()]);
    }

    #[tokio::test]
    async fn test_suggest_failure_is_500_with_empty_list() {
        let mut api = MockCommerceApi::new();
        api.expect_suggest_products()
            .returning(|_, _| Err(ShopifyError::RateLimited(1)));
        let router = app(
            AppState::with_api(Arc::new(api), DEFAULT_FREE_SHIPPING_THRESHOLD),
            false,
        );

        let response = send(&router, get("/api/search?q=soy", None)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json(response).await["products"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_page() {
        let router = router(backend());
        let body = json(send(&router, get("/search?q=%20lavender%20", None)).await).await;
        assert_eq!(body["query"], "lavender");
        assert_eq!(body["products"][0]["handle"], "lavender-fields");
    }

    #[tokio::test]
    async fn test_popular() {
        let router = router(backend());
        let body = json(send(&router, get("/api/search/popular", None)).await).await;
        assert_eq!(body["searches"][0], "Candles");
    }
}
