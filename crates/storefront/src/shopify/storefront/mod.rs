//! Shopify Storefront API client implementation.
//!
//! Sends `graphql_client` request bodies with `reqwest` 0.13. Nothing is
//! cached: every product, collection and cart read goes to the API.

mod conversions;
pub mod queries;

use std::sync::Arc;

use graphql_client::{GraphQLQuery, PathFragment, Response};
use lumiere_core::{CartId, CartLineId};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::types::{
    Cart, CartLineInput, CartLineUpdateInput, Collection, CollectionWithProducts, Product,
    ProductPage, ProductSummary,
};
use crate::shopify::{GraphQLError, GraphQLErrorLocation, ShopifyError};

use conversions::{
    cart_from_payload, convert_cart, convert_collection, convert_collection_with_products,
    convert_product, convert_product_connection, convert_suggestion,
};
use queries::{
    AddCartLines, CartLineInputVar, CartLineUpdateVar, CreateCart, GetCart, GetCollectionByHandle,
    GetCollections, GetProductByHandle, GetProducts, RemoveCartLines, SearchProducts,
    SuggestProducts, UpdateCartDiscountCodes, UpdateCartLines, add_cart_lines, create_cart,
    get_cart, get_collection_by_handle, get_collections, get_product_by_handle, get_products,
    remove_cart_lines, search_products, suggest_products, update_cart_discount_codes,
    update_cart_lines,
};

/// Header carrying the public Storefront API access token.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
}

impl std::fmt::Debug for StorefrontClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontClient")
            .field("endpoint", &self.inner.endpoint)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    ///
    /// The domain and token are not validated here; bad values surface as
    /// transport or API errors on the first request.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        Self::with_endpoint(config.endpoint(), config.access_token.clone())
    }

    /// Create a client for an explicit GraphQL endpoint URL.
    #[must_use]
    pub fn with_endpoint(endpoint: impl Into<String>, access_token: SecretString) -> Self {
        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint: endpoint.into(),
                access_token,
            }),
        }
    }

    /// The GraphQL endpoint this client posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);
        debug!(operation = request_body.operation_name, "Sending Storefront API request");

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header(ACCESS_TOKEN_HEADER, self.inner.access_token.expose_secret())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Read the body as text first so failures can log what came back
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %truncate(&response_text, 500),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::message(format!(
                "HTTP {status}: {}",
                truncate(&response_text, 200)
            )));
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %truncate(&response_text, 500),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(convert_graphql_error).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %truncate(&response_text, 500),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::message("No data in response")
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get one page of products, best sellers first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        count: i64,
        cursor: Option<String>,
    ) -> Result<ProductPage, ShopifyError> {
        let data = self
            .execute::<GetProducts>(get_products::Variables {
                first: count,
                after: cursor,
            })
            .await?;

        Ok(convert_product_connection(data.products))
    }

    /// Get a product by its handle. `None` when no product has that handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<Product>, ShopifyError> {
        let data = self
            .execute::<GetProductByHandle>(get_product_by_handle::Variables {
                handle: handle.to_string(),
            })
            .await?;

        Ok(data.product.map(convert_product))
    }

    /// Full-text product search, in backend relevance order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search_products(
        &self,
        term: &str,
        count: i64,
    ) -> Result<Vec<Product>, ShopifyError> {
        let data = self
            .execute::<SearchProducts>(search_products::Variables {
                query: term.to_string(),
                first: count,
            })
            .await?;

        Ok(data.search.into_nodes().map(convert_product).collect())
    }

    /// Lightweight product search for type-ahead suggestions.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn suggest_products(
        &self,
        term: &str,
        count: i64,
    ) -> Result<Vec<ProductSummary>, ShopifyError> {
        let data = self
            .execute::<SuggestProducts>(suggest_products::Variables {
                query: term.to_string(),
                first: count,
            })
            .await?;

        Ok(data.search.into_nodes().map(convert_suggestion).collect())
    }

    // =========================================================================
    // Collection Methods
    // =========================================================================

    /// Get the first `count` collections.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_collections(&self, count: i64) -> Result<Vec<Collection>, ShopifyError> {
        let data = self
            .execute::<GetCollections>(get_collections::Variables { first: count })
            .await?;

        Ok(data.collections.into_nodes().map(convert_collection).collect())
    }

    /// Get a collection and one page of its products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_collection_by_handle(
        &self,
        handle: &str,
        count: i64,
        cursor: Option<String>,
    ) -> Result<Option<CollectionWithProducts>, ShopifyError> {
        let data = self
            .execute::<GetCollectionByHandle>(get_collection_by_handle::Variables {
                handle: handle.to_string(),
                first: count,
                after: cursor,
            })
            .await?;

        Ok(data.collection.map(convert_collection_with_products))
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Create a new, empty cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart creation fails or user errors are returned.
    #[instrument(skip(self))]
    pub async fn create_cart(&self) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<CreateCart>(create_cart::Variables::default())
            .await?;

        let payload = data
            .cart_create
            .ok_or_else(|| ShopifyError::message("Failed to create cart"))?;
        if !payload.user_errors.is_empty() {
            return Err(ShopifyError::UserError(
                payload
                    .user_errors
                    .into_iter()
                    .map(|e| e.message)
                    .collect::<Vec<_>>()
                    .join("; "),
            ));
        }
        payload
            .cart
            .map(convert_cart)
            .ok_or_else(|| ShopifyError::message("Failed to create cart"))
    }

    /// Fetch a cart. `None` when the backend no longer knows the id.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &CartId) -> Result<Option<Cart>, ShopifyError> {
        let data = self
            .execute::<GetCart>(get_cart::Variables {
                cart_id: cart_id.to_string(),
            })
            .await?;

        Ok(data.cart.map(convert_cart))
    }

    /// Add lines to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id, lines = lines.len()))]
    pub async fn add_cart_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<AddCartLines>(add_cart_lines::Variables {
                cart_id: cart_id.to_string(),
                lines: lines
                    .into_iter()
                    .map(|line| CartLineInputVar {
                        merchandise_id: line.merchandise_id.into_inner(),
                        quantity: line.quantity,
                        selling_plan_id: line.selling_plan_id.map(Into::into),
                    })
                    .collect(),
            })
            .await?;

        cart_from_payload(data.cart_lines_add, cart_id, "cartLinesAdd")
    }

    /// Set quantities on existing cart lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id, lines = lines.len()))]
    pub async fn update_cart_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<UpdateCartLines>(update_cart_lines::Variables {
                cart_id: cart_id.to_string(),
                lines: lines
                    .into_iter()
                    .map(|line| CartLineUpdateVar {
                        id: line.id.into_inner(),
                        quantity: line.quantity,
                    })
                    .collect(),
            })
            .await?;

        cart_from_payload(data.cart_lines_update, cart_id, "cartLinesUpdate")
    }

    /// Remove lines from a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    pub async fn remove_cart_lines(
        &self,
        cart_id: &CartId,
        line_ids: Vec<CartLineId>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<RemoveCartLines>(remove_cart_lines::Variables {
                cart_id: cart_id.to_string(),
                line_ids: line_ids.into_iter().map(CartLineId::into_inner).collect(),
            })
            .await?;

        cart_from_payload(data.cart_lines_remove, cart_id, "cartLinesRemove")
    }

    /// Replace the discount codes on a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, codes), fields(cart_id = %cart_id))]
    pub async fn update_cart_discount_codes(
        &self,
        cart_id: &CartId,
        codes: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<UpdateCartDiscountCodes>(update_cart_discount_codes::Variables {
                cart_id: cart_id.to_string(),
                discount_codes: codes,
            })
            .await?;

        cart_from_payload(
            data.cart_discount_codes_update,
            cart_id,
            "cartDiscountCodesUpdate",
        )
    }
}

fn convert_graphql_error(error: graphql_client::Error) -> GraphQLError {
    GraphQLError {
        message: error.message,
        locations: error.locations.map_or_else(Vec::new, |locs| {
            locs.into_iter()
                .map(|l| GraphQLErrorLocation {
                    line: i64::from(l.line),
                    column: i64::from(l.column),
                })
                .collect()
        }),
        path: error.path.map_or_else(Vec::new, |p| {
            p.into_iter()
                .map(|fragment| match fragment {
                    PathFragment::Key(s) => serde_json::Value::String(s),
                    PathFragment::Index(i) => serde_json::Value::Number(i.into()),
                })
                .collect()
        }),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::Router;
    use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
    use axum::routing::post;
    use lumiere_core::VariantId;
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;

    /// A client whose endpoint answers every request with the same
    /// status, headers and JSON body.
    async fn canned(
        status: StatusCode,
        headers: HeaderMap,
        body: serde_json::Value,
    ) -> StorefrontClient {
        let app = Router::new().route(
            "/graphql",
            post(move || {
                let headers = headers.clone();
                let body = body.clone();
                async move { (status, headers, axum::Json(body)) }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        StorefrontClient::with_endpoint(
            format!("http://{addr}/graphql"),
            SecretString::from("token"),
        )
    }

    fn cart_id() -> CartId {
        CartId::new("gid://shopify/Cart/c1")
    }

    #[tokio::test]
    async fn test_graphql_errors_surface_first_message() {
        let client = canned(
            StatusCode::OK,
            HeaderMap::new(),
            json!({
                "data": null,
                "errors": [{"message": "Throttled"}, {"message": "Invalid ID"}]
            }),
        )
        .await;

        let err = client.get_cart(&cart_id()).await.unwrap_err();
        assert!(matches!(&err, ShopifyError::GraphQL(errors) if errors.len() == 2));
        assert_eq!(err.first_message(), "Throttled");
    }

    #[tokio::test]
    async fn test_errors_win_over_partial_data() {
        let client = canned(
            StatusCode::OK,
            HeaderMap::new(),
            json!({
                "data": {"cart": null},
                "errors": [{"message": "Access denied"}]
            }),
        )
        .await;

        let err = client.get_cart(&cart_id()).await.unwrap_err();
        assert_eq!(err.first_message(), "Access denied");
    }

    #[tokio::test]
    async fn test_too_many_requests_is_rate_limited() {
        let mut headers = HeaderMap::new();
        headers.insert(header::RETRY_AFTER, HeaderValue::from_static("7"));
        let client = canned(StatusCode::TOO_MANY_REQUESTS, headers, json!({})).await;

        let err = client.create_cart().await.unwrap_err();
        assert!(matches!(err, ShopifyError::RateLimited(7)));

        let client = canned(StatusCode::TOO_MANY_REQUESTS, HeaderMap::new(), json!({})).await;
        let err = client.create_cart().await.unwrap_err();
        assert!(matches!(err, ShopifyError::RateLimited(1)));
    }

    #[tokio::test]
    async fn test_server_error_is_graphql_failure() {
        let client = canned(
            StatusCode::INTERNAL_SERVER_ERROR,
            HeaderMap::new(),
            json!({"message": "upstream"}),
        )
        .await;

        let err = client.list_collections(10).await.unwrap_err();
        assert!(err.first_message().starts_with("HTTP 500"));
    }

    #[tokio::test]
    async fn test_invalid_cart_user_error_is_missing_cart() {
        let client = canned(
            StatusCode::OK,
            HeaderMap::new(),
            json!({"data": {"cartLinesAdd": {
                "cart": null,
                "userErrors": [{
                    "code": "INVALID",
                    "field": ["cartId"],
                    "message": "The specified cart does not exist."
                }]
            }}}),
        )
        .await;

        let err = client
            .add_cart_lines(
                &cart_id(),
                vec![CartLineInput::new(VariantId::new("gid://shopify/ProductVariant/1"), 1)],
            )
            .await
            .unwrap_err();
        assert!(matches!(&err, ShopifyError::CartNotFound(id) if id == "gid://shopify/Cart/c1"));
        assert!(err.is_missing_cart());
    }

    #[tokio::test]
    async fn test_user_errors_win_over_returned_cart() {
        let client = canned(
            StatusCode::OK,
            HeaderMap::new(),
            json!({"data": {"cartLinesUpdate": {
                "cart": {
                    "id": "gid://shopify/Cart/c1",
                    "checkoutUrl": "https://checkout.example.com/cart/c/c1",
                    "totalQuantity": 0,
                    "cost": {
                        "totalAmount": {"amount": "0.0", "currencyCode": "USD"},
                        "subtotalAmount": {"amount": "0.0", "currencyCode": "USD"}
                    },
                    "discountCodes": [],
                    "lines": {"edges": []}
                },
                "userErrors": [{
                    "code": "INVALID",
                    "field": ["lines", "0", "quantity"],
                    "message": "Quantity must be positive"
                }]
            }}}),
        )
        .await;

        let err = client
            .update_cart_lines(
                &cart_id(),
                vec![CartLineUpdateInput {
                    id: CartLineId::new("gid://shopify/CartLine/1"),
                    quantity: 1,
                }],
            )
            .await
            .unwrap_err();
        assert!(matches!(&err, ShopifyError::UserError(message) if message == "Quantity must be positive"));
        assert!(!err.is_missing_cart());
    }

    #[tokio::test]
    async fn test_unknown_cart_reads_as_none() {
        let client = canned(StatusCode::OK, HeaderMap::new(), json!({"data": {"cart": null}})).await;
        assert!(client.get_cart(&cart_id()).await.unwrap().is_none());
    }

    #[test]
    fn test_endpoint_from_config() {
        let config = ShopifyStorefrontConfig {
            store_domain: "lumiere-candles.myshopify.com".to_string(),
            api_version: "2024-01".to_string(),
            access_token: SecretString::from("token"),
        };
        let client = StorefrontClient::new(&config);
        assert_eq!(
            client.endpoint(),
            "https://lumiere-candles.myshopify.com/api/2024-01/graphql.json"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = StorefrontClient::with_endpoint(
            "http://localhost/graphql",
            SecretString::from("shpat_secret"),
        );
        let debug = format!("{client:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("shpat_secret"));
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }

    #[test]
    fn test_convert_graphql_error_path() {
        let error = graphql_client::Error {
            message: "Field 'x' doesn't exist".to_string(),
            locations: Some(vec![graphql_client::Location { line: 3, column: 7 }]),
            path: Some(vec![
                PathFragment::Key("products".to_string()),
                PathFragment::Index(0),
            ]),
            extensions: None,
        };
        let converted = convert_graphql_error(error);
        assert_eq!(converted.locations[0].line, 3);
        assert_eq!(converted.path[1], serde_json::json!(0));
    }
}
