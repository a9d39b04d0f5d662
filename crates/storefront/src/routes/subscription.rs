//! Subscription widget route handlers.
//!
//! The browser-side widget SDK posts its add-to-cart events here; they go
//! into the visitor's cart the same way an in-process widget host would
//! forward them.

use axum::{Json, extract::State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::cart::CartView;
use crate::error::{AppError, Result};
use crate::shopify::CartLineInput;
use crate::state::AppState;
use crate::subscription::{PublicSdkConfig, add_lines_and_open_cart};

/// Payload of the widget's add-to-cart event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartEvent {
    pub lines: Vec<CartLineInput>,
    #[serde(default)]
    pub discount_codes: Vec<String>,
}

/// Configuration for the browser-side SDK.
#[instrument(skip(state))]
pub async fn config(State(state): State<AppState>) -> Result<Json<PublicSdkConfig>> {
    state
        .sdk_config()
        .map(|sdk| Json(sdk.to_public()))
        .ok_or_else(|| AppError::NotFound("subscription configuration".to_string()))
}

/// Put the event's lines in the visitor's cart and open the drawer.
#[instrument(skip(state, session, event), fields(lines = event.lines.len()))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    session: Session,
    Json(event): Json<AddToCartEvent>,
) -> Result<Json<CartView>> {
    let store = state.cart_store(session);
    store.resume().await;
    add_lines_and_open_cart(&store, event.lines, event.discount_codes).await?;
    Ok(super::cart::view(&state, &store))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::super::test_support::{backend, get, json, post_json, router, send};

    #[tokio::test]
    async fn test_add_to_cart_event() {
        let router = router(backend());
        let response = send(
            &router,
            post_json(
                "/api/subscription/add-to-cart",
                &json!({
                    "lines": [
                        {"merchandiseId": "gid://shopify/ProductVariant/vanilla-bean", "quantity": 1,
                         "sellingPlanId": "gid://shopify/SellingPlan/30"},
                        {"merchandiseId": "gid://shopify/ProductVariant/cedar-smoke", "quantity": 1}
                    ],
                    "discountCodes": ["WELCOME10"]
                }),
                None,
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["total_quantity"], 2);
        assert_eq!(body["is_open"], true);
        assert_eq!(
            body["lines"][0]["selling_plan_id"],
            "gid://shopify/SellingPlan/30"
        );
        assert_eq!(body["discount_codes"][0]["code"], "WELCOME10");
    }

    #[tokio::test]
    async fn test_empty_event_without_cart_is_404() {
        let router = router(backend());
        let response = send(
            &router,
            post_json("/api/subscription/add-to-cart", &json!({"lines": []}), None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_config_requires_shopify() {
        let router = router(backend());
        let response = send(&router, get("/api/subscription/config", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
