//! Cart route handlers.
//!
//! Each request builds a [`CartStore`] over the visitor's session, so the
//! session's cart id is the one persisted id and Shopify's cart is the one
//! source of truth. Handlers answer with the resulting [`CartView`].

use axum::{
    Json,
    extract::State,
    response::Redirect,
};
use lumiere_core::{CartLineId, SellingPlanId, VariantId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{instrument, warn};
use url::Url;

use crate::cart::{CartError, CartStore, CartView};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::shopify::ShopifyError;
use crate::state::AppState;

/// Add to cart request.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub variant_id: VariantId,
    pub quantity: Option<i64>,
    pub selling_plan_id: Option<SellingPlanId>,
}

/// Update line quantity request.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub line_id: CartLineId,
    pub quantity: i64,
}

/// Remove line request.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub line_id: CartLineId,
}

/// Replace discount codes request.
#[derive(Debug, Deserialize)]
pub struct DiscountCodesRequest {
    pub codes: Vec<String>,
}

/// Project the store for the response.
pub(super) fn view(state: &AppState, store: &CartStore) -> Json<CartView> {
    Json(CartView::new(&store.snapshot(), state.free_shipping_threshold()))
}

/// The visitor's cart, refreshed from Shopify. A refresh failure degrades
/// to the last known state.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Json<CartView> {
    let store = state.cart_store(session);
    if store.resume().await
        && let Err(e) = store.refresh().await
    {
        warn!(error = %e, "Failed to refresh cart");
    }
    view(&state, &store)
}

/// Add a variant, creating the visitor's cart if needed.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let store = state.cart_store(session);
    store.resume().await;

    let variant = request.variant_id.to_string();
    store
        .add_item(
            request.variant_id,
            request.quantity.unwrap_or(1),
            request.selling_plan_id,
        )
        .await?;
    add_breadcrumb("cart", "Added to cart", &[("variant_id", &variant)]);

    Ok(view(&state, &store))
}

/// Set a line's quantity; zero or less removes it.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    let store = state.cart_store(session);
    store.resume().await;
    store
        .update_quantity(&request.line_id, request.quantity)
        .await?;
    Ok(view(&state, &store))
}

/// Remove a line.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    let store = state.cart_store(session);
    store.resume().await;
    store.remove_item(&request.line_id).await?;
    Ok(view(&state, &store))
}

/// Replace the cart's discount codes.
#[instrument(skip(state, session))]
pub async fn discount_codes(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<DiscountCodesRequest>,
) -> Result<Json<CartView>> {
    let store = state.cart_store(session);
    store.resume().await;
    store.apply_discount_codes(request.codes).await?;
    Ok(view(&state, &store))
}

/// Redirect to Shopify checkout.
///
/// Without a cart this answers 404 and with an empty one 409, as JSON like
/// the other cart routes.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let store = state.cart_store(session);
    if !store.resume().await {
        return Err(CartError::NoCart.into());
    }

    let cart = store.refresh().await?.ok_or(CartError::NoCart)?;
    if cart.lines.is_empty() {
        return Err(AppError::Conflict("Cart is empty".to_string()));
    }

    let Some(url) = checkout_target(&cart.checkout_url) else {
        warn!(checkout_url = %cart.checkout_url, "Refusing non-https checkout URL");
        return Err(ShopifyError::message("checkout URL is not https").into());
    };
    add_breadcrumb("cart", "Checkout started", &[("cart_id", cart.id.as_str())]);
    Ok(Redirect::to(url.as_str()))
}

/// The checkout URL, if it is an absolute https URL.
fn checkout_target(raw: &str) -> Option<Url> {
    Url::parse(raw).ok().filter(|url| url.scheme() == "https")
}
