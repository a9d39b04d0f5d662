//! Cart management. The cart id is kept in the storage file, so a cart
//! built in one run is the cart of the next.

use std::fmt::Write as _;

use lumiere_core::{CartLineId, SellingPlanId, VariantId};
use lumiere_storefront::cart::{CartError, CartStore, CartView};
use tracing::warn;

use super::{CliError, Context};

fn render_cart(view: &CartView) -> String {
    if view.is_empty {
        return "Your cart is empty".to_string();
    }

    let mut out = String::new();
    for line in &view.lines {
        let title = match &line.variant_title {
            Some(variant) => format!("{} ({variant})", line.product_title),
            None => line.product_title.clone(),
        };
        let plan = if line.selling_plan_id.is_some() {
            "  [subscription]"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "{:>3} x {:<32} {:>10}{plan}\n      {}",
            line.quantity, title, line.line_total, line.id
        );
    }

    let _ = writeln!(out, "\nSubtotal: {}", view.subtotal);
    for code in &view.discount_codes {
        let status = if code.applicable {
            "applied"
        } else {
            "not applicable"
        };
        let _ = writeln!(out, "Discount: {} ({status})", code.code);
    }
    if view.total != view.subtotal {
        let _ = writeln!(out, "Total:    {}", view.total);
    }
    if view.free_shipping.visible {
        let _ = writeln!(out, "\n{}", view.free_shipping.message);
    }
    out.trim_end().to_string()
}

fn respond(ctx: &Context, store: &CartStore) -> Result<String, CliError> {
    let view = CartView::new(&store.snapshot(), ctx.free_shipping_threshold);
    ctx.render(&view, render_cart)
}

/// The stored cart, refreshed from the backend. A refresh failure shows
/// the last known state instead.
///
/// # Errors
///
/// Returns `CliError::Json` if JSON output cannot be encoded.
pub async fn show(ctx: &Context) -> Result<String, CliError> {
    let store = ctx.cart_store();
    if store.resume().await
        && let Err(e) = store.refresh().await
    {
        warn!(error = %e, "Failed to refresh cart");
    }
    respond(ctx, &store)
}

/// Add a variant, creating the cart on first use.
///
/// # Errors
///
/// Returns `CliError::Cart` for a quantity below one or a backend failure.
pub async fn add(
    ctx: &Context,
    variant_id: String,
    quantity: i64,
    selling_plan: Option<String>,
) -> Result<String, CliError> {
    let store = ctx.cart_store();
    store.resume().await;
    store
        .add_item(
            VariantId::new(variant_id),
            quantity,
            selling_plan.map(SellingPlanId::new),
        )
        .await?;
    respond(ctx, &store)
}

/// Set a line's quantity; zero removes it.
///
/// # Errors
///
/// Returns `CliError::Cart` without a cart or on backend failure.
pub async fn update(ctx: &Context, line_id: String, quantity: i64) -> Result<String, CliError> {
    let store = ctx.cart_store();
    store.resume().await;
    store
        .update_quantity(&CartLineId::new(line_id), quantity)
        .await?;
    respond(ctx, &store)
}

/// Remove a line.
///
/// # Errors
///
/// Returns `CliError::Cart` without a cart or on backend failure.
pub async fn remove(ctx: &Context, line_id: String) -> Result<String, CliError> {
    let store = ctx.cart_store();
    store.resume().await;
    store.remove_item(&CartLineId::new(line_id)).await?;
    respond(ctx, &store)
}

/// Replace the cart's discount codes. No codes clears them.
///
/// # Errors
///
/// Returns `CliError::Cart` without a cart or on backend failure.
pub async fn discount(ctx: &Context, codes: Vec<String>) -> Result<String, CliError> {
    let store = ctx.cart_store();
    store.resume().await;
    store.apply_discount_codes(codes).await?;
    respond(ctx, &store)
}

/// The checkout URL of a cart with items in it.
///
/// # Errors
///
/// Returns `CliError::Cart` without a cart, or `CliError::EmptyCart`.
pub async fn checkout(ctx: &Context) -> Result<String, CliError> {
    let store = ctx.cart_store();
    if !store.resume().await || store.refresh().await?.is_none() {
        return Err(CartError::NoCart.into());
    }
    if store.lines().is_empty() {
        return Err(CliError::EmptyCart);
    }
    Ok(store.checkout_url())
}
