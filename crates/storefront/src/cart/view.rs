//! Display-ready projection of the cart state.
//!
//! Everything a drawer, header badge or CLI needs, with prices already
//! formatted. Built from a [`CartState`]; never written back.

use lumiere_core::{CurrencyCode, FreeShippingProgress, format_price};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::shopify::{CartDiscountCode, CartLine, Money};

use super::store::CartState;

/// Variant title Shopify gives single-variant products.
const DEFAULT_VARIANT_TITLE: &str = "Default Title";

/// One cart line for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLineView {
    pub id: String,
    pub variant_id: String,
    pub product_title: String,
    pub product_handle: String,
    /// `None` for single-variant products.
    pub variant_title: Option<String>,
    pub quantity: i64,
    pub unit_price: String,
    pub line_total: String,
    pub image_url: Option<String>,
    pub image_alt: Option<String>,
    pub selling_plan_id: Option<String>,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        let merchandise = &line.merchandise;
        Self {
            id: line.id.to_string(),
            variant_id: merchandise.id.to_string(),
            product_title: merchandise.product.title.clone(),
            product_handle: merchandise.product.handle.clone(),
            variant_title: (merchandise.title != DEFAULT_VARIANT_TITLE
                && !merchandise.title.is_empty())
            .then(|| merchandise.title.clone()),
            quantity: line.quantity,
            unit_price: line.cost.amount_per_quantity.display(),
            line_total: line.cost.total_amount.display(),
            image_url: merchandise.image.as_ref().map(|i| i.url.clone()),
            image_alt: merchandise.image.as_ref().and_then(|i| i.alt_text.clone()),
            selling_plan_id: line.selling_plan_id.as_ref().map(ToString::to_string),
        }
    }
}

/// Free-shipping bar state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FreeShippingView {
    /// Hidden for an empty cart.
    pub visible: bool,
    pub qualified: bool,
    pub progress_percent: Decimal,
    pub remaining: String,
    pub message: String,
}

impl FreeShippingView {
    fn new(subtotal: Decimal, threshold: Decimal, currency: &CurrencyCode) -> Self {
        let progress = FreeShippingProgress::new(subtotal, threshold);
        Self {
            visible: progress.is_visible(),
            qualified: progress.is_qualified(),
            progress_percent: progress.progress_percent.round_dp(2),
            remaining: format_price(progress.remaining_display(), currency),
            message: progress.message(currency),
        }
    }
}

/// The whole cart for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub cart_id: Option<String>,
    pub lines: Vec<CartLineView>,
    pub total_quantity: i64,
    /// Raw subtotal amount as the backend reported it.
    pub subtotal_amount: String,
    pub currency_code: String,
    /// Formatted subtotal (e.g. "$1,234.50").
    pub subtotal: String,
    pub total: String,
    pub checkout_url: String,
    pub discount_codes: Vec<CartDiscountCode>,
    pub is_open: bool,
    pub is_busy: bool,
    pub is_empty: bool,
    pub free_shipping: FreeShippingView,
}

impl CartView {
    /// Project `state`, measuring free shipping against `threshold`.
    #[must_use]
    pub fn new(state: &CartState, threshold: Decimal) -> Self {
        let currency: CurrencyCode = state.currency_code().parse().unwrap_or_default();
        let subtotal = Money::new(state.subtotal_amount(), currency.as_str());
        let total = state
            .cart
            .as_ref()
            .map_or_else(|| subtotal.clone(), |c| c.cost.total.clone());
        let lines: Vec<CartLineView> = state.lines().iter().map(CartLineView::from).collect();

        Self {
            cart_id: state.cart.as_ref().map(|c| c.id.to_string()),
            is_empty: lines.is_empty(),
            lines,
            total_quantity: state.total_quantity(),
            subtotal_amount: state.subtotal_amount().to_string(),
            currency_code: currency.as_str().to_string(),
            subtotal: subtotal.display(),
            total: total.display(),
            checkout_url: state.checkout_url().to_string(),
            discount_codes: state
                .cart
                .as_ref()
                .map(|c| c.discount_codes.clone())
                .unwrap_or_default(),
            is_open: state.is_open,
            is_busy: state.is_busy(),
            free_shipping: FreeShippingView::new(subtotal.amount_decimal(), threshold, &currency),
        }
    }
}
