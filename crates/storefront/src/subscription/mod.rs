//! Bridge to the third-party subscription widget SDK.
//!
//! The SDK is opaque: it is initialized against a widget target, emits
//! events, and is destroyed. The only thing it may do to the storefront is
//! put lines in the cart, through [`add_lines_and_open_cart`].

pub mod host;

pub use host::WidgetHost;

use async_trait::async_trait;
use lumiere_core::{SellingPlanId, VariantId};
use mockall::automock;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, instrument};

use crate::cart::{CartError, CartStore};
use crate::config::ShopifyStorefrontConfig;
use crate::shopify::{Cart, CartLineInput};

/// Errors reported by a subscription SDK.
#[derive(Debug, Error)]
pub enum SdkError {
    /// The SDK refused to initialize for a target.
    #[error("subscription widget failed to initialize: {0}")]
    Init(String),

    /// Any other SDK failure.
    #[error("subscription widget error: {0}")]
    Sdk(String),

    /// The operation needs a mounted widget.
    #[error("no subscription widget is mounted")]
    NotMounted,
}

/// Credentials the SDK is configured with.
///
/// The Storefront access token is a public, read-only token; it is handed
/// to the browser-side SDK as-is.
#[derive(Clone)]
pub struct SdkConfig {
    pub shop_domain: String,
    pub storefront_access_token: SecretString,
}

impl SdkConfig {
    #[must_use]
    pub fn from_storefront(config: &ShopifyStorefrontConfig) -> Self {
        Self {
            shop_domain: config.store_domain.clone(),
            storefront_access_token: SecretString::from(config.expose_access_token().to_string()),
        }
    }

    /// The wire form handed to the browser SDK.
    #[must_use]
    pub fn to_public(&self) -> PublicSdkConfig {
        PublicSdkConfig {
            shop_domain: self.shop_domain.clone(),
            storefront_access_token: self.storefront_access_token.expose_secret().to_string(),
        }
    }
}

impl std::fmt::Debug for SdkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkConfig")
            .field("shop_domain", &self.shop_domain)
            .field("storefront_access_token", &"[REDACTED]")
            .finish()
    }
}

/// SDK configuration as the browser receives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSdkConfig {
    pub shop_domain: String,
    pub storefront_access_token: String,
}

/// Where a widget is mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetTarget {
    /// Subscription options on a product page.
    Product {
        handle: String,
        variant_id: Option<VariantId>,
    },
    /// A product bundle builder.
    Bundle { handle: String },
    /// A build-your-own subscription box; `None` for the default box.
    SubscriptionBox { box_id: Option<String> },
    /// The customer's subscription management portal, opened at `path`
    /// below the portal root (`None` for its landing page).
    CustomerPortal { path: Option<String> },
}

impl WidgetTarget {
    /// Variant the widget starts on.
    #[must_use]
    pub const fn initial_variant(&self) -> Option<&VariantId> {
        match self {
            Self::Product { variant_id, .. } => variant_id.as_ref(),
            Self::Bundle { .. } | Self::SubscriptionBox { .. } | Self::CustomerPortal { .. } => None,
        }
    }
}

/// The shopper picked a subscription plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSelection {
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    /// `None` for one-time purchase.
    #[serde(default)]
    pub selling_plan_id: Option<SellingPlanId>,
}

/// Events a widget emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    AddToCart {
        lines: Vec<CartLineInput>,
        discount_codes: Vec<String>,
    },
    PlanSelected(PlanSelection),
}

/// A subscription widget SDK instance.
#[automock]
#[async_trait]
pub trait SubscriptionSdk: Send + Sync {
    /// Render the widget for `target`.
    async fn init(&self, target: &WidgetTarget) -> Result<(), SdkError>;

    /// Point a product widget at another variant.
    async fn set_variant(&self, variant_id: &VariantId) -> Result<(), SdkError>;

    /// Event stream; ends when the SDK is destroyed.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<WidgetEvent>;

    /// Tear the widget down.
    async fn destroy(&self) -> Result<(), SdkError>;
}

/// Put a widget's lines in the cart, apply its discount codes, and open
/// the drawer.
///
/// Lines go in as one backend call. Discount codes are applied only when
/// a cart exists afterwards.
///
/// # Errors
///
/// Returns the first failing cart operation. `CartError::NoCart` when the
/// event carried no lines and no cart exists.
#[instrument(skip(store, lines, discount_codes), fields(lines = lines.len(), codes = discount_codes.len()))]
pub async fn add_lines_and_open_cart(
    store: &CartStore,
    lines: Vec<CartLineInput>,
    discount_codes: Vec<String>,
) -> Result<Cart, CartError> {
    let mut cart = if lines.is_empty() {
        store.cart()
    } else {
        Some(store.add_lines(lines).await?)
    };

    if !discount_codes.is_empty() && cart.is_some() {
        cart = Some(store.apply_discount_codes(discount_codes).await?);
    }

    store.open_cart();
    let cart = cart.ok_or(CartError::NoCart)?;
    info!(cart_id = %cart.id, total_quantity = cart.total_quantity, "Subscription lines added");
    Ok(cart)
}
