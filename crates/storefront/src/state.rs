//! Application state shared across handlers.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::cart::{CartStore, SessionCartIdStore};
use crate::commerce::CommerceApi;
use crate::config::StorefrontConfig;
use crate::shopify::StorefrontClient;
use crate::subscription::SdkConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    api: Arc<dyn CommerceApi>,
    free_shipping_threshold: Decimal,
    sdk: Option<SdkConfig>,
}

impl AppState {
    /// State backed by the Shopify Storefront API.
    #[must_use]
    pub fn new(config: &StorefrontConfig) -> Self {
        Self::build(
            Arc::new(StorefrontClient::new(&config.shopify)),
            config.free_shipping_threshold,
            Some(SdkConfig::from_storefront(&config.shopify)),
        )
    }

    /// State backed by any commerce backend.
    #[must_use]
    pub fn with_api(api: Arc<dyn CommerceApi>, free_shipping_threshold: Decimal) -> Self {
        Self::build(api, free_shipping_threshold, None)
    }

    fn build(
        api: Arc<dyn CommerceApi>,
        free_shipping_threshold: Decimal,
        sdk: Option<SdkConfig>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                api,
                free_shipping_threshold,
                sdk,
            }),
        }
    }

    /// The commerce backend.
    #[must_use]
    pub fn api(&self) -> &Arc<dyn CommerceApi> {
        &self.inner.api
    }

    #[must_use]
    pub fn free_shipping_threshold(&self) -> Decimal {
        self.inner.free_shipping_threshold
    }

    /// Subscription SDK configuration, when Shopify is configured.
    #[must_use]
    pub fn sdk_config(&self) -> Option<&SdkConfig> {
        self.inner.sdk.as_ref()
    }

    /// A cart store for one request, remembering the visitor's cart id in
    /// `session`.
    ///
    /// Operations are ordered within the returned store only. Concurrent
    /// requests in one session each get their own store, and the later
    /// backend response wins.
    #[must_use]
    pub fn cart_store(&self, session: tower_sessions::Session) -> CartStore {
        CartStore::new(
            Arc::clone(&self.inner.api),
            Arc::new(SessionCartIdStore::new(session)),
        )
    }
}
