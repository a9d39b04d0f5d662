//! The cart store: single writer of the current cart snapshot.
//!
//! # State
//!
//! [`CartState`] lives in a `tokio::sync::watch` channel so any number of
//! observers (routes, CLI output, widget bridges) can read it or wait for
//! changes. Only the store writes to it.
//!
//! # Ordering
//!
//! Backend operations are serialized through a fair async mutex, so
//! responses are applied in the order the operations were issued and a
//! slow response can never overwrite a newer one. Each applied snapshot
//! bumps [`CartState::revision`].
//!
//! # Failures
//!
//! A failed operation leaves the previous snapshot in place, clears the
//! busy phase, logs, and returns the error. The one exception: when the
//! backend reports the cart id itself as unknown, the snapshot and the
//! persisted id are dropped so the next add starts a fresh cart.

use std::sync::Arc;

use lumiere_core::{CartId, CartLineId, SellingPlanId, VariantId};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tracing::{error, info, instrument, warn};

use crate::commerce::CommerceApi;
use crate::shopify::{Cart, CartLine, CartLineInput, CartLineUpdateInput, ShopifyError};
use crate::storage::PersistenceError;

use super::persistence::CartIdStore;

/// Subtotal reported before any cart exists.
pub const EMPTY_SUBTOTAL: &str = "0";

/// Currency reported before any cart exists.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Errors from cart store operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The operation needs an existing cart and there is none.
    #[error("no cart exists yet")]
    NoCart,

    /// Lines are added with a quantity of at least one.
    #[error("quantity must be at least 1 (got {0})")]
    InvalidQuantity(i64),

    /// `add_lines` was called with nothing to add.
    #[error("no lines to add")]
    NoLines,

    /// The backend call failed.
    #[error(transparent)]
    Backend(#[from] ShopifyError),

    /// Reading or writing the persisted cart id failed.
    #[error("cart persistence failed: {0}")]
    Persistence(#[from] PersistenceError),
}

impl CartError {
    /// Whether the backend no longer knows the cart.
    #[must_use]
    pub const fn is_missing_cart(&self) -> bool {
        matches!(self, Self::Backend(e) if e.is_missing_cart())
    }
}

/// Backend operation currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingOp {
    Initializing,
    Adding,
    Updating,
    Removing,
    ApplyingDiscount,
    Refreshing,
}

/// Lifecycle phase of the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CartPhase {
    /// No cart has been adopted or created.
    #[default]
    Uninitialized,
    /// A cart is held and nothing is in flight.
    Ready,
    /// A backend operation is in flight.
    Busy(PendingOp),
}

/// Everything the store publishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartState {
    /// Last authoritative snapshot.
    pub cart: Option<Cart>,
    /// Whether the cart drawer is showing.
    pub is_open: bool,
    pub phase: CartPhase,
    /// Incremented every time a new snapshot is applied.
    pub revision: u64,
}

impl CartState {
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self.phase, CartPhase::Busy(_))
    }

    /// Lines of the current snapshot, empty without a cart.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        self.cart.as_ref().map_or(&[], |c| c.lines.as_slice())
    }

    /// Subtotal amount as the backend reported it, `"0"` without a cart.
    #[must_use]
    pub fn subtotal_amount(&self) -> &str {
        self.cart
            .as_ref()
            .map_or(EMPTY_SUBTOTAL, |c| c.cost.subtotal.amount.as_str())
    }

    /// Subtotal currency, `"USD"` without a cart.
    #[must_use]
    pub fn currency_code(&self) -> &str {
        self.cart
            .as_ref()
            .map_or(DEFAULT_CURRENCY, |c| c.cost.subtotal.currency_code.as_str())
    }

    /// Backend-computed item count, `0` without a cart.
    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.cart.as_ref().map_or(0, |c| c.total_quantity)
    }

    /// Checkout URL, empty without a cart.
    #[must_use]
    pub fn checkout_url(&self) -> &str {
        self.cart.as_ref().map_or("", |c| c.checkout_url.as_str())
    }

    fn cart_id(&self) -> Option<CartId> {
        self.cart.as_ref().map(|c| c.id.clone())
    }

    fn settle(&mut self) {
        self.phase = if self.cart.is_some() {
            CartPhase::Ready
        } else {
            CartPhase::Uninitialized
        };
    }

    fn apply(&mut self, cart: Cart) {
        self.cart = Some(cart);
        self.revision += 1;
        self.settle();
    }
}

/// Explicit cart state container with injected backend and persistence.
pub struct CartStore {
    api: Arc<dyn CommerceApi>,
    persistence: Arc<dyn CartIdStore>,
    state: watch::Sender<CartState>,
    // Held for the duration of every backend operation
    ops: Mutex<()>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    #[must_use]
    pub fn new(api: Arc<dyn CommerceApi>, persistence: Arc<dyn CartIdStore>) -> Self {
        let (state, _) = watch::channel(CartState::default());
        Self {
            api,
            persistence,
            state,
            ops: Mutex::new(()),
        }
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Watch state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn cart(&self) -> Option<Cart> {
        self.state.borrow().cart.clone()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.borrow().is_open
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state.borrow().is_busy()
    }

    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.state.borrow().lines().to_vec()
    }

    #[must_use]
    pub fn subtotal_amount(&self) -> String {
        self.state.borrow().subtotal_amount().to_string()
    }

    #[must_use]
    pub fn currency_code(&self) -> String {
        self.state.borrow().currency_code().to_string()
    }

    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.state.borrow().total_quantity()
    }

    #[must_use]
    pub fn checkout_url(&self) -> String {
        self.state.borrow().checkout_url().to_string()
    }

    // =========================================================================
    // Drawer visibility
    // =========================================================================

    pub fn toggle_cart(&self) {
        self.state.send_modify(|s| s.is_open = !s.is_open);
    }

    pub fn open_cart(&self) {
        self.state.send_if_modified(|s| !std::mem::replace(&mut s.is_open, true));
    }

    pub fn close_cart(&self) {
        self.state
            .send_if_modified(|s| std::mem::replace(&mut s.is_open, false));
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Adopt the persisted cart id, or create and persist a new cart.
    ///
    /// A persisted id is trusted without a backend round trip; call
    /// [`refresh`](Self::refresh) to load its contents. Does nothing when a
    /// cart is already held.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if a new cart could not be created. The store
    /// stays uninitialized.
    #[instrument(skip(self))]
    pub async fn init(&self) -> Result<(), CartError> {
        let _guard = self.ops.lock().await;
        if self.state.borrow().cart.is_some() {
            return Ok(());
        }

        self.begin(PendingOp::Initializing);
        if let Some(id) = self.load_persisted().await {
            info!(cart_id = %id, "Adopted persisted cart");
            self.state.send_modify(|s| s.apply(Cart::with_id(id)));
            return Ok(());
        }

        match self.api.create_cart().await {
            Ok(cart) => {
                info!(cart_id = %cart.id, "Created cart");
                self.persist(&cart.id).await;
                self.state.send_modify(|s| s.apply(cart));
                Ok(())
            }
            Err(e) => Err(self.fail("init", e.into())),
        }
    }

    /// Adopt the persisted cart id if there is one, without ever creating a
    /// cart. Returns whether a cart is now held.
    #[instrument(skip(self))]
    pub async fn resume(&self) -> bool {
        let _guard = self.ops.lock().await;
        if self.state.borrow().cart.is_some() {
            return true;
        }

        match self.load_persisted().await {
            Some(id) => {
                self.state.send_modify(|s| s.apply(Cart::with_id(id)));
                true
            }
            None => false,
        }
    }

    /// Reload the snapshot from the backend.
    ///
    /// Returns `None` (and forgets the persisted id) when the backend no
    /// longer knows the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoCart` without a cart, or the backend failure.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Option<Cart>, CartError> {
        let _guard = self.ops.lock().await;
        let cart_id = self.state.borrow().cart_id().ok_or(CartError::NoCart)?;

        self.begin(PendingOp::Refreshing);
        match self.api.get_cart(&cart_id).await {
            Ok(Some(cart)) => {
                self.state.send_modify(|s| s.apply(cart.clone()));
                Ok(Some(cart))
            }
            Ok(None) => {
                warn!(cart_id = %cart_id, "Cart no longer exists, forgetting it");
                self.forget().await;
                Ok(None)
            }
            Err(e) => Err(self.fail("refresh", e.into())),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` of a variant, creating a cart first if needed, then
    /// open the drawer.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for `quantity < 1`, or the
    /// backend failure.
    #[instrument(skip(self), fields(variant_id = %variant_id))]
    pub async fn add_item(
        &self,
        variant_id: VariantId,
        quantity: i64,
        selling_plan_id: Option<SellingPlanId>,
    ) -> Result<Cart, CartError> {
        self.add_lines(vec![
            CartLineInput::new(variant_id, quantity).with_selling_plan(selling_plan_id),
        ])
        .await
    }

    /// Add several lines in one backend call, creating a cart first if
    /// needed, then open the drawer.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoLines` or `CartError::InvalidQuantity` for bad
    /// input, or the backend failure.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn add_lines(&self, lines: Vec<CartLineInput>) -> Result<Cart, CartError> {
        if lines.is_empty() {
            return Err(CartError::NoLines);
        }
        if let Some(bad) = lines.iter().find(|l| l.quantity < 1) {
            return Err(CartError::InvalidQuantity(bad.quantity));
        }

        let _guard = self.ops.lock().await;
        self.begin(PendingOp::Adding);

        let cart_id = match self.ensure_cart_id().await {
            Ok(id) => id,
            Err(e) => return Err(self.fail("add", e)),
        };

        match self.api.add_cart_lines(&cart_id, lines).await {
            Ok(cart) => {
                self.state.send_modify(|s| {
                    s.apply(cart.clone());
                    s.is_open = true;
                });
                Ok(cart)
            }
            Err(e) => Err(self.fail_mutation("add", e).await),
        }
    }

    /// Set a line's quantity. Zero or negative removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoCart` without a cart, or the backend failure.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn update_quantity(
        &self,
        line_id: &CartLineId,
        quantity: i64,
    ) -> Result<Cart, CartError> {
        if quantity <= 0 {
            return self.remove_item(line_id).await;
        }

        let updates = vec![CartLineUpdateInput {
            id: line_id.clone(),
            quantity,
        }];
        self.mutate_existing(PendingOp::Updating, "update", |api, cart_id| async move {
            api.update_cart_lines(&cart_id, updates).await
        })
        .await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoCart` without a cart, or the backend failure.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn remove_item(&self, line_id: &CartLineId) -> Result<Cart, CartError> {
        let line_ids = vec![line_id.clone()];
        self.mutate_existing(PendingOp::Removing, "remove", |api, cart_id| async move {
            api.remove_cart_lines(&cart_id, line_ids).await
        })
        .await
    }

    /// Replace the cart's discount codes.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoCart` without a cart, or the backend failure.
    #[instrument(skip(self))]
    pub async fn apply_discount_codes(&self, codes: Vec<String>) -> Result<Cart, CartError> {
        self.mutate_existing(
            PendingOp::ApplyingDiscount,
            "discount",
            |api, cart_id| async move { api.update_cart_discount_codes(&cart_id, codes).await },
        )
        .await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn mutate_existing<F, Fut>(
        &self,
        op: PendingOp,
        label: &'static str,
        call: F,
    ) -> Result<Cart, CartError>
    where
        F: FnOnce(Arc<dyn CommerceApi>, CartId) -> Fut + Send,
        Fut: Future<Output = Result<Cart, ShopifyError>> + Send,
    {
        let _guard = self.ops.lock().await;
        let cart_id = self.state.borrow().cart_id().ok_or(CartError::NoCart)?;

        self.begin(op);
        match call(Arc::clone(&self.api), cart_id).await {
            Ok(cart) => {
                self.state.send_modify(|s| s.apply(cart.clone()));
                Ok(cart)
            }
            Err(e) => Err(self.fail_mutation(label, e).await),
        }
    }

    /// Current cart id, else the persisted one, else a new cart's.
    ///
    /// A newly created cart's id is persisted immediately, but the snapshot
    /// only changes once the caller's mutation succeeds.
    async fn ensure_cart_id(&self) -> Result<CartId, CartError> {
        if let Some(id) = self.state.borrow().cart_id() {
            return Ok(id);
        }
        if let Some(id) = self.load_persisted().await {
            return Ok(id);
        }

        let cart = self.api.create_cart().await?;
        info!(cart_id = %cart.id, "Created cart");
        self.persist(&cart.id).await;
        Ok(cart.id)
    }

    async fn load_persisted(&self) -> Option<CartId> {
        match self.persistence.load().await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted cart id");
                None
            }
        }
    }

    async fn persist(&self, id: &CartId) {
        if let Err(e) = self.persistence.save(id).await {
            warn!(cart_id = %id, error = %e, "Failed to persist cart id");
        }
    }

    /// Drop the snapshot and the persisted id.
    async fn forget(&self) {
        if let Err(e) = self.persistence.clear().await {
            warn!(error = %e, "Failed to clear persisted cart id");
        }
        self.state.send_modify(|s| {
            if s.cart.take().is_some() {
                s.revision += 1;
            }
            s.settle();
        });
    }

    fn begin(&self, op: PendingOp) {
        self.state.send_modify(|s| s.phase = CartPhase::Busy(op));
    }

    fn fail(&self, label: &'static str, err: CartError) -> CartError {
        error!(operation = label, error = %err, "Cart operation failed");
        self.state.send_modify(CartState::settle);
        err
    }

    async fn fail_mutation(&self, label: &'static str, err: ShopifyError) -> CartError {
        if err.is_missing_cart() {
            warn!(operation = label, "Backend no longer knows the cart, forgetting it");
            self.forget().await;
        }
        self.fail(label, err.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::commerce::MockCommerceApi;
    use crate::shopify::{CartCost, Money};
    use crate::testing::InMemoryCommerce;

    use super::super::persistence::{MemoryCartIdStore, MockCartIdStore};
    use super::*;

    fn store_with(api: Arc<dyn CommerceApi>) -> (CartStore, Arc<MemoryCartIdStore>) {
        let persistence = Arc::new(MemoryCartIdStore::new());
        let store = CartStore::new(api, persistence.clone());
        (store, persistence)
    }

    fn sample_cart(id: &str, quantity: i64) -> Cart {
        Cart {
            id: CartId::new(id),
            checkout_url: format!("https://shop.example.com/checkout/{id}"),
            total_quantity: quantity,
            cost: CartCost {
                subtotal: Money::new("48.0", "CAD"),
                total: Money::new("48.0", "CAD"),
            },
            discount_codes: vec![],
            lines: vec![],
        }
    }

    #[tokio::test]
    async fn test_accessor_defaults_without_cart() {
        let (store, _) = store_with(Arc::new(InMemoryCommerce::new()));
        assert!(store.lines().is_empty());
        assert_eq!(store.subtotal_amount(), "0");
        assert_eq!(store.currency_code(), "USD");
        assert_eq!(store.total_quantity(), 0);
        assert_eq!(store.checkout_url(), "");
        assert_eq!(store.snapshot().phase, CartPhase::Uninitialized);
    }

    #[tokio::test]
    async fn test_init_twice_creates_one_cart() {
        let api = Arc::new(InMemoryCommerce::new());
        let (store, persistence) = store_with(api.clone());

        store.init().await.unwrap();
        store.init().await.unwrap();

        assert_eq!(api.carts_created(), 1);
        assert_eq!(store.snapshot().phase, CartPhase::Ready);
        assert_eq!(persistence.current(), store.cart().map(|c| c.id));
    }

    #[tokio::test]
    async fn test_init_adopts_persisted_id_without_fetching() {
        let mut api = MockCommerceApi::new();
        api.expect_create_cart().never();
        api.expect_get_cart().never();

        let persistence = Arc::new(MemoryCartIdStore::with_id(CartId::new("gid://shopify/Cart/9")));
        let store = CartStore::new(Arc::new(api), persistence);

        store.init().await.unwrap();
        store.init().await.unwrap();

        let cart = store.cart().unwrap();
        assert_eq!(cart.id.as_str(), "gid://shopify/Cart/9");
        assert_eq!(cart.total_quantity, 0);
    }

    #[tokio::test]
    async fn test_init_failure_stays_uninitialized() {
        let mut api = MockCommerceApi::new();
        api.expect_create_cart()
            .times(1)
            .returning(|| Err(ShopifyError::message("Throttled")));

        let (store, persistence) = store_with(Arc::new(api));
        let err = store.init().await.unwrap_err();

        assert!(err.to_string().contains("Throttled"));
        assert_eq!(store.snapshot().phase, CartPhase::Uninitialized);
        assert!(store.cart().is_none());
        assert!(persistence.current().is_none());
    }

    #[tokio::test]
    async fn test_add_item_creates_cart_and_opens_drawer() {
        let api = Arc::new(InMemoryCommerce::new());
        let (store, persistence) = store_with(api.clone());

        let cart = store
            .add_item(VariantId::new("gid://shopify/ProductVariant/1"), 2, None)
            .await
            .unwrap();

        assert_eq!(cart.total_quantity, 2);
        assert_eq!(cart.lines.len(), 1);
        assert!(store.is_open());
        assert!(!store.is_busy());
        assert_eq!(persistence.current(), Some(cart.id));
    }

    #[tokio::test]
    async fn test_add_item_rejects_zero_quantity() {
        let mut api = MockCommerceApi::new();
        api.expect_create_cart().never();
        api.expect_add_cart_lines().never();

        let (store, _) = store_with(Arc::new(api));
        let err = store
            .add_item(VariantId::new("gid://shopify/ProductVariant/1"), 0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity(0)));
    }

    #[tokio::test]
    async fn test_update_to_zero_removes_line() {
        let api = Arc::new(InMemoryCommerce::new());
        let (store, _) = store_with(api);
        let cart = store
            .add_item(VariantId::new("gid://shopify/ProductVariant/1"), 3, None)
            .await
            .unwrap();
        let line_id = cart.lines[0].id.clone();

        let cart = store.update_quantity(&line_id, -1).await.unwrap();
        assert!(cart.lines.is_empty());
        assert_eq!(cart.total_quantity, 0);
    }

    #[tokio::test]
    async fn test_snapshot_is_replaced_not_merged() {
        let mut api = MockCommerceApi::new();
        let returned = sample_cart("gid://shopify/Cart/1", 7);
        let expected = returned.clone();
        api.expect_update_cart_lines()
            .times(1)
            .returning(move |_, _| Ok(returned.clone()));

        let persistence = Arc::new(MemoryCartIdStore::with_id(CartId::new("gid://shopify/Cart/1")));
        let store = CartStore::new(Arc::new(api), persistence);
        store.init().await.unwrap();
        let before = store.snapshot().revision;

        store
            .update_quantity(&CartLineId::new("gid://shopify/CartLine/1"), 7)
            .await
            .unwrap();

        assert_eq!(store.cart(), Some(expected));
        assert_eq!(store.currency_code(), "CAD");
        assert_eq!(store.snapshot().revision, before + 1);
    }

    #[tokio::test]
    async fn test_failure_preserves_snapshot_and_clears_busy() {
        let mut api = MockCommerceApi::new();
        api.expect_remove_cart_lines()
            .times(1)
            .returning(|_, _| Err(ShopifyError::message("Internal error")));

        let persistence = Arc::new(MemoryCartIdStore::with_id(CartId::new("gid://shopify/Cart/1")));
        let store = CartStore::new(Arc::new(api), persistence);
        store.init().await.unwrap();
        let before = store.snapshot();

        let err = store
            .remove_item(&CartLineId::new("gid://shopify/CartLine/1"))
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::Backend(_)));
        let after = store.snapshot();
        assert_eq!(after.cart, before.cart);
        assert_eq!(after.revision, before.revision);
        assert!(!after.is_busy());
        assert_eq!(after.phase, CartPhase::Ready);
    }

    #[tokio::test]
    async fn test_operations_without_cart_make_no_calls() {
        let mut api = MockCommerceApi::new();
        api.expect_update_cart_lines().never();
        api.expect_remove_cart_lines().never();
        api.expect_update_cart_discount_codes().never();

        let (store, _) = store_with(Arc::new(api));
        let line = CartLineId::new("gid://shopify/CartLine/1");

        assert!(matches!(
            store.update_quantity(&line, 2).await,
            Err(CartError::NoCart)
        ));
        assert!(matches!(store.remove_item(&line).await, Err(CartError::NoCart)));
        assert!(matches!(
            store.apply_discount_codes(vec!["WELCOME10".to_string()]).await,
            Err(CartError::NoCart)
        ));
        assert!(!store.is_busy());
    }

    #[tokio::test]
    async fn test_missing_cart_is_forgotten() {
        let mut api = MockCommerceApi::new();
        api.expect_add_cart_lines()
            .times(1)
            .returning(|id, _| Err(ShopifyError::CartNotFound(id.to_string())));

        let persistence = Arc::new(MemoryCartIdStore::with_id(CartId::new("gid://shopify/Cart/old")));
        let store = CartStore::new(Arc::new(api), persistence.clone());
        store.init().await.unwrap();

        let err = store
            .add_item(VariantId::new("gid://shopify/ProductVariant/1"), 1, None)
            .await
            .unwrap_err();

        assert!(err.is_missing_cart());
        assert!(store.cart().is_none());
        assert!(persistence.current().is_none());
        assert_eq!(store.snapshot().phase, CartPhase::Uninitialized);
    }

    #[tokio::test]
    async fn test_refresh_forgets_unknown_cart() {
        let mut api = MockCommerceApi::new();
        api.expect_get_cart().times(1).returning(|_| Ok(None));

        let persistence = Arc::new(MemoryCartIdStore::with_id(CartId::new("gid://shopify/Cart/gone")));
        let store = CartStore::new(Arc::new(api), persistence.clone());
        store.init().await.unwrap();

        assert!(store.refresh().await.unwrap().is_none());
        assert!(store.cart().is_none());
        assert!(persistence.current().is_none());
    }

    #[tokio::test]
    async fn test_persistence_failure_does_not_block_cart() {
        let mut persistence = MockCartIdStore::new();
        persistence.expect_load().returning(|| Ok(None));
        persistence.expect_save().returning(|_| {
            Err(PersistenceError::Io(std::io::Error::other("disk full")))
        });

        let store = CartStore::new(Arc::new(InMemoryCommerce::new()), Arc::new(persistence));
        store.init().await.unwrap();
        assert!(store.cart().is_some());
    }

    #[tokio::test]
    async fn test_drawer_visibility() {
        let (store, _) = store_with(Arc::new(InMemoryCommerce::new()));
        let mut rx = store.subscribe();

        store.toggle_cart();
        assert!(store.is_open());
        assert!(rx.has_changed().unwrap());
        rx.mark_unchanged();

        store.open_cart();
        assert!(!rx.has_changed().unwrap());

        store.close_cart();
        assert!(!store.is_open());
        store.toggle_cart();
        assert!(store.is_open());
    }

    #[tokio::test]
    async fn test_concurrent_mutations_apply_in_order() {
        let api = Arc::new(InMemoryCommerce::new());
        let (store, _) = store_with(api);
        let store = Arc::new(store);
        store.init().await.unwrap();

        let handles: Vec<_> = (1..=5)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .add_item(VariantId::new(format!("gid://shopify/ProductVariant/{i}")), 1, None)
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let state = store.snapshot();
        assert_eq!(state.total_quantity(), 5);
        assert_eq!(state.lines().len(), 5);
        assert_eq!(
            state.total_quantity(),
            state.lines().iter().map(|l| l.quantity).sum::<i64>()
        );
    }
}
