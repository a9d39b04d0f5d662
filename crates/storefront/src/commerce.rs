//! The commerce backend seam.
//!
//! Everything above the Shopify client (cart store, search, routes, CLI)
//! talks to the backend through [`CommerceApi`], so tests can swap in a
//! mock or the in-memory fake.

use async_trait::async_trait;
use lumiere_core::{CartId, CartLineId};
use mockall::automock;

use crate::shopify::{
    Cart, CartLineInput, CartLineUpdateInput, Collection, CollectionWithProducts, Product,
    ProductPage, ProductSummary, ShopifyError, StorefrontClient,
};

#[automock]
#[async_trait]
pub trait CommerceApi: Send + Sync {
    /// One page of products, best sellers first.
    async fn list_products(
        &self,
        count: i64,
        cursor: Option<String>,
    ) -> Result<ProductPage, ShopifyError>;

    /// A product by handle; `None` when absent.
    async fn get_product_by_handle(&self, handle: &str) -> Result<Option<Product>, ShopifyError>;

    async fn list_collections(&self, count: i64) -> Result<Vec<Collection>, ShopifyError>;

    /// A collection with one page of products; `None` when absent.
    async fn get_collection_by_handle(
        &self,
        handle: &str,
        count: i64,
        cursor: Option<String>,
    ) -> Result<Option<CollectionWithProducts>, ShopifyError>;

    async fn search_products(&self, term: &str, count: i64) -> Result<Vec<Product>, ShopifyError>;

    async fn suggest_products(
        &self,
        term: &str,
        count: i64,
    ) -> Result<Vec<ProductSummary>, ShopifyError>;

    /// Create an empty cart.
    async fn create_cart(&self) -> Result<Cart, ShopifyError>;

    /// Fetch a cart; `None` when the backend no longer knows the id.
    async fn get_cart(&self, cart_id: &CartId) -> Result<Option<Cart>, ShopifyError>;

    async fn add_cart_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError>;

    async fn update_cart_lines(
        &self,
        cart_id: &CartId,
        updates: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError>;

    async fn remove_cart_lines(
        &self,
        cart_id: &CartId,
        line_ids: Vec<CartLineId>,
    ) -> Result<Cart, ShopifyError>;

    async fn update_cart_discount_codes(
        &self,
        cart_id: &CartId,
        codes: Vec<String>,
    ) -> Result<Cart, ShopifyError>;
}

#[async_trait]
impl CommerceApi for StorefrontClient {
    async fn list_products(
        &self,
        count: i64,
        cursor: Option<String>,
    ) -> Result<ProductPage, ShopifyError> {
        Self::list_products(self, count, cursor).await
    }

    async fn get_product_by_handle(&self, handle: &str) -> Result<Option<Product>, ShopifyError> {
        Self::get_product_by_handle(self, handle).await
    }

    async fn list_collections(&self, count: i64) -> Result<Vec<Collection>, ShopifyError> {
        Self::list_collections(self, count).await
    }

    async fn get_collection_by_handle(
        &self,
        handle: &str,
        count: i64,
        cursor: Option<String>,
    ) -> Result<Option<CollectionWithProducts>, ShopifyError> {
        Self::get_collection_by_handle(self, handle, count, cursor).await
    }

    async fn search_products(&self, term: &str, count: i64) -> Result<Vec<Product>, ShopifyError> {
        Self::search_products(self, term, count).await
    }

    async fn suggest_products(
        &self,
        term: &str,
        count: i64,
    ) -> Result<Vec<ProductSummary>, ShopifyError> {
        Self::suggest_products(self, term, count).await
    }

    async fn create_cart(&self) -> Result<Cart, ShopifyError> {
        Self::create_cart(self).await
    }

    async fn get_cart(&self, cart_id: &CartId) -> Result<Option<Cart>, ShopifyError> {
        Self::get_cart(self, cart_id).await
    }

    async fn add_cart_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        Self::add_cart_lines(self, cart_id, lines).await
    }

    async fn update_cart_lines(
        &self,
        cart_id: &CartId,
        updates: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        Self::update_cart_lines(self, cart_id, updates).await
    }

    async fn remove_cart_lines(
        &self,
        cart_id: &CartId,
        line_ids: Vec<CartLineId>,
    ) -> Result<Cart, ShopifyError> {
        Self::remove_cart_lines(self, cart_id, line_ids).await
    }

    async fn update_cart_discount_codes(
        &self,
        cart_id: &CartId,
        codes: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        Self::update_cart_discount_codes(self, cart_id, codes).await
    }
}
