//! In-memory commerce backend for tests.
//!
//! [`InMemoryCommerce`] keeps a catalog and carts in process and does the
//! cart arithmetic the real backend would: lines merge per variant and
//! selling plan, totals follow the lines, unknown carts are reported the
//! same way Shopify reports them. Latency and one-shot failures can be
//! injected to exercise ordering and error paths.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use lumiere_core::{CartId, CartLineId, CollectionId, ProductId, VariantId};
use rust_decimal::Decimal;

use crate::commerce::CommerceApi;
use crate::shopify::{
    Cart, CartCost, CartDiscountCode, CartLine, CartLineCost, CartLineInput, CartLineUpdateInput,
    CartMerchandise, CartMerchandiseProduct, Collection, CollectionWithProducts, Image, Money,
    PageInfo, PriceRange, Product, ProductPage, ProductSummary, ProductVariant, ShopifyError,
};

/// Unit price for variants missing from the catalog.
const FALLBACK_PRICE: &str = "24.00";
const CURRENCY: &str = "USD";

/// A one-variant product priced in US dollars.
#[must_use]
pub fn sample_product(handle: &str, title: &str, price: &str) -> Product {
    let money = Money::new(price, CURRENCY);
    Product {
        id: ProductId::new(format!("gid://shopify/Product/{handle}")),
        handle: handle.to_string(),
        title: title.to_string(),
        description: format!("{title}, hand-poured."),
        description_html: format!("<p>{title}, hand-poured.</p>"),
        kind: "Candle".to_string(),
        tags: vec!["candle".to_string()],
        price_range: PriceRange {
            min_variant_price: money.clone(),
            max_variant_price: money.clone(),
        },
        compare_at_price: None,
        images: vec![Image {
            url: format!("https://cdn.example.com/{handle}.jpg"),
            alt_text: Some(title.to_string()),
            width: Some(800),
            height: Some(800),
        }],
        variants: vec![ProductVariant {
            id: VariantId::new(format!("gid://shopify/ProductVariant/{handle}")),
            title: "Default Title".to_string(),
            available_for_sale: true,
            price: money,
            compare_at_price: None,
            selected_options: vec![],
            image: None,
        }],
    }
}

/// A collection wrapper with no products.
#[must_use]
pub fn sample_collection(handle: &str, title: &str) -> Collection {
    Collection {
        id: CollectionId::new(format!("gid://shopify/Collection/{handle}")),
        handle: handle.to_string(),
        title: title.to_string(),
        description: String::new(),
        image: None,
    }
}

#[derive(Default)]
struct Inner {
    products: Vec<Product>,
    collections: Vec<(Collection, Vec<String>)>,
    suggestions: Vec<ProductSummary>,
    discounts: HashMap<String, Decimal>,
    carts: HashMap<CartId, Cart>,
    next_id: u64,
    carts_created: usize,
    suggest_calls: Vec<String>,
    latency: Option<Duration>,
    fail_next: Option<String>,
}

/// Process-local stand-in for the Storefront API.
#[derive(Default)]
pub struct InMemoryCommerce {
    inner: Mutex<Inner>,
}

impl InMemoryCommerce {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_product(&self, product: Product) {
        self.lock().products.push(product);
    }

    /// Register a collection containing the products with `handles`.
    pub fn add_collection(&self, collection: Collection, handles: &[&str]) {
        let handles = handles.iter().map(ToString::to_string).collect();
        self.lock().collections.push((collection, handles));
    }

    /// Register a type-ahead suggestion. Suggestions match on title or
    /// handle, case-insensitively.
    pub fn add_suggestion(&self, summary: ProductSummary) {
        self.lock().suggestions.push(summary);
    }

    /// Accept `code` as a discount of `percent` off the subtotal.
    pub fn add_discount_code(&self, code: &str, percent: Decimal) {
        self.lock().discounts.insert(code.to_uppercase(), percent);
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = Some(latency);
    }

    /// Fail the next call with `message`.
    pub fn fail_next(&self, message: &str) {
        self.lock().fail_next = Some(message.to_string());
    }

    /// Drop a cart, as if it expired on the backend.
    pub fn expire_cart(&self, id: &CartId) {
        self.lock().carts.remove(id);
    }

    #[must_use]
    pub fn carts_created(&self) -> usize {
        self.lock().carts_created
    }

    /// Terms passed to `suggest_products`, in call order.
    #[must_use]
    pub fn suggest_calls(&self) -> Vec<String> {
        self.lock().suggest_calls.clone()
    }

    /// The backend's copy of a cart.
    #[must_use]
    pub fn cart(&self, id: &CartId) -> Option<Cart> {
        self.lock().carts.get(id).cloned()
    }

    async fn enter(&self) -> Result<(), ShopifyError> {
        let (latency, failure) = {
            let mut inner = self.lock();
            (inner.latency, inner.fail_next.take())
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        failure.map_or(Ok(()), |message| Err(ShopifyError::message(message)))
    }

    fn mutate_cart(
        &self,
        cart_id: &CartId,
        f: impl FnOnce(&mut Inner, &mut Cart) -> Result<(), ShopifyError>,
    ) -> Result<Cart, ShopifyError> {
        let mut inner = self.lock();
        let mut cart = inner
            .carts
            .get(cart_id)
            .cloned()
            .ok_or_else(|| ShopifyError::CartNotFound(cart_id.to_string()))?;
        f(&mut inner, &mut cart)?;
        reprice(&inner, &mut cart);
        inner.carts.insert(cart.id.clone(), cart.clone());
        Ok(cart)
    }
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn merchandise(&self, variant_id: &VariantId) -> CartMerchandise {
        let found = self.products.iter().find_map(|p| {
            p.variants
                .iter()
                .find(|v| &v.id == variant_id)
                .map(|v| (p, v))
        });
        match found {
            Some((product, variant)) => CartMerchandise {
                id: variant.id.clone(),
                title: variant.title.clone(),
                price: variant.price.clone(),
                image: variant.image.clone().or_else(|| product.featured_image().cloned()),
                product: CartMerchandiseProduct {
                    title: product.title.clone(),
                    handle: product.handle.clone(),
                },
            },
            None => CartMerchandise {
                id: variant_id.clone(),
                title: "Default Title".to_string(),
                price: Money::new(FALLBACK_PRICE, CURRENCY),
                image: None,
                product: CartMerchandiseProduct {
                    title: variant_id.to_string(),
                    handle: String::new(),
                },
            },
        }
    }
}

fn money(amount: Decimal) -> Money {
    Money::new(amount.normalize().to_string(), CURRENCY)
}

/// Recompute line costs and cart totals from the lines.
fn reprice(inner: &Inner, cart: &mut Cart) {
    let mut subtotal = Decimal::ZERO;
    for line in &mut cart.lines {
        let unit = line.merchandise.price.amount_decimal();
        let total = unit * Decimal::from(line.quantity);
        line.cost = CartLineCost {
            amount_per_quantity: money(unit),
            total_amount: money(total),
        };
        subtotal += total;
    }

    let percent: Decimal = cart
        .discount_codes
        .iter_mut()
        .map(|code| {
            let found = inner.discounts.get(&code.code.to_uppercase()).copied();
            code.applicable = found.is_some();
            found.unwrap_or_default()
        })
        .sum();
    let discount = (subtotal * percent / Decimal::ONE_HUNDRED).round_dp(2);

    cart.total_quantity = cart.lines.iter().map(|l| l.quantity).sum();
    cart.cost = CartCost {
        subtotal: money(subtotal),
        total: money((subtotal - discount).max(Decimal::ZERO)),
    };
}

fn missing_line(id: &CartLineId) -> ShopifyError {
    ShopifyError::UserError(format!("The merchandise line with id {id} does not exist."))
}

#[async_trait]
impl CommerceApi for InMemoryCommerce {
    async fn list_products(
        &self,
        count: i64,
        cursor: Option<String>,
    ) -> Result<ProductPage, ShopifyError> {
        self.enter().await?;
        let inner = self.lock();
        let start = cursor.and_then(|c| c.parse::<usize>().ok()).unwrap_or(0);
        let count = usize::try_from(count).unwrap_or(0);
        let products: Vec<Product> = inner
            .products
            .iter()
            .skip(start)
            .take(count)
            .cloned()
            .collect();
        let end = start + products.len();
        Ok(ProductPage {
            page_info: PageInfo {
                has_next_page: end < inner.products.len(),
                end_cursor: (!products.is_empty()).then(|| end.to_string()),
            },
            products,
        })
    }

    async fn get_product_by_handle(&self, handle: &str) -> Result<Option<Product>, ShopifyError> {
        self.enter().await?;
        Ok(self
            .lock()
            .products
            .iter()
            .find(|p| p.handle == handle)
            .cloned())
    }

    async fn list_collections(&self, count: i64) -> Result<Vec<Collection>, ShopifyError> {
        self.enter().await?;
        let count = usize::try_from(count).unwrap_or(0);
        Ok(self
            .lock()
            .collections
            .iter()
            .take(count)
            .map(|(c, _)| c.clone())
            .collect())
    }

    async fn get_collection_by_handle(
        &self,
        handle: &str,
        count: i64,
        _cursor: Option<String>,
    ) -> Result<Option<CollectionWithProducts>, ShopifyError> {
        self.enter().await?;
        let inner = self.lock();
        let Some((collection, handles)) = inner.collections.iter().find(|(c, _)| c.handle == handle)
        else {
            return Ok(None);
        };
        let count = usize::try_from(count).unwrap_or(0);
        let members: Vec<&Product> = inner
            .products
            .iter()
            .filter(|p| handles.contains(&p.handle))
            .collect();
        Ok(Some(CollectionWithProducts {
            collection: collection.clone(),
            page_info: PageInfo {
                has_next_page: members.len() > count,
                end_cursor: None,
            },
            products: members.into_iter().take(count).cloned().collect(),
        }))
    }

    async fn search_products(&self, term: &str, count: i64) -> Result<Vec<Product>, ShopifyError> {
        self.enter().await?;
        let needle = term.to_lowercase();
        let count = usize::try_from(count).unwrap_or(0);
        Ok(self
            .lock()
            .products
            .iter()
            .filter(|p| {
                p.title.to_lowercase().contains(&needle)
                    || p.handle.contains(&needle)
                    || p.tags.iter().any(|t| t.to_lowercase() == needle)
            })
            .take(count)
            .cloned()
            .collect())
    }

    async fn suggest_products(
        &self,
        term: &str,
        count: i64,
    ) -> Result<Vec<ProductSummary>, ShopifyError> {
        self.lock().suggest_calls.push(term.to_string());
        self.enter().await?;
        let needle = term.to_lowercase();
        let count = usize::try_from(count).unwrap_or(0);
        Ok(self
            .lock()
            .suggestions
            .iter()
            .filter(|s| s.title.to_lowercase().contains(&needle) || s.handle.contains(&needle))
            .take(count)
            .cloned()
            .collect())
    }

    async fn create_cart(&self) -> Result<Cart, ShopifyError> {
        self.enter().await?;
        let mut inner = self.lock();
        let n = inner.next_id();
        let mut cart = Cart::with_id(CartId::new(format!("gid://shopify/Cart/c{n}")));
        cart.checkout_url = format!("https://checkout.example.com/cart/c/c{n}");
        inner.carts_created += 1;
        inner.carts.insert(cart.id.clone(), cart.clone());
        Ok(cart)
    }

    async fn get_cart(&self, cart_id: &CartId) -> Result<Option<Cart>, ShopifyError> {
        self.enter().await?;
        Ok(self.lock().carts.get(cart_id).cloned())
    }

    async fn add_cart_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        self.enter().await?;
        self.mutate_cart(cart_id, |inner, cart| {
            for input in lines {
                if let Some(existing) = cart.lines.iter_mut().find(|l| {
                    l.merchandise.id == input.merchandise_id
                        && l.selling_plan_id == input.selling_plan_id
                }) {
                    existing.quantity += input.quantity;
                    continue;
                }
                let n = inner.next_id();
                let merchandise = inner.merchandise(&input.merchandise_id);
                cart.lines.push(CartLine {
                    id: CartLineId::new(format!("gid://shopify/CartLine/{n}")),
                    quantity: input.quantity,
                    cost: CartLineCost {
                        amount_per_quantity: merchandise.price.clone(),
                        total_amount: merchandise.price.clone(),
                    },
                    merchandise,
                    selling_plan_id: input.selling_plan_id,
                });
            }
            Ok(())
        })
    }

    async fn update_cart_lines(
        &self,
        cart_id: &CartId,
        updates: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        self.enter().await?;
        self.mutate_cart(cart_id, |_, cart| {
            for update in updates {
                let line = cart
                    .lines
                    .iter_mut()
                    .find(|l| l.id == update.id)
                    .ok_or_else(|| missing_line(&update.id))?;
                line.quantity = update.quantity;
            }
            cart.lines.retain(|l| l.quantity > 0);
            Ok(())
        })
    }

    async fn remove_cart_lines(
        &self,
        cart_id: &CartId,
        line_ids: Vec<CartLineId>,
    ) -> Result<Cart, ShopifyError> {
        self.enter().await?;
        self.mutate_cart(cart_id, |_, cart| {
            if let Some(unknown) = line_ids.iter().find(|id| cart.line(id).is_none()) {
                return Err(missing_line(unknown));
            }
            cart.lines.retain(|l| !line_ids.contains(&l.id));
            Ok(())
        })
    }

    async fn update_cart_discount_codes(
        &self,
        cart_id: &CartId,
        codes: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        self.enter().await?;
        self.mutate_cart(cart_id, |_, cart| {
            cart.discount_codes = codes
                .into_iter()
                .map(|code| CartDiscountCode {
                    code,
                    applicable: false,
                })
                .collect();
            Ok(())
        })
    }
}
