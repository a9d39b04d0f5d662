//! Domain types for the Shopify Storefront API.
//!
//! These types provide a clean, ergonomic API separate from the raw GraphQL
//! response shapes in `storefront::queries` (edges/nodes, camelCase).

use lumiere_core::{
    CartId, CartLineId, CollectionId, CurrencyCode, Price, PriceError, ProductId, SellingPlanId,
    VariantId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Money Types
// =============================================================================

/// Monetary amount with currency code, exactly as the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Decimal amount as string (preserves precision).
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

impl Money {
    /// Create a money value from its string parts.
    #[must_use]
    pub fn new(amount: impl Into<String>, currency_code: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            currency_code: currency_code.into(),
        }
    }

    /// Parse into a decimal [`Price`].
    ///
    /// # Errors
    ///
    /// Returns `PriceError` if the backend sent a malformed amount or code.
    pub fn to_price(&self) -> Result<Price, PriceError> {
        Price::parse(&self.amount, &self.currency_code)
    }

    /// Decimal amount, or zero if the amount does not parse.
    #[must_use]
    pub fn amount_decimal(&self) -> Decimal {
        self.amount.trim().parse().unwrap_or_default()
    }

    /// Currency code, falling back to USD if the code is malformed.
    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.currency_code.parse().unwrap_or_default()
    }

    /// Format for display (e.g., "$24.00").
    #[must_use]
    pub fn display(&self) -> String {
        lumiere_core::format_price(self.amount_decimal(), &self.currency())
    }
}

/// Price range for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    /// Minimum price among all variants.
    pub min_variant_price: Money,
    /// Maximum price among all variants.
    pub max_variant_price: Money,
}

// =============================================================================
// Image Types
// =============================================================================

/// Product, variant, or collection image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    pub alt_text: Option<String>,
    /// Image width in pixels.
    pub width: Option<i64>,
    /// Image height in pixels.
    pub height: Option<i64>,
}

// =============================================================================
// Product Types
// =============================================================================

/// Selected option on a product variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    /// Option name (e.g., "Size", "Scent").
    pub name: String,
    /// Selected value (e.g., "8 oz", "Vanilla").
    pub value: String,
}

/// A product variant (specific combination of options).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    /// Variant ID.
    pub id: VariantId,
    /// Variant title (combination of option values).
    pub title: String,
    /// Whether this variant is available for sale.
    pub available_for_sale: bool,
    /// Current price.
    pub price: Money,
    /// Compare-at price (original price if on sale).
    pub compare_at_price: Option<Money>,
    /// Selected options for this variant.
    pub selected_options: Vec<SelectedOption>,
    /// Variant image.
    pub image: Option<Image>,
}

/// A product in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// URL handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Plain text description.
    pub description: String,
    /// HTML description.
    pub description_html: String,
    /// Product type/category.
    #[serde(rename = "product_type")]
    pub kind: String,
    /// Product tags.
    pub tags: Vec<String>,
    /// Price range across variants.
    pub price_range: PriceRange,
    /// Lowest compare-at price across variants, if any variant has one.
    pub compare_at_price: Option<Money>,
    /// Product images (first 10).
    pub images: Vec<Image>,
    /// Product variants (first 50).
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// The first image, used as the product's thumbnail.
    #[must_use]
    pub fn featured_image(&self) -> Option<&Image> {
        self.images.first()
    }

    /// The first variant that is available for sale.
    #[must_use]
    pub fn first_available_variant(&self) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.available_for_sale)
    }
}

/// Lightweight product projection used for search suggestions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    /// Product ID.
    pub id: ProductId,
    /// Product title.
    pub title: String,
    /// URL handle.
    pub handle: String,
    /// Minimum variant price.
    pub price: Money,
    /// First product image.
    pub image: Option<Image>,
}

// =============================================================================
// Collection Types
// =============================================================================

/// A collection of products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Collection ID.
    pub id: CollectionId,
    /// URL handle.
    pub handle: String,
    /// Collection title.
    pub title: String,
    /// Plain text description.
    pub description: String,
    /// Collection image.
    pub image: Option<Image>,
}

/// A collection together with one page of its products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionWithProducts {
    /// The collection itself.
    #[serde(flatten)]
    pub collection: Collection,
    /// Products in this page.
    pub products: Vec<Product>,
    /// Pagination info for the product list.
    pub page_info: PageInfo,
}

// =============================================================================
// Pagination Types
// =============================================================================

/// Pagination information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Whether there are more items after this page.
    pub has_next_page: bool,
    /// Cursor for the last item.
    pub end_cursor: Option<String>,
}

/// Paginated list of products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPage {
    /// Products in this page.
    pub products: Vec<Product>,
    /// Pagination info.
    pub page_info: PageInfo,
}

// =============================================================================
// Cart Types
// =============================================================================

/// Merchandise in a cart line (simplified product variant info).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartMerchandise {
    /// Variant ID.
    pub id: VariantId,
    /// Variant title.
    pub title: String,
    /// Current price.
    pub price: Money,
    /// Variant image.
    pub image: Option<Image>,
    /// Parent product info.
    pub product: CartMerchandiseProduct,
}

/// Simplified product info for cart merchandise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartMerchandiseProduct {
    /// Product title.
    pub title: String,
    /// Product handle.
    pub handle: String,
}

/// Cost for a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineCost {
    /// Price per unit.
    pub amount_per_quantity: Money,
    /// Total (after discounts).
    pub total_amount: Money,
}

/// A line item in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Cart line ID.
    pub id: CartLineId,
    /// Quantity (always >= 1 while the line exists).
    pub quantity: i64,
    /// Line cost.
    pub cost: CartLineCost,
    /// Product variant.
    pub merchandise: CartMerchandise,
    /// Selling plan (subscription) attached to the line.
    pub selling_plan_id: Option<SellingPlanId>,
}

/// Cart cost summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCost {
    /// Subtotal before tax/shipping.
    #[serde(rename = "subtotal_amount")]
    pub subtotal: Money,
    /// Total amount.
    #[serde(rename = "total_amount")]
    pub total: Money,
}

impl CartCost {
    /// Zero totals in US dollars.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            subtotal: Money::new("0.0", "USD"),
            total: Money::new("0.0", "USD"),
        }
    }
}

/// Discount code applied to cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartDiscountCode {
    /// The discount code.
    pub code: String,
    /// Whether the code is applicable.
    pub applicable: bool,
}

/// A shopping cart snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID.
    pub id: CartId,
    /// Checkout URL.
    pub checkout_url: String,
    /// Total item quantity.
    pub total_quantity: i64,
    /// Cart cost summary.
    pub cost: CartCost,
    /// Applied discount codes.
    pub discount_codes: Vec<CartDiscountCode>,
    /// Cart lines.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// A reference to a known cart ID whose contents have not been fetched.
    ///
    /// Used when a persisted cart ID is adopted on startup: the ID is
    /// trusted, everything else is empty until the next backend response.
    #[must_use]
    pub fn with_id(id: CartId) -> Self {
        Self {
            id,
            checkout_url: String::new(),
            total_quantity: 0,
            cost: CartCost::zero(),
            discount_codes: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// Find a line by ID.
    #[must_use]
    pub fn line(&self, id: &CartLineId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.id == id)
    }
}

/// Input for adding a line to cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    /// Product variant ID.
    pub merchandise_id: VariantId,
    /// Quantity to add.
    pub quantity: i64,
    /// Selling plan ID (for subscriptions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selling_plan_id: Option<SellingPlanId>,
}

impl CartLineInput {
    /// A one-off purchase line.
    #[must_use]
    pub const fn new(merchandise_id: VariantId, quantity: i64) -> Self {
        Self {
            merchandise_id,
            quantity,
            selling_plan_id: None,
        }
    }

    /// Attach a selling plan (subscription) to this line.
    #[must_use]
    pub fn with_selling_plan(mut self, selling_plan_id: Option<SellingPlanId>) -> Self {
        self.selling_plan_id = selling_plan_id;
        self
    }
}

/// Input for updating a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineUpdateInput {
    /// Cart line ID.
    pub id: CartLineId,
    /// New quantity.
    pub quantity: i64,
}

/// User error from cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartUserError {
    /// Error code.
    pub code: Option<String>,
    /// Field path that caused the error.
    pub field: Option<Vec<String>>,
    /// Human-readable error message.
    pub message: String,
}

impl CartUserError {
    /// Whether the backend rejected the cart ID itself.
    #[must_use]
    pub fn is_invalid_cart(&self) -> bool {
        let on_cart_id = self
            .field
            .as_ref()
            .is_some_and(|f| f.iter().any(|p| p == "cartId"));
        let invalid = self.code.as_deref() == Some("INVALID");
        (on_cart_id && invalid) || self.message.contains("cart does not exist")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_display() {
        assert_eq!(Money::new("1234.5", "USD").display(), "$1,234.50");
        assert_eq!(Money::new("garbage", "USD").display(), "$0.00");
    }

    #[test]
    fn test_cart_with_id_is_empty() {
        let cart = Cart::with_id(CartId::new("gid://shopify/Cart/1"));
        assert_eq!(cart.total_quantity, 0);
        assert!(cart.lines.is_empty());
        assert!(cart.checkout_url.is_empty());
    }

    #[test]
    fn test_line_input_serializes_camel_case() {
        let input = CartLineInput::new(VariantId::new("gid://shopify/ProductVariant/1"), 2)
            .with_selling_plan(Some(SellingPlanId::new("gid://shopify/SellingPlan/9")));
        let json = serde_json::to_value(&input).unwrap_or_default();
        assert_eq!(json["merchandiseId"], "gid://shopify/ProductVariant/1");
        assert_eq!(json["quantity"], 2);
        assert_eq!(json["sellingPlanId"], "gid://shopify/SellingPlan/9");
    }

    #[test]
    fn test_invalid_cart_user_error() {
        let err = CartUserError {
            code: Some("INVALID".to_string()),
            field: Some(vec!["cartId".to_string()]),
            message: "The specified cart does not exist.".to_string(),
        };
        assert!(err.is_invalid_cart());

        let other = CartUserError {
            code: Some("INVALID".to_string()),
            field: Some(vec!["lines".to_string(), "0".to_string(), "quantity".to_string()]),
            message: "Quantity must be positive".to_string(),
        };
        assert!(!other.is_invalid_cart());
    }
}
