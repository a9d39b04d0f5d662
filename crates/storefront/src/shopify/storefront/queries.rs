//! GraphQL operation definitions for the Shopify Storefront API.
//!
//! Each operation is a unit struct implementing `graphql_client::GraphQLQuery`
//! with a module of the same name (snake case) holding its document,
//! `Variables` and `ResponseData`. Response shapes mirror the API verbatim
//! (edges/nodes, camelCase); `conversions` maps them to domain types.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

// =============================================================================
// Fragments
// =============================================================================

macro_rules! product_fragment {
    () => {
        r"
fragment ProductFields on Product {
  id
  title
  handle
  description
  descriptionHtml
  productType
  tags
  priceRange {
    minVariantPrice { amount currencyCode }
    maxVariantPrice { amount currencyCode }
  }
  compareAtPriceRange {
    minVariantPrice { amount currencyCode }
  }
  images(first: 10) {
    edges { node { url altText width height } }
  }
  variants(first: 50) {
    edges {
      node {
        id
        title
        availableForSale
        price { amount currencyCode }
        compareAtPrice { amount currencyCode }
        selectedOptions { name value }
        image { url altText width height }
      }
    }
  }
}
"
    };
}

macro_rules! collection_fragment {
    () => {
        r"
fragment CollectionFields on Collection {
  id
  title
  handle
  description
  image { url altText width height }
}
"
    };
}

macro_rules! cart_fragment {
    () => {
        r"
fragment CartFields on Cart {
  id
  checkoutUrl
  totalQuantity
  cost {
    totalAmount { amount currencyCode }
    subtotalAmount { amount currencyCode }
  }
  discountCodes { code applicable }
  lines(first: 100) {
    edges {
      node {
        id
        quantity
        cost {
          amountPerQuantity { amount currencyCode }
          totalAmount { amount currencyCode }
        }
        sellingPlanAllocation { sellingPlan { id } }
        merchandise {
          ... on ProductVariant {
            id
            title
            price { amount currencyCode }
            image { url altText width height }
            product { title handle }
          }
        }
      }
    }
  }
}
"
    };
}

macro_rules! cart_errors_fragment {
    () => {
        r"
fragment CartPayloadErrors on CartUserError {
  code
  field
  message
}
"
    };
}

/// Declares a `GraphQLQuery` implementation for an operation module.
macro_rules! graphql_operation {
    ($name:ident, $module:ident) => {
        pub struct $name;

        impl GraphQLQuery for $name {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $module::QUERY,
                    operation_name: $module::OPERATION_NAME,
                }
            }
        }
    };
}

// =============================================================================
// Shared response shapes
// =============================================================================

/// `{ edges: [{ node }] }` connection wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
}

impl<T> Connection<T> {
    /// Unwrap the edge nodes in order.
    pub fn into_nodes(self) -> impl Iterator<Item = T> {
        self.edges.into_iter().map(|e| e.node)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfoNode {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyNode {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageNode {
    pub url: String,
    pub alt_text: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeNode {
    pub min_variant_price: MoneyNode,
    pub max_variant_price: MoneyNode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareAtPriceRangeNode {
    pub min_variant_price: MoneyNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedOptionNode {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantNode {
    pub id: String,
    pub title: String,
    pub available_for_sale: bool,
    pub price: MoneyNode,
    pub compare_at_price: Option<MoneyNode>,
    #[serde(default)]
    pub selected_options: Vec<SelectedOptionNode>,
    pub image: Option<ImageNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductNode {
    pub id: String,
    pub title: String,
    pub handle: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub description_html: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub price_range: PriceRangeNode,
    pub compare_at_price_range: Option<CompareAtPriceRangeNode>,
    pub images: Connection<ImageNode>,
    pub variants: Connection<VariantNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductConnectionNode {
    pub page_info: PageInfoNode,
    pub edges: Vec<Edge<ProductNode>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionNode {
    pub id: String,
    pub title: String,
    pub handle: String,
    #[serde(default)]
    pub description: String,
    pub image: Option<ImageNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionWithProductsNode {
    #[serde(flatten)]
    pub collection: CollectionNode,
    pub products: ProductConnectionNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinPriceRangeNode {
    #[serde(rename = "minVariantPrice")]
    pub min_variant_price: MoneyNode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionNode {
    pub id: String,
    pub title: String,
    pub handle: String,
    pub price_range: MinPriceRangeNode,
    pub images: Connection<ImageNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCostNode {
    pub total_amount: MoneyNode,
    pub subtotal_amount: MoneyNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscountCodeNode {
    pub code: String,
    pub applicable: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineCostNode {
    pub amount_per_quantity: MoneyNode,
    pub total_amount: MoneyNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MerchandiseProductNode {
    pub title: String,
    pub handle: String,
}

/// Merchandise is a union; only `ProductVariant` members carry fields.
#[derive(Debug, Clone, Deserialize)]
pub struct MerchandiseNode {
    pub id: Option<String>,
    pub title: Option<String>,
    pub price: Option<MoneyNode>,
    pub image: Option<ImageNode>,
    pub product: Option<MerchandiseProductNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SellingPlanRefNode {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellingPlanAllocationNode {
    pub selling_plan: SellingPlanRefNode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineNode {
    pub id: String,
    pub quantity: i64,
    pub cost: CartLineCostNode,
    pub merchandise: MerchandiseNode,
    pub selling_plan_allocation: Option<SellingPlanAllocationNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartNode {
    pub id: String,
    pub checkout_url: String,
    pub total_quantity: i64,
    pub cost: CartCostNode,
    #[serde(default)]
    pub discount_codes: Vec<DiscountCodeNode>,
    pub lines: Connection<CartLineNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserErrorNode {
    pub code: Option<String>,
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Common payload of every cart mutation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPayload {
    pub cart: Option<CartNode>,
    #[serde(default)]
    pub user_errors: Vec<UserErrorNode>,
}

/// Line input as the API expects it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInputVar {
    pub merchandise_id: String,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selling_plan_id: Option<String>,
}

/// Line update as the API expects it.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineUpdateVar {
    pub id: String,
    pub quantity: i64,
}

// =============================================================================
// Product queries
// =============================================================================

graphql_operation!(GetProducts, get_products);

pub mod get_products {
    use super::{Deserialize, ProductConnectionNode, Serialize};

    pub const OPERATION_NAME: &str = "GetProducts";
    pub const QUERY: &str = concat!(
        product_fragment!(),
        r"
query GetProducts($first: Int!, $after: String) {
  products(first: $first, after: $after, sortKey: BEST_SELLING) {
    pageInfo { hasNextPage endCursor }
    edges { node { ...ProductFields } }
  }
}
"
    );

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
        pub after: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub products: ProductConnectionNode,
    }
}

graphql_operation!(GetProductByHandle, get_product_by_handle);

pub mod get_product_by_handle {
    use super::{Deserialize, ProductNode, Serialize};

    pub const OPERATION_NAME: &str = "GetProductByHandle";
    pub const QUERY: &str = concat!(
        product_fragment!(),
        r"
query GetProductByHandle($handle: String!) {
  product(handle: $handle) { ...ProductFields }
}
"
    );

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub handle: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub product: Option<ProductNode>,
    }
}

graphql_operation!(SearchProducts, search_products);

pub mod search_products {
    use super::{Connection, Deserialize, ProductNode, Serialize};

    pub const OPERATION_NAME: &str = "SearchProducts";
    pub const QUERY: &str = concat!(
        product_fragment!(),
        r"
query SearchProducts($query: String!, $first: Int!) {
  search(query: $query, first: $first, types: [PRODUCT]) {
    edges { node { ... on Product { ...ProductFields } } }
  }
}
"
    );

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub query: String,
        pub first: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub search: Connection<ProductNode>,
    }
}

graphql_operation!(SuggestProducts, suggest_products);

pub mod suggest_products {
    use super::{Connection, Deserialize, Serialize, SuggestionNode};

    pub const OPERATION_NAME: &str = "SuggestProducts";
    pub const QUERY: &str = r"
query SuggestProducts($query: String!, $first: Int!) {
  search(query: $query, first: $first, types: [PRODUCT]) {
    edges {
      node {
        ... on Product {
          id
          title
          handle
          priceRange { minVariantPrice { amount currencyCode } }
          images(first: 1) { edges { node { url altText width height } } }
        }
      }
    }
  }
}
";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub query: String,
        pub first: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub search: Connection<SuggestionNode>,
    }
}

// =============================================================================
// Collection queries
// =============================================================================

graphql_operation!(GetCollections, get_collections);

pub mod get_collections {
    use super::{CollectionNode, Connection, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "GetCollections";
    pub const QUERY: &str = concat!(
        collection_fragment!(),
        r"
query GetCollections($first: Int!) {
  collections(first: $first) {
    edges { node { ...CollectionFields } }
  }
}
"
    );

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub collections: Connection<CollectionNode>,
    }
}

graphql_operation!(GetCollectionByHandle, get_collection_by_handle);

pub mod get_collection_by_handle {
    use super::{CollectionWithProductsNode, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "GetCollectionByHandle";
    pub const QUERY: &str = concat!(
        product_fragment!(),
        collection_fragment!(),
        r"
query GetCollectionByHandle($handle: String!, $first: Int!, $after: String) {
  collection(handle: $handle) {
    ...CollectionFields
    products(first: $first, after: $after) {
      pageInfo { hasNextPage endCursor }
      edges { node { ...ProductFields } }
    }
  }
}
"
    );

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub handle: String,
        pub first: i64,
        pub after: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub collection: Option<CollectionWithProductsNode>,
    }
}

// =============================================================================
// Cart operations
// =============================================================================

graphql_operation!(GetCart, get_cart);

pub mod get_cart {
    use super::{CartNode, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "GetCart";
    pub const QUERY: &str = concat!(
        cart_fragment!(),
        r"
query GetCart($cartId: ID!) {
  cart(id: $cartId) { ...CartFields }
}
"
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub cart: Option<CartNode>,
    }
}

graphql_operation!(CreateCart, create_cart);

pub mod create_cart {
    use super::{CartPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "CreateCart";
    pub const QUERY: &str = concat!(
        cart_fragment!(),
        cart_errors_fragment!(),
        r"
mutation CreateCart {
  cartCreate {
    cart { ...CartFields }
    userErrors { ...CartPayloadErrors }
  }
}
"
    );

    #[derive(Debug, Clone, Default, Serialize)]
    pub struct Variables {}

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<CartPayload>,
    }
}

graphql_operation!(AddCartLines, add_cart_lines);

pub mod add_cart_lines {
    use super::{CartLineInputVar, CartPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "AddCartLines";
    pub const QUERY: &str = concat!(
        cart_fragment!(),
        cart_errors_fragment!(),
        r"
mutation AddCartLines($cartId: ID!, $lines: [CartLineInput!]!) {
  cartLinesAdd(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { ...CartPayloadErrors }
  }
}
"
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineInputVar>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_add: Option<CartPayload>,
    }
}

graphql_operation!(UpdateCartLines, update_cart_lines);

pub mod update_cart_lines {
    use super::{CartLineUpdateVar, CartPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "UpdateCartLines";
    pub const QUERY: &str = concat!(
        cart_fragment!(),
        cart_errors_fragment!(),
        r"
mutation UpdateCartLines($cartId: ID!, $lines: [CartLineUpdateInput!]!) {
  cartLinesUpdate(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { ...CartPayloadErrors }
  }
}
"
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineUpdateVar>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_update: Option<CartPayload>,
    }
}

graphql_operation!(RemoveCartLines, remove_cart_lines);

pub mod remove_cart_lines {
    use super::{CartPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "RemoveCartLines";
    pub const QUERY: &str = concat!(
        cart_fragment!(),
        cart_errors_fragment!(),
        r"
mutation RemoveCartLines($cartId: ID!, $lineIds: [ID!]!) {
  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {
    cart { ...CartFields }
    userErrors { ...CartPayloadErrors }
  }
}
"
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub line_ids: Vec<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_remove: Option<CartPayload>,
    }
}

graphql_operation!(UpdateCartDiscountCodes, update_cart_discount_codes);

pub mod update_cart_discount_codes {
    use super::{CartPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "UpdateCartDiscountCodes";
    pub const QUERY: &str = concat!(
        cart_fragment!(),
        cart_errors_fragment!(),
        r"
mutation UpdateCartDiscountCodes($cartId: ID!, $discountCodes: [String!]!) {
  cartDiscountCodesUpdate(cartId: $cartId, discountCodes: $discountCodes) {
    cart { ...CartFields }
    userErrors { ...CartPayloadErrors }
  }
}
"
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub discount_codes: Vec<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_discount_codes_update: Option<CartPayload>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query_uses_operation_name() {
        let body = AddCartLines::build_query(add_cart_lines::Variables {
            cart_id: "gid://shopify/Cart/1".to_string(),
            lines: vec![CartLineInputVar {
                merchandise_id: "gid://shopify/ProductVariant/1".to_string(),
                quantity: 2,
                selling_plan_id: None,
            }],
        });
        assert_eq!(body.operation_name, "AddCartLines");
        assert!(body.query.contains("fragment CartFields on Cart"));
        assert!(body.query.contains("cartLinesAdd(cartId: $cartId"));

        let json = serde_json::to_value(&body).unwrap_or_default();
        assert_eq!(json["variables"]["cartId"], "gid://shopify/Cart/1");
        assert_eq!(
            json["variables"]["lines"][0]["merchandiseId"],
            "gid://shopify/ProductVariant/1"
        );
        assert!(json["variables"]["lines"][0].get("sellingPlanId").is_none());
    }

    #[test]
    fn test_collection_query_includes_both_fragments() {
        assert!(get_collection_by_handle::QUERY.contains("fragment ProductFields"));
        assert!(get_collection_by_handle::QUERY.contains("fragment CollectionFields"));
    }

    /// Fragments a document defines but never spreads.
    fn unused_fragments(query: &str) -> Vec<&str> {
        query
            .split("fragment ")
            .skip(1)
            .filter_map(|rest| rest.split_whitespace().next())
            .filter(|name| !query.contains(&format!("...{name}")))
            .collect()
    }

    #[test]
    fn test_every_defined_fragment_is_spread() {
        let documents = [
            (get_products::OPERATION_NAME, get_products::QUERY),
            (
                get_product_by_handle::OPERATION_NAME,
                get_product_by_handle::QUERY,
            ),
            (search_products::OPERATION_NAME, search_products::QUERY),
            (suggest_products::OPERATION_NAME, suggest_products::QUERY),
            (get_collections::OPERATION_NAME, get_collections::QUERY),
            (
                get_collection_by_handle::OPERATION_NAME,
                get_collection_by_handle::QUERY,
            ),
            (get_cart::OPERATION_NAME, get_cart::QUERY),
            (create_cart::OPERATION_NAME, create_cart::QUERY),
            (add_cart_lines::OPERATION_NAME, add_cart_lines::QUERY),
            (update_cart_lines::OPERATION_NAME, update_cart_lines::QUERY),
            (remove_cart_lines::OPERATION_NAME, remove_cart_lines::QUERY),
            (
                update_cart_discount_codes::OPERATION_NAME,
                update_cart_discount_codes::QUERY,
            ),
        ];
        for (name, query) in documents {
            assert!(
                unused_fragments(query).is_empty(),
                "{name} defines unused fragments: {:?}",
                unused_fragments(query)
            );
        }
    }

    #[test]
    fn test_cart_query_omits_mutation_errors() {
        assert!(get_cart::QUERY.contains("fragment CartFields on Cart"));
        assert!(!get_cart::QUERY.contains("CartPayloadErrors"));
        assert!(create_cart::QUERY.contains("fragment CartPayloadErrors on CartUserError"));
    }

    #[test]
    fn test_remove_variables_are_camel_case() {
        let vars = remove_cart_lines::Variables {
            cart_id: "c".to_string(),
            line_ids: vec!["l".to_string()],
        };
        let json = serde_json::to_value(vars).unwrap_or_default();
        assert_eq!(json["lineIds"][0], "l");
    }
}
