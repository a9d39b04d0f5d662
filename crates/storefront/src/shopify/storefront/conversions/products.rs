//! Product conversion functions.

use lumiere_core::{ProductId, VariantId};
use rust_decimal::Decimal;

use crate::shopify::types::{
    Money, PriceRange, Product, ProductPage, ProductSummary, ProductVariant, SelectedOption,
};

use super::super::queries::{
    CompareAtPriceRangeNode, ProductConnectionNode, ProductNode, SuggestionNode, VariantNode,
};

/// Convert a full product node.
pub fn convert_product(node: ProductNode) -> Product {
    Product {
        id: ProductId::new(node.id),
        handle: node.handle,
        title: node.title,
        description: node.description,
        description_html: node.description_html,
        kind: node.product_type,
        tags: node.tags,
        price_range: PriceRange {
            min_variant_price: node.price_range.min_variant_price.into(),
            max_variant_price: node.price_range.max_variant_price.into(),
        },
        compare_at_price: node.compare_at_price_range.and_then(convert_compare_at),
        images: node.images.into_nodes().map(Into::into).collect(),
        variants: node.variants.into_nodes().map(convert_variant).collect(),
    }
}

/// Convert a page of products.
pub fn convert_product_connection(connection: ProductConnectionNode) -> ProductPage {
    ProductPage {
        products: connection
            .edges
            .into_iter()
            .map(|e| convert_product(e.node))
            .collect(),
        page_info: connection.page_info.into(),
    }
}

/// Convert a lightweight search suggestion.
pub fn convert_suggestion(node: SuggestionNode) -> ProductSummary {
    ProductSummary {
        id: ProductId::new(node.id),
        title: node.title,
        handle: node.handle,
        price: node.price_range.min_variant_price.into(),
        image: node.images.into_nodes().next().map(Into::into),
    }
}

fn convert_variant(node: VariantNode) -> ProductVariant {
    ProductVariant {
        id: VariantId::new(node.id),
        title: node.title,
        available_for_sale: node.available_for_sale,
        price: node.price.into(),
        compare_at_price: node.compare_at_price.map(Into::into),
        selected_options: node
            .selected_options
            .into_iter()
            .map(|o| SelectedOption {
                name: o.name,
                value: o.value,
            })
            .collect(),
        image: node.image.map(Into::into),
    }
}

// The API reports "0.0" rather than null when no variant has a compare-at price.
fn convert_compare_at(range: CompareAtPriceRangeNode) -> Option<Money> {
    let money = Money::from(range.min_variant_price);
    (money.amount_decimal() > Decimal::ZERO).then_some(money)
}
