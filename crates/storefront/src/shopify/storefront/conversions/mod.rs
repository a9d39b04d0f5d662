//! Conversions from Storefront API response shapes to domain types.

pub mod cart;
pub mod collections;
pub mod products;

pub use cart::{cart_from_payload, convert_cart, convert_user_error};
pub use collections::{convert_collection, convert_collection_with_products};
pub use products::{convert_product, convert_product_connection, convert_suggestion};

use crate::shopify::types::{Image, Money, PageInfo};

use super::queries::{ImageNode, MoneyNode, PageInfoNode};

impl From<MoneyNode> for Money {
    fn from(node: MoneyNode) -> Self {
        Self {
            amount: node.amount,
            currency_code: node.currency_code,
        }
    }
}

impl From<ImageNode> for Image {
    fn from(node: ImageNode) -> Self {
        Self {
            url: node.url,
            alt_text: node.alt_text,
            width: node.width,
            height: node.height,
        }
    }
}

impl From<PageInfoNode> for PageInfo {
    fn from(node: PageInfoNode) -> Self {
        Self {
            has_next_page: node.has_next_page,
            end_cursor: node.end_cursor,
        }
    }
}
