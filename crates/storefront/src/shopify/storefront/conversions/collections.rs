//! Collection conversion functions.

use lumiere_core::CollectionId;

use crate::shopify::types::{Collection, CollectionWithProducts};

use super::super::queries::{CollectionNode, CollectionWithProductsNode};
use super::products::convert_product_connection;

/// Convert a collection node.
pub fn convert_collection(node: CollectionNode) -> Collection {
    Collection {
        id: CollectionId::new(node.id),
        handle: node.handle,
        title: node.title,
        description: node.description,
        image: node.image.map(Into::into),
    }
}

/// Convert a collection together with its product page.
pub fn convert_collection_with_products(node: CollectionWithProductsNode) -> CollectionWithProducts {
    let page = convert_product_connection(node.products);
    CollectionWithProducts {
        collection: convert_collection(node.collection),
        products: page.products,
        page_info: page.page_info,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_collection_with_empty_products() {
        let node: CollectionWithProductsNode = serde_json::from_value(serde_json::json!({
            "id": "gid://shopify/Collection/5",
            "title": "Best Sellers",
            "handle": "best-sellers",
            "description": "",
            "image": null,
            "products": {
                "pageInfo": {"hasNextPage": true, "endCursor": "abc"},
                "edges": []
            }
        }))
        .unwrap();

        let collection = convert_collection_with_products(node);
        assert_eq!(collection.collection.handle, "best-sellers");
        assert!(collection.products.is_empty());
        assert!(collection.page_info.has_next_page);
        assert_eq!(collection.page_info.end_cursor.as_deref(), Some("abc"));
    }
}
