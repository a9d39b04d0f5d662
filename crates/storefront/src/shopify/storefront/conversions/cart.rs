//! Cart conversion functions.

use lumiere_core::{CartId, CartLineId, SellingPlanId, VariantId};
use tracing::warn;

use crate::shopify::ShopifyError;
use crate::shopify::types::{
    Cart, CartCost, CartDiscountCode, CartLine, CartLineCost, CartMerchandise,
    CartMerchandiseProduct, CartUserError, Money,
};

use super::super::queries::{CartLineNode, CartNode, CartPayload, UserErrorNode};

/// Convert a cart node into a snapshot.
pub fn convert_cart(node: CartNode) -> Cart {
    Cart {
        id: CartId::new(node.id),
        checkout_url: node.checkout_url,
        total_quantity: node.total_quantity,
        cost: CartCost {
            subtotal: node.cost.subtotal_amount.into(),
            total: node.cost.total_amount.into(),
        },
        discount_codes: node
            .discount_codes
            .into_iter()
            .map(|d| CartDiscountCode {
                code: d.code,
                applicable: d.applicable,
            })
            .collect(),
        lines: node.lines.into_nodes().filter_map(convert_line).collect(),
    }
}

pub fn convert_user_error(node: UserErrorNode) -> CartUserError {
    CartUserError {
        code: node.code,
        field: node.field,
        message: node.message,
    }
}

/// Unwrap a cart mutation payload.
///
/// User errors win over a returned cart. An error naming the cart id, or a
/// payload with neither cart nor errors, means the cart is gone.
pub fn cart_from_payload(
    payload: Option<CartPayload>,
    cart_id: &CartId,
    operation: &str,
) -> Result<Cart, ShopifyError> {
    let Some(payload) = payload else {
        return Err(ShopifyError::message(format!("{operation} returned no payload")));
    };

    if !payload.user_errors.is_empty() {
        let errors: Vec<CartUserError> = payload
            .user_errors
            .into_iter()
            .map(convert_user_error)
            .collect();
        if errors.iter().any(CartUserError::is_invalid_cart) {
            return Err(ShopifyError::CartNotFound(cart_id.to_string()));
        }
        return Err(ShopifyError::UserError(
            errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; "),
        ));
    }

    payload
        .cart
        .map(convert_cart)
        .ok_or_else(|| ShopifyError::CartNotFound(cart_id.to_string()))
}

fn convert_line(node: CartLineNode) -> Option<CartLine> {
    let merchandise = node.merchandise;
    let (Some(id), Some(price), Some(product)) =
        (merchandise.id, merchandise.price, merchandise.product)
    else {
        warn!(line_id = %node.id, "Skipping cart line without product variant merchandise");
        return None;
    };

    Some(CartLine {
        id: CartLineId::new(node.id),
        quantity: node.quantity,
        cost: CartLineCost {
            amount_per_quantity: node.cost.amount_per_quantity.into(),
            total_amount: node.cost.total_amount.into(),
        },
        merchandise: CartMerchandise {
            id: VariantId::new(id),
            title: merchandise.title.unwrap_or_default(),
            price: Money::from(price),
            image: merchandise.image.map(Into::into),
            product: CartMerchandiseProduct {
                title: product.title,
                handle: product.handle,
            },
        },
        selling_plan_id: node
            .selling_plan_allocation
            .map(|a| SellingPlanId::new(a.selling_plan.id)),
    })
}
