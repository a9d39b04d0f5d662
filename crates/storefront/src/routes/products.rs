//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::{instrument, warn};

use crate::error::{AppError, Result};
use crate::shopify::{Product, ProductPage};
use crate::state::AppState;

use super::PageQuery;

/// One page of products. A backend failure degrades to an empty page.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Json<ProductPage> {
    let first = query.page_size();
    match state.api().list_products(first, query.after).await {
        Ok(page) => Json(page),
        Err(e) => {
            warn!(error = %e, "Failed to load products");
            Json(ProductPage::default())
        }
    }
}

/// A single product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<Product>> {
    state
        .api()
        .get_product_by_handle(&handle)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {handle}")))
}
