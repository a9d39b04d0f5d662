//! Collection route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::{instrument, warn};

use crate::error::{AppError, Result};
use crate::shopify::{Collection, CollectionWithProducts};
use crate::state::AppState;

use super::PageQuery;

/// Collections shown on the listing page.
const COLLECTIONS_LIMIT: i64 = 20;

/// All collections. A backend failure degrades to an empty list.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Json<Vec<Collection>> {
    match state.api().list_collections(COLLECTIONS_LIMIT).await {
        Ok(collections) => Json(collections),
        Err(e) => {
            warn!(error = %e, "Failed to load collections");
            Json(Vec::new())
        }
    }
}

/// A collection with one page of its products.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<CollectionWithProducts>> {
    let first = query.page_size();
    state
        .api()
        .get_collection_by_handle(&handle, first, query.after)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("collection {handle}")))
}
