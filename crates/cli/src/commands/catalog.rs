//! Product and collection browsing.

use std::fmt::Write as _;

use lumiere_storefront::shopify::{Collection, CollectionWithProducts, Product, ProductPage};

use super::{CliError, Context};

fn product_line(out: &mut String, product: &Product) {
    let price = product.price_range.min_variant_price.display();
    let _ = writeln!(out, "{:<32} {:>10}  {}", product.title, price, product.handle);
}

fn render_page(page: &ProductPage) -> String {
    if page.products.is_empty() {
        return "No products found".to_string();
    }
    let mut out = String::new();
    for product in &page.products {
        product_line(&mut out, product);
    }
    if page.page_info.has_next_page
        && let Some(cursor) = &page.page_info.end_cursor
    {
        let _ = writeln!(out, "\nMore: --after {cursor}");
    }
    out.trim_end().to_string()
}

fn render_product(product: &Product) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", product.title, product.handle);
    let _ = write!(out, "{}", product.price_range.min_variant_price.display());
    if let Some(compare_at) = &product.compare_at_price {
        let _ = write!(out, "  was {}", compare_at.display());
    }
    let _ = writeln!(out);
    if !product.description.is_empty() {
        let _ = writeln!(out, "\n{}", product.description);
    }
    let _ = writeln!(out, "\nVariants:");
    for variant in &product.variants {
        let stock = if variant.available_for_sale {
            ""
        } else {
            "  [sold out]"
        };
        let _ = writeln!(
            out,
            "  {:<24} {:>10}  {}{stock}",
            variant.title,
            variant.price.display(),
            variant.id
        );
    }
    out.trim_end().to_string()
}

fn render_collections(collections: &[Collection]) -> String {
    if collections.is_empty() {
        return "No collections found".to_string();
    }
    collections
        .iter()
        .map(|c| format!("{:<32} {}", c.title, c.handle))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_collection(collection: &CollectionWithProducts) -> String {
    let page = ProductPage {
        products: collection.products.clone(),
        page_info: collection.page_info.clone(),
    };
    format!(
        "{} ({})\n\n{}",
        collection.collection.title,
        collection.collection.handle,
        render_page(&page)
    )
}

/// One page of products.
///
/// # Errors
///
/// Returns the backend failure.
pub async fn list_products(
    ctx: &Context,
    first: i64,
    after: Option<String>,
) -> Result<String, CliError> {
    let page = ctx.api.list_products(first, after).await?;
    ctx.render(&page, render_page)
}

/// A product by handle.
///
/// # Errors
///
/// Returns `CliError::NotFound` for an unknown handle, or the backend
/// failure.
pub async fn show_product(ctx: &Context, handle: &str) -> Result<String, CliError> {
    let product = ctx
        .api
        .get_product_by_handle(handle)
        .await?
        .ok_or_else(|| CliError::NotFound(format!("product {handle}")))?;
    ctx.render(&product, render_product)
}

/// Collections.
///
/// # Errors
///
/// Returns the backend failure.
pub async fn list_collections(ctx: &Context, first: i64) -> Result<String, CliError> {
    let collections = ctx.api.list_collections(first).await?;
    ctx.render(&collections, |c| render_collections(c))
}

/// A collection with one page of products.
///
/// # Errors
///
/// Returns `CliError::NotFound` for an unknown handle, or the backend
/// failure.
pub async fn show_collection(
    ctx: &Context,
    handle: &str,
    first: i64,
    after: Option<String>,
) -> Result<String, CliError> {
    let collection = ctx
        .api
        .get_collection_by_handle(handle, first, after)
        .await?
        .ok_or_else(|| CliError::NotFound(format!("collection {handle}")))?;
    ctx.render(&collection, render_collection)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::super::OutputFormat;
    use super::super::test_support::{backend, context};
    use super::*;

    #[tokio::test]
    async fn test_list_products_text() {
        let dir = TempDir::new().unwrap();
        let ctx = context(backend(), &dir, OutputFormat::Text);

        let out = list_products(&ctx, 1, None).await.unwrap();
        assert!(out.contains("Vanilla Bean"));
        assert!(out.contains("$32.00"));
        assert!(out.contains("More: --after 1"));
    }

    #[tokio::test]
    async fn test_show_product_json() {
        let dir = TempDir::new().unwrap();
        let ctx = context(backend(), &dir, OutputFormat::Json);

        let out = show_product(&ctx, "lavender-fields").await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["handle"], "lavender-fields");
    }

    #[tokio::test]
    async fn test_unknown_handles() {
        let dir = TempDir::new().unwrap();
        let ctx = context(backend(), &dir, OutputFormat::Text);

        assert!(matches!(
            show_product(&ctx, "nope").await,
            Err(CliError::NotFound(_))
        ));
        assert!(matches!(
            show_collection(&ctx, "nope", 10, None).await,
            Err(CliError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_show_collection() {
        let dir = TempDir::new().unwrap();
        let ctx = context(backend(), &dir, OutputFormat::Text);

        let out = show_collection(&ctx, "best-sellers", 10, None).await.unwrap();
        assert!(out.starts_with("Best Sellers (best-sellers)"));
        assert!(out.contains("Vanilla Bean"));
        assert!(!out.contains("Lavender"));
    }
}
