//! Search, type-ahead suggestions and recent searches.

use std::fmt::Write as _;

use lumiere_storefront::search::{self as storefront_search, POPULAR_SEARCHES, SearchTerm};
use lumiere_storefront::shopify::{Product, ProductSummary};
use serde::Serialize;
use tracing::warn;

use super::{CliError, Context};

#[derive(Serialize)]
struct SearchOutput<'a> {
    query: &'a str,
    products: Vec<Product>,
}

#[derive(Serialize)]
struct RecentOutput {
    /// `true` when falling back to popular searches.
    popular: bool,
    searches: Vec<String>,
}

fn render_search(output: &SearchOutput<'_>) -> String {
    if output.products.is_empty() {
        return format!("No results for \"{}\"", output.query);
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} result(s) for \"{}\"\n",
        output.products.len(),
        output.query
    );
    for product in &output.products {
        let _ = writeln!(
            out,
            "{:<32} {:>10}  {}",
            product.title,
            product.price_range.min_variant_price.display(),
            product.handle
        );
    }
    out.trim_end().to_string()
}

fn render_suggestions(suggestions: &[ProductSummary]) -> String {
    if suggestions.is_empty() {
        return "No suggestions".to_string();
    }
    suggestions
        .iter()
        .map(|s| format!("{:<32} {:>10}  {}", s.title, s.price.display(), s.handle))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_recent(output: &RecentOutput) -> String {
    let heading = if output.popular {
        "Popular searches"
    } else {
        "Recent searches"
    };
    let mut out = format!("{heading}:");
    for term in &output.searches {
        let _ = write!(out, "\n  {term}");
    }
    out
}

/// Full product search. A term long enough to send is remembered as a
/// recent search.
///
/// # Errors
///
/// Returns the backend failure.
pub async fn search(ctx: &Context, query: &str) -> Result<String, CliError> {
    let products = storefront_search::search(ctx.api.as_ref(), query).await?;

    if let Some(term) = SearchTerm::parse(query)
        && let Err(e) = ctx.recent_searches().record(term.as_str())
    {
        warn!(error = %e, "Failed to record recent search");
    }

    let output = SearchOutput {
        query: query.trim(),
        products,
    };
    ctx.render(&output, render_search)
}

/// Type-ahead suggestions for partial input.
///
/// # Errors
///
/// Returns the backend failure.
pub async fn suggest(ctx: &Context, query: &str) -> Result<String, CliError> {
    let suggestions = storefront_search::suggest(ctx.api.as_ref(), query).await?;
    ctx.render(&suggestions, |s| render_suggestions(s))
}

/// Recent searches, most recent first, or the popular searches when none
/// are remembered. `clear` forgets them instead.
///
/// # Errors
///
/// Returns `CliError::Persistence` if the storage file cannot be written.
pub fn recent(ctx: &Context, clear: bool) -> Result<String, CliError> {
    let recent = ctx.recent_searches();
    if clear {
        recent.clear()?;
        return Ok("Recent searches cleared".to_string());
    }

    let searches = recent.load();
    let output = if searches.is_empty() {
        RecentOutput {
            popular: true,
            searches: POPULAR_SEARCHES.iter().map(ToString::to_string).collect(),
        }
    } else {
        RecentOutput {
            popular: false,
            searches,
        }
    };
    ctx.render(&output, render_recent)
}
