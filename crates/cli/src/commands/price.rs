//! `plaze price`: run the product resolution flow.

use plaze_storefront::api::PriceQuote;
use plaze_storefront::resolution::{Resolution, ResolutionRequest, cancellation, resolve};
use serde::Serialize;

use super::{Api, CliError, emit};

/// What the price command prints.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PriceReport {
    Priced {
        #[serde(flatten)]
        quote: PriceQuote,
        display: Option<String>,
    },
    NoPrice {
        product: String,
        plaza: String,
    },
    Suggestions {
        product: String,
        suggestions: Vec<String>,
    },
    NotFound {
        product: String,
    },
}

impl PriceReport {
    fn new(product: &str, resolution: Resolution) -> Self {
        let product = product.trim().to_string();
        match resolution {
            Resolution::Priced(quote) => Self::Priced {
                display: quote.price.map(|p| p.display()),
                quote,
            },
            Resolution::KnownNoPrice { plaza } => Self::NoPrice { product, plaza },
            Resolution::NotFoundWithSuggestions(suggestions) => Self::Suggestions {
                product,
                suggestions,
            },
            Resolution::NotFoundEmpty => Self::NotFound { product },
        }
    }
}

/// Resolve and print the price of `product`.
///
/// Ctrl+C cancels: the flow stops at its next checkpoint and the command
/// fails with a cancellation error instead of printing a stale result.
///
/// # Errors
///
/// Returns an error if the flow cannot produce an outcome.
pub async fn run(api: &Api<'_>, product: &str, plaza: Option<&str>) -> Result<(), CliError> {
    let (handle, signal) = cancellation();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Cancelling price lookup");
            handle.cancel();
        }
    });

    let request = ResolutionRequest::new(product).with_plaza(plaza);
    let result = resolve(api, request, &signal).await;
    watcher.abort();

    let resolved = result?;
    tracing::debug!(plaza = %resolved.target.nombre, "Resolved");
    emit(&PriceReport::new(product, resolved.resolution))
}
