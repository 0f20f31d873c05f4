//! Product resolution: decide what the product page shows.
//!
//! The flow runs strictly in sequence:
//!
//! 1. Load the known plazas, unless the caller already has them.
//! 2. Pick the target plaza: the one named by the filter, else the first
//!    plaza in backend order.
//! 3. Ask for the latest price there. A price ends the flow.
//! 4. Otherwise search the product name and classify the answer.
//!
//! Every outcome is one [`Resolution`] variant. A 401 anywhere propagates
//! so the session gate can redirect; every other price failure falls
//! through to the search step. Nothing is retried.

use std::future::Future;

use thiserror::Error;
use tokio::sync::watch;

use crate::api::{ApiError, ApiSession, PlazaOption, PriceQuote, SearchOutcome};
use crate::session::SessionStore;

// =============================================================================
// Catalog seam
// =============================================================================

/// The three backend lookups the flow needs.
pub trait PriceCatalog: Send + Sync {
    /// Known plazas in backend order.
    fn plazas(&self) -> impl Future<Output = Result<Vec<PlazaOption>, ApiError>> + Send;

    /// Latest price of `product` at `plaza`.
    fn latest_price(
        &self,
        product: &str,
        plaza: &str,
    ) -> impl Future<Output = Result<PriceQuote, ApiError>> + Send;

    /// Search by product name.
    fn search(&self, query: &str) -> impl Future<Output = Result<SearchOutcome, ApiError>> + Send;
}

impl<S: SessionStore> PriceCatalog for ApiSession<'_, S> {
    async fn plazas(&self) -> Result<Vec<PlazaOption>, ApiError> {
        Ok(self.options().await?.plazas)
    }

    async fn latest_price(&self, product: &str, plaza: &str) -> Result<PriceQuote, ApiError> {
        ApiSession::latest_price(self, product, plaza).await
    }

    async fn search(&self, query: &str) -> Result<SearchOutcome, ApiError> {
        self.search_products(query).await
    }
}

// =============================================================================
// Cancellation
// =============================================================================

/// Observed side of a cancellation pair.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Option<watch::Receiver<bool>>);

impl CancelSignal {
    /// A signal that never fires.
    #[must_use]
    pub const fn never() -> Self {
        Self(None)
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.as_ref().is_some_and(|rx| *rx.borrow())
    }

    fn checkpoint(&self) -> Result<(), ResolveError> {
        if self.is_cancelled() {
            Err(ResolveError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Triggering side of a cancellation pair.
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

/// Create a connected cancellation pair.
#[must_use]
pub fn cancellation() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(tx), CancelSignal(Some(rx)))
}

// =============================================================================
// Inputs & outcomes
// =============================================================================

/// How the target plaza is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlazaSelection {
    /// The plaza with this name, compared trimmed and case-insensitively.
    Named(String),
    /// The first plaza the backend lists.
    FirstListed,
}

impl PlazaSelection {
    /// `FirstListed` for a missing or blank filter.
    #[must_use]
    pub fn from_filter(filter: Option<&str>) -> Self {
        match filter.map(str::trim) {
            Some(name) if !name.is_empty() => Self::Named(name.to_string()),
            _ => Self::FirstListed,
        }
    }

    fn pick<'a>(&self, plazas: &'a [PlazaOption]) -> Result<&'a PlazaOption, ResolveError> {
        match self {
            Self::FirstListed => plazas.first().ok_or(ResolveError::NoPlazas),
            Self::Named(name) => {
                if plazas.is_empty() {
                    return Err(ResolveError::NoPlazas);
                }
                plazas
                    .iter()
                    .find(|p| p.nombre.trim().to_lowercase() == name.to_lowercase())
                    .ok_or_else(|| ResolveError::PlazaNotFound(name.clone()))
            }
        }
    }
}

/// One product lookup.
#[derive(Debug, Clone)]
pub struct ResolutionRequest<'a> {
    /// Product name as typed or linked.
    pub product: &'a str,
    /// Plaza choice.
    pub selection: PlazaSelection,
    /// Plazas already fetched by the caller; skips step 1.
    pub known_plazas: Option<Vec<PlazaOption>>,
}

impl<'a> ResolutionRequest<'a> {
    /// Lookup with no plaza filter and no preloaded plazas.
    #[must_use]
    pub const fn new(product: &'a str) -> Self {
        Self {
            product,
            selection: PlazaSelection::FirstListed,
            known_plazas: None,
        }
    }

    /// Restrict to a named plaza (blank means first listed).
    #[must_use]
    pub fn with_plaza(mut self, filter: Option<&str>) -> Self {
        self.selection = PlazaSelection::from_filter(filter);
        self
    }

    /// Reuse a plaza list the caller already holds.
    #[must_use]
    pub fn with_known_plazas(mut self, plazas: Vec<PlazaOption>) -> Self {
        self.known_plazas = Some(plazas);
        self
    }
}

/// What the product page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A current price exists at the target plaza.
    Priced(PriceQuote),
    /// The product exists but has no price at this plaza.
    KnownNoPrice {
        /// Plaza that was asked.
        plaza: String,
    },
    /// Unknown product; similar names exist. Backend order.
    NotFoundWithSuggestions(Vec<String>),
    /// Unknown product, nothing similar.
    NotFoundEmpty,
}

/// Result of a resolution, with the context the page needs.
#[derive(Debug, Clone)]
pub struct ResolvedProduct {
    /// Plazas the user can switch between.
    pub plazas: Vec<PlazaOption>,
    /// Plaza that was asked for a price.
    pub target: PlazaOption,
    /// The outcome.
    pub resolution: Resolution,
}

/// Why a resolution could not produce an outcome.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Blank product name.
    #[error("Ingresa el nombre de un producto")]
    EmptyProduct,

    /// The backend lists no plazas at all.
    #[error("No hay plazas disponibles")]
    NoPlazas,

    /// The plaza filter matched nothing.
    #[error("No se pudo encontrar la plaza {0}")]
    PlazaNotFound(String),

    /// The caller cancelled before an outcome was committed.
    #[error("Consulta cancelada")]
    Cancelled,

    /// A backend call failed in a way the flow does not absorb.
    #[error(transparent)]
    Api(#[from] ApiError),
}

// =============================================================================
// Flow
// =============================================================================

/// Resolve a product lookup to one [`Resolution`].
///
/// # Errors
///
/// - [`ResolveError::EmptyProduct`] for a blank name
/// - [`ResolveError::NoPlazas`] / [`ResolveError::PlazaNotFound`] when no
///   target plaza can be chosen
/// - [`ResolveError::Cancelled`] when `cancel` fires before an outcome
/// - [`ResolveError::Api`] when the plaza list or the search fails, or on
///   any 401
pub async fn resolve<C: PriceCatalog>(
    catalog: &C,
    request: ResolutionRequest<'_>,
    cancel: &CancelSignal,
) -> Result<ResolvedProduct, ResolveError> {
    let product = request.product.trim();
    if product.is_empty() {
        return Err(ResolveError::EmptyProduct);
    }

    let plazas = match request.known_plazas {
        Some(plazas) => plazas,
        None => catalog.plazas().await?,
    };
    cancel.checkpoint()?;

    let target = request.selection.pick(&plazas)?.clone();
    tracing::debug!(product, plaza = %target.nombre, "Resolving product price");

    let resolution = match catalog.latest_price(product, &target.nombre).await {
        Ok(quote) => {
            cancel.checkpoint()?;
            Resolution::Priced(quote)
        }
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(price_err) => {
            tracing::debug!(
                product,
                plaza = %target.nombre,
                error = %price_err,
                "No latest price, falling back to search"
            );
            cancel.checkpoint()?;
            let outcome = catalog.search(product).await?;
            cancel.checkpoint()?;
            classify(outcome, &target.nombre)
        }
    };

    Ok(ResolvedProduct {
        plazas,
        target,
        resolution,
    })
}

fn classify(outcome: SearchOutcome, plaza: &str) -> Resolution {
    match outcome {
        SearchOutcome::NotFound { suggestions, .. } if !suggestions.is_empty() => {
            Resolution::NotFoundWithSuggestions(suggestions)
        }
        SearchOutcome::Found(hits) if !hits.is_empty() => Resolution::KnownNoPrice {
            plaza: plaza.to_string(),
        },
        _ => Resolution::NotFoundEmpty,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use plaze_core::{PlazaId, PricePerKg};
    use reqwest::StatusCode;
    use rust_decimal::Decimal;

    use super::*;
    use crate::api::SearchHit;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Plazas,
        Price(String, String),
        Search(String),
    }

    struct FakeCatalog {
        plazas: Vec<&'static str>,
        price: Option<u32>,
        price_error: fn() -> ApiError,
        search: SearchOutcome,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeCatalog {
        fn new(plazas: &[&'static str]) -> Self {
            Self {
                plazas: plazas.to_vec(),
                price: None,
                price_error: || ApiError::Backend {
                    status: StatusCode::NOT_FOUND,
                    detail: "Producto no encontrado".to_string(),
                },
                search: SearchOutcome::Unrecognized,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn priced(mut self, price: u32) -> Self {
            self.price = Some(price);
            self
        }

        fn searching(mut self, outcome: SearchOutcome) -> Self {
            self.search = outcome;
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn option(id: i32, nombre: &str) -> PlazaOption {
        PlazaOption {
            id: PlazaId::new(id),
            nombre: nombre.to_string(),
            ciudad: "Medellín".to_string(),
            estado: None,
        }
    }

    impl PriceCatalog for FakeCatalog {
        async fn plazas(&self) -> Result<Vec<PlazaOption>, ApiError> {
            self.calls.lock().unwrap().push(Call::Plazas);
            Ok(self
                .plazas
                .iter()
                .zip(1..)
                .map(|(name, id)| option(id, name))
                .collect())
        }

        async fn latest_price(&self, product: &str, plaza: &str) -> Result<PriceQuote, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Price(product.to_string(), plaza.to_string()));
            self.price.map_or_else(
                || Err((self.price_error)()),
                |price| {
                    Ok(PriceQuote {
                        product: product.to_string(),
                        plaza: plaza.to_string(),
                        price: Some(PricePerKg::new(Decimal::from(price))),
                        observed_on: None,
                    })
                },
            )
        }

        async fn search(&self, query: &str) -> Result<SearchOutcome, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Search(query.to_string()));
            Ok(self.search.clone())
        }
    }

    #[tokio::test]
    async fn test_priced_product_skips_search() {
        let catalog = FakeCatalog::new(&["Minorista", "La América"]).priced(2500);

        let resolved = resolve(
            &catalog,
            ResolutionRequest::new("Tomate chonto").with_plaza(Some("La América")),
            &CancelSignal::never(),
        )
        .await
        .unwrap();

        match resolved.resolution {
            Resolution::Priced(quote) => {
                assert_eq!(quote.plaza, "La América");
                assert_eq!(quote.price.unwrap().amount(), Decimal::from(2500));
            }
            other => panic!("expected Priced, got {other:?}"),
        }
        assert!(
            !catalog
                .calls()
                .iter()
                .any(|c| matches!(c, Call::Search(_)))
        );
    }

    #[tokio::test]
    async fn test_absent_product_searches_once_and_keeps_suggestion_order() {
        let suggestions = vec![
            "Tomate larga vida".to_string(),
            "Tomate chonto".to_string(),
            "Tomate de árbol".to_string(),
        ];
        let catalog = FakeCatalog::new(&["Minorista"]).searching(SearchOutcome::NotFound {
            detail: "Producto no encontrado".to_string(),
            suggestions: suggestions.clone(),
        });

        let resolved = resolve(
            &catalog,
            ResolutionRequest::new("tomat"),
            &CancelSignal::never(),
        )
        .await
        .unwrap();

        assert_eq!(
            resolved.resolution,
            Resolution::NotFoundWithSuggestions(suggestions)
        );
        assert_eq!(
            catalog.calls(),
            vec![
                Call::Plazas,
                Call::Price("tomat".to_string(), "Minorista".to_string()),
                Call::Search("tomat".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_found_without_price_is_known_no_price() {
        let catalog = FakeCatalog::new(&["Minorista"]).searching(SearchOutcome::Found(vec![
            SearchHit {
                product: "Papa criolla".to_string(),
                plaza: None,
            },
        ]));

        let resolved = resolve(
            &catalog,
            ResolutionRequest::new("Papa criolla"),
            &CancelSignal::never(),
        )
        .await
        .unwrap();

        assert_eq!(
            resolved.resolution,
            Resolution::KnownNoPrice {
                plaza: "Minorista".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_other_search_shapes_are_not_found_empty() {
        for outcome in [
            SearchOutcome::Found(Vec::new()),
            SearchOutcome::Unrecognized,
            SearchOutcome::NotFound {
                detail: "nada".to_string(),
                suggestions: Vec::new(),
            },
        ] {
            let catalog = FakeCatalog::new(&["Minorista"]).searching(outcome);
            let resolved = resolve(
                &catalog,
                ResolutionRequest::new("xyz"),
                &CancelSignal::never(),
            )
            .await
            .unwrap();
            assert_eq!(resolved.resolution, Resolution::NotFoundEmpty);
        }
    }

    #[tokio::test]
    async fn test_no_filter_selects_first_listed_plaza() {
        let catalog = FakeCatalog::new(&["A", "B", "C"]).priced(1000);

        let resolved = resolve(&catalog, ResolutionRequest::new("Papa"), &CancelSignal::never())
            .await
            .unwrap();

        assert_eq!(resolved.target.nombre, "A");
        assert_eq!(
            catalog.calls()[1],
            Call::Price("Papa".to_string(), "A".to_string())
        );
    }

    #[tokio::test]
    async fn test_known_plazas_skip_plaza_fetch() {
        let catalog = FakeCatalog::new(&["ignored"]).priced(1000);

        let resolved = resolve(
            &catalog,
            ResolutionRequest::new("Papa").with_known_plazas(vec![option(7, "Central")]),
            &CancelSignal::never(),
        )
        .await
        .unwrap();

        assert_eq!(resolved.target.id, PlazaId::new(7));
        assert!(!catalog.calls().contains(&Call::Plazas));
    }

    #[tokio::test]
    async fn test_plaza_selection_errors() {
        let empty = FakeCatalog::new(&[]);
        let err = resolve(&empty, ResolutionRequest::new("Papa"), &CancelSignal::never())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NoPlazas));

        let catalog = FakeCatalog::new(&["Minorista"]);
        let err = resolve(
            &catalog,
            ResolutionRequest::new("Papa").with_plaza(Some("Bazar")),
            &CancelSignal::never(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ResolveError::PlazaNotFound(name) if name == "Bazar"));
    }

    #[tokio::test]
    async fn test_plaza_filter_ignores_case_and_blank() {
        let catalog = FakeCatalog::new(&["Minorista", "La América"]).priced(1);
        let resolved = resolve(
            &catalog,
            ResolutionRequest::new("Papa").with_plaza(Some("  la américa ")),
            &CancelSignal::never(),
        )
        .await
        .unwrap();
        assert_eq!(resolved.target.nombre, "La América");

        assert_eq!(PlazaSelection::from_filter(Some("   ")), PlazaSelection::FirstListed);
    }

    #[tokio::test]
    async fn test_unauthorized_price_call_propagates() {
        let mut catalog = FakeCatalog::new(&["Minorista"]);
        catalog.price_error = || ApiError::Unauthorized;

        let err = resolve(&catalog, ResolutionRequest::new("Papa"), &CancelSignal::never())
            .await
            .unwrap_err();

        assert!(matches!(err, ResolveError::Api(ApiError::Unauthorized)));
        assert!(
            !catalog
                .calls()
                .iter()
                .any(|c| matches!(c, Call::Search(_)))
        );
    }

    #[tokio::test]
    async fn test_cancelled_flow_returns_no_outcome() {
        let catalog = FakeCatalog::new(&["Minorista"]).priced(2500);
        let (handle, signal) = cancellation();
        handle.cancel();

        let err = resolve(&catalog, ResolutionRequest::new("Papa"), &signal)
            .await
            .unwrap_err();

        assert!(matches!(err, ResolveError::Cancelled));
        assert!(signal.is_cancelled());
    }

    #[tokio::test]
    async fn test_blank_product_is_rejected_without_calls() {
        let catalog = FakeCatalog::new(&["Minorista"]);
        let err = resolve(&catalog, ResolutionRequest::new("  "), &CancelSignal::never())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::EmptyProduct));
        assert!(catalog.calls().is_empty());
    }
}
