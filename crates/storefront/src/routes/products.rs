//! Product and price route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use super::inline;
use crate::api::{ApiError, CurrentPrices, PlazaOption, PredictionReport, PriceHistory};
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::forms::parse_months;
use crate::middleware::OptionalUser;
use crate::resolution::{CancelSignal, Resolution, ResolutionRequest, ResolveError, resolve};
use crate::session::{TowerSessionStore, UserSession};
use crate::state::AppState;

/// Months of history shown when none are requested.
pub const DEFAULT_HISTORY_MONTHS: u32 = 12;

/// Months of forecast shown when none are requested.
pub const DEFAULT_PREDICTION_MONTHS: u32 = 6;

/// Quick-pick month counts offered next to the custom input.
pub const MONTH_PRESETS: [u32; 4] = [3, 6, 12, 24];

// =============================================================================
// View Types
// =============================================================================

/// A product name with its detail link.
#[derive(Debug, Clone)]
pub struct ProductLink {
    pub name: String,
    pub href: String,
}

impl ProductLink {
    /// Link to `/product/{name}`, keeping the plaza filter.
    #[must_use]
    pub fn new(name: &str, plaza: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            href: product_href(name, plaza),
        }
    }
}

/// Path of a product detail page.
#[must_use]
pub fn product_href(name: &str, plaza: Option<&str>) -> String {
    let mut href = format!("/product/{}", urlencoding::encode(name.trim()));
    if let Some(plaza) = plaza.map(str::trim).filter(|p| !p.is_empty()) {
        href.push_str("?plaza=");
        href.push_str(&urlencoding::encode(plaza));
    }
    href
}

/// A priced outcome, formatted.
#[derive(Debug, Clone)]
pub struct QuoteView {
    pub plaza: String,
    pub price: String,
    pub observed_on: Option<String>,
}

// =============================================================================
// Query Types
// =============================================================================

/// Catalog filter.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub q: Option<String>,
    pub plaza: Option<String>,
}

/// Plaza filter for the detail page.
#[derive(Debug, Default, Deserialize)]
pub struct PlazaQuery {
    pub plaza: Option<String>,
}

/// Month count for history and predictions.
#[derive(Debug, Default, Deserialize)]
pub struct MonthsQuery {
    pub months: Option<String>,
}

/// Current-price lookup.
#[derive(Debug, Default, Deserialize)]
pub struct PricesQuery {
    pub product: Option<String>,
    pub plaza: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Product catalog template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub current_user: Option<UserSession>,
    pub query: String,
    pub plaza: String,
    pub products: Vec<ProductLink>,
    pub error: Option<String>,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub current_user: Option<UserSession>,
    pub product: String,
    pub history_href: String,
    pub predictions_href: String,
    pub plazas: Vec<PlazaOption>,
    pub selected_plaza: String,
    pub quote: Option<QuoteView>,
    pub no_price_at: Option<String>,
    pub suggestions: Vec<ProductLink>,
    pub not_found: bool,
    pub error: Option<String>,
}

impl ProductShowTemplate {
    fn new(current_user: Option<UserSession>, product: &str, plaza: Option<&str>) -> Self {
        let base = product_href(product, None);
        Self {
            current_user,
            product: product.trim().to_string(),
            history_href: format!("{base}/history"),
            predictions_href: format!("{base}/predictions"),
            plazas: Vec::new(),
            selected_plaza: plaza.unwrap_or_default().trim().to_string(),
            quote: None,
            no_price_at: None,
            suggestions: Vec::new(),
            not_found: false,
            error: None,
        }
    }

    fn show(&mut self, resolution: Resolution) {
        match resolution {
            Resolution::Priced(quote) => {
                self.quote = Some(QuoteView {
                    plaza: quote.plaza,
                    price: quote
                        .price
                        .map_or_else(|| "Sin precio".to_string(), |p| p.display()),
                    observed_on: quote.observed_on.map(|d| d.format("%d/%m/%Y").to_string()),
                });
            }
            Resolution::KnownNoPrice { plaza } => self.no_price_at = Some(plaza),
            Resolution::NotFoundWithSuggestions(names) => {
                let plaza = Some(self.selected_plaza.as_str());
                self.suggestions = names
                    .iter()
                    .map(|name| ProductLink::new(name, plaza))
                    .collect();
            }
            Resolution::NotFoundEmpty => self.not_found = true,
        }
    }
}

/// Price history template.
#[derive(Template, WebTemplate)]
#[template(path = "products/history.html")]
pub struct HistoryTemplate {
    pub current_user: Option<UserSession>,
    pub product: String,
    pub product_href: String,
    pub months: u32,
    pub presets: [u32; 4],
    pub history: Option<PriceHistory>,
    pub error: Option<String>,
}

/// Price prediction template.
#[derive(Template, WebTemplate)]
#[template(path = "products/predictions.html")]
pub struct PredictionsTemplate {
    pub current_user: Option<UserSession>,
    pub product: String,
    pub product_href: String,
    pub months: u32,
    pub presets: [u32; 4],
    pub report: Option<PredictionReport>,
    pub graph_url: Option<String>,
    pub error: Option<String>,
}

/// Current prices template.
#[derive(Template, WebTemplate)]
#[template(path = "products/prices.html")]
pub struct PricesTemplate {
    pub current_user: Option<UserSession>,
    pub product: String,
    pub plaza: String,
    pub city: String,
    pub prices: Option<CurrentPrices>,
    pub error: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the product catalog, filtered by name.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
    store: TowerSessionStore,
    OptionalUser(current_user): OptionalUser,
) -> Result<ProductsIndexTemplate> {
    let needle = query.q.unwrap_or_default();
    let plaza = query.plaza.unwrap_or_default();

    let (products, error) = match inline(state.api_for(&store).all_products().await)? {
        Ok(products) => (
            products
                .iter()
                .filter(|p| p.matches(&needle))
                .map(|p| ProductLink::new(&p.nombre, Some(plaza.as_str())))
                .collect(),
            None,
        ),
        Err(message) => (Vec::new(), Some(message)),
    };

    Ok(ProductsIndexTemplate {
        current_user,
        query: needle,
        plaza,
        products,
        error,
    })
}

/// Display a product: its price at the selected plaza, or what is known instead.
pub async fn show(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<PlazaQuery>,
    store: TowerSessionStore,
    OptionalUser(current_user): OptionalUser,
) -> Result<ProductShowTemplate> {
    add_breadcrumb("navigation", "Viewed product", Some(&[("product", name.as_str())]));

    let mut page = ProductShowTemplate::new(current_user, &name, query.plaza.as_deref());
    let api = state.api_for(&store);
    let request = ResolutionRequest::new(&name).with_plaza(query.plaza.as_deref());

    // The request future is dropped on disconnect; no explicit signal needed
    match resolve(&api, request, &CancelSignal::never()).await {
        Ok(resolved) => {
            page.selected_plaza = resolved.target.nombre.clone();
            page.plazas = resolved.plazas;
            page.show(resolved.resolution);
        }
        Err(err @ ResolveError::Api(ApiError::Unauthorized)) => return Err(err.into()),
        Err(err) => {
            tracing::info!(product = %name, error = %err, "Product could not be resolved");
            page.error = Some(err.to_string());
        }
    }

    Ok(page)
}

/// Display the price history of a product.
pub async fn history(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<MonthsQuery>,
    store: TowerSessionStore,
    OptionalUser(current_user): OptionalUser,
) -> Result<HistoryTemplate> {
    let mut page = HistoryTemplate {
        current_user,
        product: name.trim().to_string(),
        product_href: product_href(&name, None),
        months: DEFAULT_HISTORY_MONTHS,
        presets: MONTH_PRESETS,
        history: None,
        error: None,
    };

    match parse_months(query.months.as_deref(), DEFAULT_HISTORY_MONTHS) {
        Ok(months) => {
            page.months = months;
            match inline(state.api_for(&store).price_history(&name, months).await)? {
                Ok(history) => page.history = Some(history),
                Err(message) => page.error = Some(message),
            }
        }
        Err(err) => page.error = Some(err.to_string()),
    }

    Ok(page)
}

/// Display the price forecast of a product.
pub async fn predictions(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<MonthsQuery>,
    store: TowerSessionStore,
    OptionalUser(current_user): OptionalUser,
) -> Result<PredictionsTemplate> {
    let mut page = PredictionsTemplate {
        current_user,
        product: name.trim().to_string(),
        product_href: product_href(&name, None),
        months: DEFAULT_PREDICTION_MONTHS,
        presets: MONTH_PRESETS,
        report: None,
        graph_url: None,
        error: None,
    };

    match parse_months(query.months.as_deref(), DEFAULT_PREDICTION_MONTHS) {
        Ok(months) => {
            page.months = months;
            match inline(state.api_for(&store).predictions(&name, months).await)? {
                Ok(report) => {
                    // Chart paths are relative to the backend
                    page.graph_url = report
                        .graph_url
                        .as_deref()
                        .and_then(|path| state.api().base_url().join(path).ok())
                        .map(String::from);
                    page.report = Some(report);
                }
                Err(message) => page.error = Some(message),
            }
        }
        Err(err) => page.error = Some(err.to_string()),
    }

    Ok(page)
}

/// Display current prices of a product in the configured city.
pub async fn current_prices(
    State(state): State<AppState>,
    Query(query): Query<PricesQuery>,
    store: TowerSessionStore,
    OptionalUser(current_user): OptionalUser,
) -> Result<PricesTemplate> {
    let product = query.product.unwrap_or_default().trim().to_string();
    let plaza = query.plaza.unwrap_or_default().trim().to_string();
    let city = state.api().default_city().to_string();

    let mut page = PricesTemplate {
        current_user,
        product,
        plaza,
        city,
        prices: None,
        error: None,
    };

    if !page.product.is_empty() {
        let plaza = Some(page.plaza.as_str()).filter(|p| !p.is_empty());
        match inline(
            state
                .api_for(&store)
                .current_prices(&page.product, Some(&page.city), plaza)
                .await,
        )? {
            Ok(prices) => page.prices = Some(prices),
            Err(message) => page.error = Some(message),
        }
    }

    Ok(page)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use plaze_core::PricePerKg;
    use rust_decimal::Decimal;

    use super::*;
    use crate::api::PriceQuote;

    #[test]
    fn test_product_href_encodes_name_and_plaza() {
        assert_eq!(product_href("Papa criolla", None), "/product/Papa%20criolla");
        assert_eq!(
            product_href("Tomate", Some("La América")),
            "/product/Tomate?plaza=La%20Am%C3%A9rica"
        );
        assert_eq!(product_href("Tomate", Some("  ")), "/product/Tomate");
    }

    #[test]
    fn test_show_priced_outcome() {
        let mut page = ProductShowTemplate::new(None, "Tomate chonto", None);
        page.show(Resolution::Priced(PriceQuote {
            product: "Tomate chonto".to_string(),
            plaza: "Minorista".to_string(),
            price: Some(PricePerKg::new(Decimal::from(2500))),
            observed_on: NaiveDate::from_ymd_opt(2025, 10, 12),
        }));

        let quote = page.quote.unwrap();
        assert_eq!(quote.price, "$2.500/kg");
        assert_eq!(quote.observed_on.as_deref(), Some("12/10/2025"));
        assert!(!page.not_found);
    }

    #[test]
    fn test_show_suggestions_keep_order_and_plaza() {
        let mut page = ProductShowTemplate::new(None, "tomat", Some("Minorista"));
        page.show(Resolution::NotFoundWithSuggestions(vec![
            "Tomate larga vida".to_string(),
            "Tomate chonto".to_string(),
        ]));

        let names: Vec<_> = page.suggestions.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Tomate larga vida", "Tomate chonto"]);
        assert_eq!(
            page.suggestions.first().map(|s| s.href.as_str()),
            Some("/product/Tomate%20larga%20vida?plaza=Minorista")
        );
    }

    #[test]
    fn test_history_links() {
        let page = ProductShowTemplate::new(None, "Papa criolla", None);
        assert_eq!(page.history_href, "/product/Papa%20criolla/history");
        assert_eq!(page.predictions_href, "/product/Papa%20criolla/predictions");
    }
}
