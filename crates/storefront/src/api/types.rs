//! Wire types for the Plaze backend.
//!
//! The backend mixes Spanish and English field names and is loose about a
//! few shapes (coordinates as text or object, product types as text or
//! list). Those variations are settled here, once, so nothing past the
//! client boundary has to care.

use chrono::NaiveDate;
use plaze_core::{Coordinates, PlazaId, PlazaStatus, PricePerKg, ProductId, UserRole};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// =============================================================================
// Prices
// =============================================================================

/// Latest known price of a product at one plaza.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
    /// Product name as the backend spells it.
    pub product: String,
    /// Plaza name as the backend spells it.
    pub plaza: String,
    /// Price per kilogram, when the backend has one.
    pub price: Option<PricePerKg>,
    /// Day the price was observed.
    pub observed_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LatestPriceBody {
    #[serde(default)]
    producto: String,
    #[serde(default)]
    plaza: String,
    #[serde(default)]
    precio_por_kg: Option<PricePerKg>,
    #[serde(default)]
    ultima_actualizacion: Option<String>,
}

impl LatestPriceBody {
    /// Fill blanks with the names that were asked for.
    pub(crate) fn into_quote(self, product: &str, plaza: &str) -> PriceQuote {
        PriceQuote {
            product: non_empty_or(self.producto, product),
            plaza: non_empty_or(self.plaza, plaza),
            price: self.precio_por_kg,
            observed_on: self.ultima_actualizacion.as_deref().and_then(parse_day),
        }
    }
}

/// One row of the current-prices listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentPrice {
    /// Product name.
    #[serde(default, alias = "producto")]
    pub product: String,
    /// Plaza name.
    #[serde(default)]
    pub plaza: String,
    /// Price per kilogram.
    #[serde(default, alias = "precio_por_kg")]
    pub price: Option<PricePerKg>,
    /// Observation date as sent by the backend.
    #[serde(default, alias = "fecha", alias = "ultima_actualizacion")]
    pub date: Option<String>,
}

/// Current prices of a product in a city.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentPrices {
    /// Product that was asked for.
    #[serde(default, alias = "producto")]
    pub product: String,
    /// City that was asked for.
    #[serde(default, alias = "ciudad")]
    pub city: String,
    /// One row per plaza with a price.
    #[serde(default, alias = "precios", alias = "resultados")]
    pub prices: Vec<CurrentPrice>,
}

// =============================================================================
// Catalog
// =============================================================================

/// A plaza as it appears in option lists and the active-plaza filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlazaOption {
    /// Backend ID.
    #[serde(alias = "plaza_id")]
    pub id: PlazaId,
    /// Display name.
    pub nombre: String,
    /// City.
    #[serde(default)]
    pub ciudad: String,
    /// Operating status, when the endpoint reports it.
    #[serde(default)]
    pub estado: Option<PlazaStatus>,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductEntry {
    /// Backend ID.
    pub id: ProductId,
    /// Display name.
    pub nombre: String,
}

impl ProductEntry {
    /// Whether `query` occurs in the name, ignoring case. Blank matches all.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty() || self.nombre.to_lowercase().contains(&query)
    }
}

/// Selectable products and plazas, in backend order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogOptions {
    /// Known products.
    #[serde(default)]
    pub productos: Vec<ProductEntry>,
    /// Known plazas. Order is significant: the first entry is the default plaza.
    #[serde(default)]
    pub plazas: Vec<PlazaOption>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActivePlazasBody {
    #[serde(default)]
    pub(crate) plazas: Vec<PlazaOption>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductListBody {
    #[serde(default)]
    pub(crate) productos: Vec<ProductEntry>,
}

// =============================================================================
// Search
// =============================================================================

/// A product match returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// Product name.
    pub product: String,
    /// Plaza the match came from, if reported.
    pub plaza: Option<String>,
}

/// Outcome of a product search.
///
/// A 404 from the search endpoint is a normal answer, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The backend matched at least zero products.
    Found(Vec<SearchHit>),
    /// The backend knows no such product.
    NotFound {
        /// Backend detail text.
        detail: String,
        /// Candidate names, backend order.
        suggestions: Vec<String>,
    },
    /// A success body without a result list.
    Unrecognized,
}

impl SearchOutcome {
    /// Classify a 2xx search body.
    pub(crate) fn from_found_body(body: &Value) -> Self {
        let Some(rows) = body
            .get("resultados")
            .or_else(|| body.get("results"))
            .and_then(Value::as_array)
        else {
            return Self::Unrecognized;
        };

        let hits = rows
            .iter()
            .filter_map(|row| match row {
                Value::String(name) => Some(SearchHit {
                    product: name.clone(),
                    plaza: None,
                }),
                Value::Object(_) => {
                    let product = ["producto", "nombre", "product"]
                        .iter()
                        .find_map(|key| row.get(*key).and_then(Value::as_str))?;
                    Some(SearchHit {
                        product: product.to_string(),
                        plaza: row.get("plaza").and_then(Value::as_str).map(str::to_string),
                    })
                }
                _ => None,
            })
            .collect();

        Self::Found(hits)
    }

    /// Classify a 404 search body.
    pub(crate) fn from_not_found_body(body: &Value) -> Self {
        let detail_field = body.get("detail");
        let detail = detail_field
            .and_then(Value::as_str)
            .or_else(|| {
                detail_field
                    .and_then(|d| d.get("message"))
                    .and_then(Value::as_str)
            })
            .unwrap_or("Producto no encontrado")
            .to_string();

        let suggestions = body
            .get("sugerencias")
            .or_else(|| detail_field.and_then(|d| d.get("suggestions")))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self::NotFound {
            detail,
            suggestions,
        }
    }
}

// =============================================================================
// History & Predictions
// =============================================================================

/// Summary statistics of a price history window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryStatistics {
    pub initial_price: f64,
    pub final_price: f64,
    pub average_price: f64,
    pub max_price: f64,
    pub min_price: f64,
    pub percent_variation: f64,
    pub total_records: u32,
}

/// A stretch of consecutive observations sharing one trend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendPeriod {
    pub start_date: String,
    pub end_date: String,
    pub start_price: f64,
    pub end_price: f64,
    pub trend: String,
    pub percent_variation: f64,
}

impl TrendPeriod {
    /// Spanish label of the trend.
    #[must_use]
    pub fn trend_label(&self) -> &'static str {
        trend_label(&self.trend)
    }
}

/// One observation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryPoint {
    pub date: String,
    pub price_per_kg: f64,
}

/// Price history of a product over the last N months.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceHistory {
    pub product: String,
    pub period_months: u32,
    pub start_date: String,
    pub end_date: String,
    /// `Increase`, `Decrease` or `Stability`.
    pub overall_trend: String,
    pub statistics: HistoryStatistics,
    pub periods: Vec<TrendPeriod>,
    pub history: Vec<HistoryPoint>,
}

impl PriceHistory {
    /// Spanish label of the overall trend.
    #[must_use]
    pub fn trend_label(&self) -> &'static str {
        trend_label(&self.overall_trend)
    }
}

fn trend_label(trend: &str) -> &'static str {
    match trend {
        "Increase" | "Aumento" => "Aumento",
        "Decrease" | "Disminución" => "Disminución",
        _ => "Estabilidad",
    }
}

/// One forecast row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastPoint {
    /// Forecast date.
    pub ds: String,
    /// Expected price.
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// Forecast series and aggregates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionSeries {
    pub forecast: Vec<ForecastPoint>,
    pub avg_forecast: Option<f64>,
    pub max_forecast: Option<f64>,
    pub min_forecast: Option<f64>,
}

/// Price prediction for a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionReport {
    pub status: String,
    pub product: String,
    pub months_ahead: u32,
    pub graph_url: Option<String>,
    pub predictions: PredictionSeries,
    /// Only present when `status` is `error`.
    pub message: Option<String>,
}

impl PredictionReport {
    /// Whether the service reported a failure inside a 2xx body.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status.eq_ignore_ascii_case("error")
    }
}

// =============================================================================
// Plazas
// =============================================================================

/// A full plaza record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plaza {
    /// Backend ID.
    #[serde(alias = "id")]
    pub plaza_id: PlazaId,
    pub nombre: String,
    #[serde(default)]
    pub direccion: String,
    #[serde(default)]
    pub ciudad: String,
    #[serde(default)]
    pub horarios: Option<String>,
    #[serde(default)]
    pub numero_comerciantes: Option<i64>,
    #[serde(default, deserialize_with = "lenient_product_types")]
    pub tipos_productos: Vec<String>,
    #[serde(default)]
    pub datos_contacto: Option<String>,
    /// `None` when the backend sent no status or one this client does not know.
    #[serde(default, deserialize_with = "lenient_status")]
    pub estado: Option<PlazaStatus>,
    #[serde(default, deserialize_with = "lenient_coordinates")]
    pub coordenadas: Option<Coordinates>,
}

impl Plaza {
    /// Status label for listings.
    #[must_use]
    pub fn estado_label(&self) -> &'static str {
        self.estado.as_ref().map_or("Sin estado", PlazaStatus::label)
    }

    /// Whether `query` occurs in the name, city or address, ignoring case.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || [&self.nombre, &self.ciudad, &self.direccion]
                .iter()
                .any(|field| field.to_lowercase().contains(&query))
    }

    /// Product types joined for display.
    #[must_use]
    pub fn product_types(&self) -> String {
        self.tipos_productos.join(", ")
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum PlazaListBody {
    List(Vec<Plaza>),
    Wrapped { plazas: Vec<Plaza> },
}

impl PlazaListBody {
    pub(crate) fn into_vec(self) -> Vec<Plaza> {
        match self {
            Self::List(plazas) | Self::Wrapped { plazas } => plazas,
        }
    }
}

/// Latitude/longitude as the backend accepts them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoordinatesBody {
    pub lat: f64,
    pub lon: f64,
}

impl From<Coordinates> for CoordinatesBody {
    fn from(c: Coordinates) -> Self {
        Self {
            lat: c.lat(),
            lon: c.lon(),
        }
    }
}

/// Body of a plaza create or update call. Built only from validated forms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlazaPayload {
    pub nombre: String,
    pub direccion: String,
    pub ciudad: String,
    pub coordenadas: CoordinatesBody,
    pub estado: PlazaStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horarios: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numero_comerciantes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipos_productos: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datos_contacto: Option<String>,
}

// =============================================================================
// Auth
// =============================================================================

/// Body of `POST /registro/`.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub(crate) struct LoginBody<'a> {
    pub(crate) email: &'a str,
    pub(crate) password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct ResetPasswordBody<'a> {
    pub(crate) new_password: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct LoginResponse {
    pub(crate) access_token: String,
    #[serde(default)]
    pub(crate) usuario: String,
    #[serde(default)]
    pub(crate) nombre: String,
    #[serde(default)]
    pub(crate) rol: String,
}

impl LoginResponse {
    pub(crate) fn role(&self) -> UserRole {
        UserRole::from_backend(&self.rol)
    }
}

/// Acknowledgement returned by mutating endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApiMessage {
    /// Backend confirmation text, if any.
    pub message: Option<String>,
}

impl ApiMessage {
    /// Read `message` / `mensaje` / `detail` from any JSON body.
    pub(crate) fn from_body(body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body).ok().and_then(|value| {
            ["message", "mensaje", "detail"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str))
                .map(str::to_string)
        });
        Self { message }
    }

    /// The message, or `fallback` when the backend sent none.
    #[must_use]
    pub fn or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.message.as_deref().unwrap_or(fallback)
    }
}

// =============================================================================
// Lenient field decoding
// =============================================================================

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

/// Parse the day part of `2025-10-12` or `2025-10-12T08:00:00`.
fn parse_day(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn lenient_product_types<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Option<PlazaStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|s| s.parse::<PlazaStatus>().ok()))
}

/// Accepts `"(6.25, -75.56)"`, `"6.25,-75.56"`, `{"lat":..,"lon"|"lng":..}`
/// or `[lat, lon]`. Anything else, or out-of-range values, yield `None`.
fn lenient_coordinates<'de, D>(deserializer: D) -> Result<Option<Coordinates>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let pair = match value {
        Some(Value::String(text)) => {
            let trimmed = text.trim().trim_start_matches('(').trim_end_matches(')');
            trimmed.split_once(',').and_then(|(lat, lon)| {
                Some((lat.trim().parse::<f64>().ok()?, lon.trim().parse::<f64>().ok()?))
            })
        }
        Some(Value::Object(map)) => {
            let lat = map.get("lat").and_then(Value::as_f64);
            let lon = map
                .get("lon")
                .or_else(|| map.get("lng"))
                .and_then(Value::as_f64);
            lat.zip(lon)
        }
        Some(Value::Array(items)) => match items.as_slice() {
            [lat, lon] => lat.as_f64().zip(lon.as_f64()),
            _ => None,
        },
        _ => None,
    };
    Ok(pair.and_then(|(lat, lon)| Coordinates::new(lat, lon).ok()))
}
