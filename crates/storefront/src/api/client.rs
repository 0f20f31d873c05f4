//! HTTP client for the Plaze backend.

use std::sync::Arc;
use std::time::{Duration, Instant};

use plaze_core::PlazaId;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::types::{
    ActivePlazasBody, ApiMessage, CatalogOptions, CurrentPrices, LatestPriceBody, LoginBody,
    LoginResponse, Plaza, PlazaListBody, PlazaOption, PlazaPayload, PredictionReport,
    PriceHistory, PriceQuote, ProductEntry, ProductListBody, Registration, ResetPasswordBody,
    SearchOutcome,
};
use super::{ApiError, extract_detail};
use crate::config::ApiConfig;
use crate::session::{SessionStore, UserSession};

/// Fixed wall-clock limit for every backend request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// PlazeClient
// =============================================================================

/// Client for the Plaze REST API.
///
/// Cheap to clone. Holds no session state; call [`with_session`](Self::with_session)
/// to get a handle that authenticates from a [`SessionStore`].
#[derive(Clone)]
pub struct PlazeClient {
    inner: Arc<PlazeClientInner>,
}

struct PlazeClientInner {
    http: reqwest::Client,
    base_url: Url,
    default_city: String,
}

impl PlazeClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ApiError::Http)?;

        Ok(Self {
            inner: Arc::new(PlazeClientInner {
                http,
                base_url: config.base_url.clone(),
                default_city: config.default_city.clone(),
            }),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// City used by `current_prices` when the caller gives none.
    #[must_use]
    pub fn default_city(&self) -> &str {
        &self.inner.default_city
    }

    /// Bind the client to a session store for one unit of work.
    #[must_use]
    pub const fn with_session<'a, S: SessionStore>(&'a self, store: &'a S) -> ApiSession<'a, S> {
        ApiSession {
            client: self,
            store,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }
}

impl std::fmt::Debug for PlazeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlazeClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Raw backend answer, body already read.
struct Reply {
    status: StatusCode,
    body: String,
}

impl Reply {
    fn backend_error(&self) -> ApiError {
        ApiError::Backend {
            status: self.status,
            detail: extract_detail(self.status, &self.body),
        }
    }

    fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        if !self.status.is_success() {
            return Err(self.backend_error());
        }
        serde_json::from_str(&self.body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %self.body.chars().take(500).collect::<String>(),
                "Failed to parse Plaze API response"
            );
            ApiError::Decode(e)
        })
    }

    fn ack(&self) -> Result<ApiMessage, ApiError> {
        if self.status.is_success() {
            Ok(ApiMessage::from_body(&self.body))
        } else {
            Err(self.backend_error())
        }
    }
}

// =============================================================================
// ApiSession
// =============================================================================

/// The API client bound to a session store.
///
/// The bearer token is read from the store before each request. Any 401
/// clears the store and returns [`ApiError::Unauthorized`].
pub struct ApiSession<'a, S> {
    client: &'a PlazeClient,
    store: &'a S,
}

impl<'a, S> ApiSession<'a, S> {
    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &'a PlazeClient {
        self.client
    }
}

impl<S: SessionStore> ApiSession<'_, S> {
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.client.endpoint(path)?;
        Ok(self.client.inner.http.request(method, url))
    }

    /// Send a request with the stored bearer token. A 401 clears the store
    /// and becomes [`ApiError::Unauthorized`].
    async fn send(&self, request: RequestBuilder) -> Result<Reply, ApiError> {
        let reply = self.dispatch(request).await?;
        if reply.status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        Ok(reply)
    }

    /// Send a request with the stored bearer token and read the body.
    ///
    /// A 401 still clears the store, but the reply is handed back so the
    /// caller can decide what the rejection means.
    async fn dispatch(&self, request: RequestBuilder) -> Result<Reply, ApiError> {
        let request = match self.store.load().await? {
            Some(session) => request.bearer_auth(session.access_token().expose_secret()),
            None => request,
        };
        let request = request.build().map_err(ApiError::Http)?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let started = Instant::now();
        let response = self
            .client
            .inner
            .http
            .execute(request)
            .await
            .map_err(|e| {
                tracing::warn!(method = %method, path = %path, error = %e, "Plaze API unreachable");
                ApiError::from_transport(e)
            })?;
        let status = response.status();
        let body = response.text().await.map_err(ApiError::from_transport)?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::debug!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms,
            "Plaze API call"
        );

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(method = %method, path = %path, "Plaze API rejected token, clearing session");
            if let Err(e) = self.store.clear().await {
                tracing::error!(error = %e, "Failed to clear session after 401");
            }
        }

        if status.is_server_error() {
            tracing::error!(
                method = %method,
                path = %path,
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Plaze API returned server error"
            );
        }

        Ok(Reply { status, body })
    }

    // -------------------------------------------------------------------------
    // Prices
    // -------------------------------------------------------------------------

    /// `GET /prices/current`: current prices of a product in a city.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn current_prices(
        &self,
        product: &str,
        city: Option<&str>,
        plaza: Option<&str>,
    ) -> Result<CurrentPrices, ApiError> {
        let city = city
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.client.default_city());
        let mut query = vec![("product", product.trim()), ("city", city)];
        if let Some(plaza) = plaza.map(str::trim).filter(|p| !p.is_empty()) {
            query.push(("plaza", plaza));
        }
        let request = self.request(Method::GET, "prices/current")?.query(&query);
        self.send(request).await?.json()
    }

    /// `GET /price-history/{name}`: price history over the last `months`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NoHistory`] on 404.
    #[instrument(skip(self))]
    pub async fn price_history(&self, product: &str, months: u32) -> Result<PriceHistory, ApiError> {
        let path = format!("price-history/{}", urlencoding::encode(product.trim()));
        let request = self.request(Method::GET, &path)?.query(&[("months", months)]);
        let reply = self.send(request).await?;
        if reply.status == StatusCode::NOT_FOUND {
            return Err(ApiError::NoHistory);
        }
        reply.json()
    }

    /// `GET /prices/latest/`: latest price of a product at a plaza.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend has no price (any non-success status).
    #[instrument(skip(self))]
    pub async fn latest_price(&self, product: &str, plaza: &str) -> Result<PriceQuote, ApiError> {
        let request = self
            .request(Method::GET, "prices/latest/")?
            .query(&[("product_name", product.trim()), ("market_name", plaza.trim())]);
        let body: LatestPriceBody = self.send(request).await?.json()?;
        Ok(body.into_quote(product.trim(), plaza.trim()))
    }

    /// `GET /prices/options/`: selectable products and plazas.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn options(&self) -> Result<CatalogOptions, ApiError> {
        let request = self.request(Method::GET, "prices/options/")?;
        self.send(request).await?.json()
    }

    /// `GET /product-prices/plazas`: plazas currently reporting prices.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn active_plazas(&self) -> Result<Vec<PlazaOption>, ApiError> {
        let request = self.request(Method::GET, "product-prices/plazas")?;
        let body: ActivePlazasBody = self.send(request).await?.json()?;
        Ok(body.plazas)
    }

    /// `GET /predictions/`: price forecast for the next `months_ahead` months.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InsufficientData`] on 404 and
    /// [`ApiError::PredictionFailed`] when the body reports an error.
    #[instrument(skip(self))]
    pub async fn predictions(
        &self,
        product: &str,
        months_ahead: u32,
    ) -> Result<PredictionReport, ApiError> {
        let request = self.request(Method::GET, "predictions/")?.query(&[
            ("product_name", product.trim().to_string()),
            ("months_ahead", months_ahead.to_string()),
        ]);
        let reply = self.send(request).await?;
        if reply.status == StatusCode::NOT_FOUND {
            return Err(ApiError::InsufficientData);
        }
        let report: PredictionReport = reply.json()?;
        if report.is_error() {
            return Err(ApiError::PredictionFailed(
                report
                    .message
                    .unwrap_or_else(|| "respuesta sin detalle".to_string()),
            ));
        }
        Ok(report)
    }

    /// `GET /prices/search/`: search products by name.
    ///
    /// A 404 is a normal outcome carrying suggestions.
    ///
    /// # Errors
    ///
    /// Returns an error on any other non-success status.
    #[instrument(skip(self))]
    pub async fn search_products(&self, query: &str) -> Result<SearchOutcome, ApiError> {
        let request = self
            .request(Method::GET, "prices/search/")?
            .query(&[("query", query.trim())]);
        let reply = self.send(request).await?;
        if reply.status == StatusCode::NOT_FOUND {
            let body = serde_json::from_str(&reply.body).unwrap_or(serde_json::Value::Null);
            return Ok(SearchOutcome::from_not_found_body(&body));
        }
        let body: serde_json::Value = reply.json()?;
        Ok(SearchOutcome::from_found_body(&body))
    }

    /// `GET /prices/products/`: the full product catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn all_products(&self) -> Result<Vec<ProductEntry>, ApiError> {
        let request = self.request(Method::GET, "prices/products/")?;
        let body: ProductListBody = self.send(request).await?.json()?;
        Ok(body.productos)
    }

    // -------------------------------------------------------------------------
    // Plazas
    // -------------------------------------------------------------------------

    /// `GET /plazas/`: every plaza record.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_plazas(&self) -> Result<Vec<Plaza>, ApiError> {
        let request = self.request(Method::GET, "plazas/")?;
        let body: PlazaListBody = self.send(request).await?.json()?;
        Ok(body.into_vec())
    }

    /// `GET /plazas/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn plaza_by_id(&self, id: PlazaId) -> Result<Plaza, ApiError> {
        let request = self.request(Method::GET, &format!("plazas/{id}"))?;
        self.send(request).await?.json()
    }

    /// `GET /plazas/nombre/{name}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn plaza_by_name(&self, name: &str) -> Result<Plaza, ApiError> {
        let path = format!("plazas/nombre/{}", urlencoding::encode(name.trim()));
        let request = self.request(Method::GET, &path)?;
        self.send(request).await?.json()
    }

    /// `POST /plazas/`.
    ///
    /// # Errors
    ///
    /// Returns the backend `detail` on rejection.
    #[instrument(skip(self, payload), fields(nombre = %payload.nombre))]
    pub async fn create_plaza(&self, payload: &PlazaPayload) -> Result<ApiMessage, ApiError> {
        let request = self.request(Method::POST, "plazas/")?.json(payload);
        self.send(request).await?.ack()
    }

    /// `PUT /plazas/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the backend `detail` on rejection.
    #[instrument(skip(self, payload), fields(nombre = %payload.nombre))]
    pub async fn update_plaza(
        &self,
        id: PlazaId,
        payload: &PlazaPayload,
    ) -> Result<ApiMessage, ApiError> {
        let request = self
            .request(Method::PUT, &format!("plazas/{id}"))?
            .json(payload);
        self.send(request).await?.ack()
    }

    /// `DELETE /plazas/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the backend `detail` on rejection.
    #[instrument(skip(self))]
    pub async fn delete_plaza(&self, id: PlazaId) -> Result<ApiMessage, ApiError> {
        let request = self.request(Method::DELETE, &format!("plazas/{id}"))?;
        self.send(request).await?.ack()
    }

    // -------------------------------------------------------------------------
    // Auth
    // -------------------------------------------------------------------------

    /// `POST /registro/`.
    ///
    /// # Errors
    ///
    /// Returns the backend `detail` on rejection.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<ApiMessage, ApiError> {
        let request = self.request(Method::POST, "registro/")?.json(registration);
        self.send(request).await?.ack()
    }

    /// `POST /auth/login`. On success all four session fields are written.
    ///
    /// # Errors
    ///
    /// Returns the backend `detail` on rejection. A 401 here is a refused
    /// credential, so it comes back as [`ApiError::Backend`] with that detail
    /// instead of [`ApiError::Unauthorized`].
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<UserSession, ApiError> {
        let request = self.request(Method::POST, "auth/login")?.json(&LoginBody {
            email: email.trim(),
            password,
        });
        let body: LoginResponse = self.dispatch(request).await?.json()?;

        let role = body.role();
        let email = if body.usuario.trim().is_empty() {
            email.trim().to_string()
        } else {
            body.usuario
        };
        let session = UserSession::new(email, body.nombre, role, SecretString::from(body.access_token));
        self.store.save(&session).await?;
        Ok(session)
    }

    /// `POST /auth/logout`. The session is cleared even if the call fails.
    ///
    /// # Errors
    ///
    /// Returns an error only if the local session cannot be cleared.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        let outcome = match self.request(Method::POST, "auth/logout") {
            Ok(request) => self.send(request).await.and_then(|reply| reply.ack()),
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            tracing::warn!(error = %e, "Logout call failed; clearing session anyway");
        }
        self.store.clear().await?;
        Ok(())
    }

    /// `POST /password/recover/{email}`.
    ///
    /// # Errors
    ///
    /// Returns the backend `detail` on rejection.
    #[instrument(skip(self))]
    pub async fn recover_password(&self, email: &str) -> Result<ApiMessage, ApiError> {
        let path = format!("password/recover/{}", urlencoding::encode(email.trim()));
        let request = self.request(Method::POST, &path)?;
        self.send(request).await?.ack()
    }

    /// `POST /password/reset/{token}`.
    ///
    /// # Errors
    ///
    /// Returns the backend `detail` on rejection.
    #[instrument(skip(self, token, new_password))]
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<ApiMessage, ApiError> {
        let path = format!("password/reset/{}", urlencoding::encode(token.trim()));
        let request = self
            .request(Method::POST, &path)?
            .json(&ResetPasswordBody { new_password });
        self.send(request).await?.ack()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Mutex;

    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::{delete, get, post};
    use axum::{Json, Router};
    use plaze_core::UserRole;
    use serde_json::json;

    use super::*;
    use crate::session::{MemorySessionStore, keys};

    async fn serve(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    fn client(base_url: Url) -> PlazeClient {
        PlazeClient::new(&ApiConfig {
            base_url,
            default_city: "Medellín".to_string(),
        })
        .unwrap()
    }

    async fn logged_in() -> MemorySessionStore {
        let store = MemorySessionStore::new();
        store
            .save(&UserSession::new(
                "ana@plaze.co",
                "Ana",
                UserRole::Admin,
                SecretString::from("tok-1"),
            ))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_unauthorized_clears_all_session_keys() {
        let base = serve(Router::new().route(
            "/prices/options/",
            get(|| async { (AxumStatus::UNAUTHORIZED, Json(json!({"detail": "expired"}))) }),
        ))
        .await;
        let client = client(base);
        let store = logged_in().await;

        let err = client.with_session(&store).options().await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized));
        for key in keys::ALL {
            assert!(store.raw(key).is_none(), "{key} should be cleared");
        }
    }

    #[tokio::test]
    async fn test_bearer_token_sent_when_logged_in() {
        let seen = std::sync::Arc::new(Mutex::new(None::<String>));
        let captured = seen.clone();
        let base = serve(Router::new().route(
            "/prices/products/",
            get(move |headers: HeaderMap| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    Json(json!({"productos": [{"id": 1, "nombre": "Papa"}]}))
                }
            }),
        ))
        .await;
        let client = client(base);
        let store = logged_in().await;

        let products = client.with_session(&store).all_products().await.unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(seen.lock().unwrap().as_deref(), Some("Bearer tok-1"));
    }

    #[tokio::test]
    async fn test_backend_detail_surfaced_verbatim() {
        let base = serve(Router::new().route(
            "/plazas/",
            post(|| async {
                (
                    AxumStatus::BAD_REQUEST,
                    Json(json!({"detail": "Ya existe una plaza con ese nombre"})),
                )
            }),
        ))
        .await;
        let client = client(base);
        let store = logged_in().await;
        let payload = PlazaPayload {
            nombre: "Minorista".to_string(),
            direccion: "Cra. 57".to_string(),
            ciudad: "Medellín".to_string(),
            coordenadas: crate::api::CoordinatesBody {
                lat: 6.25,
                lon: -75.56,
            },
            estado: plaze_core::PlazaStatus::Active,
            horarios: None,
            numero_comerciantes: None,
            tipos_productos: None,
            datos_contacto: None,
        };

        let err = client
            .with_session(&store)
            .create_plaza(&payload)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Ya existe una plaza con ese nombre");
        assert_eq!(err.status(), Some(AxumStatus::BAD_REQUEST));
        assert!(store.raw(keys::ACCESS_TOKEN).is_some());
    }

    #[tokio::test]
    async fn test_history_and_prediction_404s_are_contextual() {
        let base = serve(
            Router::new()
                .route(
                    "/price-history/{name}",
                    get(|| async { (AxumStatus::NOT_FOUND, Json(json!({"detail": "x"}))) }),
                )
                .route(
                    "/predictions/",
                    get(|| async { (AxumStatus::NOT_FOUND, Json(json!({"detail": "y"}))) }),
                ),
        )
        .await;
        let client = client(base);
        let store = MemorySessionStore::new();
        let api = client.with_session(&store);

        assert!(matches!(
            api.price_history("Papa criolla", 12).await,
            Err(ApiError::NoHistory)
        ));
        assert!(matches!(
            api.predictions("Papa criolla", 6).await,
            Err(ApiError::InsufficientData)
        ));
    }

    #[tokio::test]
    async fn test_history_path_is_encoded() {
        let base = serve(Router::new().route(
            "/price-history/{name}",
            get(
                |Path(name): Path<String>, Query(q): Query<std::collections::HashMap<String, String>>| async move {
                    Json(json!({"product": name, "period_months": q["months"].parse::<u32>().unwrap()}))
                },
            ),
        ))
        .await;
        let client = client(base);
        let store = MemorySessionStore::new();

        let history = client
            .with_session(&store)
            .price_history("Papa criolla", 3)
            .await
            .unwrap();

        assert_eq!(history.product, "Papa criolla");
        assert_eq!(history.period_months, 3);
    }

    #[tokio::test]
    async fn test_search_404_is_structured_outcome() {
        let base = serve(Router::new().route(
            "/prices/search/",
            get(|| async {
                (
                    AxumStatus::NOT_FOUND,
                    Json(json!({"detail": "Producto no encontrado", "sugerencias": ["Tomate chonto"]})),
                )
            }),
        ))
        .await;
        let client = client(base);
        let store = MemorySessionStore::new();

        let outcome = client
            .with_session(&store)
            .search_products("tomat")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SearchOutcome::NotFound {
                detail: "Producto no encontrado".to_string(),
                suggestions: vec!["Tomate chonto".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn test_login_writes_session_and_logout_always_clears() {
        let base = serve(
            Router::new()
                .route(
                    "/auth/login",
                    post(|| async {
                        Json(json!({
                            "access_token": "tok-9",
                            "usuario": "luis@plaze.co",
                            "nombre": "Luis",
                            "rol": "user"
                        }))
                    }),
                )
                .route(
                    "/auth/logout",
                    post(|| async { AxumStatus::INTERNAL_SERVER_ERROR }),
                ),
        )
        .await;
        let client = client(base);
        let store = MemorySessionStore::new();
        let api = client.with_session(&store);

        let session = api.login("luis@plaze.co", "secreto123").await.unwrap();
        assert!(!session.is_admin());
        assert_eq!(store.raw(keys::USER_NAME).as_deref(), Some("Luis"));
        assert_eq!(store.raw(keys::USER_ROLE).as_deref(), Some("user"));

        api.logout().await.unwrap();
        assert!(store.raw(keys::ACCESS_TOKEN).is_none());
    }

    #[tokio::test]
    async fn test_login_rejection_keeps_backend_detail() {
        let base = serve(Router::new().route(
            "/auth/login",
            post(|| async {
                (
                    AxumStatus::UNAUTHORIZED,
                    Json(json!({"detail": "Cuenta bloqueada temporalmente"})),
                )
            }),
        ))
        .await;
        let client = client(base);
        let store = logged_in().await;

        let err = client
            .with_session(&store)
            .login("ana@plaze.co", "secreto123")
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(err.to_string(), "Cuenta bloqueada temporalmente");
        assert!(store.raw(keys::ACCESS_TOKEN).is_none());
    }

    #[tokio::test]
    async fn test_delete_plaza_ack() {
        let base = serve(Router::new().route(
            "/plazas/{id}",
            delete(|Path(id): Path<i32>| async move {
                Json(json!({"message": format!("Plaza {id} eliminada")}))
            }),
        ))
        .await;
        let client = client(base);
        let store = logged_in().await;

        let ack = client
            .with_session(&store)
            .delete_plaza(PlazaId::new(4))
            .await
            .unwrap();

        assert_eq!(ack.message.as_deref(), Some("Plaza 4 eliminada"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_connect_error() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client(Url::parse(&format!("http://{addr}/")).unwrap());
        let store = MemorySessionStore::new();
        let err = client.with_session(&store).options().await.unwrap_err();

        assert!(err.is_unreachable());
        assert_eq!(err.to_string(), "No se pudo conectar al servidor");
    }

    #[tokio::test]
    async fn test_slow_backend_times_out_after_ten_seconds() {
        let base = serve(Router::new().route(
            "/prices/options/",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Json(json!({"productos": [], "plazas": []}))
            }),
        ))
        .await;
        let client = client(base);
        let store = MemorySessionStore::new();

        let started = Instant::now();
        let err = client.with_session(&store).options().await.unwrap_err();

        assert!(matches!(err, ApiError::Timeout(10)));
        assert!(err.is_unreachable());
        assert_eq!(err.to_string(), "El servidor no respondió en 10 segundos");
        assert!(started.elapsed() < Duration::from_secs(20));
    }
}
