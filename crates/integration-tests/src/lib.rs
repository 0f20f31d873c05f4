//! Integration test harness for Plaze.
//!
//! Each test serves the real storefront router in-process against an
//! in-process fake of the Plaze backend. Both listen on `127.0.0.1:0`, so
//! tests run in parallel without shared state.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p plaze-integration-tests
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = FakeBackend::spawn(Router::new().route("/plazas/", get(list))).await;
//! let site = Storefront::spawn(&backend).await;
//!
//! let resp = site.get("/admin/plazas").await;
//! assert_eq!(resp.status(), StatusCode::SEE_OTHER);
//! assert!(backend.calls().is_empty());
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used, clippy::expect_used)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Request, State},
    middleware::Next,
    response::Response,
    routing::post,
};
use plaze_storefront::config::{ApiConfig, SentryConfig, StorefrontConfig};
use plaze_storefront::state::AppState;
use reqwest::header::LOCATION;
use serde_json::{Value, json};
use url::Url;

/// A request the fake backend received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

type CallLog = Arc<Mutex<Vec<Call>>>;

async fn record(State(log): State<CallLog>, request: Request, next: Next) -> Response {
    let call = Call {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        authorization: request
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    log.lock().unwrap().push(call);
    next.run(request).await
}

/// In-process stand-in for the Plaze backend.
pub struct FakeBackend {
    pub url: Url,
    log: CallLog,
}

impl FakeBackend {
    /// Serve `router`, recording every request it receives.
    pub async fn spawn(router: Router) -> Self {
        let log = CallLog::default();
        let app = router.layer(axum::middleware::from_fn_with_state(log.clone(), record));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: Url::parse(&format!("http://{addr}/")).unwrap(),
            log,
        }
    }

    /// Every request received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().clone()
    }

    /// Requests matching `method` and `path`.
    #[must_use]
    pub fn calls_to(&self, method: &str, path: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.path == path)
            .collect()
    }
}

/// Login route answering with the given role and token.
#[must_use]
pub fn login_route(role: &'static str, token: &'static str) -> Router {
    Router::new().route(
        "/auth/login",
        post(move |Json(body): Json<Value>| async move {
            Json(json!({
                "access_token": token,
                "token_type": "bearer",
                "usuario": body.get("email").cloned().unwrap_or_default(),
                "nombre": "Usuaria de prueba",
                "rol": role,
            }))
        }),
    )
}

/// The storefront served against a fake backend, with a cookie-keeping
/// browser that does not follow redirects.
pub struct Storefront {
    pub base: String,
    pub browser: reqwest::Client,
}

impl Storefront {
    /// Serve the storefront against `backend`.
    pub async fn spawn(backend: &FakeBackend) -> Self {
        let config = StorefrontConfig {
            host: [127, 0, 0, 1].into(),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            api: ApiConfig::parse(backend.url.as_str(), "Medellín").unwrap(),
            sentry: SentryConfig::default(),
        };
        let state = AppState::new(config).unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(
                listener,
                plaze_storefront::app(state).into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        let browser = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            base: format!("http://{addr}"),
            browser,
        }
    }

    /// GET a storefront path.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.browser
            .get(format!("{}{path}", self.base))
            .send()
            .await
            .unwrap()
    }

    /// POST a form to a storefront path.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.browser
            .post(format!("{}{path}", self.base))
            .form(form)
            .send()
            .await
            .unwrap()
    }

    /// Log in through the login form.
    pub async fn login(&self, email: &str) -> reqwest::Response {
        self.post_form("/login", &[("email", email), ("password", "secreto123")])
            .await
    }
}

/// `Location` header of a redirect response.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
