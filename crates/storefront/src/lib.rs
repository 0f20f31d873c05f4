//! Plaze storefront library.
//!
//! Server-rendered portal for agricultural commodity prices across the
//! market plazas of a city. All data comes from the Plaze REST backend
//! through [`api::PlazeClient`].
//!
//! The binary in `main.rs` only loads configuration, installs logging and
//! serves [`app`]; the router is built here so it can be tested in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod filters;
pub mod forms;
pub mod middleware;
pub mod resolution;
pub mod routes;
pub mod session;
pub mod state;

use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::middleware::{
    ContentSecurityPolicy, create_session_layer, request_id_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// Static assets bundled with the crate.
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build the full application router.
///
/// Layer order, outermost first: Sentry, trace, request ID, security
/// headers, session.
pub fn app(state: AppState) -> Router {
    let csp = ContentSecurityPolicy::for_api(state.api().base_url());
    let session_layer = create_session_layer(state.config());

    Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(axum::middleware::from_fn_with_state(
            csp,
            security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::config::{ApiConfig, SentryConfig, StorefrontConfig};

    fn test_app() -> Router {
        let config = StorefrontConfig {
            host: [127, 0, 0, 1].into(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            api: ApiConfig::parse("http://127.0.0.1:9/", "Medellín").unwrap(),
            sentry: SentryConfig::default(),
        };
        app(AppState::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_health_carries_security_headers_and_request_id() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
        assert!(headers.get("x-request-id").is_some());
        let csp = headers
            .get(header::CONTENT_SECURITY_POLICY)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(csp.contains("img-src 'self' data: http://127.0.0.1:9"));
    }

    #[tokio::test]
    async fn test_upstream_request_id_is_echoed() {
        let response = test_app()
            .oneshot(
                Request::get("/health")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers().get("x-request-id").unwrap(), "req-42");
    }

    #[tokio::test]
    async fn test_landing_renders_without_backend() {
        let response = test_app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stylesheet_is_served() {
        let response = test_app()
            .oneshot(Request::get("/static/css/main.css").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
