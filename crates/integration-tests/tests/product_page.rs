//! Product detail page: the resolution flow behind a real request.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;

use axum::{Json, Router, extract::Query, http::StatusCode, routing::get};
use plaze_integration_tests::{FakeBackend, Storefront};
use serde_json::json;

fn catalog_backend() -> Router {
    Router::new()
        .route(
            "/prices/options/",
            get(|| async {
                Json(json!({
                    "plazas": [
                        {"id": 1, "nombre": "A", "ciudad": "Medellín"},
                        {"id": 2, "nombre": "B", "ciudad": "Medellín"},
                        {"id": 3, "nombre": "C", "ciudad": "Medellín"}
                    ],
                    "productos": []
                }))
            }),
        )
        .route(
            "/prices/latest/",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let product = q.get("product_name").cloned().unwrap_or_default();
                let plaza = q.get("market_name").cloned().unwrap_or_default();
                if product == "Tomate" {
                    (
                        StatusCode::OK,
                        Json(json!({
                            "producto": "Tomate",
                            "plaza": plaza,
                            "precio_por_kg": 2500,
                            "ultima_actualizacion": "2025-10-12"
                        })),
                    )
                } else {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({"detail": "No hay precio registrado"})),
                    )
                }
            }),
        )
        .route(
            "/prices/search/",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                match q.get("query").map(String::as_str) {
                    Some("Papa") => (
                        StatusCode::OK,
                        Json(json!({"resultados": [{"producto": "Papa", "plaza": "C"}]})),
                    ),
                    Some("tomat") => (
                        StatusCode::NOT_FOUND,
                        Json(json!({
                            "detail": "Producto no encontrado",
                            "sugerencias": ["Tomate larga vida", "Tomate chonto"]
                        })),
                    ),
                    _ => (
                        StatusCode::NOT_FOUND,
                        Json(json!({"detail": "Producto no encontrado", "sugerencias": []})),
                    ),
                }
            }),
        )
}

async fn site() -> (FakeBackend, Storefront) {
    let backend = FakeBackend::spawn(catalog_backend()).await;
    let site = Storefront::spawn(&backend).await;
    (backend, site)
}

#[tokio::test]
async fn test_priced_product_uses_first_plaza_without_search() {
    let (backend, site) = site().await;

    let body = site.get("/product/Tomate").await.text().await.unwrap();
    assert!(body.contains("$2.500/kg"));
    assert!(body.contains("en A"));
    assert!(backend.calls_to("GET", "/prices/search/").is_empty());
}

#[tokio::test]
async fn test_plaza_filter_is_case_insensitive() {
    let (_backend, site) = site().await;

    let body = site.get("/product/Tomate?plaza=b").await.text().await.unwrap();
    assert!(body.contains("en B"));
}

#[tokio::test]
async fn test_unknown_product_shows_suggestions_in_order() {
    let (backend, site) = site().await;

    let body = site.get("/product/tomat").await.text().await.unwrap();
    let first = body.find("Tomate larga vida").unwrap();
    let second = body.find("Tomate chonto").unwrap();
    assert!(first < second);
    assert_eq!(backend.calls_to("GET", "/prices/latest/").len(), 1);
    assert_eq!(backend.calls_to("GET", "/prices/search/").len(), 1);
}

#[tokio::test]
async fn test_known_product_without_price() {
    let (_backend, site) = site().await;

    let body = site.get("/product/Papa").await.text().await.unwrap();
    assert!(body.contains("no tiene precio registrado en A"));
}

#[tokio::test]
async fn test_unknown_product_without_suggestions() {
    let (_backend, site) = site().await;

    let body = site.get("/product/Zzz").await.text().await.unwrap();
    assert!(body.contains("ni productos parecidos"));
}

#[tokio::test]
async fn test_unknown_plaza_is_inline_error() {
    let (backend, site) = site().await;

    let resp = site.get("/product/Tomate?plaza=Z").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("No se pudo encontrar la plaza Z"));
    assert!(backend.calls_to("GET", "/prices/latest/").is_empty());
}
