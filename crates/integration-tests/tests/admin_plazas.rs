//! Admin plaza CRUD through the storefront.

#![allow(clippy::unwrap_used)]

use axum::{
    Json, Router,
    extract::Path,
    http::StatusCode,
    routing::get,
};
use plaze_integration_tests::{FakeBackend, Storefront, location, login_route};
use serde_json::{Value, json};

fn minorista() -> Value {
    json!({
        "plaza_id": 4,
        "nombre": "Minorista",
        "direccion": "Cra. 57 #55-70",
        "ciudad": "Medellín",
        "estado": "activa",
        "coordenadas": {"lat": 6.2552, "lon": -75.5736},
        "tipos_productos": ["Frutas", "Verduras"]
    })
}

fn plaza_backend() -> Router {
    login_route("admin", "tok-admin")
        .route(
            "/plazas/",
            get(|| async { Json(json!([minorista()])) })
                .post(|| async { (StatusCode::CREATED, Json(json!({"message": "Plaza creada"}))) }),
        )
        .route(
            "/plazas/{id}",
            get(|Path(id): Path<i32>| async move {
                if id == 4 {
                    (StatusCode::OK, Json(minorista()))
                } else {
                    (StatusCode::NOT_FOUND, Json(json!({"detail": "Plaza no encontrada"})))
                }
            })
            .put(|| async { Json(json!({"message": "Plaza actualizada"})) })
            .delete(|| async { Json(json!({"message": "Plaza eliminada"})) }),
        )
}

async fn admin_site() -> (FakeBackend, Storefront) {
    let backend = FakeBackend::spawn(plaza_backend()).await;
    let site = Storefront::spawn(&backend).await;
    site.login("admin@plaze.co").await;
    (backend, site)
}

fn plaza_form<'a>(lat: &'a str, lon: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("nombre", "La América"),
        ("direccion", "Calle 44 # 80-20"),
        ("ciudad", "Medellín"),
        ("latitud", lat),
        ("longitud", lon),
        ("estado", "activa"),
        ("numero_comerciantes", "120"),
    ]
}

#[tokio::test]
async fn test_create_rejects_out_of_range_coordinates_without_call() {
    let (backend, site) = admin_site().await;

    let resp = site.post_form("/admin/plazas/create", &plaza_form("91", "-75.56")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("La latitud debe ser"));

    let resp = site.post_form("/admin/plazas/create", &plaza_form("6.25", "-181")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("La longitud debe ser"));

    assert!(backend.calls_to("POST", "/plazas/").is_empty());
}

#[tokio::test]
async fn test_create_valid_plaza_redirects_to_list() {
    let (backend, site) = admin_site().await;

    let resp = site.post_form("/admin/plazas/create", &plaza_form("6.25", "-75.56")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/admin/plazas/list?ok=created"));
    assert_eq!(backend.calls_to("POST", "/plazas/").len(), 1);

    let resp = site.get("/admin/plazas/list?ok=created").await;
    let body = resp.text().await.unwrap();
    assert!(body.contains("Plaza creada correctamente"));
    assert!(body.contains("Minorista"));
}

#[tokio::test]
async fn test_edit_prefills_selected_plaza() {
    let (_backend, site) = admin_site().await;

    let resp = site.get("/admin/plazas/edit?plaza_id=4").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains(r#"value="Cra. 57 #55-70""#));
    assert!(body.contains(r#"value="Frutas, Verduras""#));
}

#[tokio::test]
async fn test_update_issues_put() {
    let (backend, site) = admin_site().await;

    let mut form = plaza_form("6.2552", "-75.5736");
    form.push(("plaza_id", "4"));
    let resp = site.post_form("/admin/plazas/edit", &form).await;
    assert_eq!(location(&resp).as_deref(), Some("/admin/plazas/list?ok=updated"));
    assert_eq!(backend.calls_to("PUT", "/plazas/4").len(), 1);
}

#[tokio::test]
async fn test_delete_requires_confirmation() {
    let (backend, site) = admin_site().await;

    let resp = site.post_form("/admin/plazas/delete", &[("plaza_id", "4")]).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/admin/plazas/delete?plaza_id=4"));
    assert!(backend.calls_to("DELETE", "/plazas/4").is_empty());

    let resp = site.get("/admin/plazas/delete?plaza_id=4").await;
    assert!(resp.text().await.unwrap().contains("¿Seguro que deseas eliminar"));
    assert!(backend.calls_to("DELETE", "/plazas/4").is_empty());

    let resp = site
        .post_form("/admin/plazas/delete", &[("plaza_id", "4"), ("confirm", "yes")])
        .await;
    assert_eq!(location(&resp).as_deref(), Some("/admin/plazas/list?ok=deleted"));
    assert_eq!(backend.calls_to("DELETE", "/plazas/4").len(), 1);
}

#[tokio::test]
async fn test_delete_without_selection_is_inline_error() {
    let (backend, site) = admin_site().await;

    let resp = site
        .post_form("/admin/plazas/delete", &[("plaza_id", ""), ("confirm", "yes")])
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Selecciona una plaza"));
    assert!(backend.calls().iter().all(|c| c.method != "DELETE"));
}
