//! Plaza directory route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use reqwest::StatusCode;
use serde::Deserialize;

use super::inline;
use crate::api::Plaza;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalUser;
use crate::session::{TowerSessionStore, UserSession};
use crate::state::AppState;

/// Directory filter.
#[derive(Debug, Default, Deserialize)]
pub struct DirectoryQuery {
    pub q: Option<String>,
}

/// Plaza directory template.
#[derive(Template, WebTemplate)]
#[template(path = "plazas/index.html")]
pub struct PlazasIndexTemplate {
    pub current_user: Option<UserSession>,
    pub query: String,
    pub plazas: Vec<PlazaCard>,
    pub error: Option<String>,
}

/// Plaza detail template.
#[derive(Template, WebTemplate)]
#[template(path = "plazas/show.html")]
pub struct PlazaShowTemplate {
    pub current_user: Option<UserSession>,
    pub plaza: Plaza,
    pub map_url: Option<String>,
    pub products_href: String,
}

/// A directory entry.
#[derive(Debug, Clone)]
pub struct PlazaCard {
    pub nombre: String,
    pub ciudad: String,
    pub direccion: String,
    pub estado: &'static str,
    pub href: String,
}

impl From<&Plaza> for PlazaCard {
    fn from(plaza: &Plaza) -> Self {
        Self {
            nombre: plaza.nombre.clone(),
            ciudad: plaza.ciudad.clone(),
            direccion: plaza.direccion.clone(),
            estado: plaza.estado_label(),
            href: format!("/plaza/{}", urlencoding::encode(&plaza.nombre)),
        }
    }
}

/// OpenStreetMap link centred on the plaza.
fn map_url(plaza: &Plaza) -> Option<String> {
    plaza.coordenadas.as_ref().map(|c| {
        format!(
            "https://www.openstreetmap.org/?mlat={lat}&mlon={lon}#map=17/{lat}/{lon}",
            lat = c.lat(),
            lon = c.lon()
        )
    })
}

/// Display the plaza directory.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<DirectoryQuery>,
    store: TowerSessionStore,
    OptionalUser(current_user): OptionalUser,
) -> Result<PlazasIndexTemplate> {
    let needle = query.q.unwrap_or_default();

    let (plazas, error) = match inline(state.api_for(&store).list_plazas().await)? {
        Ok(plazas) => (
            plazas
                .iter()
                .filter(|p| p.matches(&needle))
                .map(PlazaCard::from)
                .collect(),
            None,
        ),
        Err(message) => (Vec::new(), Some(message)),
    };

    Ok(PlazasIndexTemplate {
        current_user,
        query: needle,
        plazas,
        error,
    })
}

/// Display one plaza by name.
pub async fn show(
    State(state): State<AppState>,
    Path(name): Path<String>,
    store: TowerSessionStore,
    OptionalUser(current_user): OptionalUser,
) -> Result<PlazaShowTemplate> {
    let plaza = match state.api_for(&store).plaza_by_name(&name).await {
        Ok(plaza) => plaza,
        Err(err) if err.status() == Some(StatusCode::NOT_FOUND) => {
            return Err(AppError::NotFound(format!("Plaza {name}")));
        }
        Err(err) => return Err(err.into()),
    };

    Ok(PlazaShowTemplate {
        current_user,
        map_url: map_url(&plaza),
        products_href: format!("/products?plaza={}", urlencoding::encode(&plaza.nombre)),
        plaza,
    })
}
