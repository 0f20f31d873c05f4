//! Landing, home and health handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;

use super::inline;
use crate::api::PlazaOption;
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalUser;
use crate::session::{TowerSessionStore, UserSession};
use crate::state::AppState;

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/landing.html")]
pub struct LandingTemplate {
    pub current_user: Option<UserSession>,
}

/// Home page template: product search with an active-plaza filter.
#[derive(Template, WebTemplate)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub current_user: Option<UserSession>,
    pub plazas: Vec<PlazaOption>,
    pub error: Option<String>,
}

/// Display the landing page.
pub async fn landing(OptionalUser(current_user): OptionalUser) -> LandingTemplate {
    LandingTemplate { current_user }
}

/// Display the home page.
pub async fn home(
    State(state): State<AppState>,
    store: TowerSessionStore,
    OptionalUser(current_user): OptionalUser,
) -> Result<HomeTemplate> {
    let (plazas, error) = match inline(state.api_for(&store).active_plazas().await)? {
        Ok(plazas) => (plazas, None),
        Err(message) => (Vec::new(), Some(message)),
    };

    Ok(HomeTemplate {
        current_user,
        plazas,
        error,
    })
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
pub async fn health() -> &'static str {
    "ok"
}
