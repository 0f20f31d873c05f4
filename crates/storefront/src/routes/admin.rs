//! Admin plaza panel.
//!
//! Every handler takes [`RequireAdmin`], so the gate is re-evaluated on
//! each request. Forms are validated before any backend call; a failed
//! check re-renders the form and sends nothing.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use plaze_core::PlazaId;
use serde::Deserialize;

use super::inline;
use crate::api::Plaza;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::forms::{FormError, PlazaForm, PlazaSelectionForm};
use crate::middleware::RequireAdmin;
use crate::session::{TowerSessionStore, UserSession};
use crate::state::AppState;

// =============================================================================
// Form & Query Types
// =============================================================================

/// Success code shown on the list after a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub ok: Option<String>,
}

/// Edit submission: the picked plaza plus its fields.
#[derive(Debug, Default, Deserialize)]
pub struct EditPlazaForm {
    #[serde(default)]
    pub plaza_id: String,
    #[serde(flatten)]
    pub plaza: PlazaForm,
}

/// Delete submission. Only `confirm=yes` issues the DELETE.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeletePlazaForm {
    pub plaza_id: String,
    pub confirm: String,
}

impl DeletePlazaForm {
    fn confirmed(&self) -> bool {
        self.confirm.trim().eq_ignore_ascii_case("yes")
    }
}

fn flash_message(code: Option<&str>) -> Option<&'static str> {
    match code? {
        "created" => Some("Plaza creada correctamente"),
        "updated" => Some("Plaza actualizada correctamente"),
        "deleted" => Some("Plaza eliminada correctamente"),
        _ => None,
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Admin menu template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/menu.html")]
pub struct MenuTemplate {
    pub current_user: Option<UserSession>,
}

/// Plaza records template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/list.html")]
pub struct ListTemplate {
    pub current_user: Option<UserSession>,
    pub plazas: Vec<Plaza>,
    pub flash: Option<&'static str>,
    pub error: Option<String>,
}

/// Create/edit form template.
///
/// In edit mode the picker is shown and the form only once a plaza is
/// selected.
#[derive(Template, WebTemplate)]
#[template(path = "admin/form.html")]
pub struct FormTemplate {
    pub current_user: Option<UserSession>,
    pub editing: bool,
    pub plazas: Vec<Plaza>,
    pub selected_id: String,
    pub form: Option<PlazaForm>,
    pub error: Option<String>,
}

impl FormTemplate {
    fn create(admin: UserSession, form: PlazaForm, error: Option<String>) -> Self {
        Self {
            current_user: Some(admin),
            editing: false,
            plazas: Vec::new(),
            selected_id: String::new(),
            form: Some(form),
            error,
        }
    }

    fn edit(admin: UserSession, plazas: Vec<Plaza>) -> Self {
        Self {
            current_user: Some(admin),
            editing: true,
            plazas,
            selected_id: String::new(),
            form: None,
            error: None,
        }
    }

    const fn action(&self) -> &'static str {
        if self.editing {
            "/admin/plazas/edit"
        } else {
            "/admin/plazas/create"
        }
    }
}

/// Delete picker and confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/delete.html")]
pub struct DeleteTemplate {
    pub current_user: Option<UserSession>,
    pub plazas: Vec<Plaza>,
    pub selected: Option<Plaza>,
    pub error: Option<String>,
}

// =============================================================================
// Menu & List
// =============================================================================

/// Display the admin menu.
pub async fn menu(RequireAdmin(admin): RequireAdmin) -> MenuTemplate {
    MenuTemplate {
        current_user: Some(admin),
    }
}

/// Display all plaza records.
pub async fn list(
    State(state): State<AppState>,
    store: TowerSessionStore,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<ListTemplate> {
    let (plazas, error) = match inline(state.api_for(&store).list_plazas().await)? {
        Ok(plazas) => (plazas, None),
        Err(message) => (Vec::new(), Some(message)),
    };

    Ok(ListTemplate {
        current_user: Some(admin),
        plazas,
        flash: flash_message(query.ok.as_deref()),
        error,
    })
}

// =============================================================================
// Create
// =============================================================================

/// Display an empty plaza form.
pub async fn create_page(RequireAdmin(admin): RequireAdmin) -> FormTemplate {
    let form = PlazaForm {
        estado: "activa".to_string(),
        ..PlazaForm::default()
    };
    FormTemplate::create(admin, form, None)
}

/// Validate and create a plaza.
pub async fn create(
    State(state): State<AppState>,
    store: TowerSessionStore,
    RequireAdmin(admin): RequireAdmin,
    Form(form): Form<PlazaForm>,
) -> Result<Response> {
    let payload = match form.validate() {
        Ok(payload) => payload,
        Err(err) => {
            return Ok(FormTemplate::create(admin, form, Some(err.to_string())).into_response());
        }
    };

    match inline(state.api_for(&store).create_plaza(&payload).await)? {
        Ok(_) => {
            tracing::info!(nombre = %payload.nombre, admin = %admin.email, "Plaza created");
            add_breadcrumb("admin", "Created plaza", Some(&[("nombre", payload.nombre.as_str())]));
            Ok(Redirect::to("/admin/plazas/list?ok=created").into_response())
        }
        Err(message) => Ok(FormTemplate::create(admin, form, Some(message)).into_response()),
    }
}

// =============================================================================
// Edit
// =============================================================================

/// Display the plaza picker, and the prefilled form once one is picked.
pub async fn edit_page(
    State(state): State<AppState>,
    store: TowerSessionStore,
    RequireAdmin(admin): RequireAdmin,
    Query(selection): Query<PlazaSelectionForm>,
) -> Result<FormTemplate> {
    let api = state.api_for(&store);
    let mut page = FormTemplate::edit(admin, Vec::new());

    match inline(api.list_plazas().await)? {
        Ok(plazas) => page.plazas = plazas,
        Err(message) => {
            page.error = Some(message);
            return Ok(page);
        }
    }

    if selection.plaza_id.trim().is_empty() {
        return Ok(page);
    }

    match selection.plaza_id() {
        Ok(id) => {
            page.selected_id = id.to_string();
            match inline(api.plaza_by_id(id).await)? {
                Ok(plaza) => page.form = Some(PlazaForm::from_plaza(&plaza)),
                Err(message) => page.error = Some(message),
            }
        }
        Err(err) => page.error = Some(err.to_string()),
    }

    Ok(page)
}

/// Validate and update the picked plaza.
pub async fn update(
    State(state): State<AppState>,
    store: TowerSessionStore,
    RequireAdmin(admin): RequireAdmin,
    Form(submission): Form<EditPlazaForm>,
) -> Result<Response> {
    let api = state.api_for(&store);
    let selection = PlazaSelectionForm {
        plaza_id: submission.plaza_id.clone(),
    };

    let validated = selection
        .plaza_id()
        .and_then(|id| submission.plaza.validate().map(|payload| (id, payload)));

    let failure = match validated {
        Ok((id, payload)) => match inline(api.update_plaza(id, &payload).await)? {
            Ok(_) => {
                tracing::info!(plaza_id = %id, admin = %admin.email, "Plaza updated");
                add_breadcrumb("admin", "Updated plaza", Some(&[("plaza_id", id.to_string().as_str())]));
                return Ok(Redirect::to("/admin/plazas/list?ok=updated").into_response());
            }
            Err(message) => message,
        },
        Err(err) => err.to_string(),
    };

    // Re-render with the picker so the admin can switch plazas
    let plazas = inline(api.list_plazas().await)?.unwrap_or_default();
    let mut page = FormTemplate::edit(admin, plazas);
    page.selected_id = submission.plaza_id.trim().to_string();
    page.form = Some(submission.plaza);
    page.error = Some(failure);
    Ok(page.into_response())
}

// =============================================================================
// Delete
// =============================================================================

/// Display the plaza picker, and the confirmation once one is picked.
pub async fn delete_page(
    State(state): State<AppState>,
    store: TowerSessionStore,
    RequireAdmin(admin): RequireAdmin,
    Query(selection): Query<PlazaSelectionForm>,
) -> Result<DeleteTemplate> {
    let api = state.api_for(&store);
    let mut page = DeleteTemplate {
        current_user: Some(admin),
        plazas: Vec::new(),
        selected: None,
        error: None,
    };

    match inline(api.list_plazas().await)? {
        Ok(plazas) => page.plazas = plazas,
        Err(message) => {
            page.error = Some(message);
            return Ok(page);
        }
    }

    if !selection.plaza_id.trim().is_empty() {
        match selection.plaza_id() {
            Ok(id) => page.selected = page.plazas.iter().find(|p| p.plaza_id == id).cloned(),
            Err(err) => page.error = Some(err.to_string()),
        }
        if page.selected.is_none() && page.error.is_none() {
            page.error = Some(FormError::NoPlazaSelected.to_string());
        }
    }

    Ok(page)
}

/// Delete the picked plaza, but only from the confirmation step.
pub async fn delete(
    State(state): State<AppState>,
    store: TowerSessionStore,
    RequireAdmin(admin): RequireAdmin,
    Form(form): Form<DeletePlazaForm>,
) -> Result<Response> {
    let api = state.api_for(&store);
    let selection = PlazaSelectionForm {
        plaza_id: form.plaza_id.clone(),
    };

    let id = match selection.plaza_id() {
        Ok(id) => id,
        Err(err) => {
            let plazas = inline(api.list_plazas().await)?.unwrap_or_default();
            return Ok(DeleteTemplate {
                current_user: Some(admin),
                plazas,
                selected: None,
                error: Some(err.to_string()),
            }
            .into_response());
        }
    };

    if !form.confirmed() {
        return Ok(Redirect::to(&confirmation_href(id)).into_response());
    }

    match inline(api.delete_plaza(id).await)? {
        Ok(_) => {
            tracing::info!(plaza_id = %id, admin = %admin.email, "Plaza deleted");
            add_breadcrumb("admin", "Deleted plaza", Some(&[("plaza_id", id.to_string().as_str())]));
            Ok(Redirect::to("/admin/plazas/list?ok=deleted").into_response())
        }
        Err(message) => {
            let plazas = inline(api.list_plazas().await)?.unwrap_or_default();
            let selected = plazas.iter().find(|p| p.plaza_id == id).cloned();
            Ok(DeleteTemplate {
                current_user: Some(admin),
                plazas,
                selected,
                error: Some(message),
            }
            .into_response())
        }
    }
}

fn confirmation_href(id: PlazaId) -> String {
    format!("/admin/plazas/delete?plaza_id={id}")
}
