//! Authentication route handlers.
//!
//! Login, registration, password recovery and reset all go through the
//! backend; the storefront only validates the forms and keeps the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::forms::{LoginForm, RecoverPasswordForm, RegisterForm, ResetPasswordForm};
use crate::middleware::OptionalUser;
use crate::session::{TowerSessionStore, UserSession};
use crate::state::AppState;

// =============================================================================
// Query Types
// =============================================================================

/// Notice codes carried across redirects.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

/// Email shown on the registration confirmation page.
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmationQuery {
    pub email: Option<String>,
}

/// Token from the emailed reset link.
#[derive(Debug, Default, Deserialize)]
pub struct ResetQuery {
    pub token: Option<String>,
}

/// Map a notice code to its message.
fn notice_message(code: Option<&str>) -> Option<&'static str> {
    match code? {
        "reset" => Some("Tu contraseña fue actualizada. Inicia sesión con la nueva."),
        _ => None,
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub current_user: Option<UserSession>,
    pub email: String,
    pub notice: Option<&'static str>,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub current_user: Option<UserSession>,
    pub name: String,
    pub email: String,
    pub error: Option<String>,
}

/// Registration confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register_confirmation.html")]
pub struct RegisterConfirmationTemplate {
    pub current_user: Option<UserSession>,
    pub email: Option<String>,
}

/// Password recovery template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/password_recovery.html")]
pub struct RecoverPasswordTemplate {
    pub current_user: Option<UserSession>,
    pub email: String,
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Password reset template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub current_user: Option<UserSession>,
    pub token: String,
    pub error: Option<String>,
}

// =============================================================================
// Login
// =============================================================================

/// Display the login page.
pub async fn login_page(
    Query(query): Query<NoticeQuery>,
    OptionalUser(current_user): OptionalUser,
) -> LoginTemplate {
    LoginTemplate {
        current_user,
        email: String::new(),
        notice: notice_message(query.notice.as_deref()),
        error: None,
    }
}

/// Handle login form submission.
///
/// Admins land on the plaza panel, everyone else on the search page.
pub async fn login(
    State(state): State<AppState>,
    store: TowerSessionStore,
    Form(form): Form<LoginForm>,
) -> Response {
    let page = |error: String| LoginTemplate {
        current_user: None,
        email: form.email.clone(),
        notice: None,
        error: Some(error),
    };

    let email = match form.validate() {
        Ok(email) => email,
        Err(err) => return page(err.to_string()).into_response(),
    };

    match state.api_for(&store).login(email.as_str(), &form.password).await {
        Ok(user) => {
            add_breadcrumb("auth", "Logged in", Some(&[("role", user.role.to_string().as_str())]));
            let target = if user.is_admin() { "/admin/plazas" } else { "/home" };
            Redirect::to(target).into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, "Login failed");
            page(err.to_string()).into_response()
        }
    }
}

/// Handle logout. The session is cleared even if the backend call fails.
pub async fn logout(State(state): State<AppState>, store: TowerSessionStore) -> Result<Redirect> {
    state.api_for(&store).logout().await?;
    Ok(Redirect::to("/"))
}

// =============================================================================
// Registration
// =============================================================================

/// Display the registration page.
pub async fn register_page(OptionalUser(current_user): OptionalUser) -> RegisterTemplate {
    RegisterTemplate {
        current_user,
        name: String::new(),
        email: String::new(),
        error: None,
    }
}

/// Handle registration form submission.
pub async fn register(
    State(state): State<AppState>,
    store: TowerSessionStore,
    Form(form): Form<RegisterForm>,
) -> Response {
    let page = |error: String| RegisterTemplate {
        current_user: None,
        name: form.name.clone(),
        email: form.email.clone(),
        error: Some(error),
    };

    let registration = match form.validate() {
        Ok(registration) => registration,
        Err(err) => return page(err.to_string()).into_response(),
    };

    match state.api_for(&store).register(&registration).await {
        Ok(_) => {
            let target = format!(
                "/register-confirmation?email={}",
                urlencoding::encode(&registration.email)
            );
            Redirect::to(&target).into_response()
        }
        Err(err) => {
            tracing::info!(error = %err, "Registration rejected");
            page(err.to_string()).into_response()
        }
    }
}

/// Display the registration confirmation page.
pub async fn register_confirmation(
    Query(query): Query<ConfirmationQuery>,
    OptionalUser(current_user): OptionalUser,
) -> RegisterConfirmationTemplate {
    RegisterConfirmationTemplate {
        current_user,
        email: query.email.filter(|e| !e.trim().is_empty()),
    }
}

// =============================================================================
// Password Recovery
// =============================================================================

/// Display the password recovery page.
pub async fn recover_password_page(
    OptionalUser(current_user): OptionalUser,
) -> RecoverPasswordTemplate {
    RecoverPasswordTemplate {
        current_user,
        email: String::new(),
        success: None,
        error: None,
    }
}

/// Ask the backend to email a reset link.
pub async fn recover_password(
    State(state): State<AppState>,
    store: TowerSessionStore,
    OptionalUser(current_user): OptionalUser,
    Form(form): Form<RecoverPasswordForm>,
) -> RecoverPasswordTemplate {
    let mut page = RecoverPasswordTemplate {
        current_user,
        email: form.email.clone(),
        success: None,
        error: None,
    };

    match form.validate() {
        Ok(email) => match state.api_for(&store).recover_password(email.as_str()).await {
            Ok(reply) => {
                page.success = Some(
                    reply
                        .or("Si el correo está registrado, recibirás un enlace para restablecer tu contraseña")
                        .to_string(),
                );
            }
            Err(err) => page.error = Some(err.to_string()),
        },
        Err(err) => page.error = Some(err.to_string()),
    }

    page
}

/// Display the password reset page.
pub async fn reset_password_page(
    Query(query): Query<ResetQuery>,
    OptionalUser(current_user): OptionalUser,
) -> ResetPasswordTemplate {
    let token = query.token.unwrap_or_default();
    let error = token
        .trim()
        .is_empty()
        .then(|| "El enlace de recuperación no es válido".to_string());

    ResetPasswordTemplate {
        current_user,
        token,
        error,
    }
}

/// Set a new password using the emailed token.
pub async fn reset_password(
    State(state): State<AppState>,
    store: TowerSessionStore,
    Form(form): Form<ResetPasswordForm>,
) -> Response {
    let page = |error: String| ResetPasswordTemplate {
        current_user: None,
        token: form.token.clone(),
        error: Some(error),
    };

    if let Err(err) = form.validate() {
        return page(err.to_string()).into_response();
    }

    match state
        .api_for(&store)
        .reset_password(&form.token, &form.new_password)
        .await
    {
        Ok(_) => Redirect::to("/login?notice=reset").into_response(),
        Err(err) => page(err.to_string()).into_response(),
    }
}
