//! Session gate extractors.
//!
//! The gate is re-derived from the session on every request; nothing is
//! cached between requests.
//!
//! | Extractor | No session | Standard user | Admin |
//! |---|---|---|---|
//! | [`RequireAdmin`] | redirect `/login` | redirect `/home` | passes |
//! | [`OptionalUser`] | `None` | `Some` | `Some` |

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::session::{SessionStore, TowerSessionStore, UserSession};

/// Error returned when the gate rejects a request.
#[derive(Debug)]
pub enum AuthRejection {
    /// No session: go log in.
    RedirectToLogin,
    /// Logged in without the required role.
    RedirectToHome,
    /// The session layer is missing or failing.
    SessionUnavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::RedirectToHome => Redirect::to("/home").into_response(),
            Self::SessionUnavailable => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Sesión no disponible").into_response()
            }
        }
    }
}

impl<S> FromRequestParts<S> for TowerSessionStore
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(Self::new)
            .ok_or(AuthRejection::SessionUnavailable)
    }
}

async fn current_user(parts: &mut Parts) -> Result<Option<UserSession>, AuthRejection> {
    let Some(session) = parts.extensions.get::<Session>().cloned() else {
        return Ok(None);
    };
    TowerSessionStore::new(session).load().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to load session");
        AuthRejection::SessionUnavailable
    })
}

/// Extractor that requires an admin session.
///
/// # Example
///
/// ```rust,ignore
/// async fn admin_menu(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hola, {}", admin.display_name())
/// }
/// ```
pub struct RequireAdmin(pub UserSession);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)
            .await?
            .ok_or(AuthRejection::RedirectToLogin)?;
        if !user.is_admin() {
            tracing::info!(user_email = %user.email, path = %parts.uri.path(), "Non-admin denied");
            return Err(AuthRejection::RedirectToHome);
        }
        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Never rejects; a broken session reads as logged out.
pub struct OptionalUser(pub Option<UserSession>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await.ok().flatten()))
    }
}
