//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                               - Landing page
//! GET  /home                           - Search form + active plaza filter
//! GET  /health                         - Health check
//!
//! # Prices
//! GET  /products?q=&plaza=             - Product catalog
//! GET  /product/{name}?plaza=          - Product detail (resolution outcome)
//! GET  /product/{name}/history?months= - Price history
//! GET  /product/{name}/predictions?months= - Price forecast
//! GET  /prices?product=&plaza=         - Current prices in the default city
//!
//! # Plazas
//! GET  /plazas?q=                      - Plaza directory
//! GET  /plaza/{name}                   - Plaza detail
//!
//! # Auth
//! GET  /login                          - Login page
//! POST /login                          - Login action
//! GET  /register                       - Register page
//! POST /register                       - Register action
//! GET  /register-confirmation          - Registration done
//! GET  /password-recovery              - Recovery page
//! POST /password-recovery              - Send recovery email
//! GET  /reset-password?token=          - Reset page
//! POST /reset-password                 - Reset action
//! POST /logout                         - Logout action
//!
//! # Admin (requires admin role)
//! GET  /admin/plazas                   - Admin menu
//! GET  /admin/plazas/list              - Plaza records
//! GET  /admin/plazas/create            - Create form
//! POST /admin/plazas/create            - Create action
//! GET  /admin/plazas/edit?plaza_id=    - Pick + edit form
//! POST /admin/plazas/edit              - Update action
//! GET  /admin/plazas/delete?plaza_id=  - Pick + confirmation
//! POST /admin/plazas/delete            - Delete action (confirmed only)
//! ```

pub mod admin;
pub mod auth;
pub mod pages;
pub mod plazas;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::api::ApiError;
use crate::error::AppError;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the public page routes router.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::landing))
        .route("/home", get(pages::home))
        .route("/health", get(pages::health))
}

/// Create the price routes router.
pub fn price_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/product/{name}", get(products::show))
        .route("/product/{name}/history", get(products::history))
        .route("/product/{name}/predictions", get(products::predictions))
        .route("/prices", get(products::current_prices))
}

/// Create the plaza directory routes router.
pub fn plaza_routes() -> Router<AppState> {
    Router::new()
        .route("/plazas", get(plazas::index))
        .route("/plaza/{name}", get(plazas::show))
}

/// Create the auth routes router.
///
/// Credential-carrying POSTs are rate limited per client IP.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/password-recovery", post(auth::recover_password))
        .route("/reset-password", post(auth::reset_password))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/register-confirmation", get(auth::register_confirmation))
        .route("/password-recovery", get(auth::recover_password_page))
        .route("/reset-password", get(auth::reset_password_page))
        .route("/logout", post(auth::logout))
        .merge(limited)
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::menu))
        .route("/list", get(admin::list))
        .route("/create", get(admin::create_page).post(admin::create))
        .route("/edit", get(admin::edit_page).post(admin::update))
        .route("/delete", get(admin::delete_page).post(admin::delete))
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(page_routes())
        .merge(price_routes())
        .merge(plaza_routes())
        .merge(auth_routes())
        .nest("/admin/plazas", admin_routes())
}

/// Split a backend result for inline display.
///
/// A 401 becomes the outer error so the response redirects to `/login`;
/// any other failure becomes the message the page shows.
pub(crate) fn inline<T>(result: Result<T, ApiError>) -> Result<Result<T, String>, AppError> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(ApiError::Unauthorized) => Err(AppError::Api(ApiError::Unauthorized)),
        Err(err) => {
            if err.is_unreachable() || err.status().is_none_or(|s| s.is_server_error()) {
                tracing::warn!(error = %err, "Backend call failed");
            }
            Ok(Err(err.to_string()))
        }
    }
}
