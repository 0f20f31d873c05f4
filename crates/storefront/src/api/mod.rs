//! Plaze REST API client.
//!
//! # Architecture
//!
//! - Plain JSON over `reqwest`; the backend is the source of truth for
//!   prices, history, predictions, plaza records, and authentication
//! - NO caching and NO retries: every call is fired once
//! - Fixed 10 second timeout per request
//! - The bearer token is read from the [`SessionStore`](crate::session::SessionStore)
//!   right before each request; a 401 from any endpoint clears the store
//!   and surfaces as [`ApiError::Unauthorized`]
//!
//! # Example
//!
//! ```rust,ignore
//! use plaze_storefront::api::PlazeClient;
//!
//! let client = PlazeClient::new(&config.api)?;
//! let api = client.with_session(&store);
//!
//! let options = api.options().await?;
//! let quote = api.latest_price("Tomate chonto", "Minorista").await?;
//! ```

mod client;
pub mod types;

pub use client::{ApiSession, PlazeClient, REQUEST_TIMEOUT};
pub use types::*;

use reqwest::StatusCode;
use thiserror::Error;

use crate::session::SessionError;

/// Errors that can occur when talking to the Plaze backend.
///
/// The `Display` text is what the views show to the user.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received.
    #[error("No se pudo conectar al servidor")]
    Connect(#[source] reqwest::Error),

    /// The request exceeded the fixed timeout.
    #[error("El servidor no respondió en {0} segundos")]
    Timeout(u64),

    /// The backend rejected the bearer token. The session has already been cleared.
    #[error("Tu sesión expiró, inicia sesión nuevamente")]
    Unauthorized,

    /// 404 from the price history endpoint.
    #[error("Este producto no tiene datos históricos registrados en la base de datos")]
    NoHistory,

    /// 404 from the predictions endpoint.
    #[error("No hay suficientes datos históricos para generar predicciones de este producto")]
    InsufficientData,

    /// The prediction service answered with an error status in the body.
    #[error("Error al obtener predicciones: {0}")]
    PredictionFailed(String),

    /// Any other non-success status. `detail` is the backend's own message
    /// when it sent one, otherwise the status text.
    #[error("{detail}")]
    Backend {
        /// HTTP status returned by the backend.
        status: StatusCode,
        /// Backend-supplied detail, verbatim.
        detail: String,
    },

    /// The response body did not match the expected shape.
    #[error("Respuesta inesperada del servidor: {0}")]
    Decode(#[from] serde_json::Error),

    /// A request URL could not be built.
    #[error("URL inválida: {0}")]
    Url(#[from] url::ParseError),

    /// The HTTP client itself failed (builder or protocol error).
    #[error("Error HTTP: {0}")]
    Http(#[source] reqwest::Error),

    /// Reading or clearing the session failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    /// Classify a transport-level `reqwest` failure.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(REQUEST_TIMEOUT.as_secs())
        } else if err.is_connect() || err.is_request() {
            Self::Connect(err)
        } else {
            Self::Http(err)
        }
    }

    /// HTTP status of a backend rejection, if this error carries one.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            Self::NoHistory | Self::InsufficientData => Some(StatusCode::NOT_FOUND),
            Self::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the request never produced a response.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Timeout(_))
    }
}

/// Extract a human-readable message from an error body.
///
/// Accepts the shapes the backend produces:
/// - `{"detail": "text"}`
/// - `{"detail": {"message": "text", ...}}`
/// - `{"message": "text"}` / `{"mensaje": "text"}`
///
/// Falls back to the canonical status text.
pub(crate) fn extract_detail(status: StatusCode, body: &str) -> String {
    let from_body = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            let detail = value.get("detail");
            detail
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
                .or_else(|| {
                    detail
                        .and_then(|d| d.get("message"))
                        .and_then(serde_json::Value::as_str)
                        .map(str::to_string)
                })
                .or_else(|| {
                    value
                        .get("message")
                        .or_else(|| value.get("mensaje"))
                        .and_then(serde_json::Value::as_str)
                        .map(str::to_string)
                })
        })
        .filter(|s| !s.trim().is_empty());

    from_body.unwrap_or_else(|| {
        status
            .canonical_reason()
            .map_or_else(|| format!("HTTP {}", status.as_u16()), str::to_string)
    })
}
