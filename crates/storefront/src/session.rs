//! Session storage for the authenticated user.
//!
//! A session is exactly four string fields, written together on login and
//! removed together on logout or on any 401 from the backend:
//!
//! | Key | Value |
//! |---|---|
//! | `access_token` | Bearer token for the Plaze API |
//! | `user_email` | Email the user logged in with |
//! | `user_name` | Display name |
//! | `user_role` | `admin` or anything else |
//!
//! [`SessionStore`] is the only way the rest of the crate touches them.
//! Every change updates the Sentry user scope and emits a tracing event.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use plaze_core::UserRole;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::sync::watch;

use crate::error::{clear_sentry_user, set_sentry_user};

/// Session keys for authentication data.
pub mod keys {
    /// Bearer token.
    pub const ACCESS_TOKEN: &str = "access_token";
    /// Email of the logged-in user.
    pub const USER_EMAIL: &str = "user_email";
    /// Display name of the logged-in user.
    pub const USER_NAME: &str = "user_name";
    /// Backend role string.
    pub const USER_ROLE: &str = "user_role";

    /// All four keys, in write order.
    pub const ALL: [&str; 4] = [ACCESS_TOKEN, USER_EMAIL, USER_NAME, USER_ROLE];
}

/// Errors from the underlying session storage.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The storage backend failed.
    #[error("session storage error: {0}")]
    Storage(String),
}

impl From<tower_sessions::session::Error> for SessionError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

// =============================================================================
// UserSession
// =============================================================================

/// The logged-in user, as held in the session.
#[derive(Clone)]
pub struct UserSession {
    /// Email the user logged in with.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role reported by the backend at login.
    pub role: UserRole,
    access_token: SecretString,
}

impl UserSession {
    /// Build a session from login data.
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        name: impl Into<String>,
        role: UserRole,
        access_token: SecretString,
    ) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            role,
            access_token,
        }
    }

    /// Bearer token for API calls.
    #[must_use]
    pub const fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    /// Whether the user may use the admin panel.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Name to greet the user with; falls back to the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }

    fn from_fields(fields: &HashMap<&'static str, String>) -> Option<Self> {
        let token = fields
            .get(keys::ACCESS_TOKEN)
            .filter(|t| !t.is_empty())?;
        Some(Self {
            email: fields.get(keys::USER_EMAIL).cloned().unwrap_or_default(),
            name: fields.get(keys::USER_NAME).cloned().unwrap_or_default(),
            role: fields
                .get(keys::USER_ROLE)
                .map_or(UserRole::Standard, |r| UserRole::from_backend(r)),
            access_token: SecretString::from(token.clone()),
        })
    }

    fn to_fields(&self) -> [(&'static str, String); 4] {
        [
            (keys::ACCESS_TOKEN, self.access_token.expose_secret().to_string()),
            (keys::USER_EMAIL, self.email.clone()),
            (keys::USER_NAME, self.name.clone()),
            (keys::USER_ROLE, self.role.to_string()),
        ]
    }
}

impl std::fmt::Debug for UserSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSession")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

// =============================================================================
// SessionStore
// =============================================================================

/// Read/write contract for the four session fields.
pub trait SessionStore: Send + Sync {
    /// The current session, or `None` when no token is stored.
    fn load(&self) -> impl Future<Output = Result<Option<UserSession>, SessionError>> + Send;

    /// Write all four fields.
    fn save(&self, session: &UserSession) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Remove all four fields.
    fn clear(&self) -> impl Future<Output = Result<(), SessionError>> + Send;
}

fn record_saved(session: &UserSession) {
    set_sentry_user(&session.email, Some(&session.email));
    tracing::info!(
        user_email = %session.email,
        user_role = %session.role,
        "Session started"
    );
}

fn record_cleared() {
    clear_sentry_user();
    tracing::info!("Session cleared");
}

/// Session fields stored in the request's `tower_sessions::Session`.
#[derive(Clone)]
pub struct TowerSessionStore {
    session: tower_sessions::Session,
}

impl TowerSessionStore {
    /// Wrap the session extracted from the request.
    #[must_use]
    pub const fn new(session: tower_sessions::Session) -> Self {
        Self { session }
    }
}

impl SessionStore for TowerSessionStore {
    async fn load(&self) -> Result<Option<UserSession>, SessionError> {
        let mut fields = HashMap::with_capacity(keys::ALL.len());
        for key in keys::ALL {
            if let Some(value) = self.session.get::<String>(key).await? {
                fields.insert(key, value);
            }
        }
        Ok(UserSession::from_fields(&fields))
    }

    async fn save(&self, session: &UserSession) -> Result<(), SessionError> {
        // New identity, new session ID
        self.session.cycle_id().await?;
        for (key, value) in session.to_fields() {
            self.session.insert(key, value).await?;
        }
        record_saved(session);
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        for key in keys::ALL {
            self.session.remove::<String>(key).await?;
        }
        record_cleared();
        Ok(())
    }
}

/// In-process session fields with change notification.
///
/// Used by the CLI and tests. [`subscribe`](Self::subscribe) yields the
/// current session after every `save` / `clear`.
#[derive(Clone)]
pub struct MemorySessionStore {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    fields: Mutex<HashMap<&'static str, String>>,
    changes: watch::Sender<Option<UserSession>>,
}

impl MemorySessionStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            inner: Arc::new(MemoryInner {
                fields: Mutex::new(HashMap::new()),
                changes,
            }),
        }
    }

    /// Watch session changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<UserSession>> {
        self.inner.changes.subscribe()
    }

    /// Raw value of one key.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner
            .fields
            .lock()
            .ok()
            .and_then(|fields| fields.get(key).cloned())
    }

    fn with_fields<T>(
        &self,
        f: impl FnOnce(&mut HashMap<&'static str, String>) -> T,
    ) -> Result<T, SessionError> {
        let mut fields = self
            .inner
            .fields
            .lock()
            .map_err(|_| SessionError::Storage("session lock poisoned".to_string()))?;
        Ok(f(&mut fields))
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<UserSession>, SessionError> {
        self.with_fields(|fields| UserSession::from_fields(fields))
    }

    async fn save(&self, session: &UserSession) -> Result<(), SessionError> {
        self.with_fields(|fields| {
            for (key, value) in session.to_fields() {
                fields.insert(key, value);
            }
        })?;
        record_saved(session);
        self.inner.changes.send_replace(Some(session.clone()));
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        self.with_fields(|fields| {
            for key in keys::ALL {
                fields.remove(key);
            }
        })?;
        record_cleared();
        self.inner.changes.send_replace(None);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn admin() -> UserSession {
        UserSession::new(
            "ana@plaze.co",
            "Ana",
            UserRole::Admin,
            SecretString::from("tok-123"),
        )
    }

    #[tokio::test]
    async fn test_memory_store_writes_all_four_keys() {
        let store = MemorySessionStore::new();
        store.save(&admin()).await.unwrap();

        assert_eq!(store.raw(keys::ACCESS_TOKEN).as_deref(), Some("tok-123"));
        assert_eq!(store.raw(keys::USER_EMAIL).as_deref(), Some("ana@plaze.co"));
        assert_eq!(store.raw(keys::USER_NAME).as_deref(), Some("Ana"));
        assert_eq!(store.raw(keys::USER_ROLE).as_deref(), Some("admin"));

        let loaded = store.load().await.unwrap().unwrap();
        assert!(loaded.is_admin());
        assert_eq!(loaded.access_token().expose_secret(), "tok-123");
    }

    #[tokio::test]
    async fn test_memory_store_clear_removes_all_keys() {
        let store = MemorySessionStore::new();
        store.save(&admin()).await.unwrap();
        store.clear().await.unwrap();

        for key in keys::ALL {
            assert!(store.raw(key).is_none(), "{key} should be cleared");
        }
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_notifies_subscribers() {
        let store = MemorySessionStore::new();
        let mut changes = store.subscribe();

        store.save(&admin()).await.unwrap();
        changes.changed().await.unwrap();
        assert!(changes.borrow_and_update().is_some());

        store.clear().await.unwrap();
        changes.changed().await.unwrap();
        assert!(changes.borrow_and_update().is_none());
    }

    #[test]
    fn test_missing_token_means_no_session() {
        let mut fields = HashMap::new();
        fields.insert(keys::USER_EMAIL, "ana@plaze.co".to_string());
        assert!(UserSession::from_fields(&fields).is_none());

        fields.insert(keys::ACCESS_TOKEN, "t".to_string());
        let session = UserSession::from_fields(&fields).unwrap();
        assert_eq!(session.role, UserRole::Standard);
        assert_eq!(session.display_name(), "ana@plaze.co");
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", admin());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("tok-123"));
    }
}
