//! Email addresses entered on the account forms.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why an address was rejected.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailError {
    #[error("email is blank")]
    Blank,
    #[error("email must contain exactly one @")]
    Separator,
    #[error("email has nothing before the @")]
    MissingUser,
    /// The part after the @ is not a dotted host such as `plaze.co`.
    #[error("email domain must look like name.tld")]
    Domain,
    #[error("email has whitespace inside it")]
    Whitespace,
}

/// Address typed into login, registration or password recovery.
///
/// The backend owns the real check. This rejects what it would certainly
/// refuse so the form can answer without a round trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Trim and check `raw`.
    ///
    /// # Errors
    ///
    /// Returns the first [`EmailError`] that applies.
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(EmailError::Blank);
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let (user, host) = match raw.split_once('@') {
            Some((_, host)) if host.contains('@') => return Err(EmailError::Separator),
            Some(parts) => parts,
            None => return Err(EmailError::Separator),
        };
        if user.is_empty() {
            return Err(EmailError::MissingUser);
        }
        if !host.contains('.') || host.split('.').any(str::is_empty) {
            return Err(EmailError::Domain);
        }

        Ok(Self(raw.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
