//! Status enums for plazas and users.

use serde::{Deserialize, Serialize};

/// Operating status of a market plaza.
///
/// The backend stores the Spanish values `activa` / `inactiva`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlazaStatus {
    #[default]
    #[serde(rename = "activa", alias = "active", alias = "Activa")]
    Active,
    #[serde(rename = "inactiva", alias = "inactive", alias = "Inactiva")]
    Inactive,
}

impl PlazaStatus {
    /// Wire value understood by the backend.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "activa",
            Self::Inactive => "inactiva",
        }
    }

    /// Human-readable label for templates.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Active => "Activa",
            Self::Inactive => "Inactiva",
        }
    }

    /// Whether the plaza currently operates.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for PlazaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlazaStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "activa" | "active" => Ok(Self::Active),
            "inactiva" | "inactive" => Ok(Self::Inactive),
            _ => Err(format!("invalid plaza status: {s}")),
        }
    }
}

/// Role attached to an authenticated session.
///
/// The backend returns `admin` for administrators; any other value is a
/// standard user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Can manage plaza records.
    Admin,
    /// Can browse prices only.
    #[default]
    #[serde(rename = "user")]
    Standard,
}

impl UserRole {
    /// Parse a backend role string. Unknown values map to [`UserRole::Standard`].
    #[must_use]
    pub fn from_backend(role: &str) -> Self {
        if role.trim().eq_ignore_ascii_case("admin") {
            Self::Admin
        } else {
            Self::Standard
        }
    }

    /// Whether this role may use the admin panel.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Standard => write!(f, "user"),
        }
    }
}
