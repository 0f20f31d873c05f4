//! Form input and validation.
//!
//! Every form is checked here before any backend call. A failed check
//! re-renders the form with the [`FormError`] message and issues nothing.

use plaze_core::{CoordinateError, Coordinates, Email, EmailError, PlazaId, PlazaStatus};
use serde::Deserialize;
use thiserror::Error;

use crate::api::{PlazaPayload, Plaza, Registration};

/// Minimum password length accepted at registration and reset.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Bounds for a custom month count.
pub const MONTHS_RANGE: std::ops::RangeInclusive<u32> = 1..=120;

/// A form value failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("Completa los campos obligatorios: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("La latitud debe ser un número entre -90 y 90")]
    Latitude,

    #[error("La longitud debe ser un número entre -180 y 180")]
    Longitude,

    #[error("El estado debe ser activa o inactiva")]
    Status,

    #[error("El número de comerciantes debe ser un entero no negativo")]
    MerchantCount,

    #[error("Correo electrónico inválido")]
    Email,

    #[error("El nombre es obligatorio")]
    Name,

    #[error("La contraseña debe tener al menos {MIN_PASSWORD_LEN} caracteres")]
    PasswordTooShort,

    #[error("Las contraseñas no coinciden")]
    PasswordMismatch,

    #[error("El número de meses debe estar entre 1 y 120")]
    Months,

    #[error("Selecciona una plaza")]
    NoPlazaSelected,
}

impl From<CoordinateError> for FormError {
    fn from(err: CoordinateError) -> Self {
        match err {
            CoordinateError::Latitude => Self::Latitude,
            CoordinateError::Longitude => Self::Longitude,
        }
    }
}

impl From<EmailError> for FormError {
    fn from(_: EmailError) -> Self {
        Self::Email
    }
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// =============================================================================
// Plaza forms
// =============================================================================

/// Admin create/edit form, as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlazaForm {
    pub nombre: String,
    pub direccion: String,
    pub ciudad: String,
    pub latitud: String,
    pub longitud: String,
    pub estado: String,
    pub horarios: String,
    pub numero_comerciantes: String,
    pub tipos_productos: String,
    pub datos_contacto: String,
}

impl PlazaForm {
    /// Prefill the edit form from a stored record.
    ///
    /// An unknown stored status stays blank so saving requires a choice.
    #[must_use]
    pub fn from_plaza(plaza: &Plaza) -> Self {
        Self {
            nombre: plaza.nombre.clone(),
            direccion: plaza.direccion.clone(),
            ciudad: plaza.ciudad.clone(),
            latitud: plaza
                .coordenadas
                .map(|c| c.lat().to_string())
                .unwrap_or_default(),
            longitud: plaza
                .coordenadas
                .map(|c| c.lon().to_string())
                .unwrap_or_default(),
            estado: plaza
                .estado
                .map(|e| e.as_str().to_string())
                .unwrap_or_default(),
            horarios: plaza.horarios.clone().unwrap_or_default(),
            numero_comerciantes: plaza
                .numero_comerciantes
                .map(|n| n.to_string())
                .unwrap_or_default(),
            tipos_productos: plaza.product_types(),
            datos_contacto: plaza.datos_contacto.clone().unwrap_or_default(),
        }
    }

    /// Validate into a request body.
    ///
    /// # Errors
    ///
    /// Checks, in order: required fields, latitude, longitude, status,
    /// merchant count. Returns the first failure.
    pub fn validate(&self) -> Result<PlazaPayload, FormError> {
        let required = [
            ("nombre", &self.nombre),
            ("direccion", &self.direccion),
            ("ciudad", &self.ciudad),
            ("latitud", &self.latitud),
            ("longitud", &self.longitud),
            ("estado", &self.estado),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(FormError::MissingFields(missing));
        }

        let coordinates = Coordinates::parse(&self.latitud, &self.longitud)?;
        let estado = self
            .estado
            .parse::<PlazaStatus>()
            .map_err(|_| FormError::Status)?;
        let numero_comerciantes = match optional(&self.numero_comerciantes) {
            Some(raw) => Some(raw.parse::<u32>().map_err(|_| FormError::MerchantCount)?),
            None => None,
        };

        Ok(PlazaPayload {
            nombre: self.nombre.trim().to_string(),
            direccion: self.direccion.trim().to_string(),
            ciudad: self.ciudad.trim().to_string(),
            coordenadas: coordinates.into(),
            estado,
            horarios: optional(&self.horarios),
            numero_comerciantes,
            tipos_productos: optional(&self.tipos_productos),
            datos_contacto: optional(&self.datos_contacto),
        })
    }
}

/// Plaza picker used by the edit and delete screens.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlazaSelectionForm {
    pub plaza_id: String,
}

impl PlazaSelectionForm {
    /// The selected plaza.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::NoPlazaSelected`] for a blank or non-numeric value.
    pub fn plaza_id(&self) -> Result<PlazaId, FormError> {
        self.plaza_id
            .parse::<PlazaId>()
            .map_err(|_| FormError::NoPlazaSelected)
    }
}

// =============================================================================
// Auth forms
// =============================================================================

/// Login form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// # Errors
    ///
    /// Returns an error for a malformed email or an empty password.
    pub fn validate(&self) -> Result<Email, FormError> {
        let email = Email::parse(&self.email)?;
        if self.password.is_empty() {
            return Err(FormError::MissingFields(vec!["password"]));
        }
        Ok(email)
    }
}

/// Registration form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    /// # Errors
    ///
    /// Checks name, email, password length, then confirmation.
    pub fn validate(&self) -> Result<Registration, FormError> {
        let name = optional(&self.name).ok_or(FormError::Name)?;
        let email = Email::parse(&self.email)?;
        check_new_password(&self.password, &self.confirm_password)?;
        Ok(Registration {
            name,
            email: email.into_inner(),
            password: self.password.clone(),
        })
    }
}

/// Password recovery request form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecoverPasswordForm {
    pub email: String,
}

impl RecoverPasswordForm {
    /// # Errors
    ///
    /// Returns [`FormError::Email`] for a malformed email.
    pub fn validate(&self) -> Result<Email, FormError> {
        Ok(Email::parse(&self.email)?)
    }
}

/// Password reset form; the token arrives from the emailed link.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResetPasswordForm {
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl ResetPasswordForm {
    /// # Errors
    ///
    /// Returns an error for a missing token or an unacceptable password.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.token.trim().is_empty() {
            return Err(FormError::MissingFields(vec!["token"]));
        }
        check_new_password(&self.new_password, &self.confirm_password)
    }
}

fn check_new_password(password: &str, confirmation: &str) -> Result<(), FormError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(FormError::PasswordTooShort);
    }
    if password != confirmation {
        return Err(FormError::PasswordMismatch);
    }
    Ok(())
}

// =============================================================================
// Query parameters
// =============================================================================

/// Parse a month count from a query string.
///
/// Blank or absent means `default`.
///
/// # Errors
///
/// Returns [`FormError::Months`] unless the value is an integer in 1..=120.
pub fn parse_months(raw: Option<&str>, default: u32) -> Result<u32, FormError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|m| MONTHS_RANGE.contains(m))
            .ok_or(FormError::Months),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn medellin() -> PlazaForm {
        PlazaForm {
            nombre: "Minorista".to_string(),
            direccion: "Cra. 57 #55-70".to_string(),
            ciudad: "Medellín".to_string(),
            latitud: "6.25".to_string(),
            longitud: "-75.56".to_string(),
            estado: "activa".to_string(),
            ..PlazaForm::default()
        }
    }

    #[test]
    fn test_plaza_form_accepts_medellin() {
        let payload = medellin().validate().unwrap();
        assert!((payload.coordenadas.lat - 6.25).abs() < f64::EPSILON);
        assert!((payload.coordenadas.lon + 75.56).abs() < f64::EPSILON);
        assert_eq!(payload.estado, PlazaStatus::Active);
        assert!(payload.horarios.is_none());
    }

    #[test]
    fn test_plaza_form_rejects_out_of_range_coordinates() {
        let form = PlazaForm {
            latitud: "91".to_string(),
            ..medellin()
        };
        assert_eq!(form.validate().unwrap_err(), FormError::Latitude);

        let form = PlazaForm {
            longitud: "-181".to_string(),
            ..medellin()
        };
        assert_eq!(form.validate().unwrap_err(), FormError::Longitude);

        let form = PlazaForm {
            latitud: "norte".to_string(),
            ..medellin()
        };
        assert_eq!(form.validate().unwrap_err(), FormError::Latitude);
    }

    #[test]
    fn test_plaza_form_lists_missing_fields() {
        let form = PlazaForm {
            direccion: " ".to_string(),
            estado: String::new(),
            ..medellin()
        };
        let err = form.validate().unwrap_err();
        assert_eq!(err, FormError::MissingFields(vec!["direccion", "estado"]));
        assert_eq!(
            err.to_string(),
            "Completa los campos obligatorios: direccion, estado"
        );
    }

    #[test]
    fn test_plaza_form_optional_fields() {
        let form = PlazaForm {
            numero_comerciantes: "-3".to_string(),
            ..medellin()
        };
        assert_eq!(form.validate().unwrap_err(), FormError::MerchantCount);

        let form = PlazaForm {
            numero_comerciantes: " 120 ".to_string(),
            tipos_productos: "Frutas, Verduras".to_string(),
            estado: "Inactiva".to_string(),
            ..medellin()
        };
        let payload = form.validate().unwrap();
        assert_eq!(payload.numero_comerciantes, Some(120));
        assert_eq!(payload.tipos_productos.as_deref(), Some("Frutas, Verduras"));
        assert_eq!(payload.estado, PlazaStatus::Inactive);

        let form = PlazaForm {
            estado: "cerrada".to_string(),
            ..medellin()
        };
        assert_eq!(form.validate().unwrap_err(), FormError::Status);
    }

    #[test]
    fn test_prefill_leaves_unknown_status_blank() {
        let stored: Plaza = serde_json::from_value(serde_json::json!({
            "plaza_id": 4,
            "nombre": "Minorista",
            "direccion": "Cra. 57 #55-70",
            "ciudad": "Medellín",
            "coordenadas": "(6.25, -75.56)",
            "estado": "en remodelación"
        }))
        .unwrap();

        let form = PlazaForm::from_plaza(&stored);
        assert!(form.estado.is_empty());
        assert_eq!(form.validate().unwrap_err(), FormError::MissingFields(vec!["estado"]));

        let inactive: Plaza = serde_json::from_value(serde_json::json!({
            "plaza_id": 5,
            "nombre": "La América",
            "estado": "inactiva"
        }))
        .unwrap();
        assert_eq!(PlazaForm::from_plaza(&inactive).estado, "inactiva");
    }

    #[test]
    fn test_plaza_selection_required() {
        let form = PlazaSelectionForm::default();
        assert_eq!(form.plaza_id().unwrap_err(), FormError::NoPlazaSelected);
        let form = PlazaSelectionForm {
            plaza_id: "12".to_string(),
        };
        assert_eq!(form.plaza_id().unwrap(), PlazaId::new(12));
    }

    #[test]
    fn test_register_form_checks() {
        let valid = RegisterForm {
            name: "Ana".to_string(),
            email: "ana@plaze.co".to_string(),
            password: "secreto123".to_string(),
            confirm_password: "secreto123".to_string(),
        };
        assert_eq!(valid.validate().unwrap().email, "ana@plaze.co");

        let form = RegisterForm {
            name: " ".to_string(),
            ..valid.clone()
        };
        assert_eq!(form.validate().unwrap_err(), FormError::Name);

        let form = RegisterForm {
            email: "ana".to_string(),
            ..valid.clone()
        };
        assert_eq!(form.validate().unwrap_err(), FormError::Email);

        let form = RegisterForm {
            password: "corta".to_string(),
            confirm_password: "corta".to_string(),
            ..valid.clone()
        };
        assert_eq!(form.validate().unwrap_err(), FormError::PasswordTooShort);

        let form = RegisterForm {
            confirm_password: "secreto124".to_string(),
            ..valid
        };
        assert_eq!(form.validate().unwrap_err(), FormError::PasswordMismatch);
    }

    #[test]
    fn test_reset_form_requires_token() {
        let form = ResetPasswordForm {
            token: String::new(),
            new_password: "secreto123".to_string(),
            confirm_password: "secreto123".to_string(),
        };
        assert!(matches!(form.validate(), Err(FormError::MissingFields(_))));
    }

    #[test]
    fn test_parse_months() {
        assert_eq!(parse_months(None, 12), Ok(12));
        assert_eq!(parse_months(Some(" "), 6), Ok(6));
        assert_eq!(parse_months(Some("24"), 12), Ok(24));
        assert_eq!(parse_months(Some("120"), 12), Ok(120));
        assert_eq!(parse_months(Some("0"), 12), Err(FormError::Months));
        assert_eq!(parse_months(Some("121"), 12), Err(FormError::Months));
        assert_eq!(parse_months(Some("doce"), 12), Err(FormError::Months));
    }
}
