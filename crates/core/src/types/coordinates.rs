//! Geographic coordinates for plaza records.

use serde::{Deserialize, Serialize};

/// Errors that can occur when building [`Coordinates`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    /// Latitude is not a number or lies outside [-90, 90].
    #[error("latitude must be a number between -90 and 90")]
    Latitude,
    /// Longitude is not a number or lies outside [-180, 180].
    #[error("longitude must be a number between -180 and 180")]
    Longitude,
}

/// A validated latitude/longitude pair.
///
/// ## Constraints
///
/// - Latitude in [-90, 90]
/// - Longitude in [-180, 180]
/// - Both finite
///
/// ```
/// use plaze_core::Coordinates;
///
/// assert!(Coordinates::new(6.25, -75.56).is_ok());
/// assert!(Coordinates::new(91.0, -75.56).is_err());
/// assert!(Coordinates::new(6.25, -181.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    lat: f64,
    lon: f64,
}

impl Coordinates {
    /// Smallest valid latitude.
    pub const MIN_LAT: f64 = -90.0;
    /// Largest valid latitude.
    pub const MAX_LAT: f64 = 90.0;
    /// Smallest valid longitude.
    pub const MIN_LON: f64 = -180.0;
    /// Largest valid longitude.
    pub const MAX_LON: f64 = 180.0;

    /// Validate and build a coordinate pair.
    ///
    /// # Errors
    ///
    /// Returns the first failing axis, latitude before longitude.
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !(Self::MIN_LAT..=Self::MAX_LAT).contains(&lat) {
            return Err(CoordinateError::Latitude);
        }
        if !lon.is_finite() || !(Self::MIN_LON..=Self::MAX_LON).contains(&lon) {
            return Err(CoordinateError::Longitude);
        }
        Ok(Self { lat, lon })
    }

    /// Parse a pair of form inputs.
    ///
    /// # Errors
    ///
    /// Returns an error when either value does not parse or is out of bounds.
    pub fn parse(lat: &str, lon: &str) -> Result<Self, CoordinateError> {
        let lat = lat
            .trim()
            .parse::<f64>()
            .map_err(|_| CoordinateError::Latitude)?;
        let lon = lon
            .trim()
            .parse::<f64>()
            .map_err(|_| CoordinateError::Longitude)?;
        Self::new(lat, lon)
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lon(&self) -> f64 {
        self.lon
    }
}
