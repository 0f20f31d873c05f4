//! Core types for Plaze.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod coordinates;
pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use coordinates::{Coordinates, CoordinateError};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::PricePerKg;
pub use status::*;
