//! Price per kilogram, in Colombian pesos.
//!
//! The backend reports prices as JSON numbers (`precio_por_kg`). They are
//! held as [`Decimal`] so display formatting never suffers float artefacts.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price per kilogram in COP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PricePerKg(Decimal);

impl PricePerKg {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The raw decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format for display with thousands separators, e.g. `$2.500/kg`.
    ///
    /// Colombian convention: `.` groups thousands and `,` separates cents.
    /// Cents are only shown when non-zero.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{self}/kg")
    }
}

impl fmt::Display for PricePerKg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.0.round_dp(2);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let abs = rounded.abs();
        let whole = abs.trunc();
        let cents = ((abs - whole) * Decimal::ONE_HUNDRED).trunc();

        let digits = whole.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }

        if negative {
            f.write_str("-")?;
        }
        write!(f, "${grouped}")?;
        if !cents.is_zero() {
            write!(f, ",{:0>2}", cents.to_string())?;
        }
        Ok(())
    }
}

impl From<Decimal> for PricePerKg {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}
