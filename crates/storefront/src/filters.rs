//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use plaze_core::PricePerKg;
use rust_decimal::Decimal;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a number as Colombian pesos, e.g. `2500.5` as `$2.500,50`.
///
/// Usage in templates: `{{ stats.average_price|cop }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn cop(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_cop(&value.to_string()))
}

/// Formats a signed percentage with two decimals, e.g. `+4.25%`.
///
/// Usage in templates: `{{ stats.percent_variation|percent }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn percent(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    Ok(raw.parse::<f64>().map_or(raw, |v| format!("{v:+.2}%")))
}

/// Shared by the `cop` filter and views that format outside templates.
#[must_use]
pub fn format_cop(raw: &str) -> String {
    raw.trim()
        .parse::<Decimal>()
        .map_or_else(|_| raw.to_string(), |d| PricePerKg::new(d).to_string())
}
