//! `plaze history` and `plaze predict`.

use plaze_storefront::api::ApiError;
use plaze_storefront::forms::{FormError, MONTHS_RANGE};

use super::{Api, CliError, emit};

fn check_months(months: u32) -> Result<u32, FormError> {
    if MONTHS_RANGE.contains(&months) {
        Ok(months)
    } else {
        Err(FormError::Months)
    }
}

/// Print the price history of `product`.
///
/// # Errors
///
/// Returns an error for an out-of-range month count or a failed call.
pub async fn history(api: &Api<'_>, product: &str, months: u32) -> Result<(), CliError> {
    let months = check_months(months)?;
    let history = api.price_history(product, months).await?;
    tracing::info!(records = history.statistics.total_records, "History loaded");
    emit(&history)
}

/// Print the price forecast of `product`.
///
/// # Errors
///
/// Returns an error for an out-of-range month count or a failed call.
pub async fn predict(api: &Api<'_>, product: &str, months: u32) -> Result<(), CliError> {
    let months = check_months(months)?;
    let mut report = api.predictions(product, months).await?;
    // Chart paths are relative to the backend
    if let Some(path) = report.graph_url.take() {
        report.graph_url = Some(
            api.client()
                .base_url()
                .join(&path)
                .map_err(ApiError::from)?
                .to_string(),
        );
    }
    emit(&report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_months_bounds() {
        assert_eq!(check_months(1), Ok(1));
        assert_eq!(check_months(120), Ok(120));
        assert_eq!(check_months(0), Err(FormError::Months));
        assert_eq!(check_months(121), Err(FormError::Months));
    }
}
