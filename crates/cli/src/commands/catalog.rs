//! `plaze plazas` and `plaze products`.

use plaze_storefront::api::ProductEntry;

use super::{Api, CliError, emit};

/// Print all plazas, or only the operating ones.
///
/// # Errors
///
/// Returns an error if the backend call fails.
pub async fn plazas(api: &Api<'_>, active_only: bool) -> Result<(), CliError> {
    if active_only {
        emit(&api.active_plazas().await?)
    } else {
        emit(&api.list_plazas().await?)
    }
}

/// Print catalog products whose name contains `filter`.
///
/// # Errors
///
/// Returns an error if the backend call fails.
pub async fn products(api: &Api<'_>, filter: Option<&str>) -> Result<(), CliError> {
    let filter = filter.unwrap_or_default();
    let products: Vec<ProductEntry> = api
        .all_products()
        .await?
        .into_iter()
        .filter(|p| p.matches(filter))
        .collect();
    tracing::info!(count = products.len(), "Products listed");
    emit(&products)
}
