// ABOUTME: Builds the set of source adapters from credentials and compiled-in provider features
// ABOUTME: Providers without credentials are skipped with a log line rather than failing startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

use crate::config::ProviderCredentials;
use nutriscan_providers::{DatasetError, OfflineDatasetAdapter, SourceAdapter};
use std::sync::Arc;
use tracing::{debug, info};

/// Adapters for every provider that is compiled in and has credentials
///
/// Order follows the built-in provider priority. Open Food Facts needs no
/// key and is always included when its feature is enabled.
///
/// # Errors
///
/// Returns [`DatasetError`] if an offline dataset path is configured but
/// cannot be loaded.
pub async fn build_adapters(
    credentials: &ProviderCredentials,
) -> Result<Vec<Arc<dyn SourceAdapter>>, DatasetError> {
    let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::new();

    #[cfg(feature = "provider-nutritionix")]
    if let (Some(app_id), Some(app_key)) = (
        &credentials.nutritionix_app_id,
        &credentials.nutritionix_app_key,
    ) {
        adapters.push(Arc::new(nutriscan_providers::NutritionixAdapter::new(
            nutriscan_providers::NutritionixConfig::new(app_id, app_key),
        )));
    } else {
        skipped("nutritionix", "NUTRITIONIX_APP_ID/NUTRITIONIX_APP_KEY");
    }

    #[cfg(feature = "provider-usda")]
    if let Some(key) = &credentials.usda_api_key {
        adapters.push(Arc::new(nutriscan_providers::UsdaAdapter::new(
            nutriscan_providers::UsdaConfig::new(key),
        )));
    } else {
        skipped("usda", "USDA_API_KEY");
    }

    #[cfg(feature = "provider-edamam")]
    if let (Some(app_id), Some(app_key)) = (&credentials.edamam_app_id, &credentials.edamam_app_key)
    {
        adapters.push(Arc::new(nutriscan_providers::EdamamAdapter::new(
            nutriscan_providers::EdamamConfig::new(app_id, app_key),
        )));
    } else {
        skipped("edamam", "EDAMAM_APP_ID/EDAMAM_APP_KEY");
    }

    #[cfg(feature = "provider-spoonacular")]
    if let Some(key) = &credentials.spoonacular_api_key {
        adapters.push(Arc::new(nutriscan_providers::SpoonacularAdapter::new(
            nutriscan_providers::SpoonacularConfig::new(key),
        )));
    } else {
        skipped("spoonacular", "SPOONACULAR_API_KEY");
    }

    if let Some(path) = &credentials.offline_dataset {
        adapters.push(Arc::new(OfflineDatasetAdapter::load(path).await?));
    }

    #[cfg(feature = "provider-open-food-facts")]
    adapters.push(Arc::new(nutriscan_providers::OpenFoodFactsAdapter::default()));

    #[cfg(feature = "provider-barcode-lookup")]
    if let Some(key) = &credentials.barcode_lookup_api_key {
        adapters.push(Arc::new(nutriscan_providers::BarcodeLookupAdapter::new(
            nutriscan_providers::BarcodeLookupConfig::new(key),
        )));
    } else {
        skipped("barcode_lookup", "BARCODE_LOOKUP_API_KEY");
    }

    #[cfg(feature = "provider-upc-database")]
    if let Some(key) = &credentials.upc_database_api_key {
        adapters.push(Arc::new(nutriscan_providers::UpcDatabaseAdapter::new(
            nutriscan_providers::UpcDatabaseConfig::new(key),
        )));
    } else {
        skipped("upc_database", "UPC_DATABASE_API_KEY");
    }

    info!(
        adapters = adapters.len(),
        providers = %adapters
            .iter()
            .map(|adapter| adapter.provider_id().as_str())
            .collect::<Vec<_>>()
            .join(","),
        "Source adapters registered"
    );
    Ok(adapters)
}

#[allow(dead_code)] // unused when every keyed provider feature is disabled
fn skipped(provider: &str, variables: &str) {
    debug!(provider, variables, "Provider credentials not set, skipping");
}
