// ABOUTME: UPC Database adapter; barcode-only product lookup with optional nutrition block
// ABOUTME: Lowest-trust source, values per labelled serving
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

use crate::adapter::SourceAdapter;
use crate::errors::{AdapterError, AdapterResult};
use crate::http_client::{get_json, shared_client};
use crate::normalize::{non_blank, number, parse_quantity, to_grams};
use async_trait::async_trait;
use nutriscan_core::constants::providers;
use nutriscan_core::{IdentifierKind, NutritionQuery, ProviderId, RawNutritionRecord};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.upcdatabase.org";

/// UPC Database key and endpoint
#[derive(Debug, Clone)]
pub struct UpcDatabaseConfig {
    /// Bearer token
    pub api_key: String,
    /// API root, overridable for tests
    pub base_url: String,
}

impl UpcDatabaseConfig {
    /// Config against the public API
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpcProduct {
    #[serde(default)]
    success: bool,
    title: Option<String>,
    brand: Option<String>,
    nutrition: Option<UpcNutrition>,
}

/// Nutrition block; the service stores whatever was entered, so every field is loose
#[derive(Debug, Deserialize)]
struct UpcNutrition {
    serving_size: Option<Value>,
    #[serde(default)]
    calories: Value,
    #[serde(default)]
    protein: Value,
    #[serde(default)]
    carbohydrates: Value,
    #[serde(default)]
    fat: Value,
    #[serde(default)]
    fiber: Value,
    #[serde(default)]
    sugar: Value,
}

impl UpcNutrition {
    fn serving_grams(&self) -> Option<f64> {
        match self.serving_size.as_ref()? {
            Value::String(text) => {
                let (amount, unit) = parse_quantity(text)?;
                to_grams(amount, if unit.is_empty() { "g" } else { &unit })
            }
            other => number(other),
        }
    }
}

/// UPC Database adapter
#[derive(Debug, Clone)]
pub struct UpcDatabaseAdapter {
    id: ProviderId,
    config: UpcDatabaseConfig,
}

impl UpcDatabaseAdapter {
    /// Create the adapter
    #[must_use]
    pub fn new(config: UpcDatabaseConfig) -> Self {
        Self {
            id: ProviderId::from(providers::UPC_DATABASE),
            config,
        }
    }
}

/// Map a raw UPC Database body to a record for `query`
///
/// # Errors
///
/// `Malformed` for unparseable JSON or a nutrition block without serving
/// size, `NotFound` for unsuccessful lookups or products without nutrition.
pub fn parse_response(body: &str, query: &NutritionQuery) -> AdapterResult<RawNutritionRecord> {
    let product: UpcProduct = serde_json::from_str(body)
        .map_err(|e| AdapterError::malformed(providers::UPC_DATABASE, e.to_string()))?;
    map_product(product, query)
}

fn map_product(product: UpcProduct, query: &NutritionQuery) -> AdapterResult<RawNutritionRecord> {
    let nutrition = product
        .nutrition
        .filter(|_| product.success)
        .ok_or_else(|| {
            AdapterError::not_found(providers::UPC_DATABASE, format!("no nutrition for {query}"))
        })?;
    let serving_grams = nutrition
        .serving_grams()
        .filter(|g| *g > 0.0)
        .ok_or_else(|| AdapterError::malformed(providers::UPC_DATABASE, "serving size missing"))?;

    let name = non_blank(product.title.as_deref()).unwrap_or_else(|| query.identifier.clone());
    let record = RawNutritionRecord {
        serving_grams,
        calories: number(&nutrition.calories).unwrap_or(0.0),
        protein_g: number(&nutrition.protein).unwrap_or(0.0),
        carbs_g: number(&nutrition.carbohydrates).unwrap_or(0.0),
        fat_g: number(&nutrition.fat).unwrap_or(0.0),
        fiber_g: number(&nutrition.fiber).unwrap_or(0.0),
        sugar_g: number(&nutrition.sugar).unwrap_or(0.0),
        ..RawNutritionRecord::new(providers::UPC_DATABASE, name)
    }
    .with_brand(non_blank(product.brand.as_deref()));

    Ok(record)
}

#[async_trait]
impl SourceAdapter for UpcDatabaseAdapter {
    fn provider_id(&self) -> &ProviderId {
        &self.id
    }

    fn supports(&self, kind: IdentifierKind) -> bool {
        kind == IdentifierKind::Barcode
    }

    async fn fetch(
        &self,
        query: &NutritionQuery,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> AdapterResult<RawNutritionRecord> {
        if !query.is_barcode() {
            return Err(AdapterError::not_found(self.id.clone(), "name lookups are not supported"));
        }
        let request = shared_client()
            .get(format!("{}/product/{}", self.config.base_url, query.identifier))
            .bearer_auth(&self.config.api_key);

        let product: UpcProduct = get_json(&self.id, request, timeout, cancel).await?;
        map_product(product, query)
    }
}
