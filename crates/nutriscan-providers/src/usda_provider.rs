// ABOUTME: USDA FoodData Central adapter using the foods search endpoint for GTINs and names
// ABOUTME: Extracts energy and macros by nutrient id from per-100 g search results
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

//! USDA `FoodData` Central
//!
//! Barcodes are looked up as a `Branded` search on the GTIN and checked
//! against `gtinUpc`; names use a plain search. Search hits report nutrient
//! amounts per 100 g.
//!
//! API reference: <https://fdc.nal.usda.gov/api-guide.html>

use crate::adapter::SourceAdapter;
use crate::errors::{AdapterError, AdapterResult};
use crate::http_client::{get_json, shared_client};
use crate::normalize::{non_blank, same_barcode, to_kcal};
use async_trait::async_trait;
use nutriscan_core::constants::providers;
use nutriscan_core::constants::units::REFERENCE_GRAMS;
use nutriscan_core::{IdentifierKind, NutritionQuery, ProviderId, RawNutritionRecord};
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";

/// FDC nutrient ids
mod nutrient_id {
    pub const ENERGY_KCAL: u32 = 1008;
    /// Atwater general factors, used when 1008 is absent
    pub const ENERGY_ATWATER_GENERAL: u32 = 2047;
    pub const ENERGY_ATWATER_SPECIFIC: u32 = 2048;
    pub const ENERGY_KJ: u32 = 1062;
    pub const PROTEIN: u32 = 1003;
    pub const FAT: u32 = 1004;
    pub const CARBOHYDRATE: u32 = 1005;
    pub const FIBER: u32 = 1079;
    pub const SUGARS_TOTAL: u32 = 2000;
    pub const SUGARS_TOTAL_NLEA: u32 = 1063;
}

/// USDA API key and endpoint
#[derive(Debug, Clone)]
pub struct UsdaConfig {
    /// Key from <https://fdc.nal.usda.gov/api-key-signup.html>
    pub api_key: String,
    /// API root, overridable for tests
    pub base_url: String,
}

impl UsdaConfig {
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
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<SearchFood>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchFood {
    description: Option<String>,
    brand_owner: Option<String>,
    brand_name: Option<String>,
    gtin_upc: Option<String>,
    #[serde(default)]
    food_nutrients: Vec<SearchNutrient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNutrient {
    nutrient_id: u32,
    value: Option<f64>,
    unit_name: Option<String>,
}

impl SearchFood {
    fn amount(&self, id: u32) -> Option<f64> {
        self.food_nutrients
            .iter()
            .find(|n| n.nutrient_id == id)
            .and_then(|n| n.value)
    }

    fn calories(&self) -> Option<f64> {
        [
            nutrient_id::ENERGY_KCAL,
            nutrient_id::ENERGY_ATWATER_GENERAL,
            nutrient_id::ENERGY_ATWATER_SPECIFIC,
        ]
        .into_iter()
        .find_map(|id| self.amount(id))
        .or_else(|| {
            let kj = self
                .food_nutrients
                .iter()
                .find(|n| n.nutrient_id == nutrient_id::ENERGY_KJ)?;
            to_kcal(kj.value?, kj.unit_name.as_deref().unwrap_or("kJ"))
        })
    }
}

/// USDA adapter
#[derive(Debug, Clone)]
pub struct UsdaAdapter {
    id: ProviderId,
    config: UsdaConfig,
}

impl UsdaAdapter {
    /// Create the adapter
    #[must_use]
    pub fn new(config: UsdaConfig) -> Self {
        Self {
            id: ProviderId::from(providers::USDA),
            config,
        }
    }
}

/// Map a raw FDC search body to a record for `query`
///
/// # Errors
///
/// `Malformed` for unparseable JSON or a hit without energy, `NotFound` when
/// nothing matches (for barcodes, nothing with the same GTIN).
pub fn parse_response(body: &str, query: &NutritionQuery) -> AdapterResult<RawNutritionRecord> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| AdapterError::malformed(providers::USDA, e.to_string()))?;
    map_search(response, query)
}

fn map_search(response: SearchResponse, query: &NutritionQuery) -> AdapterResult<RawNutritionRecord> {
    let food = response
        .foods
        .into_iter()
        .find(|food| match query.identifier_kind {
            IdentifierKind::Barcode => food
                .gtin_upc
                .as_deref()
                .is_some_and(|gtin| same_barcode(gtin, &query.identifier)),
            IdentifierKind::Name => true,
        })
        .ok_or_else(|| AdapterError::not_found(providers::USDA, format!("no match for {query}")))?;

    let calories = food
        .calories()
        .ok_or_else(|| AdapterError::malformed(providers::USDA, "search hit has no energy value"))?;

    let name = non_blank(food.description.as_deref()).unwrap_or_else(|| query.identifier.clone());
    let brand = non_blank(food.brand_name.as_deref())
        .or_else(|| non_blank(food.brand_owner.as_deref()));
    let record = RawNutritionRecord {
        serving_grams: REFERENCE_GRAMS,
        calories,
        protein_g: food.amount(nutrient_id::PROTEIN).unwrap_or(0.0),
        carbs_g: food.amount(nutrient_id::CARBOHYDRATE).unwrap_or(0.0),
        fat_g: food.amount(nutrient_id::FAT).unwrap_or(0.0),
        fiber_g: food.amount(nutrient_id::FIBER).unwrap_or(0.0),
        sugar_g: food
            .amount(nutrient_id::SUGARS_TOTAL)
            .or_else(|| food.amount(nutrient_id::SUGARS_TOTAL_NLEA))
            .unwrap_or(0.0),
        ..RawNutritionRecord::new(providers::USDA, name)
    }
    .with_brand(brand);

    Ok(record)
}

#[async_trait]
impl SourceAdapter for UsdaAdapter {
    fn provider_id(&self) -> &ProviderId {
        &self.id
    }

    async fn fetch(
        &self,
        query: &NutritionQuery,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> AdapterResult<RawNutritionRecord> {
        let url = format!("{}/foods/search", self.config.base_url);
        let mut params = vec![
            ("query", query.identifier.as_str()),
            ("pageSize", "5"),
            ("api_key", self.config.api_key.as_str()),
        ];
        if query.is_barcode() {
            params.push(("dataType", "Branded"));
        }
        let request = shared_client().get(url).query(&params);

        let response: SearchResponse = get_json(&self.id, request, timeout, cancel).await?;
        map_search(response, query)
    }
}
