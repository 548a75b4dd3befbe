// ABOUTME: Barcode Lookup adapter; barcode-only, parses the free-text nutrition_facts field
// ABOUTME: Accepts "Label amount unit" segments separated by commas, serving size required
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

use crate::adapter::SourceAdapter;
use crate::errors::{AdapterError, AdapterResult};
use crate::http_client::{get_json, shared_client};
use crate::normalize::{non_blank, parse_quantity, to_grams, to_kcal};
use async_trait::async_trait;
use nutriscan_core::constants::providers;
use nutriscan_core::{IdentifierKind, NutritionQuery, ProviderId, RawNutritionRecord};
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.barcodelookup.com/v3";

/// Barcode Lookup key and endpoint
#[derive(Debug, Clone)]
pub struct BarcodeLookupConfig {
    /// `key` query parameter
    pub api_key: String,
    /// API root, overridable for tests
    pub base_url: String,
}

impl BarcodeLookupConfig {
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
struct ProductsResponse {
    #[serde(default)]
    products: Vec<LookupProduct>,
}

#[derive(Debug, Deserialize)]
struct LookupProduct {
    title: Option<String>,
    brand: Option<String>,
    manufacturer: Option<String>,
    nutrition_facts: Option<String>,
}

/// Nutrient amounts recovered from a `nutrition_facts` string
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NutritionFacts {
    /// Serving mass (g)
    pub serving_grams: Option<f64>,
    /// Energy (kcal)
    pub calories: Option<f64>,
    /// Protein (g)
    pub protein_g: Option<f64>,
    /// Carbohydrates (g)
    pub carbs_g: Option<f64>,
    /// Total fat (g)
    pub fat_g: Option<f64>,
    /// Fiber (g)
    pub fiber_g: Option<f64>,
    /// Total sugars (g)
    pub sugar_g: Option<f64>,
}

/// Parse `"Serving Size 40 g, Energy 230 kcal, Protein 6 g, ..."`
///
/// Sub-entries such as saturated fat or added sugars are ignored; the first
/// matching segment for each nutrient wins.
#[must_use]
pub fn parse_nutrition_facts(text: &str) -> NutritionFacts {
    let mut facts = NutritionFacts::default();
    for segment in text.split([',', ';', '\n']) {
        let Some(start) = segment.find(|c: char| c.is_ascii_digit()) else {
            continue;
        };
        let (label, quantity) = segment.split_at(start);
        let label = label.trim().to_lowercase();
        let Some((amount, unit)) = parse_quantity(quantity) else {
            continue;
        };

        let slot = if label.contains("serving") {
            &mut facts.serving_grams
        } else if label.contains("calorie") || label.contains("energy") {
            facts.calories = facts.calories.or_else(|| to_kcal(amount, &unit));
            continue;
        } else if label.contains("protein") {
            &mut facts.protein_g
        } else if label.contains("carbohydrate") || label.contains("carbs") {
            &mut facts.carbs_g
        } else if label.contains("fat") && !is_fat_subentry(&label) {
            &mut facts.fat_g
        } else if label.contains("fiber") || label.contains("fibre") {
            &mut facts.fiber_g
        } else if label.contains("sugar") && !label.contains("added") && !label.contains("alcohol") {
            &mut facts.sugar_g
        } else {
            continue;
        };
        if slot.is_none() {
            *slot = to_grams(amount, if unit.is_empty() { "g" } else { &unit });
        }
    }
    facts
}

fn is_fat_subentry(label: &str) -> bool {
    ["saturated", "trans", "poly", "mono"]
        .iter()
        .any(|kind| label.contains(kind))
}

/// Barcode Lookup adapter
#[derive(Debug, Clone)]
pub struct BarcodeLookupAdapter {
    id: ProviderId,
    config: BarcodeLookupConfig,
}

impl BarcodeLookupAdapter {
    /// Create the adapter
    #[must_use]
    pub fn new(config: BarcodeLookupConfig) -> Self {
        Self {
            id: ProviderId::from(providers::BARCODE_LOOKUP),
            config,
        }
    }
}

/// Map a raw Barcode Lookup body to a record for `query`
///
/// # Errors
///
/// `Malformed` for unparseable JSON, missing energy or serving size,
/// `NotFound` when no product carries nutrition facts.
pub fn parse_response(body: &str, query: &NutritionQuery) -> AdapterResult<RawNutritionRecord> {
    let response: ProductsResponse = serde_json::from_str(body)
        .map_err(|e| AdapterError::malformed(providers::BARCODE_LOOKUP, e.to_string()))?;
    map_products(response, query)
}

fn map_products(response: ProductsResponse, query: &NutritionQuery) -> AdapterResult<RawNutritionRecord> {
    let product = response
        .products
        .into_iter()
        .find(|p| p.nutrition_facts.as_deref().is_some_and(|f| !f.trim().is_empty()))
        .ok_or_else(|| {
            AdapterError::not_found(providers::BARCODE_LOOKUP, format!("no nutrition facts for {query}"))
        })?;

    let facts = parse_nutrition_facts(product.nutrition_facts.as_deref().unwrap_or_default());
    let calories = facts
        .calories
        .ok_or_else(|| AdapterError::malformed(providers::BARCODE_LOOKUP, "nutrition facts lack energy"))?;
    let serving_grams = facts
        .serving_grams
        .filter(|g| *g > 0.0)
        .ok_or_else(|| AdapterError::malformed(providers::BARCODE_LOOKUP, "nutrition facts lack serving size"))?;

    let name = non_blank(product.title.as_deref()).unwrap_or_else(|| query.identifier.clone());
    let brand = non_blank(product.brand.as_deref()).or_else(|| non_blank(product.manufacturer.as_deref()));
    let record = RawNutritionRecord {
        serving_grams,
        calories,
        protein_g: facts.protein_g.unwrap_or(0.0),
        carbs_g: facts.carbs_g.unwrap_or(0.0),
        fat_g: facts.fat_g.unwrap_or(0.0),
        fiber_g: facts.fiber_g.unwrap_or(0.0),
        sugar_g: facts.sugar_g.unwrap_or(0.0),
        ..RawNutritionRecord::new(providers::BARCODE_LOOKUP, name)
    }
    .with_brand(brand);

    Ok(record)
}

#[async_trait]
impl SourceAdapter for BarcodeLookupAdapter {
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
            .get(format!("{}/products", self.config.base_url))
            .query(&[
                ("barcode", query.identifier.as_str()),
                ("formatted", "y"),
                ("key", self.config.api_key.as_str()),
            ]);

        let response: ProductsResponse = get_json(&self.id, request, timeout, cancel).await?;
        map_products(response, query)
    }
}
