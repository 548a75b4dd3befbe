// ABOUTME: Spoonacular grocery products adapter with UPC lookup and search-then-detail for names
// ABOUTME: Converts per-serving named nutrients to a record using the product's serving mass
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

use crate::adapter::SourceAdapter;
use crate::errors::{AdapterError, AdapterResult};
use crate::http_client::{get_json, shared_client};
use crate::normalize::{non_blank, to_grams, to_kcal};
use async_trait::async_trait;
use nutriscan_core::constants::providers;
use nutriscan_core::{IdentifierKind, NutritionQuery, ProviderId, RawNutritionRecord};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.spoonacular.com";

/// Spoonacular API key and endpoint
#[derive(Debug, Clone)]
pub struct SpoonacularConfig {
    /// `apiKey` query parameter
    pub api_key: String,
    /// API root, overridable for tests
    pub base_url: String,
}

impl SpoonacularConfig {
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
struct ProductSearch {
    #[serde(default)]
    products: Vec<ProductHit>,
}

#[derive(Debug, Deserialize)]
struct ProductHit {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct Product {
    title: Option<String>,
    brand: Option<String>,
    nutrition: Option<Nutrition>,
    servings: Option<Servings>,
}

#[derive(Debug, Deserialize)]
struct Nutrition {
    #[serde(default)]
    nutrients: Vec<Nutrient>,
}

#[derive(Debug, Deserialize)]
struct Nutrient {
    name: String,
    amount: f64,
    #[serde(default)]
    unit: String,
}

#[derive(Debug, Deserialize)]
struct Servings {
    size: Option<f64>,
    unit: Option<String>,
}

impl Nutrition {
    fn find(&self, name: &str) -> Option<&Nutrient> {
        self.nutrients
            .iter()
            .find(|n| n.name.eq_ignore_ascii_case(name))
    }

    fn grams(&self, name: &str) -> f64 {
        self.find(name)
            .and_then(|n| to_grams(n.amount, &n.unit))
            .unwrap_or(0.0)
    }

    fn kcal(&self) -> f64 {
        self.find("Calories")
            .and_then(|n| to_kcal(n.amount, &n.unit))
            .unwrap_or(0.0)
    }
}

/// Spoonacular adapter
#[derive(Debug, Clone)]
pub struct SpoonacularAdapter {
    id: ProviderId,
    config: SpoonacularConfig,
}

impl SpoonacularAdapter {
    /// Create the adapter
    #[must_use]
    pub fn new(config: SpoonacularConfig) -> Self {
        Self {
            id: ProviderId::from(providers::SPOONACULAR),
            config,
        }
    }

    async fn product_id_for_name(
        &self,
        name: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> AdapterResult<u64> {
        let request = shared_client()
            .get(format!("{}/food/products/search", self.config.base_url))
            .query(&[
                ("query", name),
                ("number", "1"),
                ("apiKey", self.config.api_key.as_str()),
            ]);
        let search: ProductSearch = get_json(&self.id, request, timeout, cancel).await?;
        search
            .products
            .first()
            .map(|hit| hit.id)
            .ok_or_else(|| AdapterError::not_found(self.id.clone(), format!("no product named {name:?}")))
    }
}

/// Map a raw Spoonacular product body to a record for `query`
///
/// # Errors
///
/// `Malformed` for unparseable JSON, a product without nutrition, or a
/// serving that is not expressed as a mass.
pub fn parse_response(body: &str, query: &NutritionQuery) -> AdapterResult<RawNutritionRecord> {
    let product: Product = serde_json::from_str(body)
        .map_err(|e| AdapterError::malformed(providers::SPOONACULAR, e.to_string()))?;
    map_product(product, query)
}

fn map_product(product: Product, query: &NutritionQuery) -> AdapterResult<RawNutritionRecord> {
    let nutrition = product
        .nutrition
        .ok_or_else(|| AdapterError::malformed(providers::SPOONACULAR, "product has no nutrition"))?;
    let serving_grams = product
        .servings
        .and_then(|s| to_grams(s.size?, s.unit.as_deref().unwrap_or("g")))
        .filter(|g| *g > 0.0)
        .ok_or_else(|| {
            AdapterError::malformed(providers::SPOONACULAR, "serving size is not a mass")
        })?;

    let name = non_blank(product.title.as_deref()).unwrap_or_else(|| query.identifier.clone());
    let record = RawNutritionRecord {
        serving_grams,
        calories: nutrition.kcal(),
        protein_g: nutrition.grams("Protein"),
        carbs_g: nutrition.grams("Carbohydrates"),
        fat_g: nutrition.grams("Fat"),
        fiber_g: nutrition.grams("Fiber"),
        sugar_g: nutrition.grams("Sugar"),
        ..RawNutritionRecord::new(providers::SPOONACULAR, name)
    }
    .with_brand(non_blank(product.brand.as_deref()));

    Ok(record)
}

#[async_trait]
impl SourceAdapter for SpoonacularAdapter {
    fn provider_id(&self) -> &ProviderId {
        &self.id
    }

    async fn fetch(
        &self,
        query: &NutritionQuery,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> AdapterResult<RawNutritionRecord> {
        let started = Instant::now();
        let url = match query.identifier_kind {
            IdentifierKind::Barcode => {
                format!("{}/food/products/upc/{}", self.config.base_url, query.identifier)
            }
            IdentifierKind::Name => {
                let id = self
                    .product_id_for_name(&query.identifier, timeout, cancel)
                    .await?;
                format!("{}/food/products/{id}", self.config.base_url)
            }
        };

        // Both calls share one budget
        let remaining = timeout.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Err(AdapterError::timeout(self.id.clone(), timeout.as_millis()));
        }
        let request = shared_client()
            .get(url)
            .query(&[("apiKey", self.config.api_key.as_str())]);

        let product: Product = get_json(&self.id, request, remaining, cancel).await?;
        map_product(product, query)
    }
}
