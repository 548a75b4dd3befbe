// ABOUTME: Nutritionix adapter using the UPC item lookup and the natural-language nutrients endpoint
// ABOUTME: Maps per-serving foods into a normalized record on the provider's serving basis
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

//! Nutritionix Track API
//!
//! - Barcode: `GET /v2/search/item?upc=<code>`
//! - Name: `POST /v2/natural/nutrients` with `{"query": "<name>"}`
//!
//! Both return `{"foods": [...]}` with nutrients per serving and the serving
//! mass in `serving_weight_grams`.

use crate::adapter::SourceAdapter;
use crate::errors::{AdapterError, AdapterResult};
use crate::http_client::{get_json, shared_client};
use crate::normalize::{non_blank, or_missing};
use async_trait::async_trait;
use nutriscan_core::constants::providers;
use nutriscan_core::{IdentifierKind, NutritionQuery, ProviderId, RawNutritionRecord};
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://trackapi.nutritionix.com/v2";

/// Nutritionix credentials and endpoint
#[derive(Debug, Clone)]
pub struct NutritionixConfig {
    /// `x-app-id` header
    pub app_id: String,
    /// `x-app-key` header
    pub app_key: String,
    /// API root, overridable for tests
    pub base_url: String,
}

impl NutritionixConfig {
    /// Config against the public API
    #[must_use]
    pub fn new(app_id: impl Into<String>, app_key: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_key: app_key.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FoodsResponse {
    #[serde(default)]
    foods: Vec<NixFood>,
}

#[derive(Debug, Deserialize)]
struct NixFood {
    food_name: Option<String>,
    brand_name: Option<String>,
    serving_weight_grams: Option<f64>,
    nf_calories: Option<f64>,
    nf_protein: Option<f64>,
    nf_total_carbohydrate: Option<f64>,
    nf_total_fat: Option<f64>,
    nf_dietary_fiber: Option<f64>,
    nf_sugars: Option<f64>,
}

/// Nutritionix adapter
#[derive(Debug, Clone)]
pub struct NutritionixAdapter {
    id: ProviderId,
    config: NutritionixConfig,
}

impl NutritionixAdapter {
    /// Create the adapter
    #[must_use]
    pub fn new(config: NutritionixConfig) -> Self {
        Self {
            id: ProviderId::from(providers::NUTRITIONIX),
            config,
        }
    }
}

/// Map a raw Nutritionix JSON body to a record for `query`
///
/// # Errors
///
/// `Malformed` for unparseable JSON or a food without serving mass,
/// `NotFound` for an empty `foods` list.
pub fn parse_response(body: &str, query: &NutritionQuery) -> AdapterResult<RawNutritionRecord> {
    let response: FoodsResponse = serde_json::from_str(body)
        .map_err(|e| AdapterError::malformed(providers::NUTRITIONIX, e.to_string()))?;
    map_foods(response, query)
}

fn map_foods(response: FoodsResponse, query: &NutritionQuery) -> AdapterResult<RawNutritionRecord> {
    let food = response.foods.into_iter().next().ok_or_else(|| {
        AdapterError::not_found(providers::NUTRITIONIX, format!("no foods for {query}"))
    })?;

    let serving_grams = food
        .serving_weight_grams
        .filter(|g| *g > 0.0)
        .ok_or_else(|| AdapterError::malformed(providers::NUTRITIONIX, "food has no serving weight"))?;

    let name = non_blank(food.food_name.as_deref()).unwrap_or_else(|| query.identifier.clone());
    let record = RawNutritionRecord {
        serving_grams,
        calories: or_missing(food.nf_calories),
        protein_g: or_missing(food.nf_protein),
        carbs_g: or_missing(food.nf_total_carbohydrate),
        fat_g: or_missing(food.nf_total_fat),
        fiber_g: or_missing(food.nf_dietary_fiber),
        sugar_g: or_missing(food.nf_sugars),
        ..RawNutritionRecord::new(providers::NUTRITIONIX, name)
    }
    .with_brand(non_blank(food.brand_name.as_deref()));

    Ok(record)
}

#[async_trait]
impl SourceAdapter for NutritionixAdapter {
    fn provider_id(&self) -> &ProviderId {
        &self.id
    }

    async fn fetch(
        &self,
        query: &NutritionQuery,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> AdapterResult<RawNutritionRecord> {
        let client = shared_client();
        let request = match query.identifier_kind {
            IdentifierKind::Barcode => client
                .get(format!("{}/search/item", self.config.base_url))
                .query(&[("upc", query.identifier.as_str())]),
            IdentifierKind::Name => client
                .post(format!("{}/natural/nutrients", self.config.base_url))
                .json(&serde_json::json!({ "query": query.identifier })),
        }
        .header("x-app-id", &self.config.app_id)
        .header("x-app-key", &self.config.app_key);

        let response: FoodsResponse = get_json(&self.id, request, timeout, cancel).await?;
        map_foods(response, query)
    }
}
