// ABOUTME: Edamam Food Database adapter using the parser endpoint for UPCs and ingredient names
// ABOUTME: Reads per-100 g nutrient codes (ENERC_KCAL, PROCNT, CHOCDF, FAT, FIBTG, SUGAR)
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

use crate::adapter::SourceAdapter;
use crate::errors::{AdapterError, AdapterResult};
use crate::http_client::{get_json, shared_client};
use crate::normalize::{non_blank, or_missing};
use async_trait::async_trait;
use nutriscan_core::constants::providers;
use nutriscan_core::constants::units::REFERENCE_GRAMS;
use nutriscan_core::{IdentifierKind, NutritionQuery, ProviderId, RawNutritionRecord};
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.edamam.com/api/food-database/v2";

/// Edamam application credentials and endpoint
#[derive(Debug, Clone)]
pub struct EdamamConfig {
    /// `app_id` query parameter
    pub app_id: String,
    /// `app_key` query parameter
    pub app_key: String,
    /// API root, overridable for tests
    pub base_url: String,
}

impl EdamamConfig {
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
struct ParserResponse {
    #[serde(default)]
    parsed: Vec<FoodEntry>,
    #[serde(default)]
    hints: Vec<FoodEntry>,
}

#[derive(Debug, Deserialize)]
struct FoodEntry {
    food: EdamamFood,
}

#[derive(Debug, Deserialize)]
struct EdamamFood {
    label: Option<String>,
    brand: Option<String>,
    #[serde(default)]
    nutrients: EdamamNutrients,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct EdamamNutrients {
    enerc_kcal: Option<f64>,
    procnt: Option<f64>,
    chocdf: Option<f64>,
    fat: Option<f64>,
    fibtg: Option<f64>,
    sugar: Option<f64>,
}

/// Edamam adapter
#[derive(Debug, Clone)]
pub struct EdamamAdapter {
    id: ProviderId,
    config: EdamamConfig,
}

impl EdamamAdapter {
    /// Create the adapter
    #[must_use]
    pub fn new(config: EdamamConfig) -> Self {
        Self {
            id: ProviderId::from(providers::EDAMAM),
            config,
        }
    }
}

/// Map a raw Edamam parser body to a record for `query`
///
/// The exact `parsed` match is preferred over the first search `hint`.
///
/// # Errors
///
/// `Malformed` for unparseable JSON, `NotFound` when both lists are empty.
pub fn parse_response(body: &str, query: &NutritionQuery) -> AdapterResult<RawNutritionRecord> {
    let response: ParserResponse = serde_json::from_str(body)
        .map_err(|e| AdapterError::malformed(providers::EDAMAM, e.to_string()))?;
    map_parser(response, query)
}

fn map_parser(response: ParserResponse, query: &NutritionQuery) -> AdapterResult<RawNutritionRecord> {
    let ParserResponse { parsed, hints } = response;
    let food = parsed
        .into_iter()
        .chain(hints)
        .map(|entry| entry.food)
        .next()
        .ok_or_else(|| AdapterError::not_found(providers::EDAMAM, format!("no food for {query}")))?;

    let n = &food.nutrients;
    let name = non_blank(food.label.as_deref()).unwrap_or_else(|| query.identifier.clone());
    let record = RawNutritionRecord {
        serving_grams: REFERENCE_GRAMS,
        calories: or_missing(n.enerc_kcal),
        protein_g: or_missing(n.procnt),
        carbs_g: or_missing(n.chocdf),
        fat_g: or_missing(n.fat),
        fiber_g: or_missing(n.fibtg),
        sugar_g: or_missing(n.sugar),
        ..RawNutritionRecord::new(providers::EDAMAM, name)
    }
    .with_brand(non_blank(food.brand.as_deref()));

    Ok(record)
}

#[async_trait]
impl SourceAdapter for EdamamAdapter {
    fn provider_id(&self) -> &ProviderId {
        &self.id
    }

    async fn fetch(
        &self,
        query: &NutritionQuery,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> AdapterResult<RawNutritionRecord> {
        let lookup_key = match query.identifier_kind {
            IdentifierKind::Barcode => "upc",
            IdentifierKind::Name => "ingr",
        };
        let request = shared_client()
            .get(format!("{}/parser", self.config.base_url))
            .query(&[
                ("app_id", self.config.app_id.as_str()),
                ("app_key", self.config.app_key.as_str()),
                (lookup_key, query.identifier.as_str()),
            ]);

        let response: ParserResponse = get_json(&self.id, request, timeout, cancel).await?;
        map_parser(response, query)
    }
}
