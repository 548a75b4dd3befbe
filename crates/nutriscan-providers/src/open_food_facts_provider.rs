// ABOUTME: Open Food Facts adapter for the product-by-barcode API and the full-text search endpoint
// ABOUTME: Tolerates the community data's mixed number/string nutriments and kJ-only energy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

//! Open Food Facts
//!
//! No credentials are needed. Nutriments are read from the `*_100g` keys;
//! values arrive as numbers or as numeric strings depending on who entered
//! the product.

use crate::adapter::SourceAdapter;
use crate::errors::{AdapterError, AdapterResult};
use crate::http_client::{get_json, shared_client};
use crate::normalize::{non_blank, number};
use async_trait::async_trait;
use nutriscan_core::constants::providers;
use nutriscan_core::constants::units::{KJ_PER_KCAL, REFERENCE_GRAMS};
use nutriscan_core::{IdentifierKind, NutritionQuery, ProviderId, RawNutritionRecord};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default site root
pub const DEFAULT_BASE_URL: &str = "https://world.openfoodfacts.org";

/// Fields requested from the product API
const PRODUCT_FIELDS: &str = "product_name,generic_name,brands,nutriments";

/// Open Food Facts endpoint
#[derive(Debug, Clone)]
pub struct OpenFoodFactsConfig {
    /// Site root, overridable for tests or regional mirrors
    pub base_url: String,
}

impl Default for OpenFoodFactsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    #[serde(default)]
    status: i64,
    product: Option<OffProduct>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    products: Vec<OffProduct>,
}

#[derive(Debug, Deserialize)]
struct OffProduct {
    product_name: Option<String>,
    generic_name: Option<String>,
    brands: Option<String>,
    #[serde(default)]
    nutriments: Map<String, Value>,
}

impl OffProduct {
    fn per_100g(&self, key: &str) -> Option<f64> {
        self.nutriments.get(&format!("{key}_100g")).and_then(number)
    }

    fn calories(&self) -> Option<f64> {
        self.per_100g("energy-kcal")
            .or_else(|| self.per_100g("energy").map(|kj| kj / KJ_PER_KCAL))
    }

    /// First entry of the comma-separated brand list
    fn brand(&self) -> Option<String> {
        self.brands
            .as_deref()
            .and_then(|b| non_blank(b.split(',').next()))
    }
}

/// Open Food Facts adapter
#[derive(Debug, Clone)]
pub struct OpenFoodFactsAdapter {
    id: ProviderId,
    config: OpenFoodFactsConfig,
}

impl OpenFoodFactsAdapter {
    /// Create the adapter
    #[must_use]
    pub fn new(config: OpenFoodFactsConfig) -> Self {
        Self {
            id: ProviderId::from(providers::OPEN_FOOD_FACTS),
            config,
        }
    }
}

impl Default for OpenFoodFactsAdapter {
    fn default() -> Self {
        Self::new(OpenFoodFactsConfig::default())
    }
}

/// Map a raw product (barcode) or search (name) body to a record for `query`
///
/// # Errors
///
/// `Malformed` for unparseable JSON or a product without energy, `NotFound`
/// when the product status is 0 or the search is empty.
pub fn parse_response(body: &str, query: &NutritionQuery) -> AdapterResult<RawNutritionRecord> {
    let malformed = |e: serde_json::Error| AdapterError::malformed(providers::OPEN_FOOD_FACTS, e.to_string());
    let product = match query.identifier_kind {
        IdentifierKind::Barcode => product_from(serde_json::from_str(body).map_err(malformed)?, query)?,
        IdentifierKind::Name => first_hit(serde_json::from_str(body).map_err(malformed)?, query)?,
    };
    map_product(&product, query)
}

fn product_from(response: ProductResponse, query: &NutritionQuery) -> AdapterResult<OffProduct> {
    match response.product {
        Some(product) if response.status == 1 => Ok(product),
        _ => Err(AdapterError::not_found(
            providers::OPEN_FOOD_FACTS,
            format!("product {} not in database", query.identifier),
        )),
    }
}

fn first_hit(response: SearchResponse, query: &NutritionQuery) -> AdapterResult<OffProduct> {
    response
        .products
        .into_iter()
        .find(|p| !p.nutriments.is_empty())
        .ok_or_else(|| AdapterError::not_found(providers::OPEN_FOOD_FACTS, format!("no products for {query}")))
}

fn map_product(product: &OffProduct, query: &NutritionQuery) -> AdapterResult<RawNutritionRecord> {
    let calories = product.calories().ok_or_else(|| {
        AdapterError::malformed(providers::OPEN_FOOD_FACTS, "product has no energy value")
    })?;
    let name = non_blank(product.product_name.as_deref())
        .or_else(|| non_blank(product.generic_name.as_deref()))
        .unwrap_or_else(|| query.identifier.clone());

    let record = RawNutritionRecord {
        serving_grams: REFERENCE_GRAMS,
        calories,
        protein_g: product.per_100g("proteins").unwrap_or(0.0),
        carbs_g: product.per_100g("carbohydrates").unwrap_or(0.0),
        fat_g: product.per_100g("fat").unwrap_or(0.0),
        fiber_g: product.per_100g("fiber").unwrap_or(0.0),
        sugar_g: product.per_100g("sugars").unwrap_or(0.0),
        ..RawNutritionRecord::new(providers::OPEN_FOOD_FACTS, name)
    }
    .with_brand(product.brand());

    Ok(record)
}

#[async_trait]
impl SourceAdapter for OpenFoodFactsAdapter {
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
        let product = match query.identifier_kind {
            IdentifierKind::Barcode => {
                let request = client
                    .get(format!(
                        "{}/api/v2/product/{}.json",
                        self.config.base_url, query.identifier
                    ))
                    .query(&[("fields", PRODUCT_FIELDS)]);
                let response: ProductResponse = get_json(&self.id, request, timeout, cancel).await?;
                product_from(response, query)?
            }
            IdentifierKind::Name => {
                let request = client
                    .get(format!("{}/cgi/search.pl", self.config.base_url))
                    .query(&[
                        ("search_terms", query.identifier.as_str()),
                        ("search_simple", "1"),
                        ("action", "process"),
                        ("json", "1"),
                        ("page_size", "5"),
                        ("fields", PRODUCT_FIELDS),
                    ]);
                let response: SearchResponse = get_json(&self.id, request, timeout, cancel).await?;
                first_hit(response, query)?
            }
        };
        map_product(&product, query)
    }
}
