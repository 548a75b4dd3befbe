// ABOUTME: Nutrition source adapters for Nutritionix, USDA, Edamam, Spoonacular, Open Food Facts, UPC lookups
// ABOUTME: SourceAdapter trait, adapter errors, circuit breaker, shared HTTP client, offline and scripted sources
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

#![deny(unsafe_code)]

//! Nutrition data source adapters and their shared plumbing.
//!
//! HTTP providers are compiled behind `provider-*` features. The offline
//! dataset and scripted adapters are always available.

/// The adapter contract
pub mod adapter;
/// Circuit breaker for failing sources
pub mod circuit_breaker;
/// Adapter error types
pub mod errors;
/// Shared HTTP client and request helper
pub mod http_client;
/// Value coercion shared by adapters
pub mod normalize;
/// Local JSON dataset adapter
pub mod offline_dataset;
/// Canned-answer adapter for tests and demos
pub mod scripted;

/// Barcode Lookup adapter
#[cfg(feature = "provider-barcode-lookup")]
pub mod barcode_lookup_provider;
/// Edamam Food Database adapter
#[cfg(feature = "provider-edamam")]
pub mod edamam_provider;
/// Nutritionix adapter
#[cfg(feature = "provider-nutritionix")]
pub mod nutritionix_provider;
/// Open Food Facts adapter
#[cfg(feature = "provider-open-food-facts")]
pub mod open_food_facts_provider;
/// Spoonacular adapter
#[cfg(feature = "provider-spoonacular")]
pub mod spoonacular_provider;
/// UPC Database adapter
#[cfg(feature = "provider-upc-database")]
pub mod upc_database_provider;
/// USDA `FoodData` Central adapter
#[cfg(feature = "provider-usda")]
pub mod usda_provider;

pub use adapter::SourceAdapter;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot, CircuitState};
pub use errors::{AdapterError, AdapterErrorKind, AdapterResult};
pub use http_client::{initialize_shared_client, shared_client};
pub use offline_dataset::{DatasetError, OfflineDatasetAdapter};
pub use scripted::ScriptedAdapter;

#[cfg(feature = "provider-barcode-lookup")]
pub use barcode_lookup_provider::{BarcodeLookupAdapter, BarcodeLookupConfig};
#[cfg(feature = "provider-edamam")]
pub use edamam_provider::{EdamamAdapter, EdamamConfig};
#[cfg(feature = "provider-nutritionix")]
pub use nutritionix_provider::{NutritionixAdapter, NutritionixConfig};
#[cfg(feature = "provider-open-food-facts")]
pub use open_food_facts_provider::{OpenFoodFactsAdapter, OpenFoodFactsConfig};
#[cfg(feature = "provider-spoonacular")]
pub use spoonacular_provider::{SpoonacularAdapter, SpoonacularConfig};
#[cfg(feature = "provider-upc-database")]
pub use upc_database_provider::{UpcDatabaseAdapter, UpcDatabaseConfig};
#[cfg(feature = "provider-usda")]
pub use usda_provider::{UsdaAdapter, UsdaConfig};
