// ABOUTME: Local JSON dataset adapter for offline lookups by barcode or case-insensitive name
// ABOUTME: Loaded once at construction and indexed in memory; records are reported per 100 g
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

//! Offline dataset
//!
//! File format:
//!
//! ```json
//! {
//!   "foods": [
//!     {
//!       "name": "Rolled oats",
//!       "brand": "Acme",
//!       "barcodes": ["0001112223334"],
//!       "aliases": ["oatmeal"],
//!       "per_100g": { "calories": 379, "protein_g": 13.2, "carbs_g": 67.7,
//!                     "fat_g": 6.5, "fiber_g": 10.1, "sugar_g": 1.0 }
//!     }
//!   ]
//! }
//! ```

use crate::adapter::SourceAdapter;
use crate::errors::{AdapterError, AdapterResult};
use crate::normalize::same_barcode;
use async_trait::async_trait;
use nutriscan_core::constants::providers;
use nutriscan_core::constants::units::REFERENCE_GRAMS;
use nutriscan_core::{IdentifierKind, NutritionQuery, ProviderId, RawNutritionRecord};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Failures loading a dataset file
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The file could not be read
    #[error("failed to read dataset {path}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid dataset JSON
    #[error("invalid dataset JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct DatasetFile {
    #[serde(default)]
    foods: Vec<DatasetFood>,
}

#[derive(Debug, Clone, Deserialize)]
struct DatasetFood {
    name: String,
    brand: Option<String>,
    #[serde(default)]
    barcodes: Vec<String>,
    #[serde(default)]
    aliases: Vec<String>,
    per_100g: Per100g,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Per100g {
    calories: f64,
    protein_g: f64,
    carbs_g: f64,
    fat_g: f64,
    fiber_g: f64,
    sugar_g: f64,
}

/// In-memory offline food table
#[derive(Debug, Clone)]
pub struct OfflineDatasetAdapter {
    id: ProviderId,
    foods: Vec<DatasetFood>,
    by_name: HashMap<String, usize>,
}

impl OfflineDatasetAdapter {
    /// Load and index a dataset file
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the file is unreadable or malformed.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| DatasetError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let adapter = Self::from_json(&text)?;
        info!(path = %path.display(), foods = adapter.len(), "Loaded offline nutrition dataset");
        Ok(adapter)
    }

    /// Build from dataset JSON text
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Parse`] for malformed JSON.
    pub fn from_json(text: &str) -> Result<Self, DatasetError> {
        let file: DatasetFile = serde_json::from_str(text)?;
        let mut by_name = HashMap::new();
        for (index, food) in file.foods.iter().enumerate() {
            for key in std::iter::once(&food.name).chain(&food.aliases) {
                // First entry wins on duplicate names
                by_name.entry(name_key(key)).or_insert(index);
            }
        }
        Ok(Self {
            id: ProviderId::from(providers::OFFLINE_DATASET),
            foods: file.foods,
            by_name,
        })
    }

    /// Number of foods
    #[must_use]
    pub fn len(&self) -> usize {
        self.foods.len()
    }

    /// Whether the dataset has no foods
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    fn find(&self, query: &NutritionQuery) -> Option<&DatasetFood> {
        match query.identifier_kind {
            IdentifierKind::Barcode => self.foods.iter().find(|food| {
                food.barcodes
                    .iter()
                    .any(|code| same_barcode(code, &query.identifier))
            }),
            IdentifierKind::Name => self
                .by_name
                .get(&name_key(&query.identifier))
                .and_then(|index| self.foods.get(*index)),
        }
    }

    /// Synchronous lookup, used by `fetch`
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` adapter error when nothing matches.
    pub fn lookup(&self, query: &NutritionQuery) -> AdapterResult<RawNutritionRecord> {
        let food = self.find(query).ok_or_else(|| {
            AdapterError::not_found(self.id.clone(), format!("{query} not in offline dataset"))
        })?;
        let values = &food.per_100g;
        let record = RawNutritionRecord {
            serving_grams: REFERENCE_GRAMS,
            calories: values.calories,
            protein_g: values.protein_g,
            carbs_g: values.carbs_g,
            fat_g: values.fat_g,
            fiber_g: values.fiber_g,
            sugar_g: values.sugar_g,
            ..RawNutritionRecord::new(self.id.clone(), food.name.clone())
        }
        .with_brand(food.brand.clone());
        Ok(record)
    }
}

fn name_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[async_trait]
impl SourceAdapter for OfflineDatasetAdapter {
    fn provider_id(&self) -> &ProviderId {
        &self.id
    }

    async fn fetch(
        &self,
        query: &NutritionQuery,
        _timeout: Duration,
        cancel: &CancellationToken,
    ) -> AdapterResult<RawNutritionRecord> {
        if cancel.is_cancelled() {
            return Err(AdapterError::cancelled(self.id.clone()));
        }
        self.lookup(query)
    }
}
