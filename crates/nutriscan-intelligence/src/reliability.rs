// ABOUTME: Static per-provider trust weights consumed by the validator and selector
// ABOUTME: Explicitly constructed and injected; read-only once a reconciler owns it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

//! Source Reliability Table
//!
//! Reliability is a provider-level prior, independent of any single query.
//! The table is immutable after construction and shared behind an `Arc`, so
//! concurrent reconciliations read it without locking.

use crate::config::ConfigError;
use nutriscan_core::constants::providers;
use nutriscan_core::ProviderId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Provider trust weights in `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReliability {
    weights: BTreeMap<ProviderId, f64>,
    default_weight: f64,
}

impl Default for SourceReliability {
    fn default() -> Self {
        let weights = [
            (providers::NUTRITIONIX, 1.0),
            (providers::USDA, 1.0),
            (providers::EDAMAM, 0.8),
            (providers::SPOONACULAR, 0.8),
            (providers::OFFLINE_DATASET, 0.7),
            (providers::OPEN_FOOD_FACTS, 0.6),
            (providers::BARCODE_LOOKUP, 0.5),
            (providers::UPC_DATABASE, 0.3),
        ]
        .into_iter()
        .map(|(id, weight)| (ProviderId::from(id), weight))
        .collect();

        Self {
            weights,
            default_weight: 0.0,
        }
    }
}

impl SourceReliability {
    /// An empty table where every provider gets `default_weight`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValueOutOfRange` if `default_weight` is outside `[0, 1]`.
    pub fn empty(default_weight: f64) -> Result<Self, ConfigError> {
        check_weight("default", default_weight)?;
        Ok(Self {
            weights: BTreeMap::new(),
            default_weight,
        })
    }

    /// Set or override one provider's weight
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValueOutOfRange` if `weight` is outside `[0, 1]`.
    pub fn with_weight(
        mut self,
        provider: impl Into<ProviderId>,
        weight: f64,
    ) -> Result<Self, ConfigError> {
        let provider = provider.into();
        check_weight(provider.as_str(), weight)?;
        self.weights.insert(provider, weight);
        Ok(self)
    }

    /// Reliability of `provider`, or the default weight when unknown
    #[must_use]
    pub fn weight(&self, provider: &ProviderId) -> f64 {
        self.weights
            .get(provider)
            .copied()
            .unwrap_or(self.default_weight)
    }

    /// Whether the table has an explicit entry for `provider`
    #[must_use]
    pub fn contains(&self, provider: &ProviderId) -> bool {
        self.weights.contains_key(provider)
    }

    /// Fixed provider priority: higher reliability first, then alphabetical id
    ///
    /// Returns `Ordering::Greater` when `a` has priority over `b`, so it can be
    /// used directly with `max_by`.
    #[must_use]
    pub fn priority_cmp(&self, a: &ProviderId, b: &ProviderId) -> Ordering {
        self.weight(a)
            .total_cmp(&self.weight(b))
            .then_with(|| b.cmp(a))
    }

    /// Entries ordered by priority (most trusted first)
    #[must_use]
    pub fn ranked(&self) -> Vec<(ProviderId, f64)> {
        let mut entries: Vec<(ProviderId, f64)> = self
            .weights
            .iter()
            .map(|(id, w)| (id.clone(), *w))
            .collect();
        entries.sort_by(|(a, _), (b, _)| self.priority_cmp(b, a));
        entries
    }
}

fn check_weight(name: &str, weight: f64) -> Result<(), ConfigError> {
    if weight.is_finite() && (0.0..=1.0).contains(&weight) {
        Ok(())
    } else {
        Err(ConfigError::ValueOutOfRange(format!(
            "reliability for {name} must be within [0, 1], got {weight}"
        )))
    }
}
