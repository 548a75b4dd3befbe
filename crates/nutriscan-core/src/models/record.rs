// ABOUTME: Normalized per-provider nutrition facts before any validation or scoring
// ABOUTME: ProviderId newtype and RawNutritionRecord with portion scaling helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

use crate::constants::units::{
    KCAL_PER_G_CARBS, KCAL_PER_G_FAT, KCAL_PER_G_PROTEIN, REFERENCE_GRAMS,
};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable identifier of a nutrition data provider
///
/// Ordering is alphabetical, which is the last tie-break wherever the engine
/// must pick between otherwise equal candidates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    /// Create a provider id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl Borrow<str> for ProviderId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Nutrition facts reported by one provider for one query
///
/// Values are untrusted: zero means "missing", and negative or non-finite
/// values are possible until the validator has looked at the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNutritionRecord {
    /// Provider that produced this record
    pub provider_id: ProviderId,
    /// Product or food name as reported by the provider
    pub product_name: String,
    /// Brand or manufacturer, when the provider knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Mass the nutrient values below refer to (grams)
    pub serving_grams: f64,
    /// Energy (kcal)
    pub calories: f64,
    /// Protein (g)
    pub protein_g: f64,
    /// Carbohydrates (g)
    pub carbs_g: f64,
    /// Fat (g)
    pub fat_g: f64,
    /// Dietary fiber (g)
    pub fiber_g: f64,
    /// Total sugars (g)
    pub sugar_g: f64,
}

impl RawNutritionRecord {
    /// Start a record for `provider_id` with every nutrient missing
    #[must_use]
    pub fn new(provider_id: impl Into<ProviderId>, product_name: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            product_name: product_name.into(),
            brand: None,
            serving_grams: REFERENCE_GRAMS,
            calories: 0.0,
            protein_g: 0.0,
            carbs_g: 0.0,
            fat_g: 0.0,
            fiber_g: 0.0,
            sugar_g: 0.0,
        }
    }

    /// Set the brand, ignoring blank strings
    #[must_use]
    pub fn with_brand(mut self, brand: Option<impl Into<String>>) -> Self {
        self.brand = brand
            .map(Into::into)
            .filter(|b: &String| !b.trim().is_empty());
        self
    }

    /// Rescale every nutrient linearly so the record describes `portion_grams`
    ///
    /// Records with an unusable basis (zero, negative or non-finite serving
    /// mass) are returned unchanged; the validator rejects them.
    #[must_use]
    pub fn scaled_to_portion(mut self, portion_grams: f64) -> Self {
        if !self.serving_grams.is_finite() || self.serving_grams <= 0.0 {
            return self;
        }
        let factor = portion_grams / self.serving_grams;
        self.calories *= factor;
        self.protein_g *= factor;
        self.carbs_g *= factor;
        self.fat_g *= factor;
        self.fiber_g *= factor;
        self.sugar_g *= factor;
        self.serving_grams = portion_grams;
        self
    }

    /// Energy density in kcal per 100 g, if the serving mass is usable
    #[must_use]
    pub fn calories_per_100g(&self) -> Option<f64> {
        (self.serving_grams > 0.0).then(|| self.calories / self.serving_grams * REFERENCE_GRAMS)
    }

    /// Energy implied by the macronutrients using Atwater factors (kcal)
    #[must_use]
    pub fn macro_calories(&self) -> f64 {
        self.protein_g.mul_add(
            KCAL_PER_G_PROTEIN,
            self.carbs_g
                .mul_add(KCAL_PER_G_CARBS, self.fat_g * KCAL_PER_G_FAT),
        )
    }

    /// Ratio of macro-implied energy to reported energy
    ///
    /// `None` when calories are zero, which is treated as missing rather
    /// than as a division by zero.
    #[must_use]
    pub fn macro_ratio(&self) -> Option<f64> {
        (self.calories > 0.0).then(|| self.macro_calories() / self.calories)
    }

    /// Number of the eight tracked fields that are present (non-empty, non-zero)
    #[must_use]
    pub fn present_field_count(&self) -> usize {
        let numeric = [
            self.calories,
            self.protein_g,
            self.carbs_g,
            self.fat_g,
            self.fiber_g,
            self.sugar_g,
            self.serving_grams,
        ];
        let present_numeric = numeric
            .iter()
            .filter(|v| v.is_finite() && **v != 0.0)
            .count();
        present_numeric + usize::from(!self.product_name.trim().is_empty())
    }

    /// Whether any numeric field is NaN or infinite
    #[must_use]
    pub fn has_non_finite_value(&self) -> bool {
        [
            self.serving_grams,
            self.calories,
            self.protein_g,
            self.carbs_g,
            self.fat_g,
            self.fiber_g,
            self.sugar_g,
        ]
        .iter()
        .any(|v| !v.is_finite())
    }

    /// Whether the record has a non-blank product name
    #[must_use]
    pub fn has_product_name(&self) -> bool {
        !self.product_name.trim().is_empty()
    }

    /// Whether the record has a non-blank brand
    #[must_use]
    pub fn has_brand(&self) -> bool {
        self.brand.as_deref().is_some_and(|b| !b.trim().is_empty())
    }
}
