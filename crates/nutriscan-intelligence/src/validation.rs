// ABOUTME: Physical plausibility validation and accuracy scoring of provider records
// ABOUTME: Hard rejection rules followed by a weighted density/ratio/completeness score
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

//! Record Validator
//!
//! Hard rules reject records that cannot describe real food (negative energy,
//! impossible energy density, macros that contradict the calorie count). A
//! record that survives is scored on three terms:
//!
//! | Term         | Weight | Full score                     |
//! |--------------|--------|--------------------------------|
//! | density      | 0.30   | 50-800 kcal/100 g              |
//! | macro ratio  | 0.30   | macro energy within 0.7-1.3x   |
//! | completeness | 0.40   | all 8 tracked fields present   |
//!
//! Calories of exactly zero fail the density floor, so a record with macros
//! but no energy value never reaches the ratio check.

use crate::config::ValidationConfig;
use crate::scoring::{band_score, unit_clamp};
use nutriscan_core::{RawNutritionRecord, ValidatedResult};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Fields counted by the completeness term
pub const TRACKED_FIELD_COUNT: usize = 8;

/// The hard rule a record failed
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "rule", content = "value", rename_all = "snake_case")]
pub enum RejectionReason {
    /// A numeric field is NaN or infinite
    NonFiniteValue,
    /// Calories below zero
    NegativeCalories(f64),
    /// Serving mass is not within `(0, max_serving_grams]`
    ServingOutOfRange(f64),
    /// kcal/100 g outside the hard density bounds
    DensityOutOfRange(f64),
    /// Macro-implied energy disagrees with reported energy
    MacroRatioOutOfRange(f64),
    /// Protein, carbs, fat, fiber or sugar below zero
    NegativeNutrient(&'static str),
    /// Sugar exceeds carbohydrates beyond rounding tolerance
    SugarExceedsCarbs {
        /// Reported sugar (g)
        sugar_g: f64,
        /// Reported carbohydrates (g)
        carbs_g: f64,
    },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteValue => write!(f, "non-finite nutrient value"),
            Self::NegativeCalories(v) => write!(f, "negative calories ({v})"),
            Self::ServingOutOfRange(v) => write!(f, "serving size out of range ({v} g)"),
            Self::DensityOutOfRange(v) => write!(f, "calorie density out of range ({v:.1} kcal/100g)"),
            Self::MacroRatioOutOfRange(v) => write!(f, "macro/calorie ratio out of range ({v:.2})"),
            Self::NegativeNutrient(field) => write!(f, "negative {field}"),
            Self::SugarExceedsCarbs { sugar_g, carbs_g } => {
                write!(f, "sugar ({sugar_g} g) exceeds carbohydrates ({carbs_g} g)")
            }
        }
    }
}

/// Per-term scores of a record that passed the hard rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccuracyBreakdown {
    /// Density term in `[0, 1]`
    pub density: f64,
    /// Macro-ratio term in `[0, 1]`
    pub ratio: f64,
    /// Completeness term in `[0, 1]`
    pub completeness: f64,
    /// Weighted, clamped total
    pub total: f64,
}

/// Applies hard plausibility rules and computes the accuracy score
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a validator with the given rules
    #[must_use]
    pub const fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Rules in use
    #[must_use]
    pub const fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate one record
    ///
    /// Rejected records come back with `is_valid = false` and a zero score;
    /// rejection is a value, never an error.
    #[must_use]
    pub fn validate(&self, record: RawNutritionRecord) -> ValidatedResult {
        match self.assess(&record) {
            Ok(breakdown) => ValidatedResult::valid(record, breakdown.total),
            Err(reason) => {
                debug!(
                    provider = %record.provider_id,
                    reason = %reason,
                    "Record rejected by plausibility rules"
                );
                ValidatedResult::rejected(record)
            }
        }
    }

    /// Run the hard rules and, if they pass, score the record
    ///
    /// # Errors
    ///
    /// Returns the first [`RejectionReason`] the record violates.
    pub fn assess(&self, record: &RawNutritionRecord) -> Result<AccuracyBreakdown, RejectionReason> {
        let (density, ratio) = self.check_hard_rules(record)?;
        Ok(self.score(record, density, ratio))
    }

    /// Check every hard rule, returning the density and macro ratio on success
    fn check_hard_rules(
        &self,
        record: &RawNutritionRecord,
    ) -> Result<(f64, Option<f64>), RejectionReason> {
        let cfg = &self.config;

        if record.has_non_finite_value() {
            return Err(RejectionReason::NonFiniteValue);
        }
        if record.calories < 0.0 {
            return Err(RejectionReason::NegativeCalories(record.calories));
        }
        if record.serving_grams <= 0.0 || record.serving_grams > cfg.max_serving_grams {
            return Err(RejectionReason::ServingOutOfRange(record.serving_grams));
        }

        let density = record
            .calories_per_100g()
            .ok_or(RejectionReason::ServingOutOfRange(record.serving_grams))?;
        if !(cfg.min_density..=cfg.max_density).contains(&density) {
            return Err(RejectionReason::DensityOutOfRange(density));
        }

        let ratio = record.macro_ratio();
        if let Some(r) = ratio {
            if !(cfg.min_macro_ratio..=cfg.max_macro_ratio).contains(&r) {
                return Err(RejectionReason::MacroRatioOutOfRange(r));
            }
        }

        let nutrients = [
            ("protein", record.protein_g),
            ("carbohydrates", record.carbs_g),
            ("fat", record.fat_g),
            ("fiber", record.fiber_g),
            ("sugar", record.sugar_g),
        ];
        if let Some((field, _)) = nutrients.iter().find(|(_, v)| *v < 0.0) {
            return Err(RejectionReason::NegativeNutrient(*field));
        }

        if record.sugar_g > record.carbs_g * cfg.sugar_carbs_tolerance {
            return Err(RejectionReason::SugarExceedsCarbs {
                sugar_g: record.sugar_g,
                carbs_g: record.carbs_g,
            });
        }

        Ok((density, ratio))
    }

    fn score(&self, record: &RawNutritionRecord, density: f64, ratio: Option<f64>) -> AccuracyBreakdown {
        let cfg = &self.config;

        let density_term = band_score(
            density,
            cfg.min_density,
            cfg.ideal_density_min,
            cfg.ideal_density_max,
            cfg.max_density,
        );
        // Missing calories leave nothing to compare macros against
        let ratio_term = ratio.map_or(0.0, |r| {
            band_score(
                r,
                cfg.min_macro_ratio,
                cfg.ideal_macro_ratio_min,
                cfg.ideal_macro_ratio_max,
                cfg.max_macro_ratio,
            )
        });
        let completeness = completeness(record);

        let total = unit_clamp(
            cfg.completeness_weight.mul_add(
                completeness,
                cfg.density_weight
                    .mul_add(density_term, cfg.ratio_weight * ratio_term),
            ),
        );

        AccuracyBreakdown {
            density: density_term,
            ratio: ratio_term,
            completeness,
            total,
        }
    }
}

/// Fraction of the eight tracked fields that are present
#[must_use]
pub fn completeness(record: &RawNutritionRecord) -> f64 {
    record.present_field_count().min(TRACKED_FIELD_COUNT) as f64 / TRACKED_FIELD_COUNT as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(calories: f64, protein: f64, carbs: f64, fat: f64) -> RawNutritionRecord {
        RawNutritionRecord {
            calories,
            protein_g: protein,
            carbs_g: carbs,
            fat_g: fat,
            ..RawNutritionRecord::new("test", "Test food")
        }
    }

    #[test]
    fn test_density_is_checked_before_ratio() {
        let validator = Validator::default();
        let zero_calories = record(0.0, 10.0, 20.0, 5.0);
        assert_eq!(
            validator.assess(&zero_calories),
            Err(RejectionReason::DensityOutOfRange(0.0))
        );
    }

    #[test]
    fn test_negative_protein_rejected() {
        let validator = Validator::default();
        let bad = record(200.0, -1.0, 40.0, 5.0);
        // Ratio: (-4 + 160 + 45) / 200 = 1.005 -> passes, protein check fails
        assert_eq!(
            validator.assess(&bad),
            Err(RejectionReason::NegativeNutrient("protein"))
        );
    }

    #[test]
    fn test_sugar_tolerance() {
        let validator = Validator::default();
        let mut ok = record(200.0, 0.0, 50.0, 0.0);
        ok.sugar_g = 59.0;
        assert!(validator.assess(&ok).is_ok());

        let mut bad = ok.clone();
        bad.sugar_g = 61.0;
        assert!(matches!(
            validator.assess(&bad),
            Err(RejectionReason::SugarExceedsCarbs { .. })
        ));
    }

    #[test]
    fn test_macro_ratio_bounds_are_inclusive() {
        let validator = Validator::default();

        // 20 g carbs -> 80 kcal of 200: ratio 0.4
        let low = validator.assess(&record(200.0, 0.0, 20.0, 0.0)).unwrap();
        assert!(low.ratio.abs() < 1e-12);

        // 70 g carbs -> 280 kcal of 200: ratio 1.4
        let high = validator.assess(&record(200.0, 0.0, 70.0, 0.0)).unwrap();
        assert!(high.ratio.abs() < 1e-12);
    }

    #[test]
    fn test_macro_ratio_just_outside_bounds_rejected() {
        let validator = Validator::default();
        assert!(matches!(
            validator.assess(&record(200.0, 0.0, 19.9, 0.0)),
            Err(RejectionReason::MacroRatioOutOfRange(r)) if r < 0.4
        ));
        assert!(matches!(
            validator.assess(&record(200.0, 0.0, 70.1, 0.0)),
            Err(RejectionReason::MacroRatioOutOfRange(r)) if r > 1.4
        ));
    }

    #[test]
    fn test_serving_above_ceiling_rejected() {
        let validator = Validator::default();
        let mut at_ceiling = record(2_000.0, 0.0, 500.0, 0.0);
        at_ceiling.serving_grams = 2_000.0;
        assert!(validator.assess(&at_ceiling).is_ok());

        // Same density and ratio, one gram heavier
        let mut over = record(2_001.0, 0.0, 500.25, 0.0);
        over.serving_grams = 2_001.0;
        assert_eq!(
            validator.assess(&over),
            Err(RejectionReason::ServingOutOfRange(2_001.0))
        );

        let mut empty = record(100.0, 0.0, 25.0, 0.0);
        empty.serving_grams = 0.0;
        assert_eq!(
            validator.assess(&empty),
            Err(RejectionReason::ServingOutOfRange(0.0))
        );
    }

    #[test]
    fn test_negative_fiber_and_sugar_rejected() {
        let validator = Validator::default();

        let mut fiber = record(200.0, 0.0, 50.0, 0.0);
        fiber.fiber_g = -0.5;
        assert_eq!(
            validator.assess(&fiber),
            Err(RejectionReason::NegativeNutrient("fiber"))
        );

        let mut sugar = record(200.0, 0.0, 50.0, 0.0);
        sugar.sugar_g = -2.0;
        assert_eq!(
            validator.assess(&sugar),
            Err(RejectionReason::NegativeNutrient("sugar"))
        );
    }

    #[test]
    fn test_rejection_reason_display() {
        let text = RejectionReason::DensityOutOfRange(1234.5).to_string();
        assert!(text.contains("1234.5"));
    }
}
