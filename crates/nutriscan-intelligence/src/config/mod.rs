// ABOUTME: Tunable constants for validation, consensus grouping, and selection
// ABOUTME: Every config has documented defaults and a validate() that fails fast
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

//! Reconciliation Algorithm Configuration
//!
//! Holds every numeric constant the validator, grouper and selector use. The
//! defaults are the production values; tests and callers may tighten them but
//! must pass `validate()` first.

/// Configuration error type
pub mod error;

pub use error::ConfigError;

use nutriscan_core::constants::reconcile::{
    DEFAULT_CONSENSUS_MAX_SPREAD, DEFAULT_CONSENSUS_TOLERANCE, MAX_PORTION_GRAMS,
};
use serde::{Deserialize, Serialize};

/// Tolerance used when checking that weights sum to 1.0
const WEIGHT_SUM_EPSILON: f64 = 1e-6;

fn check_unit_interval(value: f64, name: &str) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ValueOutOfRange(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

fn check_weights_sum(weights: &[f64], message: &'static str) -> Result<(), ConfigError> {
    let sum: f64 = weights.iter().sum();
    if weights.iter().all(|w| w.is_finite() && *w >= 0.0) && (sum - 1.0).abs() <= WEIGHT_SUM_EPSILON
    {
        Ok(())
    } else {
        Err(ConfigError::InvalidWeights(message))
    }
}

/// Plausibility rules and soft-score weights for a single record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Largest serving accepted (grams)
    pub max_serving_grams: f64,
    /// Hard lower bound on energy density (kcal/100 g)
    pub min_density: f64,
    /// Hard upper bound on energy density (kcal/100 g); pure fat is ~900
    pub max_density: f64,
    /// Lower edge of the full-score density band
    pub ideal_density_min: f64,
    /// Upper edge of the full-score density band
    pub ideal_density_max: f64,
    /// Hard lower bound on macro-implied / reported energy
    pub min_macro_ratio: f64,
    /// Hard upper bound on macro-implied / reported energy
    pub max_macro_ratio: f64,
    /// Lower edge of the full-score ratio band
    pub ideal_macro_ratio_min: f64,
    /// Upper edge of the full-score ratio band
    pub ideal_macro_ratio_max: f64,
    /// Sugar may exceed carbs by this factor before the record is rejected
    pub sugar_carbs_tolerance: f64,
    /// Weight of the density term
    pub density_weight: f64,
    /// Weight of the macro-ratio term
    pub ratio_weight: f64,
    /// Weight of the completeness term
    pub completeness_weight: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_serving_grams: MAX_PORTION_GRAMS,
            min_density: 1.0,
            max_density: 1000.0,
            ideal_density_min: 50.0,
            ideal_density_max: 800.0,
            min_macro_ratio: 0.4,
            max_macro_ratio: 1.4,
            ideal_macro_ratio_min: 0.7,
            ideal_macro_ratio_max: 1.3,
            sugar_carbs_tolerance: 1.2,
            density_weight: 0.30,
            ratio_weight: 0.30,
            completeness_weight: 0.40,
        }
    }
}

impl ValidationConfig {
    /// Validate bounds ordering and weight totals
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRange` if a band is not nested inside its
    /// hard bounds, or `ConfigError::InvalidWeights` if the three score
    /// weights do not sum to 1.0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_serving_grams.is_finite() && self.max_serving_grams > 0.0) {
            return Err(ConfigError::InvalidRange("max_serving_grams must be positive"));
        }
        let density_ordered = self.min_density >= 0.0
            && self.min_density <= self.ideal_density_min
            && self.ideal_density_min <= self.ideal_density_max
            && self.ideal_density_max <= self.max_density;
        if !density_ordered {
            return Err(ConfigError::InvalidRange(
                "density bounds must satisfy 0 <= min <= ideal_min <= ideal_max <= max",
            ));
        }
        let ratio_ordered = self.min_macro_ratio >= 0.0
            && self.min_macro_ratio <= self.ideal_macro_ratio_min
            && self.ideal_macro_ratio_min <= self.ideal_macro_ratio_max
            && self.ideal_macro_ratio_max <= self.max_macro_ratio;
        if !ratio_ordered {
            return Err(ConfigError::InvalidRange(
                "macro ratio bounds must satisfy 0 <= min <= ideal_min <= ideal_max <= max",
            ));
        }
        if !(self.sugar_carbs_tolerance.is_finite() && self.sugar_carbs_tolerance >= 1.0) {
            return Err(ConfigError::InvalidRange("sugar_carbs_tolerance must be >= 1.0"));
        }
        check_weights_sum(
            &[
                self.density_weight,
                self.ratio_weight,
                self.completeness_weight,
            ],
            "validation score weights must sum to 1.0",
        )
    }
}

/// Calorie clustering parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Relative distance from the running group mean that still joins the group
    pub tolerance: f64,
    /// Relative distance from the group's smallest member that still joins
    pub max_spread: f64,
    /// Weight of the normalized group size in the group score
    pub size_weight: f64,
    /// Weight of the mean member accuracy in the group score
    pub accuracy_weight: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_CONSENSUS_TOLERANCE,
            max_spread: DEFAULT_CONSENSUS_MAX_SPREAD,
            size_weight: 0.6,
            accuracy_weight: 0.4,
        }
    }
}

impl ConsensusConfig {
    /// Grouping config with the given tolerance and a spread cap of twice that
    #[must_use]
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance,
            max_spread: tolerance * 2.0,
            ..Self::default()
        }
    }

    /// Validate tolerance, spread, and weights
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValueOutOfRange` if the tolerance is not within
    /// `(0, 1]`, `ConfigError::InvalidRange` if the spread cap is below the
    /// tolerance, or `ConfigError::InvalidWeights` if weights don't sum to 1.0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0 && self.tolerance <= 1.0) {
            return Err(ConfigError::ValueOutOfRange(format!(
                "consensus tolerance must be within (0, 1], got {}",
                self.tolerance
            )));
        }
        if !self.max_spread.is_finite() || self.max_spread < self.tolerance {
            return Err(ConfigError::InvalidRange(
                "consensus max_spread must be finite and at least the tolerance",
            ));
        }
        check_weights_sum(
            &[self.size_weight, self.accuracy_weight],
            "consensus group score weights must sum to 1.0",
        )
    }
}

/// Winner selection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Smallest group that counts as consensus
    pub min_consensus_size: usize,
    /// Added to the winning group's score to form the confidence
    pub consensus_bonus: f64,
    /// Fallback composite weight: source reliability
    pub reliability_weight: f64,
    /// Fallback composite weight: accuracy score
    pub accuracy_weight: f64,
    /// Fallback composite weight: field completeness
    pub completeness_weight: f64,
    /// Fallback composite weight: brand and product name presence
    pub brand_name_weight: f64,
    /// Reliability a lone winner must exceed to be "single reliable"
    pub single_reliable_min_reliability: f64,
    /// Accuracy a lone winner must exceed to be "single reliable"
    pub single_reliable_min_accuracy: f64,
    /// Confidence multiplier for an uncorroborated fallback
    pub uncorroborated_penalty: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_consensus_size: 2,
            consensus_bonus: 0.1,
            reliability_weight: 0.4,
            accuracy_weight: 0.3,
            completeness_weight: 0.2,
            brand_name_weight: 0.1,
            single_reliable_min_reliability: 0.7,
            single_reliable_min_accuracy: 0.7,
            uncorroborated_penalty: 0.7,
        }
    }
}

impl SelectionConfig {
    /// Validate thresholds and composite weights
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRange` if consensus needs fewer than two
    /// members, `ConfigError::ValueOutOfRange` for thresholds outside `[0, 1]`,
    /// or `ConfigError::InvalidWeights` if composite weights don't sum to 1.0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_consensus_size < 2 {
            return Err(ConfigError::InvalidRange(
                "consensus requires at least two agreeing sources",
            ));
        }
        check_unit_interval(self.consensus_bonus, "consensus_bonus")?;
        check_unit_interval(
            self.single_reliable_min_reliability,
            "single_reliable_min_reliability",
        )?;
        check_unit_interval(
            self.single_reliable_min_accuracy,
            "single_reliable_min_accuracy",
        )?;
        check_unit_interval(self.uncorroborated_penalty, "uncorroborated_penalty")?;
        check_weights_sum(
            &[
                self.reliability_weight,
                self.accuracy_weight,
                self.completeness_weight,
                self.brand_name_weight,
            ],
            "fallback composite weights must sum to 1.0",
        )
    }
}

/// Complete algorithm configuration for one reconciler
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconciliationTuning {
    /// Validator rules
    pub validation: ValidationConfig,
    /// Grouper parameters
    pub consensus: ConsensusConfig,
    /// Selector parameters
    pub selection: SelectionConfig,
}

impl ReconciliationTuning {
    /// Validate every section
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found in any section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validation.validate()?;
        self.consensus.validate()?;
        self.selection.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ReconciliationTuning::default().validate().is_ok());
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let config = ConsensusConfig {
            tolerance: -0.1,
            ..ConsensusConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValueOutOfRange(_))
        ));
    }

    #[test]
    fn test_spread_below_tolerance_rejected() {
        let config = ConsensusConfig {
            tolerance: 0.2,
            max_spread: 0.1,
            ..ConsensusConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRange(_))));
    }

    #[test]
    fn test_unbalanced_weights_rejected() {
        let config = ValidationConfig {
            completeness_weight: 0.5,
            ..ValidationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWeights(_))
        ));
    }

    #[test]
    fn test_misordered_density_band_rejected() {
        let config = ValidationConfig {
            ideal_density_min: 900.0,
            ..ValidationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_singleton_consensus_rejected() {
        let config = SelectionConfig {
            min_consensus_size: 1,
            ..SelectionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_tolerance_doubles_spread() {
        let config = ConsensusConfig::with_tolerance(0.1);
        assert!((config.max_spread - 0.2).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }
}
