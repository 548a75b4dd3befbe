// ABOUTME: Picks the final record from consensus groups or, lacking agreement, the best single record
// ABOUTME: Deterministic tie-breaking by score, accuracy, then fixed provider priority
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

//! Selector
//!
//! With at least one group of two or more members the answer is a consensus:
//! the best group wins and its most trusted, most accurate member represents
//! it. Otherwise every valid record competes on a composite score and the
//! winner's confidence depends on whether it stands on its own.

use crate::config::SelectionConfig;
use crate::reliability::SourceReliability;
use crate::scoring::{score_cmp, unit_clamp};
use crate::validation::completeness;
use nutriscan_core::{
    ConsensusGroup, Rationale, RawNutritionRecord, ReconciledNutrition, ValidatedResult,
};
use std::cmp::Ordering;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Selection failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// Neither a group nor a valid record was available
    #[error("no valid nutrition records to select from")]
    NoValidResults,
}

/// Chooses the reconciled record
#[derive(Debug, Clone)]
pub struct Selector {
    config: SelectionConfig,
    reliability: Arc<SourceReliability>,
}

impl Selector {
    /// Create a selector over a shared reliability table
    #[must_use]
    pub const fn new(config: SelectionConfig, reliability: Arc<SourceReliability>) -> Self {
        Self {
            config,
            reliability,
        }
    }

    /// Reliability table in use
    #[must_use]
    pub fn reliability(&self) -> &SourceReliability {
        &self.reliability
    }

    /// Select the final record
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::NoValidResults`] when no group reaches the
    /// consensus size and `results` holds no valid record.
    pub fn select(
        &self,
        groups: &[ConsensusGroup],
        results: &[ValidatedResult],
    ) -> Result<ReconciledNutrition, SelectionError> {
        if let Some(consensus) = self.best_group(groups).and_then(|g| self.from_group(g)) {
            return Ok(consensus);
        }
        self.best_single(results)
            .map(|winner| self.from_single(winner))
            .ok_or(SelectionError::NoValidResults)
    }

    fn best_group<'a>(&self, groups: &'a [ConsensusGroup]) -> Option<&'a ConsensusGroup> {
        groups
            .iter()
            .filter(|g| g.size() >= self.config.min_consensus_size)
            .max_by(|a, b| self.group_cmp(a, b))
    }

    fn group_cmp(&self, a: &ConsensusGroup, b: &ConsensusGroup) -> Ordering {
        score_cmp(a.group_score, b.group_score)
            .then_with(|| score_cmp(a.avg_accuracy(), b.avg_accuracy()))
            .then_with(|| match (a.earliest_member(), b.earliest_member()) {
                (Some(x), Some(y)) => self
                    .reliability
                    .priority_cmp(x.provider_id(), y.provider_id()),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            })
    }

    fn from_group(&self, group: &ConsensusGroup) -> Option<ReconciledNutrition> {
        let trust = |m: &ValidatedResult| self.reliability.weight(m.provider_id()) * m.accuracy_score;
        let representative = group
            .members
            .iter()
            .max_by(|a, b| {
                score_cmp(trust(a), trust(b)).then_with(|| {
                    self.reliability
                        .priority_cmp(a.provider_id(), b.provider_id())
                })
            })?
            .record
            .clone();

        let confidence = unit_clamp((group.group_score + self.config.consensus_bonus).min(1.0));
        debug!(
            provider = %representative.provider_id,
            group_size = group.size(),
            centroid = group.centroid_calories,
            confidence,
            "Selected consensus representative"
        );

        Some(ReconciledNutrition {
            record: representative,
            confidence,
            rationale: Rationale::Consensus,
            supporting_providers: group.providers(),
        })
    }

    /// Fallback composite used when no consensus exists
    #[must_use]
    pub fn composite_score(&self, result: &ValidatedResult) -> f64 {
        let cfg = &self.config;
        let reliability = self.reliability.weight(result.provider_id());
        let terms = [
            (cfg.reliability_weight, reliability),
            (cfg.accuracy_weight, result.accuracy_score),
            (cfg.completeness_weight, completeness(&result.record)),
            (cfg.brand_name_weight, brand_name_quality(&result.record)),
        ];
        unit_clamp(terms.iter().map(|(w, v)| w * v).sum())
    }

    fn best_single<'a>(&self, results: &'a [ValidatedResult]) -> Option<&'a ValidatedResult> {
        results.iter().filter(|r| r.is_valid).max_by(|a, b| {
            score_cmp(self.composite_score(a), self.composite_score(b)).then_with(|| {
                self.reliability
                    .priority_cmp(a.provider_id(), b.provider_id())
            })
        })
    }

    fn from_single(&self, winner: &ValidatedResult) -> ReconciledNutrition {
        let cfg = &self.config;
        let reliability = self.reliability.weight(winner.provider_id());
        let (rationale, confidence) = if reliability > cfg.single_reliable_min_reliability
            && winner.accuracy_score > cfg.single_reliable_min_accuracy
        {
            (Rationale::SingleReliable, winner.accuracy_score)
        } else {
            (
                Rationale::FallbackBest,
                winner.accuracy_score * cfg.uncorroborated_penalty,
            )
        };
        let confidence = unit_clamp(confidence);
        debug!(
            provider = %winner.provider_id(),
            reliability,
            accuracy = winner.accuracy_score,
            %rationale,
            confidence,
            "Selected single record"
        );

        ReconciledNutrition {
            record: winner.record.clone(),
            confidence,
            rationale,
            supporting_providers: vec![winner.provider_id().clone()],
        }
    }
}

/// 1.0 with brand and product name, 0.5 with one of them, 0 with neither
#[must_use]
pub fn brand_name_quality(record: &RawNutritionRecord) -> f64 {
    match (record.has_brand(), record.has_product_name()) {
        (true, true) => 1.0,
        (false, false) => 0.0,
        _ => 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutriscan_core::constants::providers;

    fn selector() -> Selector {
        Selector::new(
            SelectionConfig::default(),
            Arc::new(SourceReliability::default()),
        )
    }

    fn valid(provider: &str, calories: f64, accuracy: f64) -> ValidatedResult {
        ValidatedResult::valid(
            RawNutritionRecord {
                calories,
                ..RawNutritionRecord::new(provider, "Item")
            },
            accuracy,
        )
    }

    #[test]
    fn test_empty_input_fails() {
        assert_eq!(
            selector().select(&[], &[]),
            Err(SelectionError::NoValidResults)
        );
    }

    #[test]
    fn test_rejected_only_fails() {
        let rejected = ValidatedResult::rejected(RawNutritionRecord::new(providers::USDA, "x"));
        assert_eq!(
            selector().select(&[], &[rejected]),
            Err(SelectionError::NoValidResults)
        );
    }

    #[test]
    fn test_single_reliable_requires_both_thresholds() {
        let usda = valid(providers::USDA, 200.0, 0.9);
        let picked = selector().select(&[], &[usda]).unwrap();
        assert_eq!(picked.rationale, Rationale::SingleReliable);
        assert!((picked.confidence - 0.9).abs() < 1e-9);

        // Threshold is strict: exactly 0.7 accuracy falls back
        let borderline = valid(providers::USDA, 200.0, 0.7);
        let picked = selector().select(&[], &[borderline]).unwrap();
        assert_eq!(picked.rationale, Rationale::FallbackBest);
        assert!((picked.confidence - 0.49).abs() < 1e-9);
    }

    #[test]
    fn test_singleton_groups_do_not_count_as_consensus() {
        let only = valid(providers::EDAMAM, 200.0, 0.9);
        let group = ConsensusGroup {
            members: vec![only.clone()],
            centroid_calories: 200.0,
            group_score: 1.0,
        };
        let picked = selector().select(&[group], &[only]).unwrap();
        assert_ne!(picked.rationale, Rationale::Consensus);
    }

    #[test]
    fn test_brand_name_quality() {
        let named = RawNutritionRecord::new("x", "Oats");
        assert!((brand_name_quality(&named) - 0.5).abs() < f64::EPSILON);
        let branded = named.clone().with_brand(Some("Acme"));
        assert!((brand_name_quality(&branded) - 1.0).abs() < f64::EPSILON);
        let anonymous = RawNutritionRecord::new("x", " ");
        assert!(brand_name_quality(&anonymous).abs() < f64::EPSILON);
    }
}
