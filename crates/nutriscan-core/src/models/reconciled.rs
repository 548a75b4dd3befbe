// ABOUTME: Validation, grouping, and final output types of a reconciliation
// ABOUTME: ValidatedResult, ConsensusGroup, Rationale, and ReconciledNutrition
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

use super::record::{ProviderId, RawNutritionRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A provider record after plausibility validation
///
/// `accuracy_score` is always within `[0, 1]` and is `0` for rejected records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedResult {
    /// The record that was validated
    pub record: RawNutritionRecord,
    /// Whether every hard rule passed
    pub is_valid: bool,
    /// Continuous plausibility score
    pub accuracy_score: f64,
}

impl ValidatedResult {
    /// A record that passed the hard rules, with its clamped score
    #[must_use]
    pub fn valid(record: RawNutritionRecord, accuracy_score: f64) -> Self {
        let accuracy_score = if accuracy_score.is_finite() {
            accuracy_score.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            record,
            is_valid: true,
            accuracy_score,
        }
    }

    /// A record that failed a hard rule
    #[must_use]
    pub const fn rejected(record: RawNutritionRecord) -> Self {
        Self {
            record,
            is_valid: false,
            accuracy_score: 0.0,
        }
    }

    /// Provider that produced the underlying record
    #[must_use]
    pub const fn provider_id(&self) -> &ProviderId {
        &self.record.provider_id
    }
}

/// Records whose calorie values agree within tolerance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusGroup {
    /// Members in the order they were added (ascending calories)
    pub members: Vec<ValidatedResult>,
    /// Mean calories of the members
    pub centroid_calories: f64,
    /// `0.6 * normalized_size + 0.4 * avg_accuracy`
    pub group_score: f64,
}

impl ConsensusGroup {
    /// Number of members
    #[must_use]
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Mean accuracy score of the members (0 for an empty group)
    #[must_use]
    pub fn avg_accuracy(&self) -> f64 {
        if self.members.is_empty() {
            return 0.0;
        }
        self.members.iter().map(|m| m.accuracy_score).sum::<f64>() / self.members.len() as f64
    }

    /// The first member added to the group
    #[must_use]
    pub fn earliest_member(&self) -> Option<&ValidatedResult> {
        self.members.first()
    }

    /// Providers contributing to this group, in member order
    #[must_use]
    pub fn providers(&self) -> Vec<ProviderId> {
        self.members.iter().map(|m| m.provider_id().clone()).collect()
    }
}

/// Why the engine picked the record it returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rationale {
    /// Two or more sources agreed on calories
    Consensus,
    /// No agreement, but the single winner is both reliable and accurate
    SingleReliable,
    /// No agreement; best available record, penalized for lack of corroboration
    FallbackBest,
    /// Nothing usable was found
    ///
    /// Never carried by a [`ReconciledNutrition`]; failed lookups report it
    /// alongside their fan-out summary so callers can persist the miss.
    NoneFound,
}

impl fmt::Display for Rationale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Consensus => "consensus",
            Self::SingleReliable => "single_reliable",
            Self::FallbackBest => "fallback_best",
            Self::NoneFound => "none_found",
        };
        f.write_str(label)
    }
}

/// The engine's sole output for a successful reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledNutrition {
    /// Best-estimate nutrition facts for the requested portion
    pub record: RawNutritionRecord,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    /// How the record was chosen
    pub rationale: Rationale,
    /// Providers that corroborate the record (just the winner when not consensus)
    pub supporting_providers: Vec<ProviderId>,
}
