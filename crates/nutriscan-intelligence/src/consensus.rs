// ABOUTME: Clusters validated records by calorie agreement and scores each cluster
// ABOUTME: Running-mean single linkage over ascending calories with a bounded total spread
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

//! Consensus Grouper
//!
//! Valid records are sorted by calories and walked once. A record joins the
//! current group when it is within `tolerance` of the group's running mean
//! AND within `max_spread` of the group's first (smallest) member. The
//! second condition stops a chain of records that each creep just inside the
//! tolerance from growing into one group spanning far more than the tolerance.
//!
//! `group_score = 0.6 * min(size / total_valid, 1) + 0.4 * avg_accuracy`

use crate::config::ConsensusConfig;
use crate::scoring::unit_clamp;
use nutriscan_core::{ConsensusGroup, ValidatedResult};

/// Groups records that agree on calories
#[derive(Debug, Clone, Default)]
pub struct ConsensusGrouper {
    config: ConsensusConfig,
}

/// A group still being built during the walk
struct OpenGroup {
    members: Vec<ValidatedResult>,
    calorie_sum: f64,
    first_calories: f64,
}

impl OpenGroup {
    fn start(result: ValidatedResult) -> Self {
        let calories = result.record.calories;
        Self {
            members: vec![result],
            calorie_sum: calories,
            first_calories: calories,
        }
    }

    fn mean(&self) -> f64 {
        self.calorie_sum / self.members.len() as f64
    }

    fn push(&mut self, result: ValidatedResult) {
        self.calorie_sum += result.record.calories;
        self.members.push(result);
    }
}

impl ConsensusGrouper {
    /// Create a grouper with the given parameters
    #[must_use]
    pub const fn new(config: ConsensusConfig) -> Self {
        Self { config }
    }

    /// Parameters in use
    #[must_use]
    pub const fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Cluster the valid entries of `results`
    ///
    /// Invalid entries are ignored. The output is ordered by ascending
    /// centroid and is identical for any permutation of the input.
    #[must_use]
    pub fn group(&self, results: &[ValidatedResult]) -> Vec<ConsensusGroup> {
        let mut valid: Vec<ValidatedResult> =
            results.iter().filter(|r| r.is_valid).cloned().collect();
        if valid.is_empty() {
            return Vec::new();
        }
        valid.sort_by(|a, b| {
            a.record
                .calories
                .total_cmp(&b.record.calories)
                .then_with(|| a.provider_id().cmp(b.provider_id()))
                .then_with(|| b.accuracy_score.total_cmp(&a.accuracy_score))
        });

        let total_valid = valid.len();
        let mut finished: Vec<OpenGroup> = Vec::new();
        let mut current: Option<OpenGroup> = None;

        for result in valid {
            match current.as_mut() {
                Some(group) if self.joins(group, result.record.calories) => group.push(result),
                _ => {
                    if let Some(done) = current.replace(OpenGroup::start(result)) {
                        finished.push(done);
                    }
                }
            }
        }
        finished.extend(current);

        finished
            .into_iter()
            .map(|group| self.close(group, total_valid))
            .collect()
    }

    fn joins(&self, group: &OpenGroup, calories: f64) -> bool {
        let mean = group.mean();
        if mean <= 0.0 || group.first_calories <= 0.0 {
            // Relative distance is undefined; only exact agreement counts
            return (calories - mean).abs() < f64::EPSILON;
        }
        let near_mean = (calories - mean).abs() <= self.config.tolerance * mean;
        let within_spread =
            (calories - group.first_calories) / group.first_calories <= self.config.max_spread;
        near_mean && within_spread
    }

    fn close(&self, group: OpenGroup, total_valid: usize) -> ConsensusGroup {
        let centroid_calories = group.mean();
        let size = group.members.len();
        let normalized_size = (size as f64 / total_valid as f64).min(1.0);
        let avg_accuracy =
            group.members.iter().map(|m| m.accuracy_score).sum::<f64>() / size as f64;
        let group_score = unit_clamp(
            self.config
                .size_weight
                .mul_add(normalized_size, self.config.accuracy_weight * avg_accuracy),
        );

        ConsensusGroup {
            members: group.members,
            centroid_calories,
            group_score,
        }
    }
}
