// ABOUTME: Shared numeric helpers for plausibility scoring and deterministic ranking
// ABOUTME: Band (trapezoid) scoring and quantized float comparison
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

use std::cmp::Ordering;

/// Scores closer than this are treated as tied so tie-break rules apply
pub const SCORE_EPSILON: f64 = 1e-9;

/// Map `value` to `[0, 1]` with a trapezoid over four ordered points
///
/// Full score inside `[ideal_min, ideal_max]`, falling linearly to zero at
/// `hard_min` and `hard_max`. Non-finite input scores zero.
#[must_use]
pub fn band_score(value: f64, hard_min: f64, ideal_min: f64, ideal_max: f64, hard_max: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    if (ideal_min..=ideal_max).contains(&value) {
        return 1.0;
    }
    let score = if value < ideal_min {
        ramp(value, hard_min, ideal_min)
    } else {
        ramp(value, hard_max, ideal_max)
    };
    score.clamp(0.0, 1.0)
}

/// Linear ramp that is 0 at `zero_at` and 1 at `one_at`
fn ramp(value: f64, zero_at: f64, one_at: f64) -> f64 {
    let span = one_at - zero_at;
    if span.abs() < f64::EPSILON {
        return if (value - one_at).abs() < f64::EPSILON {
            1.0
        } else {
            0.0
        };
    }
    (value - zero_at) / span
}

/// Compare two scores after rounding both to a multiple of [`SCORE_EPSILON`]
///
/// Rounding first keeps the comparison a total order: scores in the same
/// bucket tie, so tie-break rules apply to them.
#[must_use]
pub fn score_cmp(a: f64, b: f64) -> Ordering {
    quantize(a).total_cmp(&quantize(b))
}

fn quantize(score: f64) -> f64 {
    (score / SCORE_EPSILON).round()
}

/// Clamp to `[0, 1]`, mapping NaN to zero
#[must_use]
pub fn unit_clamp(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_full_score_inside_ideal() {
        assert!((band_score(250.0, 1.0, 50.0, 800.0, 1000.0) - 1.0).abs() < f64::EPSILON);
        assert!((band_score(50.0, 1.0, 50.0, 800.0, 1000.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_band_decays_linearly() {
        // Halfway between 800 and 1000
        assert!((band_score(900.0, 1.0, 50.0, 800.0, 1000.0) - 0.5).abs() < 1e-12);
        // Halfway between 0.4 and 0.7
        assert!((band_score(0.55, 0.4, 0.7, 1.3, 1.4) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_band_zero_at_and_beyond_hard_bounds() {
        assert!(band_score(1000.0, 1.0, 50.0, 800.0, 1000.0).abs() < f64::EPSILON);
        assert!(band_score(2000.0, 1.0, 50.0, 800.0, 1000.0).abs() < f64::EPSILON);
        assert!(band_score(f64::NAN, 1.0, 50.0, 800.0, 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_score_cmp_epsilon() {
        assert_eq!(score_cmp(0.3, 0.1 + 0.2), Ordering::Equal);
        assert_eq!(score_cmp(0.5, 0.4), Ordering::Greater);
    }

    #[test]
    fn test_score_cmp_is_transitive_across_near_ties() {
        let scores: Vec<f64> = (0..12).map(|i| 0.8 + f64::from(i) * 0.3e-9).collect();
        for a in &scores {
            for b in &scores {
                for c in &scores {
                    let ab = score_cmp(*a, *b);
                    let bc = score_cmp(*b, *c);
                    if ab == bc {
                        assert_eq!(score_cmp(*a, *c), ab, "{a} {b} {c}");
                    }
                    if ab != Ordering::Greater && bc != Ordering::Greater {
                        assert_ne!(score_cmp(*a, *c), Ordering::Greater, "{a} {b} {c}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_score_cmp_sorts_near_ties_consistently() {
        let mut scores = vec![1.2e-9, 0.0, 0.6e-9, 0.4e-9];
        scores.sort_by(|a, b| score_cmp(*a, *b));
        assert_eq!(score_cmp(scores[0], scores[3]), Ordering::Less);
        assert!(scores.windows(2).all(|w| score_cmp(w[0], w[1]) != Ordering::Greater));
    }

    #[test]
    fn test_unit_clamp() {
        assert!(unit_clamp(f64::NAN).abs() < f64::EPSILON);
        assert!((unit_clamp(1.7) - 1.0).abs() < f64::EPSILON);
    }
}
