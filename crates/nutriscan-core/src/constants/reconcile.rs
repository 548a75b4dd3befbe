// ABOUTME: Default timing and threshold values for a reconciliation run
// ABOUTME: Mirrors the documented defaults of ReconcileConfig
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

/// Hard upper bound on wall-clock time for one reconciliation (milliseconds)
pub const DEFAULT_GLOBAL_DEADLINE_MS: u64 = 8_000;

/// Per-adapter timeout enforced by the orchestrator (milliseconds)
pub const DEFAULT_PER_SOURCE_TIMEOUT_MS: u64 = 6_000;

/// Relative calorie tolerance against the running group mean
pub const DEFAULT_CONSENSUS_TOLERANCE: f64 = 0.15;

/// Maximum relative spread between the smallest and largest member of a group
pub const DEFAULT_CONSENSUS_MAX_SPREAD: f64 = 0.30;

/// Minimum accuracy score for a fast-track exit
pub const DEFAULT_FAST_TRACK_ACCURACY: f64 = 0.8;

/// Minimum source reliability for a fast-track exit
pub const DEFAULT_FAST_TRACK_RELIABILITY: f64 = 0.8;

/// Default portion when the caller does not supply one (grams)
pub const DEFAULT_PORTION_GRAMS: f64 = 100.0;

/// Largest portion a query may ask for, and largest serving a record may report (grams)
pub const MAX_PORTION_GRAMS: f64 = 2_000.0;

/// Shortest barcode accepted (EAN-8)
pub const MIN_BARCODE_DIGITS: usize = 8;

/// Longest barcode accepted (GTIN-14)
pub const MAX_BARCODE_DIGITS: usize = 14;
