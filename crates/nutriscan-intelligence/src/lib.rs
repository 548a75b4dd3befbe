// ABOUTME: Nutrition plausibility validation, consensus grouping, and winner selection
// ABOUTME: Pure CPU-bound reconciliation logic with no I/O, shared by the orchestrator and tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

#![deny(unsafe_code)]

//! # Nutriscan Intelligence
//!
//! Everything that turns a pile of provider records into one answer:
//!
//! 1. [`Validator`] rejects physically impossible records and scores the rest
//! 2. [`ConsensusGrouper`] clusters valid records whose calories agree
//! 3. [`Selector`] picks a consensus representative, or the best lone record
//!
//! All three are deterministic: the same set of records, in any order,
//! produces the same reconciled output.

/// Algorithm parameters and their validation
pub mod config;
/// Calorie-agreement clustering
pub mod consensus;
/// Per-provider trust weights
pub mod reliability;
/// Numeric scoring helpers
pub mod scoring;
/// Final record selection
pub mod selection;
/// Hard rules and accuracy scoring
pub mod validation;

pub use config::{
    ConfigError, ConsensusConfig, ReconciliationTuning, SelectionConfig, ValidationConfig,
};
pub use consensus::ConsensusGrouper;
pub use reliability::SourceReliability;
pub use selection::{SelectionError, Selector};
pub use validation::{AccuracyBreakdown, RejectionReason, Validator};
