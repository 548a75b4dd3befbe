// ABOUTME: Nutrition data model shared by adapters, validator, grouper, and selector
// ABOUTME: Query, provider record, validated result, consensus group, and reconciled output
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

//! Data model for one reconciliation.
//!
//! Data flows strictly forward through these types:
//! [`NutritionQuery`] → [`RawNutritionRecord`] (per provider) → [`ValidatedResult`]
//! → [`ConsensusGroup`] → [`ReconciledNutrition`]. None of them is shared
//! across queries.

mod query;
mod reconciled;
mod record;

pub use query::{IdentifierKind, NutritionQuery, QueryError};
pub use reconciled::{ConsensusGroup, Rationale, ReconciledNutrition, ValidatedResult};
pub use record::{ProviderId, RawNutritionRecord};
