// ABOUTME: Core types and constants for the nutriscan nutrition reconciliation engine
// ABOUTME: Foundation crate with the nutrition data model, error handling, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

#![deny(unsafe_code)]

//! # Nutriscan Core
//!
//! Foundation crate providing shared types and constants for the nutrition
//! reconciliation engine. It changes rarely, so the provider, intelligence and
//! application crates can compile against it in parallel.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode` and `ErrorResponse`
//! - **models**: Queries, per-provider records, validated results, consensus groups
//!   and the final reconciled record
//! - **constants**: Provider identifiers, default timeouts and cache TTLs

/// Unified error handling system with standard error codes
pub mod errors;

/// Nutrition data model shared by every stage of reconciliation
pub mod models;

/// Application constants organized by domain
pub mod constants;

pub use errors::{AppError, AppResult, ErrorCode, ErrorResponse};
pub use models::{
    ConsensusGroup, IdentifierKind, NutritionQuery, ProviderId, RawNutritionRecord, Rationale,
    ReconciledNutrition, ValidatedResult,
};
