// ABOUTME: Main library entry point for the nutriscan nutrition reconciliation engine
// ABOUTME: Fans a food query out to many nutrition sources and returns one trusted record
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

#![deny(unsafe_code)]

//! # Nutriscan
//!
//! Given a barcode or food name and a portion, nutriscan asks every
//! configured nutrition source in parallel, rejects physically implausible
//! answers, looks for sources that agree on calories, and returns a single
//! [`ReconciledNutrition`] with a confidence and a rationale.
//!
//! ## Architecture
//!
//! - **`nutriscan-core`**: data model, error codes, constants
//! - **`nutriscan-providers`**: `SourceAdapter` implementations and the circuit breaker
//! - **`nutriscan-intelligence`**: validator, consensus grouper, selector
//! - **this crate**: fan-out orchestration, the [`Reconciler`] facade,
//!   configuration, the provider registry, and a caller-side cache
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use nutriscan::{registry, NutritionQuery, ProviderCredentials, ReconcileConfig, Reconciler};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let adapters = registry::build_adapters(&ProviderCredentials::from_env()).await?;
//! let reconciler = Reconciler::builder()
//!     .adapters(adapters)
//!     .config(ReconcileConfig::from_env()?)
//!     .build()?;
//!
//! let result = reconciler
//!     .reconcile(&NutritionQuery::barcode("0001112223334", 30.0))
//!     .await?;
//! println!("{} kcal ({})", result.record.calories, result.rationale);
//! # Ok(())
//! # }
//! ```

/// Caller-side TTL cache around the reconciler
pub mod cache;

/// Reconcile, credential, and cache configuration
pub mod config;

/// Reconciliation failure types
pub mod errors;

/// Logging configuration and structured reconciliation events
pub mod logging;

/// Concurrent adapter fan-out
pub mod orchestrator;

/// The reconciliation facade
pub mod reconciler;

/// Adapter construction from credentials
pub mod registry;

pub use cache::CachedReconciler;
pub use config::{CacheConfig, ProviderCredentials, ReconcileConfig};
pub use errors::{FanOutSummary, ReconcileError};
pub use orchestrator::{AdapterAttempt, AttemptOutcome, FanOutOutcome, Termination};
pub use reconciler::{Reconciler, ReconcilerBuilder};

pub use nutriscan_core::{
    AppError, ErrorCode, ErrorResponse, IdentifierKind, NutritionQuery, ProviderId,
    Rationale, RawNutritionRecord, ReconciledNutrition,
};
pub use nutriscan_intelligence::{ReconciliationTuning, SourceReliability};
pub use nutriscan_providers::{CircuitBreakerConfig, SourceAdapter};
