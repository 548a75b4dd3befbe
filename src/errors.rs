// ABOUTME: Reconciliation failure type and the fan-out summary it carries
// ABOUTME: Distinguishes "no data for this item" from "providers temporarily unreachable"
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

//! # Reconciliation Errors
//!
//! Adapter failures and validation rejections never surface individually.
//! They are counted into a [`FanOutSummary`], which only reaches the caller
//! when the whole reconciliation comes up empty.

use nutriscan_core::models::QueryError;
use nutriscan_core::{AppError, ErrorCode, Rationale};
use nutriscan_intelligence::ConfigError;
use nutriscan_providers::AdapterErrorKind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// What happened to each provider during one fan-out
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FanOutSummary {
    /// Adapters whose call was actually started
    pub dispatched: usize,
    /// Adapters skipped because their circuit breaker was open
    pub skipped: usize,
    /// Adapters that returned a record
    pub responded: usize,
    /// Returned records that failed the plausibility rules
    pub rejected: usize,
    /// Adapter failures by kind, circuit-open skips excluded
    pub failures: BTreeMap<AdapterErrorKind, usize>,
    /// Adapters still pending when the fan-out ended
    pub abandoned: usize,
    /// Adapters that panicked
    pub panicked: usize,
}

impl FanOutSummary {
    /// Failures of `kind`
    #[must_use]
    pub fn failures_of(&self, kind: AdapterErrorKind) -> usize {
        self.failures.get(&kind).copied().unwrap_or(0)
    }

    /// Whether retrying later could plausibly help
    ///
    /// True when no adapter produced a record and at least one was
    /// unreachable: it timed out, hit a network error, sat behind an open
    /// circuit, or was still pending at the deadline.
    #[must_use]
    pub fn is_temporarily_unreachable(&self) -> bool {
        if self.responded > 0 {
            return false;
        }
        let unreachable: usize = self
            .failures
            .iter()
            .filter(|(kind, _)| kind.is_unreachable())
            .map(|(_, count)| count)
            .sum();
        unreachable + self.skipped + self.abandoned > 0
    }
}

impl fmt::Display for FanOutSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} dispatched, {} skipped, {} responded, {} rejected, {} abandoned",
            self.dispatched, self.skipped, self.responded, self.rejected, self.abandoned
        )
    }
}

/// Why a reconciliation produced no record
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// No provider returned a valid record
    #[error("no nutrition data found ({0})")]
    NoNutritionDataFound(FanOutSummary),

    /// The reconcile configuration is malformed
    #[error("invalid reconcile configuration: {0}")]
    Configuration(#[from] ConfigError),

    /// The query was refused before dispatch
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] QueryError),

    /// The reconciler has no adapters to ask
    #[error("no source adapters configured")]
    NoAdapters,
}

impl ReconcileError {
    /// Fan-out report, when the failure happened after dispatch
    #[must_use]
    pub const fn summary(&self) -> Option<&FanOutSummary> {
        match self {
            Self::NoNutritionDataFound(summary) => Some(summary),
            _ => None,
        }
    }

    /// Rationale to record for a failed lookup
    ///
    /// Only an empty fan-out has one: [`Rationale::NoneFound`]. Refused
    /// queries and misconfiguration never reached the providers.
    #[must_use]
    pub const fn rationale(&self) -> Option<Rationale> {
        match self {
            Self::NoNutritionDataFound(_) => Some(Rationale::NoneFound),
            _ => None,
        }
    }

    /// Whether the caller should offer a retry rather than manual entry
    #[must_use]
    pub fn is_temporarily_unreachable(&self) -> bool {
        self.summary()
            .is_some_and(FanOutSummary::is_temporarily_unreachable)
    }
}

impl From<ReconcileError> for AppError {
    fn from(error: ReconcileError) -> Self {
        match error {
            ReconcileError::NoNutritionDataFound(summary) => {
                let code = if summary.is_temporarily_unreachable() {
                    ErrorCode::ExternalServiceUnavailable
                } else {
                    ErrorCode::ResourceNotFound
                };
                let mut details = serde_json::to_value(&summary).unwrap_or_default();
                if let Some(fields) = details.as_object_mut() {
                    fields.insert(
                        "rationale".to_owned(),
                        serde_json::Value::String(Rationale::NoneFound.to_string()),
                    );
                }
                Self::new(code, format!("No nutrition data found ({summary})")).with_details(details)
            }
            ReconcileError::Configuration(err) => Self::config(err.to_string()).with_source(err),
            ReconcileError::InvalidQuery(err) => {
                Self::invalid_input(err.to_string()).with_source(err)
            }
            ReconcileError::NoAdapters => Self::config("No source adapters configured"),
        }
    }
}
