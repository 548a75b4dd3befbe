// ABOUTME: The SourceAdapter contract every nutrition data provider implements
// ABOUTME: One query in, one normalized record or a per-source error out, with cooperative cancellation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

//! # Source Adapters
//!
//! An adapter knows how to ask one provider about one food and how to turn
//! the answer into a [`RawNutritionRecord`]. It does no validation or
//! scoring. Provider DTOs stay private to each adapter module; only the
//! normalized record crosses this boundary.
//!
//! The orchestrator enforces timeouts itself, so an adapter that ignores the
//! `timeout` hint still cannot stall a reconciliation. Adapters should still
//! pass the hint to their HTTP client and watch `cancel` so abandoned calls
//! release their connection promptly.

use crate::errors::AdapterResult;
use async_trait::async_trait;
use nutriscan_core::{IdentifierKind, NutritionQuery, ProviderId, RawNutritionRecord};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A nutrition data provider
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable provider id, the key into the reliability table
    fn provider_id(&self) -> &ProviderId;

    /// Whether this provider can answer queries of `kind`
    ///
    /// Adapters that return `false` are not dispatched for that query.
    fn supports(&self, kind: IdentifierKind) -> bool {
        let _ = kind;
        true
    }

    /// Look up `query`
    ///
    /// The record describes the provider's own basis: `serving_grams` is the
    /// serving (or 100 g reference) the provider reported values for. The
    /// orchestrator validates it as reported and scales it to the portion.
    ///
    /// # Errors
    ///
    /// Returns an [`AdapterError`](crate::AdapterError) when the provider is
    /// unreachable, has no match, answers with an unusable payload, or the
    /// call is cancelled.
    async fn fetch(
        &self,
        query: &NutritionQuery,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> AdapterResult<RawNutritionRecord>;
}
