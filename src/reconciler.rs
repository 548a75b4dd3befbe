// ABOUTME: Reconciler facade: query validation, fan-out, consensus grouping, and selection
// ABOUTME: Built once with adapters, reliability table, and tuning; shared across concurrent queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

//! # Reconciler
//!
//! One `reconcile` call walks `Dispatched -> Collecting -> (FastTrack |
//! AllCompleted | DeadlineReached) -> Grouped -> Selected | Failed`. Nothing
//! is retried inside the engine. A caller that gets `NoNutritionDataFound`
//! retries with a different query.
//!
//! The reconciler holds no per-query state, so one instance behind an `Arc`
//! serves any number of concurrent queries.

use crate::config::ReconcileConfig;
use crate::errors::ReconcileError;
use crate::logging::ReconcileLogger;
use crate::orchestrator::{FanOut, FanOutOutcome, RegisteredAdapter};
use nutriscan_core::{ConsensusGroup, NutritionQuery, ProviderId, ReconciledNutrition};
use nutriscan_intelligence::{
    ConsensusConfig, ConsensusGrouper, ReconciliationTuning, SourceReliability, Selector,
    Validator,
};
use nutriscan_providers::{CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot, SourceAdapter};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

/// The reconciliation engine
#[derive(Debug)]
pub struct Reconciler {
    sources: Vec<RegisteredAdapter>,
    reliability: Arc<SourceReliability>,
    validator: Validator,
    consensus: ConsensusConfig,
    selector: Selector,
    config: ReconcileConfig,
}

/// Builder for [`Reconciler`]
pub struct ReconcilerBuilder {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    reliability: SourceReliability,
    tuning: ReconciliationTuning,
    config: ReconcileConfig,
    breaker: CircuitBreakerConfig,
}

impl Default for ReconcilerBuilder {
    fn default() -> Self {
        Self {
            adapters: Vec::new(),
            reliability: SourceReliability::default(),
            tuning: ReconciliationTuning::default(),
            config: ReconcileConfig::default(),
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl ReconcilerBuilder {
    /// Add an adapter
    #[must_use]
    pub fn adapter(mut self, adapter: impl SourceAdapter + 'static) -> Self {
        self.adapters.push(Arc::new(adapter));
        self
    }

    /// Add an adapter that is shared with other owners
    #[must_use]
    pub fn shared_adapter(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Add several shared adapters
    #[must_use]
    pub fn adapters(mut self, adapters: impl IntoIterator<Item = Arc<dyn SourceAdapter>>) -> Self {
        self.adapters.extend(adapters);
        self
    }

    /// Replace the reliability table
    #[must_use]
    pub fn reliability(mut self, reliability: SourceReliability) -> Self {
        self.reliability = reliability;
        self
    }

    /// Replace the algorithm tuning
    ///
    /// The consensus tolerance and spread still come from the reconcile config.
    #[must_use]
    pub fn tuning(mut self, tuning: ReconciliationTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Replace the reconcile config
    #[must_use]
    pub fn config(mut self, config: ReconcileConfig) -> Self {
        self.config = config;
        self
    }

    /// Circuit breaker settings applied to every adapter
    #[must_use]
    pub fn circuit_breaker(mut self, breaker: CircuitBreakerConfig) -> Self {
        self.breaker = breaker;
        self
    }

    /// Validate everything and build
    ///
    /// Adapters with a provider id already registered are dropped.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::Configuration` for invalid config or tuning,
    /// and `ReconcileError::NoAdapters` when no adapter was added.
    pub fn build(self) -> Result<Reconciler, ReconcileError> {
        self.config.validate()?;
        let mut tuning = self.tuning;
        tuning.consensus = consensus_for(&tuning.consensus, &self.config);
        tuning.validate()?;

        let mut seen = HashSet::new();
        let mut sources = Vec::with_capacity(self.adapters.len());
        for adapter in self.adapters {
            let provider = adapter.provider_id().clone();
            if !seen.insert(provider.clone()) {
                warn!(provider = %provider, "Duplicate adapter ignored");
                continue;
            }
            if !self.reliability.contains(&provider) {
                warn!(provider = %provider, "Adapter has no reliability weight");
            }
            let breaker = CircuitBreaker::with_config(provider, self.breaker.clone());
            sources.push(RegisteredAdapter::new(adapter, breaker));
        }
        if sources.is_empty() {
            return Err(ReconcileError::NoAdapters);
        }

        let reliability = Arc::new(self.reliability);
        Ok(Reconciler {
            sources,
            validator: Validator::new(tuning.validation),
            consensus: tuning.consensus,
            selector: Selector::new(tuning.selection, Arc::clone(&reliability)),
            reliability,
            config: self.config,
        })
    }
}

/// Grouping parameters with the tolerance and spread taken from `config`
fn consensus_for(base: &ConsensusConfig, config: &ReconcileConfig) -> ConsensusConfig {
    ConsensusConfig {
        tolerance: config.consensus_tolerance,
        max_spread: config.consensus_max_spread,
        ..base.clone()
    }
}

impl Reconciler {
    /// Start building a reconciler
    #[must_use]
    pub fn builder() -> ReconcilerBuilder {
        ReconcilerBuilder::default()
    }

    /// Configuration used by [`Self::reconcile`]
    #[must_use]
    pub const fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// The shared reliability table
    #[must_use]
    pub fn reliability(&self) -> &SourceReliability {
        &self.reliability
    }

    /// Registered provider ids in registration order
    #[must_use]
    pub fn providers(&self) -> Vec<ProviderId> {
        self.sources
            .iter()
            .map(|source| source.provider_id().clone())
            .collect()
    }

    /// Current circuit breaker state of every adapter
    #[must_use]
    pub fn circuits(&self) -> Vec<CircuitSnapshot> {
        self.sources
            .iter()
            .map(|source| source.breaker().snapshot())
            .collect()
    }

    /// Reconcile `query` with the configuration given at build time
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::InvalidQuery` before dispatch for a malformed
    /// query, and `ReconcileError::NoNutritionDataFound` when no provider
    /// produced a valid record.
    pub async fn reconcile(
        &self,
        query: &NutritionQuery,
    ) -> Result<ReconciledNutrition, ReconcileError> {
        self.run(query, &self.config, &self.consensus).await
    }

    /// Reconcile `query` with a per-call configuration
    ///
    /// # Errors
    ///
    /// As [`Self::reconcile`], plus `ReconcileError::Configuration` when
    /// `config` is invalid.
    pub async fn reconcile_with(
        &self,
        query: &NutritionQuery,
        config: &ReconcileConfig,
    ) -> Result<ReconciledNutrition, ReconcileError> {
        config.validate()?;
        let consensus = consensus_for(&self.consensus, config);
        consensus.validate()?;
        self.run(query, config, &consensus).await
    }

    /// Fan out only, without grouping or selection
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::InvalidQuery` for a malformed query.
    pub async fn collect(&self, query: &NutritionQuery) -> Result<FanOutOutcome, ReconcileError> {
        query.validate()?;
        Ok(self.fan_out(query, &self.config).await)
    }

    async fn fan_out(&self, query: &NutritionQuery, config: &ReconcileConfig) -> FanOutOutcome {
        FanOut::new(config, &self.validator, &self.reliability)
            .run(query, &self.sources)
            .await
    }

    async fn run(
        &self,
        query: &NutritionQuery,
        config: &ReconcileConfig,
        consensus: &ConsensusConfig,
    ) -> Result<ReconciledNutrition, ReconcileError> {
        query.validate()?;

        let span = info_span!(
            "reconcile",
            run_id = %Uuid::new_v4(),
            identifier.kind = %query.identifier_kind,
            identifier = %query.identifier,
            portion_grams = query.portion_grams,
        );

        async {
            let started = Instant::now();
            let outcome = self.fan_out(query, config).await;
            ReconcileLogger::log_collected(
                outcome.termination,
                outcome.valid_results().count(),
                outcome.results.len(),
                outcome.elapsed,
            );

            let groups = ConsensusGrouper::new(consensus.clone()).group(&outcome.results);
            ReconcileLogger::log_grouped(
                groups.len(),
                groups.iter().map(ConsensusGroup::size).max().unwrap_or(0),
            );

            match self.selector.select(&groups, &outcome.results) {
                Ok(reconciled) => {
                    ReconcileLogger::log_selected(&reconciled, started.elapsed());
                    Ok(reconciled)
                }
                Err(_) => {
                    let summary = outcome.summary();
                    ReconcileLogger::log_failed(&summary, started.elapsed());
                    Err(ReconcileError::NoNutritionDataFound(summary))
                }
            }
        }
        .instrument(span)
        .await
    }
}
