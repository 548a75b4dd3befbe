// ABOUTME: Concurrent fan-out of one query to every adapter under a global deadline and per-source timeouts
// ABOUTME: Validates records as they arrive and stops early once a trustworthy result lands
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

//! # Fan-out Orchestrator
//!
//! Each adapter call runs in its own task, wrapped (outermost first) in the
//! adapter's circuit breaker, a panic guard, and the per-source timeout. The
//! collector validates records in arrival order, on the basis each provider
//! reported, and scales the accepted ones to the portion. It stops at whichever comes
//! first: every task finished, the global deadline, or a fast-track hit.
//!
//! When the collector stops early it cancels the shared token and detaches
//! the remaining tasks. Adapters that honor the token drop their requests;
//! the rest are still bounded by their per-source timeout.

use crate::config::ReconcileConfig;
use crate::errors::FanOutSummary;
use crate::logging::ReconcileLogger;
use futures_util::FutureExt;
use nutriscan_core::{NutritionQuery, ProviderId, RawNutritionRecord, ValidatedResult};
use nutriscan_intelligence::{RejectionReason, SourceReliability, Validator};
use nutriscan_providers::{
    AdapterError, AdapterErrorKind, AdapterResult, CircuitBreaker, SourceAdapter,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// An adapter together with its circuit breaker
#[derive(Clone)]
pub struct RegisteredAdapter {
    adapter: Arc<dyn SourceAdapter>,
    breaker: Arc<CircuitBreaker>,
}

impl RegisteredAdapter {
    /// Pair `adapter` with `breaker`
    #[must_use]
    pub fn new(adapter: Arc<dyn SourceAdapter>, breaker: CircuitBreaker) -> Self {
        Self {
            adapter,
            breaker: Arc::new(breaker),
        }
    }

    /// The adapter's provider id
    #[must_use]
    pub fn provider_id(&self) -> &ProviderId {
        self.adapter.provider_id()
    }

    /// The adapter
    #[must_use]
    pub fn adapter(&self) -> &Arc<dyn SourceAdapter> {
        &self.adapter
    }

    /// The adapter's circuit breaker
    #[must_use]
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

impl std::fmt::Debug for RegisteredAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredAdapter")
            .field("provider", self.provider_id())
            .field("circuit", &self.breaker.state())
            .finish()
    }
}

/// Why the collector stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// A result met both fast-track thresholds
    FastTrack,
    /// Every dispatched adapter finished
    AllCompleted,
    /// The global deadline fired first
    DeadlineReached,
}

/// How one adapter's call ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The record passed validation
    Accepted {
        /// Its accuracy score
        accuracy: f64,
    },
    /// The record failed a hard rule
    Rejected {
        /// The rule it failed
        reason: RejectionReason,
    },
    /// The adapter reported an error, or its circuit was open
    Failed {
        /// Error category
        kind: AdapterErrorKind,
    },
    /// The adapter panicked
    Panicked,
    /// The fan-out ended before this adapter answered
    Abandoned,
}

/// One adapter's part in a fan-out
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterAttempt {
    /// Which adapter
    pub provider: ProviderId,
    /// How it ended
    pub outcome: AttemptOutcome,
    /// Time from dispatch to answer, or to the end of the fan-out if abandoned
    pub elapsed: Duration,
}

/// Everything one fan-out produced
#[derive(Debug, Clone)]
pub struct FanOutOutcome {
    /// Validated results, valid and rejected, in arrival order
    pub results: Vec<ValidatedResult>,
    /// One entry per supporting adapter
    pub attempts: Vec<AdapterAttempt>,
    /// Why collection stopped
    pub termination: Termination,
    /// Wall-clock time of the fan-out
    pub elapsed: Duration,
}

impl FanOutOutcome {
    /// Results that passed validation
    pub fn valid_results(&self) -> impl Iterator<Item = &ValidatedResult> {
        self.results.iter().filter(|result| result.is_valid)
    }

    /// Fold attempts into counts
    #[must_use]
    pub fn summary(&self) -> FanOutSummary {
        let mut summary = FanOutSummary::default();
        for attempt in &self.attempts {
            match &attempt.outcome {
                AttemptOutcome::Failed {
                    kind: AdapterErrorKind::CircuitOpen,
                } => {
                    summary.skipped += 1;
                    continue;
                }
                AttemptOutcome::Accepted { .. } => summary.responded += 1,
                AttemptOutcome::Rejected { .. } => {
                    summary.responded += 1;
                    summary.rejected += 1;
                }
                AttemptOutcome::Failed { kind } => {
                    *summary.failures.entry(*kind).or_insert(0) += 1;
                }
                AttemptOutcome::Panicked => summary.panicked += 1,
                AttemptOutcome::Abandoned => summary.abandoned += 1,
            }
            summary.dispatched += 1;
        }
        summary
    }
}

/// What a task hands back to the collector
struct TaskReport {
    provider: ProviderId,
    elapsed: Duration,
    result: TaskResult,
}

enum TaskResult {
    Answered(AdapterResult<RawNutritionRecord>),
    Panicked,
}

/// Runs one query against a set of adapters
pub struct FanOut<'a> {
    config: &'a ReconcileConfig,
    validator: &'a Validator,
    reliability: &'a SourceReliability,
}

impl<'a> FanOut<'a> {
    /// Borrow the pieces a fan-out reads
    #[must_use]
    pub const fn new(
        config: &'a ReconcileConfig,
        validator: &'a Validator,
        reliability: &'a SourceReliability,
    ) -> Self {
        Self {
            config,
            validator,
            reliability,
        }
    }

    /// Query every adapter that supports the query's identifier kind
    ///
    /// Never fails: adapter errors, panics, and timeouts become attempts.
    /// An empty `results` is the caller's signal that nothing usable came back.
    pub async fn run(&self, query: &NutritionQuery, sources: &[RegisteredAdapter]) -> FanOutOutcome {
        let started = Instant::now();
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();
        let mut pending = BTreeSet::new();

        for source in sources {
            if !source.adapter.supports(query.identifier_kind) {
                ReconcileLogger::log_adapter_unsupported(source.provider_id(), query);
                continue;
            }
            pending.insert(source.provider_id().clone());
            tasks.spawn(call_adapter(
                source.clone(),
                query.clone(),
                self.config.per_source_timeout,
                cancel.clone(),
            ));
        }
        ReconcileLogger::log_dispatched(pending.len());

        let mut results = Vec::with_capacity(pending.len());
        let mut attempts = Vec::with_capacity(pending.len());
        let deadline = tokio::time::sleep(self.config.global_deadline);
        tokio::pin!(deadline);

        let termination = loop {
            tokio::select! {
                () = &mut deadline => break Termination::DeadlineReached,
                joined = tasks.join_next() => match joined {
                    None => break Termination::AllCompleted,
                    Some(Ok(report)) => {
                        pending.remove(&report.provider);
                        let fast_track =
                            self.collect(report, query.portion_grams, &mut results, &mut attempts);
                        if fast_track {
                            break Termination::FastTrack;
                        }
                    }
                    Some(Err(err)) => {
                        // Tasks are never aborted and panics are caught inside them
                        warn!(error = %err, "Adapter task ended unexpectedly");
                    }
                },
            }
        };

        cancel.cancel();
        tasks.detach_all();

        let elapsed = started.elapsed();
        for provider in pending {
            ReconcileLogger::log_adapter_abandoned(&provider, termination);
            attempts.push(AdapterAttempt {
                provider,
                outcome: AttemptOutcome::Abandoned,
                elapsed,
            });
        }

        FanOutOutcome {
            results,
            attempts,
            termination,
            elapsed,
        }
    }

    /// Validate one report; returns whether it meets the fast-track condition
    ///
    /// Hard rules run on the record as the provider reported it. Only an
    /// accepted record is scaled to `portion_grams`.
    fn collect(
        &self,
        report: TaskReport,
        portion_grams: f64,
        results: &mut Vec<ValidatedResult>,
        attempts: &mut Vec<AdapterAttempt>,
    ) -> bool {
        let TaskReport {
            provider,
            elapsed,
            result,
        } = report;

        let outcome = match result {
            TaskResult::Panicked => {
                ReconcileLogger::log_adapter_panicked(&provider);
                AttemptOutcome::Panicked
            }
            TaskResult::Answered(Err(err)) => {
                ReconcileLogger::log_adapter_failed(&err, elapsed);
                AttemptOutcome::Failed { kind: err.kind }
            }
            TaskResult::Answered(Ok(record)) => match self.validator.assess(&record) {
                Ok(breakdown) => {
                    ReconcileLogger::log_record_accepted(&record, breakdown.total, elapsed);
                    results.push(ValidatedResult::valid(
                        record.scaled_to_portion(portion_grams),
                        breakdown.total,
                    ));
                    AttemptOutcome::Accepted {
                        accuracy: breakdown.total,
                    }
                }
                Err(reason) => {
                    ReconcileLogger::log_record_rejected(&record, &reason);
                    results.push(ValidatedResult::rejected(record));
                    AttemptOutcome::Rejected { reason }
                }
            },
        };

        let fast_track = match outcome {
            AttemptOutcome::Accepted { accuracy } => self.is_fast_track(&provider, accuracy),
            _ => false,
        };
        attempts.push(AdapterAttempt {
            provider,
            outcome,
            elapsed,
        });
        fast_track
    }

    fn is_fast_track(&self, provider: &ProviderId, accuracy: f64) -> bool {
        self.config.fast_track_enabled
            && accuracy >= self.config.fast_track_accuracy_threshold
            && self.reliability.weight(provider) >= self.config.fast_track_reliability_threshold
    }
}

/// One adapter call, bounded by the per-source timeout and its breaker
async fn call_adapter(
    source: RegisteredAdapter,
    query: NutritionQuery,
    timeout: Duration,
    cancel: CancellationToken,
) -> TaskReport {
    let started = Instant::now();
    let provider = source.provider_id().clone();

    // A panic is an adapter bug and says nothing about the source, so the
    // breaker treats it like a cancelled call.
    let mut panicked = false;
    let result = source
        .breaker
        .call(async {
            let fetch = source.adapter.fetch(&query, timeout, &cancel);
            match AssertUnwindSafe(tokio::time::timeout(timeout, fetch))
                .catch_unwind()
                .await
            {
                Ok(Ok(result)) => result,
                Ok(Err(_elapsed)) => Err(AdapterError::timeout(
                    provider.clone(),
                    timeout.as_millis(),
                )),
                Err(_panic) => {
                    panicked = true;
                    Err(AdapterError::new(
                        provider.clone(),
                        AdapterErrorKind::Cancelled,
                        "adapter panicked",
                    ))
                }
            }
        })
        .await;

    TaskReport {
        provider,
        elapsed: started.elapsed(),
        result: if panicked {
            TaskResult::Panicked
        } else {
            TaskResult::Answered(result)
        },
    }
}
