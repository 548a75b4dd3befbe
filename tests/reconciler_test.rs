// ABOUTME: End-to-end reconciliation tests driving the fan-out with scripted adapters on paused time
// ABOUTME: Covers fast-track, deadlines, per-source timeouts, panics, circuit breaking, and selection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{carb_record, complete_record, no_fast_track, reconciler_with};
use nutriscan::{
    AppError, AttemptOutcome, ErrorCode, NutritionQuery, Rationale, ReconcileConfig,
    ReconcileError, Reconciler, Termination,
};
use nutriscan_core::constants::providers;
use nutriscan_core::models::QueryError;
use nutriscan_core::RawNutritionRecord;
use nutriscan_intelligence::RejectionReason;
use nutriscan_providers::{AdapterErrorKind, CircuitBreakerConfig, CircuitState, ScriptedAdapter};
use std::time::Duration;

fn granola_barcode() -> NutritionQuery {
    NutritionQuery::barcode("0001112223334", 100.0)
}

fn outcome_of<'a>(attempts: &'a [nutriscan::AdapterAttempt], provider: &str) -> &'a AttemptOutcome {
    &attempts
        .iter()
        .find(|attempt| attempt.provider.as_str() == provider)
        .unwrap_or_else(|| panic!("no attempt recorded for {provider}"))
        .outcome
}

// === Early termination ===

#[tokio::test(start_paused = true)]
async fn test_fast_track_stops_waiting_for_slow_sources() {
    let fast = ScriptedAdapter::returning(providers::NUTRITIONIX, complete_record("x"))
        .with_delay(Duration::from_millis(10));
    let slow = ScriptedAdapter::returning(providers::USDA, complete_record("x"))
        .with_delay(Duration::from_secs(60));

    let reconciler = reconciler_with(vec![fast, slow.clone()], ReconcileConfig::default());
    let outcome = reconciler.collect(&granola_barcode()).await.unwrap();

    assert_eq!(outcome.termination, Termination::FastTrack);
    assert!(outcome.elapsed < Duration::from_secs(1));
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(
        outcome_of(&outcome.attempts, providers::USDA),
        &AttemptOutcome::Abandoned
    );
    assert_eq!(slow.calls(), 1);
    assert_eq!(slow.completed(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_fast_track_result_is_the_trusted_record() {
    let fast = ScriptedAdapter::returning(providers::NUTRITIONIX, complete_record("x"))
        .with_delay(Duration::from_millis(10));
    let slow = ScriptedAdapter::returning(providers::EDAMAM, carb_record("x", 900.0))
        .with_delay(Duration::from_secs(60));

    let reconciler = reconciler_with(vec![fast, slow], ReconcileConfig::default());
    let picked = reconciler.reconcile(&granola_barcode()).await.unwrap();

    assert_eq!(picked.record.provider_id.as_str(), providers::NUTRITIONIX);
    assert!((picked.record.calories - 296.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_low_reliability_source_does_not_fast_track() {
    let upc = ScriptedAdapter::returning(providers::UPC_DATABASE, complete_record("x"))
        .with_delay(Duration::from_millis(10));
    let usda = ScriptedAdapter::returning(providers::USDA, complete_record("x"))
        .with_delay(Duration::from_secs(2));

    let reconciler = reconciler_with(vec![upc, usda.clone()], ReconcileConfig::default());
    let outcome = reconciler.collect(&granola_barcode()).await.unwrap();

    assert_eq!(outcome.termination, Termination::FastTrack);
    assert_eq!(outcome.results.len(), 2);
    assert_eq!(usda.completed(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_all_completed_without_fast_track() {
    let a = ScriptedAdapter::returning(providers::NUTRITIONIX, complete_record("x"));
    let b = ScriptedAdapter::returning(providers::USDA, complete_record("x"))
        .with_delay(Duration::from_millis(500));

    let reconciler = reconciler_with(vec![a, b.clone()], no_fast_track());
    let outcome = reconciler.collect(&granola_barcode()).await.unwrap();

    assert_eq!(outcome.termination, Termination::AllCompleted);
    assert_eq!(outcome.attempts.len(), 2);
    assert_eq!(b.completed(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_global_deadline_abandons_pending_sources() {
    let slow = ScriptedAdapter::returning(providers::USDA, complete_record("x"))
        .with_delay(Duration::from_secs(30));
    let config = ReconcileConfig {
        global_deadline: Duration::from_secs(1),
        ..ReconcileConfig::default()
    };

    let reconciler = reconciler_with(vec![slow.clone()], config);
    let outcome = reconciler.collect(&granola_barcode()).await.unwrap();

    assert_eq!(outcome.termination, Termination::DeadlineReached);
    assert!(outcome.elapsed >= Duration::from_secs(1));
    assert!(outcome.elapsed < Duration::from_secs(2));
    assert_eq!(
        outcome_of(&outcome.attempts, providers::USDA),
        &AttemptOutcome::Abandoned
    );
    assert_eq!(slow.completed(), 0);

    let err = reconciler.reconcile(&granola_barcode()).await.unwrap_err();
    let summary = err.summary().unwrap();
    assert_eq!(summary.abandoned, 1);
    assert!(err.is_temporarily_unreachable());
}

#[tokio::test(start_paused = true)]
async fn test_per_source_timeout_bounds_an_adapter_that_ignores_cancel() {
    let stuck = ScriptedAdapter::returning(providers::USDA, complete_record("x"))
        .with_delay(Duration::from_secs(30))
        .ignoring_cancel();
    let config = ReconcileConfig {
        per_source_timeout: Duration::from_secs(1),
        ..ReconcileConfig::default()
    };

    let reconciler = reconciler_with(vec![stuck.clone()], config);
    let outcome = reconciler.collect(&granola_barcode()).await.unwrap();

    assert_eq!(outcome.termination, Termination::AllCompleted);
    assert_eq!(
        outcome_of(&outcome.attempts, providers::USDA),
        &AttemptOutcome::Failed {
            kind: AdapterErrorKind::Timeout
        }
    );
    assert!(outcome.elapsed < Duration::from_secs(2));
    assert_eq!(stuck.completed(), 0);
}

// === Failure isolation ===

#[tokio::test(start_paused = true)]
async fn test_panicking_adapter_is_treated_as_absent() {
    let broken = ScriptedAdapter::panicking(providers::EDAMAM);
    let good = ScriptedAdapter::returning(providers::OPEN_FOOD_FACTS, carb_record("x", 240.0))
        .with_delay(Duration::from_millis(50));

    let reconciler = reconciler_with(vec![broken, good], no_fast_track());
    let outcome = reconciler.collect(&granola_barcode()).await.unwrap();
    assert_eq!(
        outcome_of(&outcome.attempts, providers::EDAMAM),
        &AttemptOutcome::Panicked
    );
    assert_eq!(outcome.summary().panicked, 1);

    let picked = reconciler.reconcile(&granola_barcode()).await.unwrap();
    assert_eq!(picked.record.provider_id.as_str(), providers::OPEN_FOOD_FACTS);
}

#[tokio::test(start_paused = true)]
async fn test_not_found_everywhere_maps_to_resource_not_found() {
    let adapters = vec![
        ScriptedAdapter::failing(providers::USDA, AdapterErrorKind::NotFound),
        ScriptedAdapter::failing(providers::EDAMAM, AdapterErrorKind::NotFound),
    ];
    let reconciler = reconciler_with(adapters, ReconcileConfig::default());

    let err = reconciler.reconcile(&granola_barcode()).await.unwrap_err();
    let summary = err.summary().unwrap();
    assert_eq!(summary.dispatched, 2);
    assert_eq!(summary.failures_of(AdapterErrorKind::NotFound), 2);
    assert!(!err.is_temporarily_unreachable());
    assert_eq!(err.rationale(), Some(Rationale::NoneFound));

    let app: AppError = err.into();
    assert_eq!(app.code, ErrorCode::ResourceNotFound);
    assert_eq!(app.details["dispatched"], 2);
    assert_eq!(app.details["rationale"], "none_found");
}

#[tokio::test(start_paused = true)]
async fn test_network_errors_everywhere_map_to_unavailable() {
    let adapters = vec![
        ScriptedAdapter::failing(providers::USDA, AdapterErrorKind::NetworkError),
        ScriptedAdapter::failing(providers::NUTRITIONIX, AdapterErrorKind::Timeout),
    ];
    let reconciler = reconciler_with(adapters, ReconcileConfig::default());

    let app: AppError = reconciler
        .reconcile(&granola_barcode())
        .await
        .unwrap_err()
        .into();
    assert_eq!(app.code, ErrorCode::ExternalServiceUnavailable);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_records_only_is_no_data() {
    let negative = RawNutritionRecord {
        calories: -40.0,
        ..RawNutritionRecord::new("x", "Broken")
    };
    let reconciler = reconciler_with(
        vec![ScriptedAdapter::returning(providers::USDA, negative)],
        ReconcileConfig::default(),
    );

    let err = reconciler.reconcile(&granola_barcode()).await.unwrap_err();
    let summary = err.summary().unwrap();
    assert_eq!(summary.responded, 1);
    assert_eq!(summary.rejected, 1);
    assert!(!err.is_temporarily_unreachable());
}

#[tokio::test(start_paused = true)]
async fn test_panicking_adapter_never_opens_its_circuit() {
    let broken = ScriptedAdapter::panicking(providers::EDAMAM);
    let reconciler = Reconciler::builder()
        .adapter(broken.clone())
        .circuit_breaker(CircuitBreakerConfig::new(1, Duration::from_secs(60), 1))
        .build()
        .unwrap();

    for _ in 0..2 {
        let err = reconciler.reconcile(&granola_barcode()).await.unwrap_err();
        assert_eq!(err.summary().unwrap().panicked, 1);
    }
    assert_eq!(reconciler.circuits()[0].state, CircuitState::Closed);
    assert_eq!(broken.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_open_circuit_skips_the_adapter() {
    let flaky = ScriptedAdapter::failing(providers::USDA, AdapterErrorKind::NetworkError);
    let reconciler = Reconciler::builder()
        .adapter(flaky.clone())
        .circuit_breaker(CircuitBreakerConfig::new(1, Duration::from_secs(60), 1))
        .build()
        .unwrap();

    let first = reconciler.reconcile(&granola_barcode()).await.unwrap_err();
    assert_eq!(
        first
            .summary()
            .unwrap()
            .failures_of(AdapterErrorKind::NetworkError),
        1
    );
    assert_eq!(reconciler.circuits()[0].state, CircuitState::Open);

    let second = reconciler.reconcile(&granola_barcode()).await.unwrap_err();
    let summary = second.summary().unwrap();
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.dispatched, 0);
    assert!(second.is_temporarily_unreachable());
    assert_eq!(flaky.calls(), 1);
}

// === Selection through the engine ===

#[tokio::test(start_paused = true)]
async fn test_consensus_outvotes_reliable_outlier() {
    let adapters = vec![
        ScriptedAdapter::returning(providers::NUTRITIONIX, carb_record("x", 200.0)),
        ScriptedAdapter::returning(providers::OPEN_FOOD_FACTS, carb_record("x", 210.0)),
        ScriptedAdapter::returning(providers::UPC_DATABASE, carb_record("x", 205.0)),
        ScriptedAdapter::returning(providers::USDA, carb_record("x", 800.0)),
    ];
    let reconciler = reconciler_with(adapters, no_fast_track());

    let picked = reconciler.reconcile(&granola_barcode()).await.unwrap();

    assert_eq!(picked.rationale, Rationale::Consensus);
    assert_eq!(picked.record.provider_id.as_str(), providers::NUTRITIONIX);
    assert_eq!(picked.supporting_providers.len(), 3);
    assert!(!picked
        .supporting_providers
        .iter()
        .any(|p| p.as_str() == providers::USDA));
}

#[tokio::test(start_paused = true)]
async fn test_single_open_food_facts_result() {
    let record = RawNutritionRecord {
        calories: 250.0,
        protein_g: 10.0,
        carbs_g: 30.0,
        fat_g: 8.0,
        ..RawNutritionRecord::new("x", "Cereal bar")
    };
    let reconciler = reconciler_with(
        vec![ScriptedAdapter::returning(providers::OPEN_FOOD_FACTS, record)],
        ReconcileConfig::default(),
    );

    let picked = reconciler.reconcile(&granola_barcode()).await.unwrap();
    assert_eq!(picked.rationale, Rationale::FallbackBest);
    assert!((picked.confidence - 0.63).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_records_are_scaled_to_the_portion() {
    let reconciler = reconciler_with(
        vec![ScriptedAdapter::returning(
            providers::NUTRITIONIX,
            complete_record("x"),
        )],
        ReconcileConfig::default(),
    );

    let picked = reconciler
        .reconcile(&NutritionQuery::barcode("0001112223334", 30.0))
        .await
        .unwrap();
    assert!((picked.record.calories - 88.8).abs() < 1e-9);
    assert!((picked.record.serving_grams - 30.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_implausible_provider_serving_is_rejected_before_scaling() {
    let huge_serving = RawNutritionRecord {
        serving_grams: 5_000.0,
        calories: 10_000.0,
        carbs_g: 2_500.0,
        ..RawNutritionRecord::new("x", "Soup")
    };
    let reconciler = reconciler_with(
        vec![ScriptedAdapter::returning(providers::USDA, huge_serving)],
        ReconcileConfig::default(),
    );

    let outcome = reconciler.collect(&granola_barcode()).await.unwrap();
    assert!(matches!(
        outcome_of(&outcome.attempts, providers::USDA),
        AttemptOutcome::Rejected {
            reason: RejectionReason::ServingOutOfRange(grams)
        } if (*grams - 5_000.0).abs() < 1e-9
    ));

    let err = reconciler.reconcile(&granola_barcode()).await.unwrap_err();
    assert_eq!(err.summary().unwrap().rejected, 1);
}

#[tokio::test(start_paused = true)]
async fn test_large_portion_of_small_serving_is_accepted() {
    let sachet = RawNutritionRecord {
        serving_grams: 30.0,
        calories: 120.0,
        carbs_g: 30.0,
        ..RawNutritionRecord::new("x", "Oat sachet")
    };
    let reconciler = reconciler_with(
        vec![ScriptedAdapter::returning(providers::USDA, sachet)],
        ReconcileConfig::default(),
    );

    let picked = reconciler
        .reconcile(&NutritionQuery::name("oats", 1_500.0))
        .await
        .unwrap();
    assert!((picked.record.serving_grams - 1_500.0).abs() < 1e-9);
    assert!((picked.record.calories - 6_000.0).abs() < 1e-6);
}

#[tokio::test(start_paused = true)]
async fn test_reconcile_with_overrides_consensus_tolerance() {
    let adapters = vec![
        ScriptedAdapter::returning(providers::EDAMAM, carb_record("x", 200.0)),
        ScriptedAdapter::returning(providers::SPOONACULAR, carb_record("x", 220.0)),
    ];
    let reconciler = reconciler_with(adapters, no_fast_track());

    let loose = reconciler.reconcile(&granola_barcode()).await.unwrap();
    assert_eq!(loose.rationale, Rationale::Consensus);

    let strict = ReconcileConfig {
        consensus_tolerance: 0.05,
        ..no_fast_track()
    };
    let picked = reconciler
        .reconcile_with(&granola_barcode(), &strict)
        .await
        .unwrap();
    assert_ne!(picked.rationale, Rationale::Consensus);
}

// === Dispatch and validation ===

#[tokio::test(start_paused = true)]
async fn test_unsupported_adapter_is_not_dispatched() {
    let barcode_only = ScriptedAdapter::returning(providers::UPC_DATABASE, carb_record("x", 300.0))
        .only_for(nutriscan::IdentifierKind::Barcode);
    let any = ScriptedAdapter::returning(providers::EDAMAM, carb_record("x", 310.0));

    let reconciler = reconciler_with(vec![barcode_only.clone(), any], no_fast_track());
    let outcome = reconciler
        .collect(&NutritionQuery::name("granola", 100.0))
        .await
        .unwrap();

    assert_eq!(barcode_only.calls(), 0);
    assert_eq!(outcome.attempts.len(), 1);
    assert_eq!(outcome.summary().dispatched, 1);
}

#[tokio::test]
async fn test_invalid_query_is_refused_before_dispatch() {
    let adapter = ScriptedAdapter::returning(providers::USDA, complete_record("x"));
    let reconciler = reconciler_with(vec![adapter.clone()], ReconcileConfig::default());

    let err = reconciler
        .reconcile(&NutritionQuery::barcode("12ab", 100.0))
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::InvalidQuery(_)));

    let err = reconciler
        .reconcile(&NutritionQuery::name("granola", 0.0))
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::InvalidQuery(_)));

    let err = reconciler
        .reconcile(&NutritionQuery::name("soup", 2_500.0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::InvalidQuery(QueryError::InvalidPortion(_))
    ));
    assert_eq!(adapter.calls(), 0);
}

#[test]
fn test_builder_requires_an_adapter() {
    let err = Reconciler::builder().build().unwrap_err();
    assert!(matches!(err, ReconcileError::NoAdapters));
}

#[test]
fn test_builder_rejects_invalid_config() {
    let config = ReconcileConfig {
        consensus_tolerance: 0.0,
        ..ReconcileConfig::default()
    };
    let err = Reconciler::builder()
        .adapter(ScriptedAdapter::returning(providers::USDA, complete_record("x")))
        .config(config)
        .build()
        .unwrap_err();
    assert!(matches!(err, ReconcileError::Configuration(_)));
}

#[test]
fn test_duplicate_providers_are_ignored() {
    let reconciler = Reconciler::builder()
        .adapter(ScriptedAdapter::returning(providers::USDA, carb_record("x", 100.0)))
        .adapter(ScriptedAdapter::returning(providers::USDA, carb_record("x", 900.0)))
        .adapter(ScriptedAdapter::returning(providers::EDAMAM, carb_record("x", 100.0)))
        .build()
        .unwrap();

    let providers: Vec<_> = reconciler
        .providers()
        .iter()
        .map(|p| p.as_str().to_owned())
        .collect();
    assert_eq!(providers, vec!["usda", "edamam"]);
}
