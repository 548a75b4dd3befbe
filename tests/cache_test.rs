// ABOUTME: Caller-side reconciliation cache tests on paused tokio time
// ABOUTME: Checks hits, per-kind TTLs, name normalization, and that failures are never cached
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{complete_record, reconciler_with};
use nutriscan::{CacheConfig, CachedReconciler, NutritionQuery, ReconcileConfig};
use nutriscan_core::constants::providers;
use nutriscan_providers::{AdapterErrorKind, ScriptedAdapter};
use std::sync::Arc;
use std::time::Duration;

fn cached(adapter: &ScriptedAdapter) -> CachedReconciler {
    CachedReconciler::new(Arc::new(reconciler_with(
        vec![adapter.clone()],
        ReconcileConfig::default(),
    )))
}

#[tokio::test(start_paused = true)]
async fn test_repeat_query_is_served_from_cache() {
    let adapter = ScriptedAdapter::returning(providers::USDA, complete_record("x"));
    let cache = cached(&adapter);
    let query = NutritionQuery::barcode("0001112223334", 100.0);

    let first = cache.reconcile(&query).await.unwrap();
    let second = cache.reconcile(&query).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(adapter.calls(), 1);
    assert_eq!(cache.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_portion_is_part_of_the_key() {
    let adapter = ScriptedAdapter::returning(providers::USDA, complete_record("x"));
    let cache = cached(&adapter);

    cache
        .reconcile(&NutritionQuery::barcode("0001112223334", 100.0))
        .await
        .unwrap();
    let small = cache
        .reconcile(&NutritionQuery::barcode("0001112223334", 50.0))
        .await
        .unwrap();

    assert_eq!(adapter.calls(), 2);
    assert!((small.record.calories - 148.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_name_keys_ignore_case() {
    let adapter = ScriptedAdapter::returning(providers::USDA, complete_record("x"));
    let cache = cached(&adapter);

    cache
        .reconcile(&NutritionQuery::name("Granola", 100.0))
        .await
        .unwrap();
    assert!(cache.get(&NutritionQuery::name("GRANOLA", 100.0)).is_some());
    assert_eq!(adapter.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_barcode_and_name_ttls_differ() {
    let adapter = ScriptedAdapter::returning(providers::USDA, complete_record("x"));
    let cache = cached(&adapter);
    let barcode = NutritionQuery::barcode("0001112223334", 100.0);
    let name = NutritionQuery::name("granola", 100.0);

    cache.reconcile(&barcode).await.unwrap();
    cache.reconcile(&name).await.unwrap();

    tokio::time::advance(Duration::from_secs(2 * 3_600)).await;
    assert!(cache.get(&barcode).is_some());
    assert!(cache.get(&name).is_none());

    tokio::time::advance(Duration::from_secs(23 * 3_600)).await;
    assert!(cache.get(&barcode).is_none());

    cache.reconcile(&barcode).await.unwrap();
    assert_eq!(adapter.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_failures_are_not_cached() {
    let adapter = ScriptedAdapter::failing(providers::USDA, AdapterErrorKind::NotFound);
    let cache = cached(&adapter);
    let query = NutritionQuery::barcode("0001112223334", 100.0);

    assert!(cache.reconcile(&query).await.is_err());
    assert!(cache.reconcile(&query).await.is_err());

    assert_eq!(adapter.calls(), 2);
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_purge_and_invalidate() {
    let adapter = ScriptedAdapter::returning(providers::USDA, complete_record("x"));
    let config = CacheConfig {
        name_ttl: Duration::from_secs(10),
        ..CacheConfig::default()
    };
    let cache = CachedReconciler::with_config(
        Arc::new(reconciler_with(vec![adapter], ReconcileConfig::default())),
        config,
    );
    let barcode = NutritionQuery::barcode("0001112223334", 100.0);

    cache
        .reconcile(&NutritionQuery::name("granola", 100.0))
        .await
        .unwrap();
    cache.reconcile(&barcode).await.unwrap();
    assert_eq!(cache.len(), 2);

    tokio::time::advance(Duration::from_secs(11)).await;
    assert_eq!(cache.purge_expired(), 1);
    assert_eq!(cache.len(), 1);

    cache.invalidate(&barcode);
    assert!(cache.is_empty());
}
