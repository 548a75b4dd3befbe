// ABOUTME: Shared test utilities for the nutriscan integration tests
// ABOUTME: Quiet logging setup, record builders, and scripted-adapter reconcilers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors
#![allow(
    dead_code,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used
)]
//! Shared test utilities for `nutriscan`

use nutriscan::{ReconcileConfig, Reconciler, RawNutritionRecord, SourceAdapter};
use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// 100 g record whose energy comes entirely from carbohydrates
///
/// Four of eight fields present, so it scores 0.8 accuracy.
pub fn carb_record(provider: &str, calories: f64) -> RawNutritionRecord {
    RawNutritionRecord {
        calories,
        carbs_g: calories / 4.0,
        ..RawNutritionRecord::new(provider, "Granola")
    }
}

/// 100 g record with every field present and macros matching calories exactly
pub fn complete_record(provider: &str) -> RawNutritionRecord {
    RawNutritionRecord {
        protein_g: 5.0,
        carbs_g: 60.0,
        fat_g: 4.0,
        fiber_g: 3.0,
        sugar_g: 12.0,
        calories: 296.0,
        ..RawNutritionRecord::new(provider, "Granola").with_brand(Some("Acme"))
    }
}

/// Default config with fast-track turned off
pub fn no_fast_track() -> ReconcileConfig {
    ReconcileConfig {
        fast_track_enabled: false,
        ..ReconcileConfig::default()
    }
}

/// Reconciler over `adapters` with `config`
pub fn reconciler_with<A>(adapters: Vec<A>, config: ReconcileConfig) -> Reconciler
where
    A: SourceAdapter + 'static,
{
    init_test_logging();
    adapters
        .into_iter()
        .fold(Reconciler::builder().config(config), |builder, adapter| {
            builder.adapter(adapter)
        })
        .build()
        .unwrap()
}
