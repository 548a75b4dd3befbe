// ABOUTME: Lists registered providers with reliability weight and circuit breaker state
// ABOUTME: Output is a JSON array in registration order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

use crate::helpers::display::print_json;
use nutriscan::Reconciler;
use nutriscan_core::AppResult;
use serde_json::json;

pub fn run(reconciler: &Reconciler) -> AppResult<()> {
    let reliability = reconciler.reliability();
    let rows: Vec<_> = reconciler
        .circuits()
        .into_iter()
        .map(|circuit| {
            json!({
                "provider": circuit.provider,
                "reliability": reliability.weight(&circuit.provider),
                "circuit": circuit.state,
            })
        })
        .collect();
    print_json(&rows)
}
