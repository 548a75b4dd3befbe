// ABOUTME: Single lookup command printing the reconciled record as JSON
// ABOUTME: Reconciliation failures propagate to main as AppError
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

use crate::helpers::display::print_json;
use nutriscan::{NutritionQuery, Reconciler};
use nutriscan_core::AppResult;

pub async fn run(reconciler: &Reconciler, query: &NutritionQuery) -> AppResult<()> {
    let reconciled = reconciler.reconcile(query).await?;
    print_json(&reconciled)
}
