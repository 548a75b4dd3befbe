// ABOUTME: Batch command reconciling a file of queries with bounded concurrency through the cache
// ABOUTME: Prints one JSON line per input line, in input order, failures included
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

use futures_util::stream::{self, StreamExt};
use nutriscan::{CachedReconciler, NutritionQuery};
use nutriscan_core::constants::reconcile::DEFAULT_PORTION_GRAMS;
use nutriscan_core::{AppError, AppResult, ErrorResponse};
use serde_json::json;
use std::path::Path;
use tracing::info;

/// Parse `kind,identifier[,portion]`
///
/// Names may contain commas; a trailing field is taken as the portion only
/// when it parses as a number.
fn parse_line(line: &str) -> AppResult<NutritionQuery> {
    let (kind, rest) = line
        .split_once(',')
        .ok_or_else(|| AppError::invalid_input("expected kind,identifier[,portion]"))?;

    let (identifier, portion) = match rest.rsplit_once(',') {
        Some((identifier, portion)) => match portion.trim().parse::<f64>() {
            Ok(grams) => (identifier, grams),
            Err(_) => (rest, DEFAULT_PORTION_GRAMS),
        },
        None => (rest, DEFAULT_PORTION_GRAMS),
    };

    match kind.trim().to_lowercase().as_str() {
        "barcode" => Ok(NutritionQuery::barcode(identifier, portion)),
        "name" => Ok(NutritionQuery::name(identifier, portion)),
        other => Err(AppError::invalid_input(format!(
            "unknown identifier kind {other:?}, expected barcode or name"
        ))),
    }
}

pub async fn run(cache: &CachedReconciler, file: &Path, concurrency: usize) -> AppResult<()> {
    let text = tokio::fs::read_to_string(file).await.map_err(|err| {
        AppError::invalid_input(format!("cannot read {}: {err}", file.display())).with_source(err)
    })?;

    let entries: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .collect();
    info!(queries = entries.len(), concurrency, "Starting batch reconciliation");

    let mut outputs: Vec<(usize, serde_json::Value)> = stream::iter(entries)
        .map(|(line_no, line)| async move {
            let result = match parse_line(line) {
                Ok(query) => cache
                    .reconcile(&query)
                    .await
                    .map(|reconciled| json!({ "query": query, "result": reconciled }))
                    .map_err(AppError::from),
                Err(err) => Err(err),
            };
            let value = match result {
                Ok(mut value) => {
                    value["line"] = json!(line_no);
                    value
                }
                Err(err) => json!({
                    "line": line_no,
                    "input": line,
                    "error": ErrorResponse::from(err).error,
                }),
            };
            (line_no, value)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    outputs.sort_by_key(|(line_no, _)| *line_no);
    for (_, value) in outputs {
        println!("{value}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutriscan::IdentifierKind;

    #[test]
    fn test_parse_line_with_portion() {
        let query = parse_line("barcode,0001112223334,30").unwrap();
        assert_eq!(query.identifier_kind, IdentifierKind::Barcode);
        assert_eq!(query.identifier, "0001112223334");
        assert!((query.portion_grams - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_line_name_with_comma_and_default_portion() {
        let query = parse_line("name,chicken, roasted").unwrap();
        assert_eq!(query.identifier_kind, IdentifierKind::Name);
        assert_eq!(query.identifier, "chicken, roasted");
        assert!((query.portion_grams - DEFAULT_PORTION_GRAMS).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_line_unknown_kind() {
        assert!(parse_line("sku,123").is_err());
        assert!(parse_line("barcode").is_err());
    }
}
