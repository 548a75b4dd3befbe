// ABOUTME: Output formatting helpers for the nutriscan CLI
// ABOUTME: Results go to stdout as JSON; errors use the ErrorResponse shape
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

use nutriscan_core::{AppError, AppResult, ErrorResponse};
use serde::Serialize;

/// Pretty-print `value` as JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print `error` as an `ErrorResponse` document
pub fn print_error(error: AppError) {
    let response = ErrorResponse::from(error);
    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("{}: {err}", response.error.message),
    }
}
