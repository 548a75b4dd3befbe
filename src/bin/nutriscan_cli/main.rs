// ABOUTME: Nutriscan CLI - reconcile nutrition data for barcodes and food names from the terminal
// ABOUTME: Single lookups, concurrent batch files, and a listing of configured providers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors
//!
//! Usage:
//! ```bash
//! # Reconcile a barcode for a 30 g serving
//! nutriscan lookup --barcode 0001112223334 --portion 30
//!
//! # Reconcile a food name for the default 100 g
//! nutriscan lookup --name "greek yogurt"
//!
//! # Reconcile every line of a file (kind,identifier[,portion])
//! nutriscan batch foods.csv --concurrency 4
//!
//! # Show which providers are configured
//! nutriscan providers
//! ```
//!
//! Provider keys come from the environment (`USDA_API_KEY`, ...). Failures are
//! printed as an `ErrorResponse` JSON document and exit non-zero.

mod commands;
mod helpers;

use clap::{Parser, Subcommand};
use nutriscan::config::load_dotenv;
use nutriscan::logging::LoggingConfig;
use nutriscan::{
    registry, CacheConfig, CachedReconciler, NutritionQuery, ProviderCredentials,
    ReconcileConfig, Reconciler,
};
use nutriscan_core::constants::reconcile::DEFAULT_PORTION_GRAMS;
use nutriscan_core::{AppError, AppResult};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

/// Default TCP connect timeout for provider requests
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Parser)]
#[command(
    name = "nutriscan",
    about = "Multi-source nutrition data reconciliation",
    long_about = "Queries every configured nutrition source in parallel, rejects implausible answers, and prints one reconciled record with a confidence and rationale."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Override the global deadline in milliseconds
    #[arg(long, global = true)]
    deadline_ms: Option<u64>,

    /// Wait for every source instead of stopping at the first trustworthy answer
    #[arg(long, global = true)]
    no_fast_track: bool,

    /// TCP connect timeout for provider requests, in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    connect_timeout: u64,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Reconcile one barcode or food name
    Lookup {
        /// EAN/UPC/GTIN barcode (8-14 digits)
        #[arg(long, conflicts_with = "name", required_unless_present = "name")]
        barcode: Option<String>,

        /// Free-text food name
        #[arg(long)]
        name: Option<String>,

        /// Portion in grams
        #[arg(long, default_value_t = DEFAULT_PORTION_GRAMS)]
        portion: f64,
    },

    /// Reconcile every line of a file, through the result cache
    Batch {
        /// File of `kind,identifier[,portion]` lines; `#` starts a comment
        file: PathBuf,

        /// Queries in flight at once
        #[arg(long, default_value_t = 4)]
        concurrency: usize,
    },

    /// List configured providers with their reliability and circuit state
    Providers,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Before logging so RUST_LOG may come from the file
    let dotenv = load_dotenv();
    if let Err(err) = LoggingConfig::for_cli(cli.verbose).init() {
        eprintln!("logging disabled: {err}");
    }
    match dotenv {
        Some(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        None => tracing::debug!("No .env file found"),
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            helpers::display::print_error(error);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let mut config =
        ReconcileConfig::from_env().map_err(|err| AppError::config(err.to_string()))?;
    if let Some(ms) = cli.deadline_ms {
        config.global_deadline = Duration::from_millis(ms);
    }
    if cli.no_fast_track {
        config.fast_track_enabled = false;
    }

    nutriscan_providers::initialize_shared_client(cli.connect_timeout);
    let adapters = registry::build_adapters(&ProviderCredentials::from_env())
        .await
        .map_err(|err| AppError::config(err.to_string()))?;
    let reconciler = Reconciler::builder()
        .adapters(adapters)
        .config(config)
        .build()?;

    match cli.command {
        Command::Lookup {
            barcode,
            name,
            portion,
        } => {
            let query = match (barcode, name) {
                (Some(code), _) => NutritionQuery::barcode(code, portion),
                (None, Some(name)) => NutritionQuery::name(name, portion),
                (None, None) => {
                    return Err(AppError::invalid_input("either --barcode or --name is required"))
                }
            };
            commands::lookup::run(&reconciler, &query).await
        }
        Command::Batch { file, concurrency } => {
            let cache_config =
                CacheConfig::from_env().map_err(|err| AppError::config(err.to_string()))?;
            let cache = CachedReconciler::with_config(Arc::new(reconciler), cache_config);
            commands::batch::run(&cache, &file, concurrency).await
        }
        Command::Providers => commands::providers::run(&reconciler),
    }
}
