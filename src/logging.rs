// ABOUTME: Logging configuration and structured reconciliation events
// ABOUTME: Sets up the tracing subscriber and names every field the engine logs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

//! Structured logging with `tracing`

use crate::errors::FanOutSummary;
use crate::orchestrator::Termination;
use anyhow::Result;
use nutriscan_core::{NutritionQuery, ProviderId, RawNutritionRecord, ReconciledNutrition};
use nutriscan_intelligence::RejectionReason;
use nutriscan_providers::AdapterError;
use serde_json::json;
use std::env;
use std::io;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{
    filter::{Directive, LevelFilter},
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Service name reported at startup
pub const SERVICE_NAME: &str = "nutriscan";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Include thread information
    pub include_thread: bool,
    /// Emit span open/close events
    pub include_spans: bool,
    /// Service name for structured logging
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Environment (development, staging, production)
    pub environment: String,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` format for production logging
    Json,
    /// Pretty format for development
    Pretty,
    /// Compact format for terminals
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            include_location: false,
            include_thread: false,
            include_spans: false,
            service_name: SERVICE_NAME.into(),
            service_version: env!("CARGO_PKG_VERSION").to_owned(),
            environment: "development".into(),
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());

        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let is_production = environment == "production";

        Self {
            level,
            format,
            include_location: is_production || env::var("LOG_INCLUDE_LOCATION").is_ok(),
            include_thread: is_production || env::var("LOG_INCLUDE_THREAD").is_ok(),
            include_spans: env::var("LOG_INCLUDE_SPANS").is_ok(),
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| SERVICE_NAME.into()),
            service_version: env!("CARGO_PKG_VERSION").to_owned(),
            environment,
        }
    }

    /// Quiet a CLI down to warnings unless `RUST_LOG` says otherwise
    #[must_use]
    pub fn for_cli(verbose: bool) -> Self {
        let level = env::var("RUST_LOG").unwrap_or_else(|_| {
            if verbose {
                "debug".into()
            } else {
                "warn".into()
            }
        });
        Self {
            level,
            format: LogFormat::Compact,
            ..Self::from_env()
        }
    }

    /// Build the subscriber filter from `level`
    ///
    /// A bare level name also quiets the HTTP stack and pins the crate to that
    /// level. A directive list such as `warn,nutriscan::orchestrator=trace` is
    /// used exactly as written.
    fn env_filter(&self) -> EnvFilter {
        let Ok(level) = self.level.trim().parse::<LevelFilter>() else {
            return EnvFilter::new(&self.level);
        };
        let directive = |text: &str, fallback: tracing::Level| -> Directive {
            text.parse().unwrap_or_else(|_| fallback.into())
        };
        EnvFilter::new(level.to_string())
            .add_directive(directive("hyper=warn", tracing::Level::WARN))
            .add_directive(directive("hyper_util=warn", tracing::Level::WARN))
            .add_directive(directive("reqwest=warn", tracing::Level::WARN))
            .add_directive(directive(
                &format!("nutriscan={level}"),
                tracing::Level::INFO,
            ))
    }

    /// Initialize the global tracing subscriber
    ///
    /// Logs go to stderr so stdout stays clean for command output.
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        let registry = tracing_subscriber::registry().with(self.env_filter());
        let span_events = if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        match self.format {
            LogFormat::Json => {
                let json_layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_thread_ids(self.include_thread)
                    .with_thread_names(self.include_thread)
                    .with_target(true)
                    .with_writer(io::stderr)
                    .with_span_events(span_events)
                    .json();
                registry.with(json_layer).try_init()?;
            }
            LogFormat::Pretty => {
                let pretty_layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_thread_ids(self.include_thread)
                    .with_thread_names(self.include_thread)
                    .with_target(true)
                    .with_writer(io::stderr)
                    .with_span_events(span_events);
                registry.with(pretty_layer).try_init()?;
            }
            LogFormat::Compact => {
                let compact_layer = fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(io::stderr)
                    .with_span_events(FmtSpan::NONE);
                registry.with(compact_layer).try_init()?;
            }
        }

        self.log_startup_info();
        Ok(())
    }

    fn log_startup_info(&self) {
        let summary = json!({
            "service": {
                "name": self.service_name,
                "version": self.service_version,
                "environment": self.environment
            },
            "logging": {
                "level": self.level,
                "format": format!("{:?}", self.format),
                "location": self.include_location,
                "thread": self.include_thread,
                "spans": self.include_spans
            }
        });
        debug!(config = %summary, "Nutriscan logging initialized");
    }
}

/// Initialize logging from environment
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

/// Structured events emitted during a reconciliation
pub struct ReconcileLogger;

impl ReconcileLogger {
    /// An adapter was left out because it cannot answer this identifier kind
    pub fn log_adapter_unsupported(provider: &ProviderId, query: &NutritionQuery) {
        debug!(
            provider = %provider,
            identifier.kind = %query.identifier_kind,
            "Adapter does not support identifier kind, not dispatched"
        );
    }

    /// Adapter calls were started
    pub fn log_dispatched(count: usize) {
        debug!(state = "dispatched", adapters = count, "Fan-out dispatched");
    }

    /// An adapter returned a record that passed validation
    pub fn log_record_accepted(record: &RawNutritionRecord, accuracy: f64, elapsed: Duration) {
        debug!(
            provider = %record.provider_id,
            product = %record.product_name,
            calories = record.calories,
            accuracy,
            elapsed_ms = elapsed.as_millis(),
            "Adapter answered with a valid record"
        );
    }

    /// An adapter returned a record that failed a hard rule
    pub fn log_record_rejected(record: &RawNutritionRecord, reason: &RejectionReason) {
        debug!(
            provider = %record.provider_id,
            rule = %reason,
            "Record rejected by plausibility rules"
        );
    }

    /// An adapter call failed
    pub fn log_adapter_failed(error: &AdapterError, elapsed: Duration) {
        warn!(
            provider = %error.provider,
            kind = %error.kind,
            elapsed_ms = elapsed.as_millis(),
            error = %error.message,
            "Adapter call failed"
        );
    }

    /// An adapter panicked
    pub fn log_adapter_panicked(provider: &ProviderId) {
        warn!(provider = %provider, "Adapter panicked, treating as absent");
    }

    /// An adapter was still pending when the fan-out ended
    pub fn log_adapter_abandoned(provider: &ProviderId, termination: Termination) {
        debug!(
            provider = %provider,
            termination = ?termination,
            "Adapter abandoned, result will not be awaited"
        );
    }

    /// Collection stopped
    pub fn log_collected(termination: Termination, valid: usize, total: usize, elapsed: Duration) {
        debug!(
            state = "collected",
            termination = ?termination,
            valid,
            total,
            elapsed_ms = elapsed.as_millis(),
            "Fan-out finished"
        );
    }

    /// Valid records were clustered
    pub fn log_grouped(groups: usize, largest: usize) {
        debug!(state = "grouped", groups, largest, "Consensus groups formed");
    }

    /// A record was selected
    pub fn log_selected(reconciled: &ReconciledNutrition, elapsed: Duration) {
        info!(
            state = "selected",
            rationale = %reconciled.rationale,
            confidence = reconciled.confidence,
            provider = %reconciled.record.provider_id,
            supporting = reconciled.supporting_providers.len(),
            elapsed_ms = elapsed.as_millis(),
            "Nutrition reconciled"
        );
    }

    /// Nothing usable came back
    pub fn log_failed(summary: &FanOutSummary, elapsed: Duration) {
        warn!(
            state = "failed",
            dispatched = summary.dispatched,
            responded = summary.responded,
            rejected = summary.rejected,
            unreachable = summary.is_temporarily_unreachable(),
            elapsed_ms = elapsed.as_millis(),
            "No nutrition data found"
        );
    }
}
