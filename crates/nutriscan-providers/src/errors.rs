// ABOUTME: Per-source adapter errors with a coarse kind used by the orchestrator and circuit breaker
// ABOUTME: Maps reqwest failures and HTTP statuses onto Timeout/NotFound/Malformed/NetworkError
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

use nutriscan_core::ProviderId;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Category of an adapter failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterErrorKind {
    /// The call did not complete within its time budget
    Timeout,
    /// The provider has no entry for this identifier
    NotFound,
    /// The provider answered with something that could not be parsed
    Malformed,
    /// Transport failure, rate limiting, or a server-side error
    NetworkError,
    /// The caller stopped waiting before the call finished
    Cancelled,
    /// The adapter was skipped because its circuit breaker is open
    CircuitOpen,
}

impl AdapterErrorKind {
    /// Whether this failure says something about provider health
    ///
    /// Only these count against the circuit breaker.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Timeout | Self::NetworkError)
    }

    /// Whether the provider was unreachable rather than merely empty
    #[must_use]
    pub const fn is_unreachable(self) -> bool {
        matches!(self, Self::Timeout | Self::NetworkError | Self::CircuitOpen)
    }
}

impl fmt::Display for AdapterErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Timeout => "timeout",
            Self::NotFound => "not_found",
            Self::Malformed => "malformed",
            Self::NetworkError => "network_error",
            Self::Cancelled => "cancelled",
            Self::CircuitOpen => "circuit_open",
        };
        f.write_str(label)
    }
}

/// A single adapter's failure; never fatal to a reconciliation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{provider}: {kind}: {message}")]
pub struct AdapterError {
    /// Adapter that failed
    pub provider: ProviderId,
    /// Failure category
    pub kind: AdapterErrorKind,
    /// Human-readable detail for logs
    pub message: String,
}

/// Result alias for adapter calls
pub type AdapterResult<T> = Result<T, AdapterError>;

impl AdapterError {
    /// Create an error of any kind
    #[must_use]
    pub fn new(
        provider: impl Into<ProviderId>,
        kind: AdapterErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            kind,
            message: message.into(),
        }
    }

    /// The call exceeded `after_ms`
    #[must_use]
    pub fn timeout(provider: impl Into<ProviderId>, after_ms: u128) -> Self {
        Self::new(
            provider,
            AdapterErrorKind::Timeout,
            format!("no response after {after_ms} ms"),
        )
    }

    /// No matching product
    #[must_use]
    pub fn not_found(provider: impl Into<ProviderId>, message: impl Into<String>) -> Self {
        Self::new(provider, AdapterErrorKind::NotFound, message)
    }

    /// Unparseable payload
    #[must_use]
    pub fn malformed(provider: impl Into<ProviderId>, message: impl Into<String>) -> Self {
        Self::new(provider, AdapterErrorKind::Malformed, message)
    }

    /// Transport or server failure
    #[must_use]
    pub fn network(provider: impl Into<ProviderId>, message: impl Into<String>) -> Self {
        Self::new(provider, AdapterErrorKind::NetworkError, message)
    }

    /// The caller cancelled the call
    #[must_use]
    pub fn cancelled(provider: impl Into<ProviderId>) -> Self {
        Self::new(provider, AdapterErrorKind::Cancelled, "cancelled by caller")
    }

    /// Skipped by the circuit breaker
    #[must_use]
    pub fn circuit_open(provider: impl Into<ProviderId>, retry_after_secs: u64) -> Self {
        Self::new(
            provider,
            AdapterErrorKind::CircuitOpen,
            format!("circuit open, retry in {retry_after_secs}s"),
        )
    }

    /// Classify a reqwest failure
    #[must_use]
    pub fn from_reqwest(provider: impl Into<ProviderId>, error: &reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            AdapterErrorKind::Timeout
        } else if error.is_decode() {
            AdapterErrorKind::Malformed
        } else if let Some(status) = error.status() {
            return Self::from_status(provider, status.as_u16());
        } else {
            AdapterErrorKind::NetworkError
        };
        Self::new(provider, kind, error.to_string())
    }

    /// Classify a non-success HTTP status
    #[must_use]
    pub fn from_status(provider: impl Into<ProviderId>, status: u16) -> Self {
        let kind = match status {
            404 => AdapterErrorKind::NotFound,
            _ => AdapterErrorKind::NetworkError,
        };
        Self::new(provider, kind, format!("HTTP {status}"))
    }

    /// Whether the circuit breaker should count this failure
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}
