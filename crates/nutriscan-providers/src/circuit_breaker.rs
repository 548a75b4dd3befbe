// ABOUTME: Lock-free circuit breaker that skips nutrition sources which keep timing out or erroring
// ABOUTME: Closed/Open/HalfOpen state machine shared by every reconciliation using the adapter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

use crate::errors::{AdapterError, AdapterErrorKind, AdapterResult};
use nutriscan_core::ProviderId;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Calls pass through; transient failures are counted
    Closed,
    /// Calls are refused until the recovery timeout elapses
    Open,
    /// A single probe call is in flight
    HalfOpen,
}

impl CircuitState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Closed,
            1 => Self::Open,
            _ => Self::HalfOpen,
        }
    }

    const fn as_u8(self) -> u8 {
        match self {
            Self::Closed => 0,
            Self::Open => 1,
            Self::HalfOpen => 2,
        }
    }
}

/// Thresholds for one breaker
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive transient failures that open the circuit
    pub failure_threshold: u32,
    /// How long an open circuit refuses calls before probing
    pub recovery_timeout: Duration,
    /// Consecutive probe successes needed to close again
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 1,
        }
    }
}

impl CircuitBreakerConfig {
    /// Custom thresholds
    #[must_use]
    pub const fn new(
        failure_threshold: u32,
        recovery_timeout: Duration,
        success_threshold: u32,
    ) -> Self {
        Self {
            failure_threshold,
            recovery_timeout,
            success_threshold,
        }
    }

    /// Trip quickly; for free community sources that rate-limit aggressively
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(60),
            success_threshold: 2,
        }
    }
}

/// Point-in-time view of a breaker, for reporting
#[derive(Debug, Clone, Serialize)]
pub struct CircuitSnapshot {
    /// Provider the breaker guards
    pub provider: ProviderId,
    /// Current state
    pub state: CircuitState,
    /// Consecutive transient failures while closed
    pub consecutive_failures: u32,
}

/// Circuit breaker guarding one adapter
///
/// All fields are atomics so concurrent reconciliations can share one
/// breaker per adapter without locking.
#[derive(Debug)]
pub struct CircuitBreaker {
    provider: ProviderId,
    state: AtomicU8,
    failures: AtomicU32,
    probe_successes: AtomicU32,
    /// Millis since `epoch` at which the circuit last opened or began a probe
    opened_at_ms: AtomicU64,
    config: CircuitBreakerConfig,
    epoch: Instant,
}

impl CircuitBreaker {
    /// Breaker with default thresholds
    #[must_use]
    pub fn new(provider: ProviderId) -> Self {
        Self::with_config(provider, CircuitBreakerConfig::default())
    }

    /// Breaker with custom thresholds
    #[must_use]
    pub fn with_config(provider: ProviderId, config: CircuitBreakerConfig) -> Self {
        Self {
            provider,
            state: AtomicU8::new(CircuitState::Closed.as_u8()),
            failures: AtomicU32::new(0),
            probe_successes: AtomicU32::new(0),
            opened_at_ms: AtomicU64::new(0),
            config,
            epoch: Instant::now(),
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Reporting view
    #[must_use]
    pub fn snapshot(&self) -> CircuitSnapshot {
        CircuitSnapshot {
            provider: self.provider.clone(),
            state: self.state(),
            consecutive_failures: self.failures.load(Ordering::SeqCst),
        }
    }

    /// Whether a call may go through right now
    ///
    /// An open circuit past its recovery timeout moves to half-open and
    /// admits exactly one caller. A probe that never reported back is
    /// considered lost after another recovery timeout.
    #[must_use]
    pub fn try_acquire(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::Open => self.try_begin_probe(),
            CircuitState::HalfOpen => self.try_replace_lost_probe(),
        }
    }

    fn try_replace_lost_probe(&self) -> bool {
        let started = self.opened_at_ms.load(Ordering::SeqCst);
        let now = self.now_ms();
        now.saturating_sub(started) >= self.recovery_ms()
            && self
                .opened_at_ms
                .compare_exchange(started, now, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
    }

    fn try_begin_probe(&self) -> bool {
        if self.millis_since_open() < self.recovery_ms() {
            return false;
        }
        let moved = self
            .state
            .compare_exchange(
                CircuitState::Open.as_u8(),
                CircuitState::HalfOpen.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        if moved {
            self.opened_at_ms.store(self.now_ms(), Ordering::SeqCst);
            info!(provider = %self.provider, "Circuit half-open, probing source");
        }
        moved
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn recovery_ms(&self) -> u64 {
        self.config.recovery_timeout.as_millis() as u64
    }

    fn millis_since_open(&self) -> u64 {
        self.now_ms()
            .saturating_sub(self.opened_at_ms.load(Ordering::SeqCst))
    }

    fn open(&self) {
        self.state
            .store(CircuitState::Open.as_u8(), Ordering::SeqCst);
        self.opened_at_ms.store(self.now_ms(), Ordering::SeqCst);
        self.probe_successes.store(0, Ordering::SeqCst);
    }

    /// Record a completed call
    pub fn on_success(&self) {
        match self.state() {
            CircuitState::Closed => self.failures.store(0, Ordering::SeqCst),
            CircuitState::HalfOpen => {
                let successes = self.probe_successes.fetch_add(1, Ordering::SeqCst) + 1;
                if successes >= self.config.success_threshold {
                    self.state
                        .store(CircuitState::Closed.as_u8(), Ordering::SeqCst);
                    self.failures.store(0, Ordering::SeqCst);
                    self.probe_successes.store(0, Ordering::SeqCst);
                    info!(provider = %self.provider, "Circuit closed, source recovered");
                } else {
                    // Back to open with the recovery window already elapsed
                    self.opened_at_ms.store(
                        self.now_ms().saturating_sub(self.recovery_ms()),
                        Ordering::SeqCst,
                    );
                    self.state
                        .store(CircuitState::Open.as_u8(), Ordering::SeqCst);
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Give up an in-flight probe that produced no answer
    ///
    /// The circuit returns to open with its recovery window already elapsed,
    /// so the next caller may probe straight away.
    pub fn release_probe(&self) {
        if self
            .state
            .compare_exchange(
                CircuitState::HalfOpen.as_u8(),
                CircuitState::Open.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
        {
            self.opened_at_ms.store(
                self.now_ms().saturating_sub(self.recovery_ms()),
                Ordering::SeqCst,
            );
            info!(provider = %self.provider, "Probe released without an answer");
        }
    }

    /// Record a transient failure
    pub fn on_failure(&self) {
        match self.state() {
            CircuitState::Closed => {
                let failures = self.failures.fetch_add(1, Ordering::SeqCst) + 1;
                if failures >= self.config.failure_threshold {
                    self.open();
                    warn!(
                        provider = %self.provider,
                        failures,
                        recovery_secs = self.config.recovery_timeout.as_secs(),
                        "Circuit opened, skipping source"
                    );
                }
            }
            CircuitState::HalfOpen => {
                self.open();
                warn!(provider = %self.provider, "Circuit re-opened, probe failed");
            }
            CircuitState::Open => {
                self.opened_at_ms.store(self.now_ms(), Ordering::SeqCst);
            }
        }
    }

    /// Run `operation` under the breaker
    ///
    /// Only transient failures (timeouts and network errors) count against
    /// the source. "Not found" and malformed payloads are answers, so they
    /// leave a closed breaker alone and complete a half-open probe. A
    /// cancelled call is no answer at all and only releases the probe.
    ///
    /// # Errors
    ///
    /// Returns a `CircuitOpen` adapter error without running `operation`
    /// when the circuit refuses the call, otherwise the operation's own error.
    pub async fn call<F, T>(&self, operation: F) -> AdapterResult<T>
    where
        F: Future<Output = AdapterResult<T>>,
    {
        if !self.try_acquire() {
            return Err(AdapterError::circuit_open(
                self.provider.clone(),
                self.seconds_until_probe(),
            ));
        }

        let outcome = operation.await;
        match &outcome {
            Ok(_) => self.on_success(),
            Err(e) if e.is_transient() => self.on_failure(),
            Err(e)
                if matches!(
                    e.kind,
                    AdapterErrorKind::Cancelled | AdapterErrorKind::CircuitOpen
                ) =>
            {
                self.release_probe();
            }
            Err(_) => {
                if self.state() == CircuitState::HalfOpen {
                    // The source answered, so it is reachable
                    self.on_success();
                }
            }
        }
        outcome
    }

    /// Seconds until an open circuit admits a probe, rounded up
    fn seconds_until_probe(&self) -> u64 {
        self.recovery_ms()
            .saturating_sub(self.millis_since_open())
            .div_ceil(1000)
    }

    /// Force the breaker closed
    pub fn reset(&self) {
        self.state
            .store(CircuitState::Closed.as_u8(), Ordering::SeqCst);
        self.failures.store(0, Ordering::SeqCst);
        self.probe_successes.store(0, Ordering::SeqCst);
    }
}
