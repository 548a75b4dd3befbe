// ABOUTME: Scripted adapter returning canned records or failures after a configurable delay
// ABOUTME: Lets tests and demos drive the orchestrator without network access
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

use crate::adapter::SourceAdapter;
use crate::errors::{AdapterError, AdapterErrorKind, AdapterResult};
use async_trait::async_trait;
use nutriscan_core::{IdentifierKind, NutritionQuery, ProviderId, RawNutritionRecord};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
enum Script {
    Record(RawNutritionRecord),
    Fail(AdapterErrorKind),
    Panic,
}

/// Adapter with a fixed behavior
///
/// The record is returned as the provider's answer for its own
/// `serving_grams`, like a real adapter.
#[derive(Debug, Clone)]
pub struct ScriptedAdapter {
    id: ProviderId,
    script: Script,
    delay: Duration,
    kinds: Option<IdentifierKind>,
    honor_cancel: bool,
    calls: Arc<AtomicUsize>,
    completed: Arc<AtomicUsize>,
}

impl ScriptedAdapter {
    fn with_script(provider: impl Into<ProviderId>, script: Script) -> Self {
        Self {
            id: provider.into(),
            script,
            delay: Duration::ZERO,
            kinds: None,
            honor_cancel: true,
            calls: Arc::new(AtomicUsize::new(0)),
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer with `record`, re-labelled as coming from `provider`
    #[must_use]
    pub fn returning(provider: impl Into<ProviderId>, record: RawNutritionRecord) -> Self {
        let id = provider.into();
        let record = RawNutritionRecord {
            provider_id: id.clone(),
            ..record
        };
        Self::with_script(id, Script::Record(record))
    }

    /// Fail every call with `kind`
    #[must_use]
    pub fn failing(provider: impl Into<ProviderId>, kind: AdapterErrorKind) -> Self {
        Self::with_script(provider, Script::Fail(kind))
    }

    /// Panic inside `fetch`, simulating an adapter bug
    #[must_use]
    pub fn panicking(provider: impl Into<ProviderId>) -> Self {
        Self::with_script(provider, Script::Panic)
    }

    /// Wait this long before answering
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Only answer queries of `kind`
    #[must_use]
    pub const fn only_for(mut self, kind: IdentifierKind) -> Self {
        self.kinds = Some(kind);
        self
    }

    /// Keep sleeping through cancellation, like an adapter that ignores the token
    #[must_use]
    pub const fn ignoring_cancel(mut self) -> Self {
        self.honor_cancel = false;
        self
    }

    /// Number of `fetch` calls started
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of `fetch` calls that ran to the end of their delay
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    fn answer(&self) -> AdapterResult<RawNutritionRecord> {
        match &self.script {
            Script::Record(record) => Ok(record.clone()),
            Script::Fail(kind) => Err(AdapterError::new(
                self.id.clone(),
                *kind,
                "scripted failure",
            )),
            #[allow(clippy::panic)]
            Script::Panic => panic!("scripted adapter {} panicked", self.id),
        }
    }
}

#[async_trait]
impl SourceAdapter for ScriptedAdapter {
    fn provider_id(&self) -> &ProviderId {
        &self.id
    }

    fn supports(&self, kind: IdentifierKind) -> bool {
        !matches!(self.kinds, Some(only) if only != kind)
    }

    async fn fetch(
        &self,
        _query: &NutritionQuery,
        _timeout: Duration,
        cancel: &CancellationToken,
    ) -> AdapterResult<RawNutritionRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            if self.honor_cancel {
                tokio::select! {
                    () = cancel.cancelled() => return Err(AdapterError::cancelled(self.id.clone())),
                    () = tokio::time::sleep(self.delay) => {}
                }
            } else {
                tokio::time::sleep(self.delay).await;
            }
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.answer()
    }
}
