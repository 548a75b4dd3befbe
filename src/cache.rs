// ABOUTME: Caller-side TTL cache in front of the reconciler, keyed by identifier kind, identifier, and portion
// ABOUTME: Caches successes only; barcodes live for 24 hours and names for 1 hour by default
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

//! Reconciliation cache
//!
//! Sits outside the engine. Two concurrent misses for the same key both fan
//! out; the later insert wins.

use crate::config::CacheConfig;
use crate::errors::ReconcileError;
use crate::reconciler::Reconciler;
use dashmap::DashMap;
use nutriscan_core::{IdentifierKind, NutritionQuery, ReconciledNutrition};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Cache key; the portion is compared bit-for-bit
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    kind: IdentifierKind,
    identifier: String,
    portion_bits: u64,
}

impl CacheKey {
    fn for_query(query: &NutritionQuery) -> Self {
        let identifier = match query.identifier_kind {
            IdentifierKind::Barcode => query.identifier.clone(),
            IdentifierKind::Name => query.identifier.to_lowercase(),
        };
        Self {
            kind: query.identifier_kind,
            identifier,
            portion_bits: query.portion_grams.to_bits(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: ReconciledNutrition,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// A [`Reconciler`] with a TTL cache in front of it
#[derive(Debug, Clone)]
pub struct CachedReconciler {
    inner: Arc<Reconciler>,
    entries: Arc<DashMap<CacheKey, CacheEntry>>,
    config: CacheConfig,
}

impl CachedReconciler {
    /// Wrap `inner` with the default TTLs
    #[must_use]
    pub fn new(inner: Arc<Reconciler>) -> Self {
        Self::with_config(inner, CacheConfig::default())
    }

    /// Wrap `inner` with explicit cache settings
    #[must_use]
    pub fn with_config(inner: Arc<Reconciler>, config: CacheConfig) -> Self {
        Self {
            inner,
            entries: Arc::new(DashMap::new()),
            config,
        }
    }

    /// The wrapped reconciler
    #[must_use]
    pub fn reconciler(&self) -> &Reconciler {
        &self.inner
    }

    /// Lifetime of a cached result for identifiers of `kind`
    #[must_use]
    pub const fn ttl_for(&self, kind: IdentifierKind) -> Duration {
        match kind {
            IdentifierKind::Barcode => self.config.barcode_ttl,
            IdentifierKind::Name => self.config.name_ttl,
        }
    }

    /// Return a fresh cached result or reconcile and cache a success
    ///
    /// # Errors
    ///
    /// Propagates the reconciler's error; failures are not cached.
    pub async fn reconcile(
        &self,
        query: &NutritionQuery,
    ) -> Result<ReconciledNutrition, ReconcileError> {
        let key = CacheKey::for_query(query);
        if let Some(hit) = self.lookup(&key) {
            debug!(identifier = %query.identifier, "Reconciliation cache hit");
            return Ok(hit);
        }

        let reconciled = self.inner.reconcile(query).await?;
        self.store(key, reconciled.clone());
        Ok(reconciled)
    }

    /// Cached result for `query`, if still fresh
    #[must_use]
    pub fn get(&self, query: &NutritionQuery) -> Option<ReconciledNutrition> {
        self.lookup(&CacheKey::for_query(query))
    }

    /// Drop the cached result for `query`
    pub fn invalidate(&self, query: &NutritionQuery) {
        self.entries.remove(&CacheKey::for_query(query));
    }

    /// Drop everything
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Entries currently held, expired ones included until swept
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are held
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove expired entries, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, "Purged expired reconciliation cache entries");
        }
        removed
    }

    fn lookup(&self, key: &CacheKey) -> Option<ReconciledNutrition> {
        let now = Instant::now();
        let entry = self.entries.get(key)?;
        if entry.is_expired(now) {
            drop(entry);
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
            return None;
        }
        Some(entry.value.clone())
    }

    fn store(&self, key: CacheKey, value: ReconciledNutrition) {
        let ttl = self.ttl_for(key.kind);
        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        if self.entries.len() > self.config.max_entries {
            self.purge_expired();
        }
    }
}
