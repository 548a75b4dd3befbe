// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Provider identifiers, reconciliation defaults, cache TTLs, and nutrition units
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

//! Constants module
//!
//! Constants are grouped by domain rather than kept in a single flat file.

/// Caller-side reconciliation cache constants (TTL, capacity)
pub mod cache;
/// Provider identifiers used as keys in the reliability table
pub mod providers;
/// Default timeouts and thresholds for the reconciliation engine
pub mod reconcile;
/// Energy and mass conversion constants
pub mod units;
