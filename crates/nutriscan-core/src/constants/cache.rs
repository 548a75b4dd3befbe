// ABOUTME: Cache-related constants for the caller-side reconciliation cache
// ABOUTME: TTLs differ by identifier kind since barcoded products change rarely
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

/// Barcode lookup TTL (24 hours) - packaged product labels change infrequently
pub const TTL_BARCODE_SECS: u64 = 86_400; // 24 hours

/// Free-text name lookup TTL (1 hour) - search rankings drift
pub const TTL_NAME_SECS: u64 = 3_600; // 1 hour

/// Default maximum cache entries before expired entries are swept
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 10_000;
