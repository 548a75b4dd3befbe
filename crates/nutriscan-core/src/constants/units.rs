// ABOUTME: Energy and mass conversion constants for nutrition math
// ABOUTME: Atwater factors and kJ/kcal conversion used by validators and adapters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

/// Atwater factor for protein (kcal per gram)
pub const KCAL_PER_G_PROTEIN: f64 = 4.0;

/// Atwater factor for carbohydrate (kcal per gram)
pub const KCAL_PER_G_CARBS: f64 = 4.0;

/// Atwater factor for fat (kcal per gram)
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// Kilojoules per kilocalorie
pub const KJ_PER_KCAL: f64 = 4.184;

/// Grams per ounce
pub const GRAMS_PER_OUNCE: f64 = 28.349_523_125;

/// Reference mass that most databases report nutrients against
pub const REFERENCE_GRAMS: f64 = 100.0;
