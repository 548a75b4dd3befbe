// ABOUTME: Canonical provider identifiers for every supported nutrition data source
// ABOUTME: Used as stable keys for reliability weights, circuit breakers, and logs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

/// Nutritionix natural-language and UPC API
pub const NUTRITIONIX: &str = "nutritionix";

/// USDA `FoodData` Central
pub const USDA: &str = "usda";

/// Edamam Food Database API
pub const EDAMAM: &str = "edamam";

/// Spoonacular food API
pub const SPOONACULAR: &str = "spoonacular";

/// Open Food Facts (community maintained, no key required)
pub const OPEN_FOOD_FACTS: &str = "open_food_facts";

/// Barcode Lookup product API
pub const BARCODE_LOOKUP: &str = "barcode_lookup";

/// UPC Database product API
pub const UPC_DATABASE: &str = "upc_database";

/// Local offline dataset bundled with the app
pub const OFFLINE_DATASET: &str = "offline_dataset";

/// All built-in providers in fixed priority order
pub const ALL: [&str; 8] = [
    NUTRITIONIX,
    USDA,
    EDAMAM,
    SPOONACULAR,
    OFFLINE_DATASET,
    OPEN_FOOD_FACTS,
    BARCODE_LOOKUP,
    UPC_DATABASE,
];
