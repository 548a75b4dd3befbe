// ABOUTME: Maps recorded provider payloads into normalized records without network access
// ABOUTME: Checks field selection, unit conversion, serving basis, and not-found/malformed handling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

#![cfg(feature = "all-providers")]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use nutriscan_core::NutritionQuery;
use nutriscan_providers::{
    barcode_lookup_provider, edamam_provider, nutritionix_provider, open_food_facts_provider,
    spoonacular_provider, upc_database_provider, usda_provider, AdapterErrorKind,
};

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-6
}

// === Nutritionix ===

#[test]
fn test_nutritionix_reports_per_serving_weight() {
    let body = include_str!("fixtures/nutritionix_upc.json");
    let query = NutritionQuery::barcode("016000275270", 74.0);

    let record = nutritionix_provider::parse_response(body, &query).unwrap();

    assert_eq!(record.provider_id.as_str(), "nutritionix");
    assert_eq!(record.product_name, "Honey Nut Cheerios");
    assert_eq!(record.brand.as_deref(), Some("General Mills"));
    // The query portion does not change the provider's basis
    assert!(close(record.serving_grams, 37.0));
    assert!(close(record.calories, 140.0));
    assert!(close(record.carbs_g, 30.0));
    assert!(close(record.sugar_g, 12.0));
}

#[test]
fn test_nutritionix_empty_foods_is_not_found() {
    let query = NutritionQuery::name("unobtainium", 100.0);
    let err = nutritionix_provider::parse_response(r#"{"foods": []}"#, &query).unwrap_err();
    assert_eq!(err.kind, AdapterErrorKind::NotFound);
}

// === USDA ===

#[test]
fn test_usda_barcode_matches_gtin_and_reads_nutrient_ids() {
    let body = include_str!("fixtures/usda_search_branded.json");
    let query = NutritionQuery::barcode("016000275270", 30.0);

    let record = usda_provider::parse_response(body, &query).unwrap();

    assert_eq!(record.product_name, "HONEY NUT CHEERIOS");
    assert_eq!(record.brand.as_deref(), Some("CHEERIOS"));
    assert!(close(record.serving_grams, 100.0));
    assert!(close(record.calories, 378.0));
    assert!(close(record.protein_g, 8.11));
    assert!(close(record.fiber_g, 8.1));
    assert!(close(record.sugar_g, 32.4));
}

#[test]
fn test_usda_barcode_without_gtin_match_is_not_found() {
    let body = include_str!("fixtures/usda_search_branded.json");
    let query = NutritionQuery::barcode("5000112548167", 100.0);
    let err = usda_provider::parse_response(body, &query).unwrap_err();
    assert_eq!(err.kind, AdapterErrorKind::NotFound);
}

// === Edamam ===

#[test]
fn test_edamam_prefers_parsed_over_hints() {
    let body = include_str!("fixtures/edamam_parser.json");
    let query = NutritionQuery::name("banana", 118.0);

    let record = edamam_provider::parse_response(body, &query).unwrap();

    assert_eq!(record.product_name, "Banana");
    assert!(record.brand.is_none());
    assert!(close(record.calories, 89.0));
    assert!(close(record.sugar_g, 0.0));
}

// === Spoonacular ===

#[test]
fn test_spoonacular_uses_serving_mass() {
    let body = include_str!("fixtures/spoonacular_product.json");
    let query = NutritionQuery::barcode("689544083016", 100.0);

    let record = spoonacular_provider::parse_response(body, &query).unwrap();

    assert_eq!(record.brand.as_deref(), Some("Fage"));
    assert!(close(record.serving_grams, 170.0));
    assert!(close(record.calories, 90.0));
    assert!(close(record.protein_g, 18.0));
}

#[test]
fn test_spoonacular_without_nutrition_is_malformed() {
    let query = NutritionQuery::barcode("689544083016", 100.0);
    let err = spoonacular_provider::parse_response(r#"{"title": "Mystery"}"#, &query).unwrap_err();
    assert_eq!(err.kind, AdapterErrorKind::Malformed);
}

// === Open Food Facts ===

#[test]
fn test_open_food_facts_product_accepts_string_numbers() {
    let body = include_str!("fixtures/open_food_facts_product.json");
    let query = NutritionQuery::barcode("0001112223334", 100.0);

    let record = open_food_facts_provider::parse_response(body, &query).unwrap();

    assert_eq!(record.product_name, "Crunchy Cereal Bar");
    assert_eq!(record.brand.as_deref(), Some("Trail Co"));
    assert!(close(record.calories, 250.0));
    assert!(close(record.protein_g, 10.0));
    assert!(close(record.carbs_g, 30.0));
    assert!(close(record.fat_g, 8.0));
}

#[test]
fn test_open_food_facts_status_zero_is_not_found() {
    let body = include_str!("fixtures/open_food_facts_not_found.json");
    let query = NutritionQuery::barcode("9999999999999", 100.0);
    let err = open_food_facts_provider::parse_response(body, &query).unwrap_err();
    assert_eq!(err.kind, AdapterErrorKind::NotFound);
}

#[test]
fn test_open_food_facts_search_skips_empty_products_and_converts_kj() {
    let body = include_str!("fixtures/open_food_facts_search.json");
    let query = NutritionQuery::name("peanut butter", 100.0);

    let record = open_food_facts_provider::parse_response(body, &query).unwrap();

    assert_eq!(record.product_name, "Smooth Peanut Butter");
    assert!(close(record.calories, 2510.0 / 4.184));
}

// === Barcode Lookup ===

#[test]
fn test_barcode_lookup_parses_text_facts() {
    let body = include_str!("fixtures/barcode_lookup_products.json");
    let query = NutritionQuery::barcode("0016000275270", 37.0);

    let record = barcode_lookup_provider::parse_response(body, &query).unwrap();

    // Blank brand falls back to the manufacturer
    assert_eq!(record.brand.as_deref(), Some("General Mills"));
    assert!(close(record.calories, 140.0));
    assert!(close(record.fat_g, 2.0));
    assert!(close(record.sugar_g, 12.0));
}

// === UPC Database ===

#[test]
fn test_upc_database_loose_fields() {
    let body = include_str!("fixtures/upc_database_product.json");
    let query = NutritionQuery::barcode("0044000032029", 78.0);

    let record = upc_database_provider::parse_response(body, &query).unwrap();

    assert!(close(record.serving_grams, 39.0));
    assert!(close(record.calories, 190.0));
    assert!(close(record.carbs_g, 23.0));
}

#[test]
fn test_upc_database_unsuccessful_lookup() {
    let query = NutritionQuery::barcode("0044000032029", 100.0);
    let err = upc_database_provider::parse_response(r#"{"success": false}"#, &query).unwrap_err();
    assert_eq!(err.kind, AdapterErrorKind::NotFound);
}

// === Shared ===

#[test]
fn test_garbage_payload_is_malformed_everywhere() {
    let query = NutritionQuery::barcode("0001112223334", 100.0);
    let parsers = [
        nutritionix_provider::parse_response,
        usda_provider::parse_response,
        edamam_provider::parse_response,
        spoonacular_provider::parse_response,
        open_food_facts_provider::parse_response,
        barcode_lookup_provider::parse_response,
        upc_database_provider::parse_response,
    ];
    for parse in parsers {
        let err = parse("<html>502 Bad Gateway</html>", &query).unwrap_err();
        assert_eq!(err.kind, AdapterErrorKind::Malformed);
    }
}
