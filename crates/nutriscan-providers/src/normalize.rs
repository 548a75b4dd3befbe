// ABOUTME: Helpers shared by adapters to coerce loosely-typed provider values into grams and kcal
// ABOUTME: Lenient number parsing, unit conversion, free-text quantity parsing, and barcode comparison
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

use nutriscan_core::constants::units::{GRAMS_PER_OUNCE, KJ_PER_KCAL};
use serde_json::Value;

/// Read a JSON number, or a string holding one ("12.5", "12,5", "12.5 g")
#[must_use]
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_quantity(s).map(|(amount, _)| amount),
        _ => None,
    }
}

/// Missing values count as zero, the record's "not reported" marker
#[must_use]
pub fn or_missing(value: Option<f64>) -> f64 {
    value.unwrap_or(0.0)
}

/// Split `"40 g"`, `"1.5oz"` or `"250"` into amount and lower-cased unit
#[must_use]
pub fn parse_quantity(text: &str) -> Option<(f64, String)> {
    let text = text.trim();
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .unwrap_or(text.len());
    let (amount, unit) = text.split_at(split);
    let amount: f64 = amount.replace(',', ".").parse().ok()?;
    amount
        .is_finite()
        .then(|| (amount, unit.trim().to_lowercase()))
}

/// Convert an amount in `unit` to grams, if it is a mass unit
#[must_use]
pub fn to_grams(amount: f64, unit: &str) -> Option<f64> {
    match unit.trim().to_lowercase().as_str() {
        "g" | "gr" | "gram" | "grams" | "grm" => Some(amount),
        "mg" => Some(amount / 1000.0),
        "kg" => Some(amount * 1000.0),
        "oz" | "ounce" | "ounces" => Some(amount * GRAMS_PER_OUNCE),
        _ => None,
    }
}

/// Convert an energy amount to kcal
#[must_use]
pub fn to_kcal(amount: f64, unit: &str) -> Option<f64> {
    match unit.trim().to_lowercase().as_str() {
        "kcal" | "cal" | "calories" | "" => Some(amount),
        "kj" => Some(amount / KJ_PER_KCAL),
        _ => None,
    }
}

/// Compare barcodes ignoring leading zeros (UPC-A vs EAN-13 vs GTIN-14)
#[must_use]
pub fn same_barcode(a: &str, b: &str) -> bool {
    let a = a.trim().trim_start_matches('0');
    let b = b.trim().trim_start_matches('0');
    !a.is_empty() && a == b
}

/// Trimmed, non-empty text
#[must_use]
pub fn non_blank(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_accepts_strings() {
        assert_eq!(number(&json!(12.5)), Some(12.5));
        assert_eq!(number(&json!("7,5")), Some(7.5));
        assert_eq!(number(&json!("30 g")), Some(30.0));
        assert_eq!(number(&json!(null)), None);
        assert_eq!(number(&json!("n/a")), None);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("40 g"), Some((40.0, "g".to_owned())));
        assert_eq!(parse_quantity("1.5OZ"), Some((1.5, "oz".to_owned())));
        assert_eq!(parse_quantity("about 3"), None);
    }

    #[test]
    fn test_unit_conversion() {
        assert_eq!(to_grams(250.0, "mg"), Some(0.25));
        assert!(to_grams(1.0, "cup").is_none());
        let kcal = to_kcal(418.4, "kJ").unwrap();
        assert!((kcal - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_barcode_ignores_padding() {
        assert!(same_barcode("0012345678905", "012345678905"));
        assert!(!same_barcode("000", "0"));
        assert!(!same_barcode("123", "124"));
    }
}
