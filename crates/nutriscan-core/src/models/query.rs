// ABOUTME: Immutable food lookup request produced by the food-recognition pipeline
// ABOUTME: Barcode or free-text name plus the portion size in grams
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

use crate::constants::reconcile::{MAX_BARCODE_DIGITS, MAX_PORTION_GRAMS, MIN_BARCODE_DIGITS};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// How the food item is identified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    /// EAN/UPC/GTIN barcode digits
    Barcode,
    /// Free-text food name (e.g. "banana", "greek yogurt")
    Name,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Barcode => write!(f, "barcode"),
            Self::Name => write!(f, "name"),
        }
    }
}

/// Reasons a query is refused before any provider is contacted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Identifier is empty after trimming
    #[error("identifier must not be empty")]
    EmptyIdentifier,

    /// Barcode contains something other than digits or has an unsupported length
    #[error("barcode must be 8-14 digits, got {0:?}")]
    InvalidBarcode(String),

    /// Portion is not a finite number in `(0, 2000]` grams
    #[error("portion must be a positive number of grams up to 2000, got {0}")]
    InvalidPortion(String),
}

/// A single food lookup request
///
/// Created by the caller and never mutated by the engine. The identifier is
/// stored trimmed so cache keys and provider requests agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionQuery {
    /// Barcode or name
    pub identifier_kind: IdentifierKind,
    /// Barcode digits or food name
    pub identifier: String,
    /// Portion size the caller wants nutrition for, in grams
    pub portion_grams: f64,
}

impl NutritionQuery {
    /// Build a barcode query
    #[must_use]
    pub fn barcode(code: impl AsRef<str>, portion_grams: f64) -> Self {
        Self {
            identifier_kind: IdentifierKind::Barcode,
            identifier: code.as_ref().trim().to_owned(),
            portion_grams,
        }
    }

    /// Build a free-text name query
    #[must_use]
    pub fn name(name: impl AsRef<str>, portion_grams: f64) -> Self {
        Self {
            identifier_kind: IdentifierKind::Name,
            identifier: name.as_ref().trim().to_owned(),
            portion_grams,
        }
    }

    /// Whether this query identifies a product by barcode
    #[must_use]
    pub fn is_barcode(&self) -> bool {
        self.identifier_kind == IdentifierKind::Barcode
    }

    /// Check the query is well-formed
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] when the identifier is empty, a barcode is not
    /// 8-14 digits, or the portion is not within `(0, 2000]` grams.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.identifier.trim().is_empty() {
            return Err(QueryError::EmptyIdentifier);
        }
        if self.is_barcode() {
            let len = self.identifier.len();
            let digits_only = self.identifier.bytes().all(|b| b.is_ascii_digit());
            if !digits_only || !(MIN_BARCODE_DIGITS..=MAX_BARCODE_DIGITS).contains(&len) {
                return Err(QueryError::InvalidBarcode(self.identifier.clone()));
            }
        }
        if !self.portion_grams.is_finite()
            || self.portion_grams <= 0.0
            || self.portion_grams > MAX_PORTION_GRAMS
        {
            return Err(QueryError::InvalidPortion(self.portion_grams.to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for NutritionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} ({}g)",
            self.identifier_kind, self.identifier, self.portion_grams
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_barcode_query_trims_identifier() {
        let query = NutritionQuery::barcode("  0001112223334 ", 100.0);
        assert_eq!(query.identifier, "0001112223334");
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_digit_barcode() {
        let query = NutritionQuery::barcode("12345abc9", 100.0);
        assert!(matches!(
            query.validate(),
            Err(QueryError::InvalidBarcode(_))
        ));
    }

    #[test]
    fn test_rejects_short_barcode() {
        let query = NutritionQuery::barcode("1234", 100.0);
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_portion() {
        for portion in [0.0, -5.0, f64::NAN, f64::INFINITY, 2_000.5] {
            let query = NutritionQuery::name("banana", portion);
            assert!(matches!(
                query.validate(),
                Err(QueryError::InvalidPortion(_))
            ));
        }
    }

    #[test]
    fn test_largest_portion_is_accepted() {
        assert!(NutritionQuery::name("soup", MAX_PORTION_GRAMS).validate().is_ok());
        assert!(NutritionQuery::name("soup", 2_500.0).validate().is_err());
    }

    #[test]
    fn test_rejects_blank_name() {
        assert_eq!(
            NutritionQuery::name("   ", 50.0).validate(),
            Err(QueryError::EmptyIdentifier)
        );
    }
}
