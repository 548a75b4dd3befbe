// ABOUTME: Reconciliation, provider credential, and cache configuration loaded from the environment
// ABOUTME: ReconcileConfig is validated before any provider is contacted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

//! Runtime configuration
//!
//! Every `from_env` falls back to the documented defaults for unset
//! variables. A variable that is set but unparsable is an error, not a
//! silent default.

use nutriscan_core::constants::{cache, reconcile};
use nutriscan_intelligence::ConfigError;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Load a `.env` file from the working directory or one of its parents
///
/// Variables already present in the process take precedence over the file.
/// Returns the path that was loaded, if any.
#[must_use]
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Load a specific `.env` file
///
/// # Errors
///
/// Returns `ConfigError::Parse` when the file is missing or malformed.
pub fn load_dotenv_from(path: &Path) -> Result<(), ConfigError> {
    dotenvy::from_path(path)
        .map_err(|err| ConfigError::Parse(format!("{}: {err}", path.display())))
}

/// Timing and threshold knobs for one reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileConfig {
    /// Hard upper bound on the whole fan-out
    pub global_deadline: Duration,
    /// Hard upper bound on each adapter call
    pub per_source_timeout: Duration,
    /// Relative calorie distance from the running group mean that still agrees
    pub consensus_tolerance: f64,
    /// Relative distance from a group's smallest member that still agrees
    pub consensus_max_spread: f64,
    /// Minimum accuracy for an early exit
    pub fast_track_accuracy_threshold: f64,
    /// Minimum provider reliability for an early exit
    pub fast_track_reliability_threshold: f64,
    /// Whether a single trustworthy result may end the fan-out early
    pub fast_track_enabled: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            global_deadline: Duration::from_millis(reconcile::DEFAULT_GLOBAL_DEADLINE_MS),
            per_source_timeout: Duration::from_millis(reconcile::DEFAULT_PER_SOURCE_TIMEOUT_MS),
            consensus_tolerance: reconcile::DEFAULT_CONSENSUS_TOLERANCE,
            consensus_max_spread: reconcile::DEFAULT_CONSENSUS_MAX_SPREAD,
            fast_track_accuracy_threshold: reconcile::DEFAULT_FAST_TRACK_ACCURACY,
            fast_track_reliability_threshold: reconcile::DEFAULT_FAST_TRACK_RELIABILITY,
            fast_track_enabled: true,
        }
    }
}

impl ReconcileConfig {
    /// Load from `NUTRISCAN_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for a variable that is set but malformed,
    /// or any error from [`Self::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            global_deadline: env_parse::<u64>("NUTRISCAN_GLOBAL_DEADLINE_MS")?
                .map_or(defaults.global_deadline, Duration::from_millis),
            per_source_timeout: env_parse::<u64>("NUTRISCAN_PER_SOURCE_TIMEOUT_MS")?
                .map_or(defaults.per_source_timeout, Duration::from_millis),
            consensus_tolerance: env_parse("NUTRISCAN_CONSENSUS_TOLERANCE")?
                .unwrap_or(defaults.consensus_tolerance),
            consensus_max_spread: env_parse("NUTRISCAN_CONSENSUS_MAX_SPREAD")?
                .unwrap_or(defaults.consensus_max_spread),
            fast_track_accuracy_threshold: env_parse("NUTRISCAN_FAST_TRACK_ACCURACY")?
                .unwrap_or(defaults.fast_track_accuracy_threshold),
            fast_track_reliability_threshold: env_parse("NUTRISCAN_FAST_TRACK_RELIABILITY")?
                .unwrap_or(defaults.fast_track_reliability_threshold),
            fast_track_enabled: env_parse("NUTRISCAN_FAST_TRACK_ENABLED")?
                .unwrap_or(defaults.fast_track_enabled),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check durations, tolerances, and thresholds
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRange` for a zero duration or a spread
    /// below the tolerance, and `ConfigError::ValueOutOfRange` for a
    /// tolerance outside `(0, 1]` or a threshold outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.global_deadline.is_zero() {
            return Err(ConfigError::InvalidRange("global deadline must be positive"));
        }
        if self.per_source_timeout.is_zero() {
            return Err(ConfigError::InvalidRange(
                "per-source timeout must be positive",
            ));
        }
        if !(self.consensus_tolerance.is_finite()
            && self.consensus_tolerance > 0.0
            && self.consensus_tolerance <= 1.0)
        {
            return Err(ConfigError::ValueOutOfRange(format!(
                "consensus tolerance must be within (0, 1], got {}",
                self.consensus_tolerance
            )));
        }
        if !self.consensus_max_spread.is_finite()
            || self.consensus_max_spread < self.consensus_tolerance
        {
            return Err(ConfigError::InvalidRange(
                "consensus max spread must be finite and at least the tolerance",
            ));
        }
        check_threshold(
            self.fast_track_accuracy_threshold,
            "fast_track_accuracy_threshold",
        )?;
        check_threshold(
            self.fast_track_reliability_threshold,
            "fast_track_reliability_threshold",
        )
    }
}

fn check_threshold(value: f64, name: &str) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ValueOutOfRange(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

/// Parse an optional environment variable
fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Parse(format!("{key}={raw:?} is not a valid value"))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(ConfigError::EnvVar(err)),
    }
}

/// Read a variable, treating blank values as unset
fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// API keys for the HTTP providers, plus the offline dataset location
///
/// A provider is only registered when its credentials are present. Open Food
/// Facts needs none and is always available when compiled in.
#[derive(Clone, Default)]
pub struct ProviderCredentials {
    /// Nutritionix application id
    pub nutritionix_app_id: Option<String>,
    /// Nutritionix application key
    pub nutritionix_app_key: Option<String>,
    /// USDA `FoodData` Central key
    pub usda_api_key: Option<String>,
    /// Edamam application id
    pub edamam_app_id: Option<String>,
    /// Edamam application key
    pub edamam_app_key: Option<String>,
    /// Spoonacular key
    pub spoonacular_api_key: Option<String>,
    /// Barcode Lookup key
    pub barcode_lookup_api_key: Option<String>,
    /// UPC Database key
    pub upc_database_api_key: Option<String>,
    /// Path to a local JSON dataset
    pub offline_dataset: Option<PathBuf>,
}

impl ProviderCredentials {
    /// Read credentials from the environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            nutritionix_app_id: env_non_empty("NUTRITIONIX_APP_ID"),
            nutritionix_app_key: env_non_empty("NUTRITIONIX_APP_KEY"),
            usda_api_key: env_non_empty("USDA_API_KEY"),
            edamam_app_id: env_non_empty("EDAMAM_APP_ID"),
            edamam_app_key: env_non_empty("EDAMAM_APP_KEY"),
            spoonacular_api_key: env_non_empty("SPOONACULAR_API_KEY"),
            barcode_lookup_api_key: env_non_empty("BARCODE_LOOKUP_API_KEY"),
            upc_database_api_key: env_non_empty("UPC_DATABASE_API_KEY"),
            offline_dataset: env_non_empty("NUTRISCAN_OFFLINE_DATASET").map(PathBuf::from),
        }
    }
}

// Keys stay out of logs
impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const fn mask(value: Option<&String>) -> &'static str {
            if value.is_some() {
                "[set]"
            } else {
                "[unset]"
            }
        }
        f.debug_struct("ProviderCredentials")
            .field("nutritionix_app_id", &mask(self.nutritionix_app_id.as_ref()))
            .field("nutritionix_app_key", &mask(self.nutritionix_app_key.as_ref()))
            .field("usda_api_key", &mask(self.usda_api_key.as_ref()))
            .field("edamam_app_id", &mask(self.edamam_app_id.as_ref()))
            .field("edamam_app_key", &mask(self.edamam_app_key.as_ref()))
            .field("spoonacular_api_key", &mask(self.spoonacular_api_key.as_ref()))
            .field(
                "barcode_lookup_api_key",
                &mask(self.barcode_lookup_api_key.as_ref()),
            )
            .field(
                "upc_database_api_key",
                &mask(self.upc_database_api_key.as_ref()),
            )
            .field("offline_dataset", &self.offline_dataset)
            .finish()
    }
}

/// Caller-side result cache settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Entry count above which expired entries are swept on insert
    pub max_entries: usize,
    /// Lifetime of barcode results
    pub barcode_ttl: Duration,
    /// Lifetime of name results
    pub name_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: cache::DEFAULT_CACHE_MAX_ENTRIES,
            barcode_ttl: Duration::from_secs(cache::TTL_BARCODE_SECS),
            name_ttl: Duration::from_secs(cache::TTL_NAME_SECS),
        }
    }
}

impl CacheConfig {
    /// Load cache configuration from environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for a malformed variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            max_entries: env_parse("NUTRISCAN_CACHE_MAX_ENTRIES")?
                .unwrap_or(defaults.max_entries),
            barcode_ttl: env_parse::<u64>("NUTRISCAN_CACHE_TTL_BARCODE_SECS")?
                .map_or(defaults.barcode_ttl, Duration::from_secs),
            name_ttl: env_parse::<u64>("NUTRISCAN_CACHE_TTL_NAME_SECS")?
                .map_or(defaults.name_ttl, Duration::from_secs),
        })
    }
}
