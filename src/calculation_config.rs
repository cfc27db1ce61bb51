//! Tunable parameters for day-supply calculation.
//!
//! Built once at startup (from `supply_config.json` or `Default`), validated,
//! then shared read-only by every calculation. Every threshold an operator may
//! want to dial lives here; nothing in the engine hard-codes a tuning decision.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::supply::policy::WarningPolicy;
use crate::supply::types::SupplyError;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationConfig {
    pub bounds: BoundsConfig,
    pub defaults: DefaultsConfig,
    pub matching: MatchingConfig,
    pub penalties: ConfidencePenalties,
    pub warning_policy: WarningPolicy,
}

/// Safe range for the final day supply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsConfig {
    pub min_days: u32,
    pub max_days: u32,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            min_days: 7,
            max_days: 365,
        }
    }
}

impl BoundsConfig {
    pub fn validate(&self) -> Result<(), SupplyError> {
        if self.max_days == 0 || self.min_days > self.max_days {
            return Err(SupplyError::InvalidConfig(format!(
                "bounds must satisfy 0 <= min_days <= max_days and max_days > 0 (got {}..{})",
                self.min_days, self.max_days
            )));
        }
        Ok(())
    }
}

/// Values substituted when the input or the catalog is silent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Quantity used when no number can be found in the quantity text.
    pub quantity: f64,
    /// Dose per administration when the sig states none.
    pub dose: f64,
    /// Division guard only; stated doses above it are kept as written.
    pub dose_floor: f64,
    /// Administrations per day when no frequency is recognized.
    pub frequency: f64,
    pub frequency_floor: f64,
    /// Share of the maximum PRN frequency assumed to be used.
    pub prn_usage_factor: f64,
    /// Interval substituted for injectables with no parsable schedule.
    pub injectable_interval_days: f64,
    /// Grams per application when no body area is named.
    pub topical_grams_per_application: f64,
    /// Grams in one finger-tip unit.
    pub ftu_grams: f64,
    pub eye_drops_per_ml: f64,
    pub eye_bottle_ml: f64,
    /// Unit-less nasal/eye quantities above this are read as millilitres.
    pub bare_quantity_volume_threshold: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            quantity: 1.0,
            dose: 1.0,
            dose_floor: 0.01,
            frequency: 1.0,
            frequency_floor: 1.0,
            prn_usage_factor: 0.5,
            injectable_interval_days: 7.0,
            topical_grams_per_application: 2.0,
            ftu_grams: 0.5,
            eye_drops_per_ml: 20.0,
            eye_bottle_ml: 5.0,
            bare_quantity_volume_threshold: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum similarity (0..=1) for a fuzzy catalog match to be accepted.
    pub min_similarity: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_similarity: 0.80,
        }
    }
}

/// Fixed deductions from a starting confidence of 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidencePenalties {
    pub fuzzy_match: f64,
    pub pattern_match: f64,
    pub fallback_match: f64,
    pub unresolved_category: f64,
    pub quantity_partial: f64,
    pub quantity_fallback: f64,
    pub sig_partial: f64,
    pub sig_fallback: f64,
    pub missing_attribute: f64,
}

impl Default for ConfidencePenalties {
    fn default() -> Self {
        Self {
            fuzzy_match: 0.10,
            pattern_match: 0.25,
            fallback_match: 0.40,
            unresolved_category: 0.20,
            quantity_partial: 0.05,
            quantity_fallback: 0.20,
            sig_partial: 0.05,
            sig_fallback: 0.20,
            missing_attribute: 0.10,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Loading & validation
// ═══════════════════════════════════════════════════════════

impl CalculationConfig {
    /// Load and validate a JSON configuration file. Missing sections take defaults.
    pub fn load(path: &Path) -> Result<Self, SupplyError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            SupplyError::ReferenceDataLoad(path.display().to_string(), e.to_string())
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| {
            SupplyError::ReferenceDataParse(path.display().to_string(), e.to_string())
        })?;
        config.validate()?;
        tracing::info!(
            path = %path.display(),
            min_days = config.bounds.min_days,
            max_days = config.bounds.max_days,
            "Calculation config loaded"
        );
        Ok(config)
    }

    /// Reject values that would break calculation invariants.
    pub fn validate(&self) -> Result<(), SupplyError> {
        self.bounds.validate()?;

        let d = &self.defaults;
        let positives = [
            ("defaults.quantity", d.quantity),
            ("defaults.dose", d.dose),
            ("defaults.dose_floor", d.dose_floor),
            ("defaults.frequency", d.frequency),
            ("defaults.frequency_floor", d.frequency_floor),
            ("defaults.prn_usage_factor", d.prn_usage_factor),
            ("defaults.injectable_interval_days", d.injectable_interval_days),
            ("defaults.topical_grams_per_application", d.topical_grams_per_application),
            ("defaults.ftu_grams", d.ftu_grams),
            ("defaults.eye_drops_per_ml", d.eye_drops_per_ml),
            ("defaults.eye_bottle_ml", d.eye_bottle_ml),
            ("defaults.bare_quantity_volume_threshold", d.bare_quantity_volume_threshold),
        ];
        for (name, value) in positives {
            if !(value.is_finite() && value > 0.0) {
                return Err(SupplyError::InvalidConfig(format!(
                    "{name} must be a positive number (got {value})"
                )));
            }
        }
        if d.prn_usage_factor > 1.0 {
            return Err(SupplyError::InvalidConfig(format!(
                "defaults.prn_usage_factor must not exceed 1.0 (got {})",
                d.prn_usage_factor
            )));
        }

        let similarity = self.matching.min_similarity;
        if !(similarity > 0.0 && similarity <= 1.0) {
            return Err(SupplyError::InvalidConfig(format!(
                "matching.min_similarity must be in (0, 1] (got {similarity})"
            )));
        }

        let p = &self.penalties;
        for value in [
            p.fuzzy_match,
            p.pattern_match,
            p.fallback_match,
            p.unresolved_category,
            p.quantity_partial,
            p.quantity_fallback,
            p.sig_partial,
            p.sig_fallback,
            p.missing_attribute,
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SupplyError::InvalidConfig(format!(
                    "confidence penalties must be in [0, 1] (got {value})"
                )));
            }
        }

        self.warning_policy.validate()
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
