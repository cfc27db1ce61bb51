use serde::{Deserialize, Serialize};

use super::enums::MedicationCategory;

/// Catalog entry: one product and the attributes its day-supply formula reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationRecord {
    pub name: String,
    pub category: MedicationCategory,
    /// Brand names, generic names and common shorthand resolving to this record.
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub attributes: MedicationAttributes,
}

/// Category-specific product attributes. Absent values fall back to configured
/// defaults at calculation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedicationAttributes {
    /// Actuations per device (sprays, puffs, blisters) or units per insulin container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_capacity: Option<f64>,
    /// Container volume in mL, or grams per tube for topicals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units_per_ml: Option<f64>,
    /// Usual amount per administration when the sig does not state one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose_per_administration: Option<f64>,
    /// Devices labelled for a fixed schedule (e.g. once-daily Ellipta).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_daily_frequency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doses_per_container: Option<f64>,
    /// Labelled administration interval for injectables.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_days: Option<f64>,
    /// Beyond-use / discard-after-opening window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beyond_use_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drops_per_ml: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength_unit: Option<String>,
}

impl MedicationRecord {
    pub fn new(name: impl Into<String>, category: MedicationCategory) -> Self {
        Self {
            name: name.into(),
            category,
            aliases: Vec::new(),
            attributes: MedicationAttributes::default(),
        }
    }

    /// All names this record answers to, primary name first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}
