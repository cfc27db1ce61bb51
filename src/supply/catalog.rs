use std::collections::BTreeMap;
use std::path::Path;

use crate::models::enums::MedicationCategory;
use crate::models::{MedicationAttributes, MedicationRecord};

use super::classify::{CatalogMatch, CategoryClassifier};
use super::helpers::normalize_name;
use super::types::SupplyError;

const BUNDLED_CATALOG: &str = include_str!("../../resources/drug_catalog.json");

/// Conservative attributes for a category, used when a record (or a
/// pattern-only match) lacks product data.
pub fn category_template(category: MedicationCategory) -> MedicationAttributes {
    let mut attrs = MedicationAttributes::default();
    match category {
        MedicationCategory::NasalInhaler => {
            attrs.device_capacity = Some(120.0);
            attrs.package_size = Some(15.0);
            attrs.dose_per_administration = Some(1.0);
        }
        MedicationCategory::OralInhaler => {
            attrs.device_capacity = Some(200.0);
            attrs.dose_per_administration = Some(2.0);
        }
        MedicationCategory::Insulin => {
            attrs.device_capacity = Some(300.0);
            attrs.units_per_ml = Some(100.0);
            attrs.dose_per_administration = Some(10.0);
            attrs.beyond_use_days = Some(28);
            attrs.strength_unit = Some("units".into());
        }
        MedicationCategory::BiologicInjectable => {
            attrs.doses_per_container = Some(1.0);
            attrs.interval_days = Some(14.0);
        }
        MedicationCategory::NonBiologicInjectable | MedicationCategory::DiabeticInjectable => {
            attrs.doses_per_container = Some(1.0);
            attrs.interval_days = Some(7.0);
        }
        MedicationCategory::EyeDrop => {
            attrs.package_size = Some(5.0);
            attrs.drops_per_ml = Some(20.0);
            attrs.dose_per_administration = Some(1.0);
            attrs.beyond_use_days = Some(28);
        }
        MedicationCategory::Topical => {
            attrs.package_size = Some(30.0);
            attrs.strength_unit = Some("g".into());
        }
        MedicationCategory::Unknown => {}
    }
    attrs
}

/// Immutable name → medication table. Built once, shared read-only.
#[derive(Debug, Clone)]
pub struct DrugCatalog {
    records: Vec<MedicationRecord>,
    /// Normalized name or alias → index into `records`.
    index: BTreeMap<String, usize>,
    /// One generic record per category for pattern matches and the fallback.
    templates: BTreeMap<MedicationCategory, MedicationRecord>,
}

impl DrugCatalog {
    /// Build the catalog, rejecting names that resolve to two different records.
    pub fn from_records(records: Vec<MedicationRecord>) -> Result<Self, SupplyError> {
        let mut index: BTreeMap<String, usize> = BTreeMap::new();
        for (i, record) in records.iter().enumerate() {
            for name in record.names() {
                let key = normalize_name(name);
                if key.is_empty() {
                    return Err(SupplyError::ReferenceDataParse(
                        record.name.clone(),
                        "empty drug name or alias".into(),
                    ));
                }
                if let Some(&existing) = index.get(&key) {
                    if existing != i {
                        return Err(SupplyError::ReferenceDataParse(
                            key,
                            format!(
                                "name claimed by both '{}' and '{}'",
                                records[existing].name, record.name
                            ),
                        ));
                    }
                    continue;
                }
                index.insert(key, i);
            }
        }

        let templates = MedicationCategory::ALL
            .iter()
            .map(|&category| {
                let mut record =
                    MedicationRecord::new(format!("generic {}", category.as_str()), category);
                record.attributes = category_template(category);
                (category, record)
            })
            .collect();

        Ok(Self {
            records,
            index,
            templates,
        })
    }

    /// Load a catalog from a JSON array of medication records.
    pub fn load(path: &Path) -> Result<Self, SupplyError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            SupplyError::ReferenceDataLoad(path.display().to_string(), e.to_string())
        })?;
        let catalog = Self::from_json(&json, &path.display().to_string())?;
        tracing::info!(
            path = %path.display(),
            records = catalog.len(),
            names = catalog.index.len(),
            "Drug catalog loaded"
        );
        Ok(catalog)
    }

    /// The catalog compiled into the crate.
    pub fn bundled() -> Result<Self, SupplyError> {
        Self::from_json(BUNDLED_CATALOG, crate::config::CATALOG_FILE)
    }

    fn from_json(json: &str, source: &str) -> Result<Self, SupplyError> {
        let records: Vec<MedicationRecord> = serde_json::from_str(json)
            .map_err(|e| SupplyError::ReferenceDataParse(source.into(), e.to_string()))?;
        Self::from_records(records)
    }

    /// Resolve a drug name with the standard exact → fuzzy → pattern → fallback chain.
    pub fn lookup(&self, drug_name: &str, min_similarity: f64) -> CatalogMatch<'_> {
        CategoryClassifier::new(min_similarity).classify(drug_name, self)
    }

    /// Exact lookup on an already-normalized name.
    pub fn get(&self, normalized: &str) -> Option<&MedicationRecord> {
        self.index.get(normalized).map(|&i| &self.records[i])
    }

    /// Every (normalized name, record) pair in key order.
    pub fn names(&self) -> impl Iterator<Item = (&str, &MedicationRecord)> {
        self.index
            .iter()
            .map(|(name, &i)| (name.as_str(), &self.records[i]))
    }

    pub fn template(&self, category: MedicationCategory) -> &MedicationRecord {
        // Every category is inserted at construction.
        &self.templates[&category]
    }

    pub fn fallback(&self) -> &MedicationRecord {
        self.template(MedicationCategory::Unknown)
    }

    pub fn records(&self) -> &[MedicationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
