//! Drug-name resolution as an ordered chain of match strategies.
//!
//! Each strategy either resolves a normalized name against the catalog or
//! passes; the first success wins. The chain always ends in the fallback
//! strategy, so classification never fails.

use std::sync::LazyLock;

use regex::Regex;
use strsim::normalized_levenshtein;

use crate::models::enums::{MatchMethod, MedicationCategory};
use crate::models::MedicationRecord;

use super::catalog::DrugCatalog;
use super::helpers::normalize_name;

/// Minimum length for containment and per-token comparisons.
const MIN_FRAGMENT_LEN: usize = 4;
/// Substring and token scores never reach an exact match.
const PARTIAL_SCORE_CEILING: f64 = 0.95;
const CONTAINMENT_BONUS: f64 = 0.2;

/// Outcome of classification: the record used and how it was found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogMatch<'a> {
    pub record: &'a MedicationRecord,
    /// Catalog name that matched; `None` for pattern and fallback matches.
    pub matched_name: Option<&'a str>,
    pub method: MatchMethod,
    /// Similarity of the best catalog candidate (1.0 for exact).
    pub similarity: f64,
}

impl CatalogMatch<'_> {
    pub fn category(&self) -> MedicationCategory {
        self.record.category
    }
}

/// One step of the resolution chain.
pub trait MatchStrategy: Send + Sync {
    fn method(&self) -> MatchMethod;

    /// Try to resolve an already-normalized name.
    fn attempt<'a>(&self, name: &str, catalog: &'a DrugCatalog) -> Option<CatalogMatch<'a>>;
}

// ═══════════════════════════════════════════════════════════
// Similarity
// ═══════════════════════════════════════════════════════════

/// Best of whole-name edit similarity, containment and per-token similarity.
pub fn name_similarity(query: &str, candidate: &str) -> f64 {
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    let whole = normalized_levenshtein(query, candidate);

    let (shorter, longer) = if query.len() <= candidate.len() {
        (query, candidate)
    } else {
        (candidate, query)
    };
    let containment = if shorter.len() >= MIN_FRAGMENT_LEN && longer.contains(shorter) {
        (shorter.len() as f64 / longer.len() as f64 + CONTAINMENT_BONUS).min(PARTIAL_SCORE_CEILING)
    } else {
        0.0
    };

    // "30 ml azelastine" → "azelastine"
    let token = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= MIN_FRAGMENT_LEN && t.chars().any(|c| c.is_alphabetic()))
        .map(|t| normalized_levenshtein(t, candidate))
        .fold(0.0, f64::max)
        .min(PARTIAL_SCORE_CEILING);

    whole.max(containment).max(token)
}

/// Highest-scoring catalog name. Ties keep the first name in key order.
pub fn best_candidate<'a>(
    name: &str,
    catalog: &'a DrugCatalog,
) -> Option<(&'a str, &'a MedicationRecord, f64)> {
    catalog
        .names()
        .map(|(key, record)| (key, record, name_similarity(name, key)))
        .fold(None, |best, candidate| match best {
            Some(b) if b.2 >= candidate.2 => Some(b),
            _ => Some(candidate),
        })
}

// ═══════════════════════════════════════════════════════════
// Strategies
// ═══════════════════════════════════════════════════════════

/// Case-insensitive, whitespace-normalized name or alias lookup.
pub struct ExactMatch;

impl MatchStrategy for ExactMatch {
    fn method(&self) -> MatchMethod {
        MatchMethod::Exact
    }

    fn attempt<'a>(&self, name: &str, catalog: &'a DrugCatalog) -> Option<CatalogMatch<'a>> {
        let record = catalog.get(name)?;
        Some(CatalogMatch {
            record,
            matched_name: Some(record.name.as_str()),
            method: MatchMethod::Exact,
            similarity: 1.0,
        })
    }
}

/// Closest catalog name, accepted at or above `min_similarity`.
pub struct FuzzyMatch {
    pub min_similarity: f64,
}

impl MatchStrategy for FuzzyMatch {
    fn method(&self) -> MatchMethod {
        MatchMethod::Fuzzy
    }

    fn attempt<'a>(&self, name: &str, catalog: &'a DrugCatalog) -> Option<CatalogMatch<'a>> {
        let (key, record, similarity) = best_candidate(name, catalog)?;
        if similarity < self.min_similarity {
            return None;
        }
        tracing::debug!(
            query = name,
            matched = key,
            similarity,
            "Fuzzy catalog match"
        );
        Some(CatalogMatch {
            record,
            matched_name: Some(record.name.as_str()),
            method: MatchMethod::Fuzzy,
            similarity,
        })
    }
}

/// Category-indicative fragments, checked in order.
static CATEGORY_PATTERNS: LazyLock<Vec<(Regex, MedicationCategory)>> = LazyLock::new(|| {
    [
        (r"\binsulin\b|\bunits?/ml\b", MedicationCategory::Insulin),
        (r"\b(?:nasal|nostril|nose)\b|\bspray\b", MedicationCategory::NasalInhaler),
        (
            r"\b(?:inhaler|inhalation|inh|hfa|mdi|dpi|diskus|ellipta|respimat|handihaler|aerosol|flexhaler|pressair)\b",
            MedicationCategory::OralInhaler,
        ),
        (r"\w+(?:mab|cept)\b", MedicationCategory::BiologicInjectable),
        (
            r"\w*(?:glutide|natide|tirzepatide|pramlintide)\b",
            MedicationCategory::DiabeticInjectable,
        ),
        (
            r"\b(?:pen|syringe|injection|injectable|inj|auto-?injector|prefilled|vial)s?\b",
            MedicationCategory::NonBiologicInjectable,
        ),
        (
            r"(?:drops?|gtts?)\b|\b(?:ophthalmic|ophth|eye)\b",
            MedicationCategory::EyeDrop,
        ),
        (
            r"\b(?:ointment|oint|cream|crm|gel|lotion|topical|foam|paste|emollient)\b",
            MedicationCategory::Topical,
        ),
    ]
    .into_iter()
    .map(|(pattern, category)| (Regex::new(pattern).unwrap(), category))
    .collect()
});

/// Category guessed from name fragments, resolved to the category template.
pub struct PatternMatch;

impl PatternMatch {
    pub fn category_for(name: &str) -> Option<MedicationCategory> {
        CATEGORY_PATTERNS
            .iter()
            .find(|(re, _)| re.is_match(name))
            .map(|(_, category)| *category)
    }
}

impl MatchStrategy for PatternMatch {
    fn method(&self) -> MatchMethod {
        MatchMethod::Pattern
    }

    fn attempt<'a>(&self, name: &str, catalog: &'a DrugCatalog) -> Option<CatalogMatch<'a>> {
        let category = Self::category_for(name)?;
        tracing::debug!(query = name, category = category.as_str(), "Pattern catalog match");
        Some(CatalogMatch {
            record: catalog.template(category),
            matched_name: None,
            method: MatchMethod::Pattern,
            similarity: best_candidate(name, catalog).map_or(0.0, |(_, _, s)| s),
        })
    }
}

/// Generic `Unknown` record. Always succeeds.
pub struct FallbackMatch;

impl FallbackMatch {
    pub fn resolve<'a>(&self, name: &str, catalog: &'a DrugCatalog) -> CatalogMatch<'a> {
        let similarity = best_candidate(name, catalog).map_or(0.0, |(_, _, s)| s);
        tracing::debug!(query = name, best_similarity = similarity, "Drug not recognized");
        CatalogMatch {
            record: catalog.fallback(),
            matched_name: None,
            method: MatchMethod::Fallback,
            similarity,
        }
    }
}

impl MatchStrategy for FallbackMatch {
    fn method(&self) -> MatchMethod {
        MatchMethod::Fallback
    }

    fn attempt<'a>(&self, name: &str, catalog: &'a DrugCatalog) -> Option<CatalogMatch<'a>> {
        Some(self.resolve(name, catalog))
    }
}

// ═══════════════════════════════════════════════════════════
// Classifier
// ═══════════════════════════════════════════════════════════

/// Resolves drug names to a category and match method.
pub struct CategoryClassifier {
    chain: Vec<Box<dyn MatchStrategy>>,
}

impl CategoryClassifier {
    /// Exact → fuzzy → pattern → fallback.
    pub fn new(min_similarity: f64) -> Self {
        Self::with_strategies(vec![
            Box::new(ExactMatch),
            Box::new(FuzzyMatch { min_similarity }),
            Box::new(PatternMatch),
            Box::new(FallbackMatch),
        ])
    }

    /// Custom chain. Fallback is applied if no strategy resolves the name.
    pub fn with_strategies(chain: Vec<Box<dyn MatchStrategy>>) -> Self {
        Self { chain }
    }

    pub fn methods(&self) -> Vec<MatchMethod> {
        self.chain.iter().map(|s| s.method()).collect()
    }

    pub fn classify<'a>(&self, drug_name: &str, catalog: &'a DrugCatalog) -> CatalogMatch<'a> {
        let name = normalize_name(drug_name);
        self.chain
            .iter()
            .find_map(|strategy| strategy.attempt(&name, catalog))
            .unwrap_or_else(|| FallbackMatch.resolve(&name, catalog))
    }
}
