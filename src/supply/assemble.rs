use crate::calculation_config::ConfidencePenalties;
use crate::models::enums::{DiscrepancyKind, MatchMethod, MedicationCategory, ParseConfidence};
use crate::models::PrescriptionInput;

use super::classify::CatalogMatch;
use super::formulas::FormulaOutcome;
use super::helpers::input_id;
use super::policy::WarningPolicy;
use super::types::{CalculationResult, DiscrepancySignal, NormalizedQuantity, ParsedSig};

/// Label used in warning messages when the drug name is blank.
const UNNAMED_DRUG: &str = "This medication";

/// Intermediate products of one calculation.
pub struct AssemblyParts<'a> {
    pub input: &'a PrescriptionInput,
    pub matched: CatalogMatch<'a>,
    pub quantity: NormalizedQuantity,
    pub sig: ParsedSig,
    pub outcome: FormulaOutcome,
    pub calculated_days: u32,
    pub bounds_signal: Option<DiscrepancySignal>,
}

/// Builds the final result: confidence score, filtered warnings, provenance.
#[derive(Debug, Clone, Copy)]
pub struct ResultAssembler {
    penalties: ConfidencePenalties,
}

impl ResultAssembler {
    pub fn new(penalties: ConfidencePenalties) -> Self {
        Self { penalties }
    }

    /// Start at 1.0, subtract each applicable penalty, clamp to [0, 1] and
    /// round to two decimals.
    pub fn confidence_score(
        &self,
        method: MatchMethod,
        category: MedicationCategory,
        quantity: ParseConfidence,
        sig: ParseConfidence,
        missing_data: usize,
    ) -> f64 {
        let p = &self.penalties;
        let mut score = 1.0;

        score -= match method {
            MatchMethod::Exact => 0.0,
            MatchMethod::Fuzzy => p.fuzzy_match,
            MatchMethod::Pattern => p.pattern_match,
            MatchMethod::Fallback => p.fallback_match,
        };
        if category == MedicationCategory::Unknown {
            score -= p.unresolved_category;
        }
        score -= match quantity {
            ParseConfidence::Full => 0.0,
            ParseConfidence::Partial => p.quantity_partial,
            ParseConfidence::Fallback => p.quantity_fallback,
        };
        score -= match sig {
            ParseConfidence::Full => 0.0,
            ParseConfidence::Partial => p.sig_partial,
            ParseConfidence::Fallback => p.sig_fallback,
        };
        score -= p.missing_attribute * missing_data as f64;

        let score: f64 = score.clamp(0.0, 1.0);
        (score * 100.0).round() / 100.0
    }

    pub fn assemble(&self, parts: AssemblyParts<'_>, policy: &WarningPolicy) -> CalculationResult {
        let AssemblyParts {
            input,
            matched,
            quantity,
            sig,
            outcome,
            calculated_days,
            bounds_signal,
        } = parts;

        let signals: Vec<DiscrepancySignal> =
            outcome.signals.into_iter().chain(bounds_signal).collect();
        let missing_data = signals
            .iter()
            .filter(|s| s.kind == DiscrepancyKind::MissingData)
            .count();

        let confidence_score = self.confidence_score(
            matched.method,
            matched.category(),
            quantity.confidence,
            sig.confidence,
            missing_data,
        );

        let label = match input.drug_name.trim() {
            "" => UNNAMED_DRUG,
            name => name,
        };
        let warnings = policy.evaluate(&signals, label);

        CalculationResult {
            input_id: input_id(input),
            drug_name: input.drug_name.clone(),
            matched_drug_name: matched.matched_name.map(str::to_string),
            matched_category: matched.category(),
            match_method: matched.method,
            match_similarity: (matched.similarity * 1000.0).round() / 1000.0,
            quantity,
            sig,
            standardized_sig: outcome.standardized_sig,
            raw_day_supply: outcome.raw_days,
            calculated_day_supply: calculated_days,
            confidence_score,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembler() -> ResultAssembler {
        ResultAssembler::new(ConfidencePenalties::default())
    }

    #[test]
    fn perfect_inputs_score_one() {
        let score = assembler().confidence_score(
            MatchMethod::Exact,
            MedicationCategory::Insulin,
            ParseConfidence::Full,
            ParseConfidence::Full,
            0,
        );
        assert_eq!(score, 1.0);
    }

    #[test]
    fn penalties_accumulate() {
        let score = assembler().confidence_score(
            MatchMethod::Fuzzy,
            MedicationCategory::OralInhaler,
            ParseConfidence::Partial,
            ParseConfidence::Fallback,
            1,
        );
        // 1.0 - 0.10 - 0.05 - 0.20 - 0.10
        assert_eq!(score, 0.55);
    }

    #[test]
    fn fallback_unknown_scores_lowest() {
        let score = assembler().confidence_score(
            MatchMethod::Fallback,
            MedicationCategory::Unknown,
            ParseConfidence::Partial,
            ParseConfidence::Fallback,
            0,
        );
        assert_eq!(score, 0.15);
    }

    #[test]
    fn score_never_negative() {
        let score = assembler().confidence_score(
            MatchMethod::Fallback,
            MedicationCategory::Unknown,
            ParseConfidence::Fallback,
            ParseConfidence::Fallback,
            10,
        );
        assert_eq!(score, 0.0);
    }

    #[test]
    fn pattern_scores_below_fuzzy() {
        let a = assembler();
        let fuzzy = a.confidence_score(
            MatchMethod::Fuzzy,
            MedicationCategory::EyeDrop,
            ParseConfidence::Full,
            ParseConfidence::Full,
            0,
        );
        let pattern = a.confidence_score(
            MatchMethod::Pattern,
            MedicationCategory::EyeDrop,
            ParseConfidence::Full,
            ParseConfidence::Full,
            0,
        );
        assert!(pattern < fuzzy);
    }
}
