use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::enums::{
    DiscrepancyKind, MatchMethod, MedicationCategory, ParseConfidence, QuantityUnit,
    ThresholdBasis, WarningSeverity,
};
use crate::models::PrescriptionInput;

// ---------------------------------------------------------------------------
// NormalizedQuantity
// ---------------------------------------------------------------------------

/// Numeric quantity extracted from free text, with its canonical unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedQuantity {
    pub value: f64,
    pub unit: QuantityUnit,
    pub confidence: ParseConfidence,
}

// ---------------------------------------------------------------------------
// ParsedSig
// ---------------------------------------------------------------------------

/// Dosing instruction reduced to an amount per administration and a daily rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSig {
    /// Amount per administration, never below the configured dose floor.
    pub dose_amount: f64,
    /// Unit token that accompanied the dose ("spray", "unit", "drop", ...).
    pub dose_unit: Option<String>,
    /// Administrations per day, never below the configured frequency floor.
    pub frequency_per_day: f64,
    /// Days between administrations for weekly/monthly style schedules.
    pub interval_days: Option<f64>,
    pub is_prn: bool,
    /// Dose applies to both sides (each nostril, both eyes).
    pub bilateral: bool,
    /// Whether the dose came from the text rather than a default.
    pub dose_stated: bool,
    /// Whether a frequency or interval expression was recognized.
    pub schedule_recognized: bool,
    pub confidence: ParseConfidence,
}

// ---------------------------------------------------------------------------
// DiscrepancySignal
// ---------------------------------------------------------------------------

/// Raised wherever a computed value deviates from a naive or expected one.
/// Signals are data; only the warning policy turns them into warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscrepancySignal {
    pub kind: DiscrepancyKind,
    /// Reference value: the naive computation or the amount needed.
    pub expected: f64,
    /// Value actually used or supplied.
    pub actual: f64,
    /// |actual - expected| / |expected|.
    pub relative_difference: f64,
    /// Short machine-oriented context (attribute names, caps applied).
    pub context: String,
}

/// Overflowed values saturate so results stay plain, comparable numbers.
fn saturate(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(f64::MIN, f64::MAX)
    }
}

impl DiscrepancySignal {
    pub fn new(kind: DiscrepancyKind, expected: f64, actual: f64, context: impl Into<String>) -> Self {
        let expected = saturate(expected);
        let actual = saturate(actual);
        let denominator = if expected.abs() > f64::EPSILON {
            expected.abs()
        } else {
            1.0
        };
        Self {
            kind,
            expected,
            actual,
            relative_difference: saturate((actual - expected).abs() / denominator),
            context: context.into(),
        }
    }

    /// Magnitude compared against a policy threshold.
    pub fn magnitude(&self, basis: ThresholdBasis) -> f64 {
        match basis {
            ThresholdBasis::Relative => self.relative_difference,
            ThresholdBasis::Absolute => (self.actual - self.expected).abs(),
        }
    }
}

// ---------------------------------------------------------------------------
// WarningRecord
// ---------------------------------------------------------------------------

/// A signal that passed the warning policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningRecord {
    pub kind: DiscrepancyKind,
    pub severity: WarningSeverity,
    pub message: String,
    pub expected: f64,
    pub actual: f64,
    pub relative_difference: f64,
}

// ---------------------------------------------------------------------------
// CalculationResult
// ---------------------------------------------------------------------------

/// Final, immutable answer for one prescription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// Deterministic id derived from the input fields.
    pub input_id: Uuid,
    pub drug_name: String,
    pub matched_drug_name: Option<String>,
    pub matched_category: MedicationCategory,
    pub match_method: MatchMethod,
    pub match_similarity: f64,
    pub quantity: NormalizedQuantity,
    pub sig: ParsedSig,
    pub standardized_sig: String,
    /// Formula output before bounds were applied.
    pub raw_day_supply: u32,
    pub calculated_day_supply: u32,
    pub confidence_score: f64,
    pub warnings: Vec<WarningRecord>,
}

// ---------------------------------------------------------------------------
// SupplyError
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum SupplyError {
    #[error("Unusable prescription input: {0}")]
    Structural(String),

    #[error("Reference data load failed ({0}): {1}")]
    ReferenceDataLoad(String, String),

    #[error("Reference data parse failed ({0}): {1}")]
    ReferenceDataParse(String, String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
}

// ---------------------------------------------------------------------------
// SupplyEngine trait
// ---------------------------------------------------------------------------

/// Entry point for day-supply calculation.
pub trait SupplyEngine {
    /// Process one prescription. Fails only for structurally unusable input.
    fn calculate(&self, input: &PrescriptionInput) -> Result<CalculationResult, SupplyError>;

    /// Process many prescriptions independently; results keep input order.
    fn calculate_batch(
        &self,
        inputs: &[PrescriptionInput],
    ) -> Vec<Result<CalculationResult, SupplyError>>;
}
