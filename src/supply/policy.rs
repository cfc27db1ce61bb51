//! Warning policy: the single decision point turning discrepancy signals into
//! warnings.
//!
//! One row per [`DiscrepancyKind`]: `{enabled, threshold, basis, severity}`.
//! Operators move between "warn liberally" and "warn never" by editing this
//! table, not code. A signal yields at most one warning.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::enums::{DiscrepancyKind, ThresholdBasis, WarningSeverity};

use super::messages::MessageTemplates;
use super::types::{DiscrepancySignal, SupplyError, WarningRecord};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WarningRule {
    pub enabled: bool,
    /// Magnitude the signal must exceed. Zero means "always, when enabled".
    pub threshold: f64,
    #[serde(default = "default_basis")]
    pub basis: ThresholdBasis,
    #[serde(default = "default_severity")]
    pub severity: WarningSeverity,
}

fn default_basis() -> ThresholdBasis {
    ThresholdBasis::Relative
}

fn default_severity() -> WarningSeverity {
    WarningSeverity::Standard
}

impl WarningRule {
    pub fn new(enabled: bool, threshold: f64, basis: ThresholdBasis, severity: WarningSeverity) -> Self {
        Self {
            enabled,
            threshold,
            basis,
            severity,
        }
    }

    fn admits(&self, signal: &DiscrepancySignal) -> bool {
        self.enabled && (self.threshold <= 0.0 || signal.magnitude(self.basis) > self.threshold)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PolicyFile")]
pub struct WarningPolicy {
    rules: BTreeMap<DiscrepancyKind, WarningRule>,
}

/// On-disk shape; kinds left out keep their tuned defaults.
#[derive(Deserialize)]
struct PolicyFile {
    #[serde(default)]
    rules: BTreeMap<DiscrepancyKind, WarningRule>,
}

impl From<PolicyFile> for WarningPolicy {
    fn from(file: PolicyFile) -> Self {
        let mut policy = WarningPolicy::default();
        policy.rules.extend(file.rules);
        policy
    }
}

impl Default for WarningPolicy {
    /// Tuned defaults: quantity mismatches only when off by more than 100%,
    /// expiration caps past 25%, bounds adjustments only in extreme cases
    /// (more than 500 days moved), unknown drugs and missing data always.
    fn default() -> Self {
        use DiscrepancyKind::*;
        use ThresholdBasis::*;
        use WarningSeverity::*;

        Self::from_rules([
            (QuantityMismatch, WarningRule::new(true, 1.0, Relative, Standard)),
            (ExpirationLimiting, WarningRule::new(true, 0.25, Relative, Info)),
            (DaySupplyAdjusted, WarningRule::new(true, 500.0, Absolute, Standard)),
            (UnknownDrug, WarningRule::new(true, 0.0, Relative, Standard)),
            (MissingData, WarningRule::new(true, 0.0, Relative, Info)),
        ])
    }
}

impl WarningPolicy {
    pub fn from_rules(rules: impl IntoIterator<Item = (DiscrepancyKind, WarningRule)>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    /// Every kind enabled with a zero threshold.
    pub fn maximum_transparency() -> Self {
        Self::from_rules(DiscrepancyKind::ALL.iter().map(|kind| {
            let base = Self::default().rule(*kind);
            (*kind, WarningRule { enabled: true, threshold: 0.0, ..base })
        }))
    }

    /// Every kind disabled: results carry no warnings, confidence still degrades.
    pub fn silent() -> Self {
        Self::from_rules(DiscrepancyKind::ALL.iter().map(|kind| {
            let base = Self::default().rule(*kind);
            (*kind, WarningRule { enabled: false, ..base })
        }))
    }

    /// Rule for a kind; kinds absent from the table are disabled.
    pub fn rule(&self, kind: DiscrepancyKind) -> WarningRule {
        self.rules.get(&kind).copied().unwrap_or(WarningRule {
            enabled: false,
            threshold: 0.0,
            basis: ThresholdBasis::Relative,
            severity: WarningSeverity::Info,
        })
    }

    pub fn set_rule(&mut self, kind: DiscrepancyKind, rule: WarningRule) {
        self.rules.insert(kind, rule);
    }

    /// Builder-style variant of [`set_rule`](Self::set_rule).
    pub fn with_rule(mut self, kind: DiscrepancyKind, rule: WarningRule) -> Self {
        self.set_rule(kind, rule);
        self
    }

    pub fn should_warn(&self, signal: &DiscrepancySignal) -> bool {
        self.rule(signal.kind).admits(signal)
    }

    /// Map signals to warnings, preserving signal order.
    pub fn evaluate(&self, signals: &[DiscrepancySignal], drug_label: &str) -> Vec<WarningRecord> {
        signals
            .iter()
            .filter(|signal| {
                let warn = self.should_warn(signal);
                if !warn {
                    tracing::debug!(
                        kind = signal.kind.as_str(),
                        relative = signal.relative_difference,
                        "Signal within tolerance, suppressed"
                    );
                }
                warn
            })
            .map(|signal| WarningRecord {
                kind: signal.kind,
                severity: self.rule(signal.kind).severity,
                message: MessageTemplates::render(signal, drug_label),
                expected: signal.expected,
                actual: signal.actual,
                relative_difference: signal.relative_difference,
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), SupplyError> {
        for (kind, rule) in &self.rules {
            if !(rule.threshold.is_finite() && rule.threshold >= 0.0) {
                return Err(SupplyError::InvalidConfig(format!(
                    "warning_policy.{} threshold must be a non-negative number (got {})",
                    kind.as_str(),
                    rule.threshold
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(kind: DiscrepancyKind, expected: f64, actual: f64) -> DiscrepancySignal {
        DiscrepancySignal::new(kind, expected, actual, "")
    }

    #[test]
    fn extreme_adjustment_warns() {
        let policy = WarningPolicy::default();
        assert!(policy.should_warn(&signal(DiscrepancyKind::DaySupplyAdjusted, 1000.0, 365.0)));
    }

    #[test]
    fn small_adjustment_suppressed() {
        let policy = WarningPolicy::default();
        assert!(!policy.should_warn(&signal(DiscrepancyKind::DaySupplyAdjusted, 400.0, 365.0)));
        assert!(!policy.should_warn(&signal(DiscrepancyKind::DaySupplyAdjusted, 3.0, 7.0)));
    }

    #[test]
    fn zero_threshold_always_warns_when_enabled() {
        let policy = WarningPolicy::default();
        assert!(policy.should_warn(&signal(DiscrepancyKind::UnknownDrug, 1.0, 1.0)));
    }

    #[test]
    fn disabled_kind_never_warns() {
        let policy = WarningPolicy::default().with_rule(
            DiscrepancyKind::UnknownDrug,
            WarningRule::new(false, 0.0, ThresholdBasis::Relative, WarningSeverity::Standard),
        );
        assert!(!policy.should_warn(&signal(DiscrepancyKind::UnknownDrug, 1.0, 0.0)));
    }

    #[test]
    fn quantity_threshold_is_exclusive() {
        let policy = WarningPolicy::default();
        // Exactly 100% off: not beyond the threshold.
        assert!(!policy.should_warn(&signal(DiscrepancyKind::QuantityMismatch, 2.0, 4.0)));
        assert!(policy.should_warn(&signal(DiscrepancyKind::QuantityMismatch, 2.0, 5.0)));
    }

    #[test]
    fn silent_and_transparent_presets() {
        let s = signal(DiscrepancyKind::ExpirationLimiting, 100.0, 95.0);
        assert!(!WarningPolicy::silent().should_warn(&s));
        assert!(WarningPolicy::maximum_transparency().should_warn(&s));
        assert!(!WarningPolicy::default().should_warn(&s));
    }

    #[test]
    fn raising_threshold_never_adds_warnings() {
        let signals: Vec<DiscrepancySignal> = [
            (2.0, 3.0),
            (2.0, 6.0),
            (10.0, 100.0),
            (5.0, 5.0),
            (1.0, 0.0),
        ]
        .iter()
        .map(|(e, a)| signal(DiscrepancyKind::QuantityMismatch, *e, *a))
        .collect();

        let mut previous = usize::MAX;
        for threshold in [0.0, 0.1, 0.5, 1.0, 2.0, 10.0, 1000.0] {
            let policy = WarningPolicy::default().with_rule(
                DiscrepancyKind::QuantityMismatch,
                WarningRule::new(true, threshold, ThresholdBasis::Relative, WarningSeverity::Standard),
            );
            let count = policy.evaluate(&signals, "drug").len();
            assert!(count <= previous, "threshold {threshold} raised count to {count}");
            previous = count;
        }
    }

    #[test]
    fn evaluate_emits_at_most_one_warning_per_signal() {
        let signals = vec![
            signal(DiscrepancyKind::UnknownDrug, 1.0, 0.0),
            signal(DiscrepancyKind::MissingData, 1.0, 0.0),
            signal(DiscrepancyKind::DaySupplyAdjusted, 1000.0, 365.0),
        ];
        let warnings = WarningPolicy::maximum_transparency().evaluate(&signals, "Mystery");
        assert_eq!(warnings.len(), signals.len());
        assert_eq!(warnings[0].kind, DiscrepancyKind::UnknownDrug);
        assert_eq!(warnings[2].kind, DiscrepancyKind::DaySupplyAdjusted);
        assert!(warnings[0].message.contains("Mystery"));
    }

    #[test]
    fn negative_threshold_invalid() {
        let policy = WarningPolicy::default().with_rule(
            DiscrepancyKind::MissingData,
            WarningRule::new(true, -1.0, ThresholdBasis::Relative, WarningSeverity::Info),
        );
        assert!(policy.validate().is_err());
    }

    #[test]
    fn serializes_as_rule_table() {
        let json = serde_json::to_value(WarningPolicy::default()).unwrap();
        assert_eq!(json["rules"]["day_supply_adjusted"]["threshold"], 500.0);
        assert_eq!(json["rules"]["day_supply_adjusted"]["basis"], "absolute");
        let back: WarningPolicy = serde_json::from_value(json).unwrap();
        assert_eq!(back, WarningPolicy::default());
    }
}
