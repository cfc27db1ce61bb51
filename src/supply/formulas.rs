//! Category-specific day-supply formulas.
//!
//! Each formula is a pure function of the matched record, the normalized
//! quantity and the parsed sig. Formulas never overwrite the prescribed
//! quantity; where their estimate deviates from the naive one they emit a
//! `DiscrepancySignal` and leave the warning decision to the policy.

use std::sync::LazyLock;

use regex::Regex;

use crate::calculation_config::DefaultsConfig;
use crate::models::enums::{DiscrepancyKind, MedicationCategory, QuantityUnit};
use crate::models::{MedicationAttributes, MedicationRecord};

use super::catalog::category_template;
use super::helpers::{clamped_div, floor_days, frequency_to_text};
use super::messages::format_amount;
use super::types::{DiscrepancySignal, NormalizedQuantity, ParsedSig};

/// Unit-less insulin quantities at or above this are read as units.
const BARE_INSULIN_UNITS_THRESHOLD: f64 = 100.0;
/// Slack for float error before rounding device counts up.
const CEIL_EPSILON: f64 = 1e-9;

/// Everything a formula may read.
#[derive(Debug, Clone, Copy)]
pub struct FormulaInput<'a> {
    pub record: &'a MedicationRecord,
    pub quantity: &'a NormalizedQuantity,
    pub sig: &'a ParsedSig,
    /// Original sig text, for vocabulary the parser does not model (body areas).
    pub sig_text: &'a str,
    pub defaults: &'a DefaultsConfig,
    pub max_days: u32,
    pub match_similarity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormulaOutcome {
    /// Floor of the computed supply, before bounds.
    pub raw_days: u32,
    pub signals: Vec<DiscrepancySignal>,
    pub standardized_sig: String,
}

pub type Formula = fn(&FormulaInput<'_>) -> FormulaOutcome;

/// Category → formula. Every category has exactly one entry.
static FORMULAS: &[(MedicationCategory, Formula)] = &[
    (MedicationCategory::NasalInhaler, inhaler_days),
    (MedicationCategory::OralInhaler, inhaler_days),
    (MedicationCategory::Insulin, insulin_days),
    (MedicationCategory::BiologicInjectable, injectable_days),
    (MedicationCategory::NonBiologicInjectable, injectable_days),
    (MedicationCategory::DiabeticInjectable, injectable_days),
    (MedicationCategory::EyeDrop, eye_drop_days),
    (MedicationCategory::Topical, topical_days),
    (MedicationCategory::Unknown, unknown_days),
];

/// Dispatches to the formula for the record's category.
#[derive(Debug, Clone, Copy, Default)]
pub struct DaySupplyCalculator;

impl DaySupplyCalculator {
    pub fn formula_for(category: MedicationCategory) -> Formula {
        FORMULAS
            .iter()
            .find(|(c, _)| *c == category)
            .map_or(unknown_days as Formula, |(_, formula)| *formula)
    }

    pub fn calculate(&self, input: &FormulaInput<'_>) -> FormulaOutcome {
        let outcome = Self::formula_for(input.record.category)(input);
        tracing::debug!(
            drug = %input.record.name,
            category = input.record.category.as_str(),
            raw_days = outcome.raw_days,
            signals = outcome.signals.len(),
            "Formula applied"
        );
        outcome
    }
}

// ═══════════════════════════════════════════════════════════
// Shared formula state
// ═══════════════════════════════════════════════════════════

struct FormulaContext<'a, 'b> {
    input: &'b FormulaInput<'a>,
    template: MedicationAttributes,
    signals: Vec<DiscrepancySignal>,
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

impl<'a, 'b> FormulaContext<'a, 'b> {
    fn new(input: &'b FormulaInput<'a>) -> Self {
        Self {
            input,
            template: category_template(input.record.category),
            signals: Vec::new(),
        }
    }

    fn attributes(&self) -> &MedicationAttributes {
        &self.input.record.attributes
    }

    /// Record value, else category template, silently.
    fn known(&self, pick: fn(&MedicationAttributes) -> Option<f64>) -> Option<f64> {
        positive(pick(self.attributes())).or_else(|| positive(pick(&self.template)))
    }

    /// Record value, else a substitute plus a MissingData signal.
    fn required(
        &mut self,
        label: &str,
        pick: fn(&MedicationAttributes) -> Option<f64>,
        generic: f64,
    ) -> f64 {
        if let Some(value) = positive(pick(self.attributes())) {
            return value;
        }
        let value = positive(pick(&self.template)).unwrap_or(generic);
        tracing::debug!(
            drug = %self.input.record.name,
            attribute = label,
            substituted = value,
            "Catalog attribute missing"
        );
        self.signals.push(DiscrepancySignal::new(
            DiscrepancyKind::MissingData,
            1.0,
            0.0,
            label,
        ));
        value
    }

    /// Stated sig dose, else the product's usual dose, else the configured default.
    fn dose(&self) -> f64 {
        let sig = self.input.sig;
        let dose = if sig.dose_stated {
            sig.dose_amount
        } else {
            self.known(|a| a.dose_per_administration)
                .unwrap_or(self.input.defaults.dose)
        };
        dose.max(self.input.defaults.dose_floor)
    }

    fn divisor_floor(&self) -> f64 {
        self.input.defaults.dose_floor * self.input.defaults.frequency_floor
    }

    /// Unit-less quantity large enough to be a volume rather than a count.
    fn bare_volume(&self) -> bool {
        let q = self.input.quantity;
        q.unit == QuantityUnit::Unspecified && q.value > self.input.defaults.bare_quantity_volume_threshold
    }

    /// Cap by the beyond-use window; emits ExpirationLimiting when it binds.
    fn cap_by_beyond_use(&mut self, uncapped: f64) -> f64 {
        let limit = self
            .attributes()
            .beyond_use_days
            .or(self.template.beyond_use_days)
            .filter(|d| *d > 0);
        let Some(limit) = limit.map(f64::from) else {
            return uncapped;
        };
        if uncapped.floor() <= limit {
            return uncapped;
        }
        self.signals.push(DiscrepancySignal::new(
            DiscrepancyKind::ExpirationLimiting,
            uncapped.floor(),
            limit,
            format!("beyond-use window {} days", format_amount(limit)),
        ));
        limit
    }

    /// Compare containers prescribed with containers needed for the supply
    /// actually delivered (after caps and the maximum day bound).
    fn check_container_count(&mut self, days: f64, prescribed: f64, per_container_days: f64, what: &str) {
        let delivered = days.floor().min(f64::from(self.input.max_days));
        if per_container_days <= 0.0 || delivered <= 0.0 {
            return;
        }
        let needed = (delivered / per_container_days - CEIL_EPSILON).ceil().max(1.0);
        if (needed - prescribed).abs() > CEIL_EPSILON {
            self.signals.push(DiscrepancySignal::new(
                DiscrepancyKind::QuantityMismatch,
                needed,
                prescribed,
                what,
            ));
        }
    }

    fn finish(self, days: f64, standardized_sig: String) -> FormulaOutcome {
        FormulaOutcome {
            raw_days: floor_days(days),
            signals: self.signals,
            standardized_sig,
        }
    }
}

fn schedule_text(sig: &ParsedSig, frequency: f64, interval: Option<f64>) -> String {
    let mut text = frequency_to_text(frequency, interval);
    if sig.is_prn {
        text.push_str(" as needed");
    }
    text
}

// ═══════════════════════════════════════════════════════════
// Inhalers (nasal and oral)
// ═══════════════════════════════════════════════════════════

fn inhaler_days(input: &FormulaInput<'_>) -> FormulaOutcome {
    let mut cx = FormulaContext::new(input);
    let nasal = input.record.category == MedicationCategory::NasalInhaler;
    let q = input.quantity;

    let capacity = cx.required("device capacity", |a| a.device_capacity, 120.0);
    let devices = if matches!(q.unit, QuantityUnit::Milliliter | QuantityUnit::Gram)
        || (nasal && cx.bare_volume())
    {
        q.value / cx.required("package size", |a| a.package_size, q.value.max(1.0))
    } else {
        q.value
    };

    let mut frequency = input.sig.frequency_per_day;
    if let Some(max) = positive(input.record.attributes.max_daily_frequency) {
        frequency = frequency.min(max);
    }
    let per_side = cx.dose();
    let dose = if nasal && input.sig.bilateral {
        per_side * 2.0
    } else {
        per_side
    };
    let daily_use = dose * frequency;

    let uncapped = clamped_div(devices * capacity, daily_use, cx.divisor_floor());
    let days = cx.cap_by_beyond_use(uncapped);
    let per_device_days = clamped_div(capacity, daily_use, cx.divisor_floor());
    cx.check_container_count(
        days,
        devices,
        per_device_days,
        &format!("{} actuations per device", format_amount(capacity)),
    );

    let schedule = schedule_text(input.sig, frequency, None);
    let sig = if nasal {
        let side = if input.sig.bilateral { " in each nostril" } else { "" };
        format!("Use {} spray(s){} {}", format_amount(per_side), side, schedule)
    } else {
        format!("Inhale {} puff(s) {}", format_amount(per_side), schedule)
    };
    cx.finish(days, sig)
}

// ═══════════════════════════════════════════════════════════
// Insulin
// ═══════════════════════════════════════════════════════════

fn insulin_days(input: &FormulaInput<'_>) -> FormulaOutcome {
    let mut cx = FormulaContext::new(input);
    let q = input.quantity;

    let total_units = match q.unit {
        QuantityUnit::Unit => q.value,
        QuantityUnit::Unspecified if q.value >= BARE_INSULIN_UNITS_THRESHOLD => q.value,
        QuantityUnit::Milliliter => q.value * cx.required("units per mL", |a| a.units_per_ml, 100.0),
        QuantityUnit::Unspecified if cx.bare_volume() => {
            q.value * cx.required("units per mL", |a| a.units_per_ml, 100.0)
        }
        _ => q.value * cx.required("units per container", |a| a.device_capacity, 300.0),
    };

    let dose = cx.dose();
    let frequency = input.sig.frequency_per_day;
    let uncapped = clamped_div(total_units, dose * frequency, cx.divisor_floor());
    let days = cx.cap_by_beyond_use(uncapped);

    let sig = format!(
        "Inject {} unit(s) {}",
        format_amount(dose),
        schedule_text(input.sig, frequency, None)
    );
    cx.finish(days, sig)
}

// ═══════════════════════════════════════════════════════════
// Injectables (biologic, non-biologic, diabetic)
// ═══════════════════════════════════════════════════════════

fn injectable_days(input: &FormulaInput<'_>) -> FormulaOutcome {
    let mut cx = FormulaContext::new(input);
    let q = input.quantity;
    let sig = input.sig;

    let doses_per_container = cx.required("doses per container", |a| a.doses_per_container, 1.0);
    let containers = match (q.unit, cx.known(|a| a.package_size)) {
        (QuantityUnit::Milliliter, Some(ml)) => q.value / ml,
        _ => q.value,
    };
    // "inject 2 pens" consumes two doses per administration.
    let doses_per_administration = match sig.dose_unit.as_deref() {
        Some("injection") if sig.dose_stated => sig.dose_amount,
        _ => 1.0,
    };
    let administrations =
        clamped_div(containers * doses_per_container, doses_per_administration, 1.0);

    let (days_per_administration, interval, defaulted) = match sig.interval_days {
        Some(days) => (days, Some(days), false),
        None if sig.schedule_recognized => (1.0 / sig.frequency_per_day, None, false),
        None => {
            let days = cx
                .known(|a| a.interval_days)
                .unwrap_or(input.defaults.injectable_interval_days);
            tracing::debug!(
                drug = %input.record.name,
                interval_days = days,
                "Injection interval not stated, using labelled interval"
            );
            (days, Some(days), true)
        }
    };

    let uncapped = administrations * days_per_administration;
    let days = cx.cap_by_beyond_use(uncapped);
    if defaulted {
        cx.check_container_count(
            days,
            administrations,
            days_per_administration,
            &format!(
                "administration interval assumed to be {} days",
                format_amount(days_per_administration)
            ),
        );
    }

    let dose_text = match (&sig.dose_unit, sig.dose_stated) {
        (Some(unit), true) => format!("{} {}", format_amount(sig.dose_amount), unit),
        _ => "1 dose".to_string(),
    };
    let standardized = format!(
        "Inject {} {}",
        dose_text,
        schedule_text(sig, sig.frequency_per_day, interval)
    );
    cx.finish(days, standardized)
}

// ═══════════════════════════════════════════════════════════
// Eye drops
// ═══════════════════════════════════════════════════════════

fn eye_drop_days(input: &FormulaInput<'_>) -> FormulaOutcome {
    let mut cx = FormulaContext::new(input);
    let q = input.quantity;
    let defaults = input.defaults;

    let millilitres = if matches!(q.unit, QuantityUnit::Milliliter | QuantityUnit::Gram)
        || cx.bare_volume()
    {
        q.value
    } else {
        q.value * cx.required("bottle size", |a| a.package_size, defaults.eye_bottle_ml)
    };
    let drops_per_ml = positive(input.record.attributes.drops_per_ml).unwrap_or(defaults.eye_drops_per_ml);

    let per_eye = cx.dose();
    let dose = if input.sig.bilateral { per_eye * 2.0 } else { per_eye };
    let frequency = input.sig.frequency_per_day;

    let uncapped = clamped_div(millilitres * drops_per_ml, dose * frequency, cx.divisor_floor());
    let days = cx.cap_by_beyond_use(uncapped);

    let eye = if input.sig.bilateral { "each eye" } else { "the affected eye" };
    let sig = format!(
        "Instill {} drop(s) in {} {}",
        format_amount(per_eye),
        eye,
        schedule_text(input.sig, frequency, None)
    );
    cx.finish(days, sig)
}

// ═══════════════════════════════════════════════════════════
// Topicals (finger-tip units)
// ═══════════════════════════════════════════════════════════

/// Finger-tip units per application by body area.
static BODY_AREAS: LazyLock<Vec<(Regex, &'static str, f64)>> = LazyLock::new(|| {
    [
        (r"\b(?:face|neck)\b", "face and neck", 2.5),
        (r"\bscalp\b", "scalp", 3.0),
        (r"\barms?\b", "arm", 3.0),
        (r"\bhands?\b", "hand", 1.0),
        (r"\blegs?\b", "leg", 6.0),
        (r"\b(?:foot|feet)\b", "foot", 2.0),
        (r"\b(?:chest|abdomen|stomach|belly)\b", "chest and abdomen", 7.0),
        (r"\bback\b", "back", 7.0),
        (r"\b(?:buttock|buttocks)\b", "buttocks", 1.5),
    ]
    .into_iter()
    .map(|(pattern, label, ftu)| (Regex::new(pattern).unwrap(), label, ftu))
    .collect()
});

/// Named body areas and their summed finger-tip units.
pub fn body_area_ftu(sig_text: &str) -> Option<(Vec<&'static str>, f64)> {
    let lower = sig_text.to_lowercase();
    let matched: Vec<_> = BODY_AREAS
        .iter()
        .filter(|(re, _, _)| re.is_match(&lower))
        .collect();
    if matched.is_empty() {
        return None;
    }
    let labels = matched.iter().map(|(_, label, _)| *label).collect();
    let ftu = matched.iter().map(|(_, _, ftu)| ftu).sum();
    Some((labels, ftu))
}

fn topical_days(input: &FormulaInput<'_>) -> FormulaOutcome {
    let mut cx = FormulaContext::new(input);
    let q = input.quantity;
    let defaults = input.defaults;

    let grams = match q.unit {
        QuantityUnit::Gram | QuantityUnit::Milliliter => q.value,
        QuantityUnit::Milligram => q.value / 1000.0,
        QuantityUnit::Unspecified if cx.bare_volume() => q.value,
        _ => q.value * cx.required("tube size", |a| a.package_size, 30.0),
    };

    let areas = body_area_ftu(input.sig_text);
    let grams_per_application = if input.sig.dose_unit.as_deref() == Some("ftu") {
        input.sig.dose_amount * defaults.ftu_grams
    } else if let Some((_, ftu)) = &areas {
        ftu * defaults.ftu_grams
    } else {
        cx.signals.push(DiscrepancySignal::new(
            DiscrepancyKind::MissingData,
            1.0,
            0.0,
            "body area",
        ));
        defaults.topical_grams_per_application
    };

    let frequency = input.sig.frequency_per_day;
    let days = clamped_div(
        grams,
        grams_per_application * frequency,
        defaults.ftu_grams * defaults.frequency_floor,
    );

    let target = match &areas {
        Some((labels, _)) => labels.join(", "),
        None => "the affected area".to_string(),
    };
    let sig = format!(
        "Apply a thin layer to {} {}",
        target,
        schedule_text(input.sig, frequency, None)
    );
    cx.finish(days, sig)
}

// ═══════════════════════════════════════════════════════════
// Unknown
// ═══════════════════════════════════════════════════════════

fn unknown_days(input: &FormulaInput<'_>) -> FormulaOutcome {
    let mut cx = FormulaContext::new(input);
    let dose = cx.dose();
    let frequency = input.sig.frequency_per_day;
    let days = clamped_div(input.quantity.value, dose * frequency, cx.divisor_floor());

    cx.signals.push(DiscrepancySignal::new(
        DiscrepancyKind::UnknownDrug,
        1.0,
        input.match_similarity,
        "best catalog similarity",
    ));

    let unit = input.sig.dose_unit.as_deref().unwrap_or("dose");
    let sig = format!(
        "Use {} {}(s) {}",
        format_amount(dose),
        unit,
        schedule_text(input.sig, frequency, None)
    );
    cx.finish(days, sig)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::ParseConfidence;
    use crate::supply::quantity::QuantityNormalizer;
    use crate::supply::sig::SigParser;

    struct Case {
        record: MedicationRecord,
        quantity: NormalizedQuantity,
        sig: ParsedSig,
        sig_text: String,
        defaults: DefaultsConfig,
    }

    impl Case {
        fn new(record: MedicationRecord, quantity: &str, sig: &str) -> Self {
            let defaults = DefaultsConfig::default();
            Self {
                record,
                quantity: QuantityNormalizer::new(defaults.quantity).normalize(quantity),
                sig: SigParser::new(defaults).parse(sig),
                sig_text: sig.to_string(),
                defaults,
            }
        }

        fn run(&self) -> FormulaOutcome {
            let input = FormulaInput {
                record: &self.record,
                quantity: &self.quantity,
                sig: &self.sig,
                sig_text: &self.sig_text,
                defaults: &self.defaults,
                max_days: 365,
                match_similarity: 1.0,
            };
            DaySupplyCalculator.calculate(&input)
        }
    }

    fn record(
        category: MedicationCategory,
        configure: impl FnOnce(&mut MedicationAttributes),
    ) -> MedicationRecord {
        let mut record = MedicationRecord::new("Test Product", category);
        record.attributes = category_template(category);
        configure(&mut record.attributes);
        record
    }

    fn kinds(outcome: &FormulaOutcome) -> Vec<DiscrepancyKind> {
        outcome.signals.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn every_category_has_a_formula() {
        for category in MedicationCategory::ALL {
            assert!(FORMULAS.iter().any(|(c, _)| c == category), "{category}");
        }
    }

    #[test]
    fn nasal_spray_bilateral() {
        let rec = record(MedicationCategory::NasalInhaler, |a| {
            a.device_capacity = Some(120.0);
            a.package_size = Some(16.0);
        });
        let outcome = Case::new(rec, "1 bottle", "2 sprays each nostril daily").run();
        assert_eq!(outcome.raw_days, 30);
        assert!(outcome.signals.is_empty());
        assert_eq!(outcome.standardized_sig, "Use 2 spray(s) in each nostril once daily");
    }

    #[test]
    fn nasal_bare_volume_converted_to_bottles() {
        let rec = record(MedicationCategory::NasalInhaler, |a| {
            a.device_capacity = Some(120.0);
            a.package_size = Some(16.0);
        });
        let outcome = Case::new(rec, "32", "1 spray each nostril bid").run();
        // 2 bottles × 120 sprays / (1 × 2 sides × 2 per day)
        assert_eq!(outcome.raw_days, 60);
    }

    #[test]
    fn oral_inhaler_puffs() {
        let rec = record(MedicationCategory::OralInhaler, |a| a.device_capacity = Some(200.0));
        let outcome = Case::new(rec, "1 inhaler", "inhale 2 puffs q6h").run();
        assert_eq!(outcome.raw_days, 25);
        assert_eq!(outcome.standardized_sig, "Inhale 2 puff(s) four times daily");
    }

    #[test]
    fn once_daily_device_caps_frequency() {
        let rec = record(MedicationCategory::OralInhaler, |a| {
            a.device_capacity = Some(30.0);
            a.dose_per_administration = Some(1.0);
            a.max_daily_frequency = Some(1.0);
        });
        let outcome = Case::new(rec, "1", "1 puff bid").run();
        assert_eq!(outcome.raw_days, 30);
    }

    #[test]
    fn excess_inhalers_signal_mismatch() {
        let rec = record(MedicationCategory::OralInhaler, |a| a.device_capacity = Some(200.0));
        let outcome = Case::new(rec, "12 inhalers", "2 puffs daily").run();
        assert_eq!(outcome.raw_days, 1200);
        let mismatch = outcome
            .signals
            .iter()
            .find(|s| s.kind == DiscrepancyKind::QuantityMismatch)
            .unwrap();
        assert_eq!(mismatch.expected, 4.0);
        assert_eq!(mismatch.actual, 12.0);
    }

    #[test]
    fn inhaler_discard_window_caps() {
        let rec = record(MedicationCategory::OralInhaler, |a| {
            a.device_capacity = Some(60.0);
            a.beyond_use_days = Some(42);
        });
        let outcome = Case::new(rec, "1", "1 puff daily").run();
        assert_eq!(outcome.raw_days, 42);
        assert!(kinds(&outcome).contains(&DiscrepancyKind::ExpirationLimiting));
    }

    #[test]
    fn insulin_vials_capped_by_beyond_use() {
        let rec = record(MedicationCategory::Insulin, |a| {
            a.device_capacity = Some(1000.0);
            a.beyond_use_days = Some(28);
        });
        let outcome = Case::new(rec, "3", "10 units at bedtime").run();
        assert_eq!(outcome.raw_days, 28);
        let signal = &outcome.signals[0];
        assert_eq!(signal.kind, DiscrepancyKind::ExpirationLimiting);
        assert_eq!(signal.expected, 300.0);
        assert_eq!(signal.actual, 28.0);
        assert_eq!(outcome.standardized_sig, "Inject 10 unit(s) once daily");
    }

    #[test]
    fn insulin_quantity_in_ml_and_units() {
        let rec = record(MedicationCategory::Insulin, |a| a.beyond_use_days = Some(365));
        assert_eq!(Case::new(rec.clone(), "15 ml", "50 units daily").run().raw_days, 30);
        assert_eq!(Case::new(rec.clone(), "1500 units", "50 units daily").run().raw_days, 30);
        assert_eq!(Case::new(rec, "1500", "50 units daily").run().raw_days, 30);
    }

    #[test]
    fn injectable_weekly_pens() {
        let rec = record(MedicationCategory::DiabeticInjectable, |a| {
            a.doses_per_container = Some(4.0);
            a.package_size = Some(3.0);
        });
        let outcome = Case::new(rec, "1 pen", "inject 0.5 mg once weekly").run();
        assert_eq!(outcome.raw_days, 28);
        assert!(outcome.signals.is_empty());
        assert_eq!(outcome.standardized_sig, "Inject 0.5 mg once weekly");
    }

    #[test]
    fn injectable_keeps_small_stated_dose() {
        let rec = record(MedicationCategory::DiabeticInjectable, |a| {
            a.doses_per_container = Some(4.0);
            a.package_size = Some(3.0);
        });
        let outcome = Case::new(rec, "1 pen", "inject 0.25 mg weekly").run();
        assert_eq!(outcome.raw_days, 28);
        assert_eq!(outcome.standardized_sig, "Inject 0.25 mg once weekly");
    }

    #[test]
    fn injectable_biweekly() {
        let rec = record(MedicationCategory::BiologicInjectable, |_| {});
        let outcome = Case::new(rec, "2 pens", "inject 40 mg every other week").run();
        assert_eq!(outcome.raw_days, 28);
    }

    #[test]
    fn injectable_daily_schedule() {
        let rec = record(MedicationCategory::NonBiologicInjectable, |_| {});
        let outcome = Case::new(rec, "20 syringes", "inject bid").run();
        assert_eq!(outcome.raw_days, 10);
    }

    #[test]
    fn injectable_without_schedule_uses_labelled_interval() {
        let rec = record(MedicationCategory::BiologicInjectable, |a| a.interval_days = Some(14.0));
        let outcome = Case::new(rec, "2", "use as directed").run();
        assert_eq!(outcome.raw_days, 28);
        assert!(outcome.signals.is_empty());
    }

    #[test]
    fn injectable_without_schedule_flags_excess() {
        let rec = record(MedicationCategory::BiologicInjectable, |a| a.interval_days = Some(14.0));
        let outcome = Case::new(rec, "52", "use as directed").run();
        assert_eq!(outcome.raw_days, 728);
        let mismatch = &outcome.signals[0];
        assert_eq!(mismatch.kind, DiscrepancyKind::QuantityMismatch);
        assert_eq!(mismatch.expected, 27.0);
        assert_eq!(mismatch.actual, 52.0);
    }

    #[test]
    fn eye_drops_bottle_and_both_eyes() {
        let rec = record(MedicationCategory::EyeDrop, |a| a.beyond_use_days = Some(60));
        // 5 mL × 20 drops / (1 drop × 2 eyes × 1)
        let outcome = Case::new(rec, "1", "1 drop ou qhs").run();
        assert_eq!(outcome.raw_days, 50);
        assert_eq!(outcome.standardized_sig, "Instill 1 drop(s) in each eye once daily");
    }

    #[test]
    fn eye_drops_capped_by_discard_window() {
        let rec = record(MedicationCategory::EyeDrop, |_| {});
        let outcome = Case::new(rec, "2.5 ml", "1 drop in right eye daily").run();
        assert_eq!(outcome.raw_days, 28);
        assert_eq!(kinds(&outcome), vec![DiscrepancyKind::ExpirationLimiting]);
    }

    #[test]
    fn partial_day_over_discard_window_is_not_a_reduction() {
        let rec = record(MedicationCategory::EyeDrop, |a| {
            a.drops_per_ml = Some(20.0);
            a.beyond_use_days = Some(28);
        });
        // 2.85 mL × 20 drops / (1 drop × 2) = 28.5 days, floored to the window
        let outcome = Case::new(rec, "2.85 ml", "1 drop bid").run();
        assert_eq!(outcome.raw_days, 28);
        assert!(outcome.signals.is_empty());
    }

    #[test]
    fn suspension_drop_volume_from_catalog() {
        let rec = record(MedicationCategory::EyeDrop, |a| {
            a.drops_per_ml = Some(16.0);
            a.beyond_use_days = Some(365);
        });
        let outcome = Case::new(rec, "5 ml", "1 drop qid").run();
        assert_eq!(outcome.raw_days, 20);
    }

    #[test]
    fn topical_with_body_area() {
        let rec = record(MedicationCategory::Topical, |_| {});
        // 30 g / (1 FTU × 0.5 g × 2)
        let outcome = Case::new(rec, "30 g", "apply to hands twice daily").run();
        assert_eq!(outcome.raw_days, 30);
        assert!(outcome.signals.is_empty());
        assert_eq!(outcome.standardized_sig, "Apply a thin layer to hand twice daily");
    }

    #[test]
    fn topical_sums_areas() {
        assert_eq!(body_area_ftu("apply to face and back").unwrap().1, 9.5);
        assert!(body_area_ftu("apply thin layer").is_none());
    }

    #[test]
    fn topical_without_body_area_signals_missing_data() {
        let rec = record(MedicationCategory::Topical, |_| {});
        let outcome = Case::new(rec, "2 tubes", "apply bid").run();
        // 60 g / (2 g × 2)
        assert_eq!(outcome.raw_days, 15);
        assert_eq!(kinds(&outcome), vec![DiscrepancyKind::MissingData]);
        assert_eq!(outcome.signals[0].context, "body area");
    }

    #[test]
    fn unknown_formula_always_signals() {
        let rec = MedicationRecord::new("generic unknown", MedicationCategory::Unknown);
        let outcome = Case::new(rec, "999", "use as directed").run();
        assert_eq!(outcome.raw_days, 999);
        assert_eq!(kinds(&outcome), vec![DiscrepancyKind::UnknownDrug]);
    }

    #[test]
    fn missing_attribute_substitutes_and_signals() {
        let rec = MedicationRecord::new("Bare Inhaler", MedicationCategory::OralInhaler);
        let outcome = Case::new(rec, "1", "2 puffs bid").run();
        assert_eq!(outcome.raw_days, 50);
        assert_eq!(outcome.signals[0].kind, DiscrepancyKind::MissingData);
        assert_eq!(outcome.signals[0].context, "device capacity");
    }

    #[test]
    fn zero_quantity_is_zero_days() {
        let rec = record(MedicationCategory::OralInhaler, |_| {});
        let case = Case::new(rec, "0", "2 puffs bid");
        assert_eq!(case.quantity.confidence, ParseConfidence::Partial);
        assert_eq!(case.run().raw_days, 0);
    }
}
