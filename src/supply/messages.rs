use crate::models::enums::DiscrepancyKind;

use super::types::DiscrepancySignal;

/// Message template builder for consistent reviewer-facing wording.
/// Messages state the two compared values so a pharmacist can act without
/// re-running the calculation.
pub struct MessageTemplates;

impl MessageTemplates {
    /// Render the message for any signal kind.
    pub fn render(signal: &DiscrepancySignal, drug: &str) -> String {
        match signal.kind {
            DiscrepancyKind::QuantityMismatch => {
                Self::quantity_mismatch(drug, signal.actual, signal.expected, &signal.context)
            }
            DiscrepancyKind::ExpirationLimiting => {
                Self::expiration_limiting(drug, signal.expected, signal.actual)
            }
            DiscrepancyKind::DaySupplyAdjusted => {
                Self::day_supply_adjusted(drug, signal.expected, signal.actual)
            }
            DiscrepancyKind::UnknownDrug => Self::unknown_drug(drug),
            DiscrepancyKind::MissingData => Self::missing_data(drug, &signal.context),
        }
    }

    /// QUANTITY MISMATCH message.
    pub fn quantity_mismatch(drug: &str, prescribed: f64, needed: f64, context: &str) -> String {
        let detail = if context.is_empty() {
            String::new()
        } else {
            format!(" ({context})")
        };
        format!(
            "{} was prescribed as {} but the dosing schedule needs about {}{}. \
             Please verify the dispensed quantity.",
            drug,
            format_amount(prescribed),
            format_amount(needed),
            detail,
        )
    }

    /// EXPIRATION LIMITING message.
    pub fn expiration_limiting(drug: &str, uncapped_days: f64, capped_days: f64) -> String {
        format!(
            "{} would last {} days by quantity, but its beyond-use window limits \
             the supply to {} days.",
            drug,
            format_amount(uncapped_days),
            format_amount(capped_days),
        )
    }

    /// DAY SUPPLY ADJUSTED message.
    pub fn day_supply_adjusted(drug: &str, raw_days: f64, clamped_days: f64) -> String {
        format!(
            "Calculated supply for {} was {} days and has been adjusted to {} days \
             to stay within the allowed range.",
            drug,
            format_amount(raw_days),
            format_amount(clamped_days),
        )
    }

    /// UNKNOWN DRUG message.
    pub fn unknown_drug(drug: &str) -> String {
        format!(
            "{} was not recognized in the reference catalog. \
             A generic quantity / daily-use estimate was used.",
            drug,
        )
    }

    /// MISSING DATA message.
    pub fn missing_data(drug: &str, what: &str) -> String {
        format!(
            "Information needed for {} was missing ({}). A standard assumption was used.",
            drug, what,
        )
    }
}

/// Whole numbers without decimals, everything else to at most two places.
pub fn format_amount(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        let text = format!("{:.2}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
