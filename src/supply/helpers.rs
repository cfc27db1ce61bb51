use std::sync::LazyLock;

use uuid::Uuid;

use crate::models::PrescriptionInput;

/// Namespace for deterministic prescription ids.
static INPUT_NAMESPACE: LazyLock<Uuid> =
    LazyLock::new(|| Uuid::new_v5(&Uuid::NAMESPACE_URL, b"urn:day-supply:prescription-input"));

/// Lowercase, trim and collapse internal whitespace.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stable id for an input: identical fields, identical id.
pub fn input_id(input: &PrescriptionInput) -> Uuid {
    let key = format!(
        "{}\u{1f}{}\u{1f}{}",
        input.drug_name, input.raw_quantity, input.sig
    );
    Uuid::new_v5(&INPUT_NAMESPACE, key.as_bytes())
}

/// Floor a day count into u32. The float cast saturates; NaN becomes 0.
pub fn floor_days(days: f64) -> u32 {
    days.max(0.0).floor() as u32
}

/// Divide, substituting `floor` for any divisor below it.
pub fn clamped_div(numerator: f64, divisor: f64, floor: f64) -> f64 {
    numerator / divisor.max(floor)
}

/// English number words commonly written in sigs.
pub fn number_word(word: &str) -> Option<f64> {
    let value = match word {
        "half" => 0.5,
        "one" | "a" | "an" => 1.0,
        "two" => 2.0,
        "three" => 3.0,
        "four" => 4.0,
        "five" => 5.0,
        "six" => 6.0,
        "seven" => 7.0,
        "eight" => 8.0,
        "nine" => 9.0,
        "ten" => 10.0,
        _ => return None,
    };
    Some(value)
}

/// Human-readable schedule for the standardized sig.
pub fn frequency_to_text(frequency_per_day: f64, interval_days: Option<f64>) -> String {
    let frequency_per_day = match interval_days {
        // Sub-daily intervals read better as a daily rate.
        Some(days) if days > 0.0 && days < 1.5 => 1.0 / days,
        _ => frequency_per_day,
    };
    if let Some(days) = interval_days.filter(|d| *d >= 1.5) {
        return match days.round() as i64 {
            2 => "every other day".into(),
            7 => "once weekly".into(),
            14 => "every other week".into(),
            28 => "every 4 weeks".into(),
            30 => "once monthly".into(),
            n => format!("every {} days", n),
        };
    }
    let same = |v: f64| (frequency_per_day - v).abs() < 1e-9;
    if same(1.0) {
        "once daily".into()
    } else if same(2.0) {
        "twice daily".into()
    } else if same(3.0) {
        "three times daily".into()
    } else if same(4.0) {
        "four times daily".into()
    } else {
        format!("{:.1} times daily", frequency_per_day)
    }
}
