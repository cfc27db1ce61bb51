//! Sig (dosing instruction) parsing: dose amount, daily frequency,
//! administration interval and PRN/bilateral markers.
//!
//! Vocabulary is table-driven; anything unrecognized degrades to configured
//! defaults with lowered confidence. `frequency_per_day` is always at or above
//! the configured floor.

use std::sync::LazyLock;

use regex::Regex;

use crate::calculation_config::DefaultsConfig;
use crate::models::enums::ParseConfidence;

use super::helpers::number_word;
use super::types::ParsedSig;

/// Collapses "b.i.d." style abbreviations to "bid".
static RE_ABBREV_DOTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([a-z])\.").unwrap());

static RE_TIMES_PER_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(?:x|times?)\s*(?:a|per|/|each|every)?\s*(?:day|daily)\b")
        .unwrap()
});

static RE_EVERY_HOURS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:q\s*|every\s+)(\d+)(?:\s*(?:-|to)\s*\d+)?\s*(?:h|hr|hrs|hours?)\b").unwrap()
});

static RE_EVERY_DAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bevery\s+(\d+)\s*days?\b").unwrap());

static RE_EVERY_WEEKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:every\s+|q)(\d+)\s*(?:weeks?|wks?|w)\b").unwrap());

static RE_PRN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:prn|as needed|when needed|if needed|as required|may repeat)\b").unwrap()
});

static RE_BILATERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:each|both|per|in each) (?:nostril|nostrils|eye|eyes|side|sides)\b|\bbilat(?:eral(?:ly)?)?\b|\bou\b|\bbilat nares\b",
    )
    .unwrap()
});

const NUMBER: &str = r"(\d+(?:\.\d+)?|\.\d+|one|two|three|four|five|six|seven|eight|nine|ten|half|an|a)";

static RE_DOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:^|[^\w.]){NUMBER}(?:\s*(?:-|to|or)\s*{NUMBER})?\s*(sprays?|squirts?|puffs?|inhalations?|actuations?|blisters?|units?|iu|u|drops?|gtts?|mg|mcg|ml|tablets?|tabs?|capsules?|caps?|patch(?:es)?|applications?|ftus?|injections?|pens?)\b"
    ))
    .unwrap()
});

static RE_BARE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?|\.\d+)\s*([a-z]*)").unwrap());

/// Words after a number that make it a duration or count of times, not a dose.
const NON_DOSE_FOLLOWERS: &[&str] = &[
    "h", "hr", "hrs", "hour", "hours", "min", "mins", "minute", "minutes", "day", "days",
    "week", "weeks", "wk", "wks", "month", "months", "year", "years", "x", "times", "time",
    "am", "pm", "refills", "refill",
];

/// Administration interval vocabulary, most specific first ("biweekly" before "weekly").
static INTERVAL_TABLE: LazyLock<Vec<(Regex, f64)>> = LazyLock::new(|| {
    [
        (r"\b(?:every other day|qod|alternate days)\b", 2.0),
        (r"\b(?:every other week|biweekly|bi-weekly|every two weeks|fortnightly)\b", 14.0),
        (r"\b(?:every four weeks)\b", 28.0),
        (r"\b(?:every twelve weeks|every three months|quarterly)\b", 84.0),
        (r"\b(?:monthly|once a month|every month|per month|qmonth)\b", 30.0),
        (r"\b(?:weekly|once a week|every week|per week|qw|qwk|q7d)\b", 7.0),
    ]
    .into_iter()
    .map(|(pattern, days)| (Regex::new(pattern).unwrap(), days))
    .collect()
});

/// Daily frequency vocabulary, most specific first.
static FREQUENCY_TABLE: LazyLock<Vec<(Regex, f64)>> = LazyLock::new(|| {
    [
        (r"\b(?:qid|four times)\b", 4.0),
        (r"\b(?:tid|three times|thrice)\b", 3.0),
        (r"\b(?:bid|twice|two times)\b|\bmorning and (?:evening|night|bedtime)\b", 2.0),
        (r"\b(?:qhs|hs|at bedtime|bedtime|nightly|every night|at night|qpm|every evening|in the evening)\b", 1.0),
        (r"\b(?:qam|every morning|in the morning)\b", 1.0),
        (r"\b(?:qd|daily|once a day|every day|per day|a day|sid|q24h)\b", 1.0),
    ]
    .into_iter()
    .map(|(pattern, freq)| (Regex::new(pattern).unwrap(), freq))
    .collect()
});

fn parse_number(token: &str) -> Option<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .or_else(|| number_word(token))
}

/// Canonical singular dose unit.
fn canonical_dose_unit(token: &str) -> &'static str {
    match token.trim_end_matches('s') {
        "spray" | "squirt" => "spray",
        "puff" | "inhalation" | "actuation" | "blister" => "puff",
        "unit" | "iu" | "u" => "unit",
        "drop" | "gtt" => "drop",
        "tablet" | "tab" => "tablet",
        "capsule" | "cap" => "capsule",
        "patch" | "patche" => "patch",
        "application" => "application",
        "ftu" => "ftu",
        "injection" | "pen" => "injection",
        "mg" => "mg",
        "mcg" => "mcg",
        "ml" => "ml",
        _ => "dose",
    }
}

/// Prepared sig text: lowercase, single-spaced, abbreviation dots removed.
pub fn prepare_sig(sig: &str) -> String {
    let lower = sig.to_lowercase();
    let spaced = lower.split_whitespace().collect::<Vec<_>>().join(" ");
    RE_ABBREV_DOTS.replace_all(&spaced, "$1").into_owned()
}

/// Interval in days for weekly/monthly style schedules.
pub fn parse_interval_days(text: &str) -> Option<f64> {
    if let Some((_, days)) = INTERVAL_TABLE.iter().find(|(re, _)| re.is_match(text)) {
        return Some(*days);
    }
    if let Some(caps) = RE_EVERY_WEEKS.captures(text) {
        let weeks = caps.get(1)?.as_str().parse::<f64>().ok()?;
        return (weeks > 0.0).then_some(weeks * 7.0);
    }
    if let Some(caps) = RE_EVERY_DAYS.captures(text) {
        let days = caps.get(1)?.as_str().parse::<f64>().ok()?;
        return (days > 1.0).then_some(days);
    }
    None
}

/// Administrations per day, if any frequency expression is present.
pub fn parse_daily_frequency(text: &str) -> Option<f64> {
    if let Some(caps) = RE_TIMES_PER_DAY.captures(text) {
        if let Some(n) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) {
            if n > 0.0 && n.is_finite() {
                return Some(n);
            }
        }
    }
    if let Some(caps) = RE_EVERY_HOURS.captures(text) {
        if let Some(hours) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) {
            if hours > 0.0 && hours <= 24.0 {
                return Some(24.0 / hours);
            }
        }
    }
    FREQUENCY_TABLE
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, freq)| *freq)
}

/// First stated dose: (amount, unit). Ranges resolve to their midpoint.
pub fn parse_dose(text: &str) -> Option<(f64, Option<&'static str>)> {
    if let Some(caps) = RE_DOSE.captures(text) {
        let low = caps.get(1).and_then(|m| parse_number(m.as_str()));
        let high = caps.get(2).and_then(|m| parse_number(m.as_str()));
        let unit = caps.get(3).map(|m| canonical_dose_unit(m.as_str()));
        if let Some(low) = low {
            let amount = match high {
                Some(high) if high > low => (low + high) / 2.0,
                _ => low,
            };
            return Some((amount, unit));
        }
    }

    RE_BARE_NUMBER.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        let glued = text[..whole.start()]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '.');
        let follower = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        if glued || NON_DOSE_FOLLOWERS.contains(&follower) {
            return None;
        }
        let amount = caps.get(1)?.as_str().parse::<f64>().ok()?;
        (amount > 0.0 && amount.is_finite()).then_some((amount, None))
    })
}

/// Parses sigs against the vocabulary tables, substituting configured defaults.
#[derive(Debug, Clone, Copy)]
pub struct SigParser {
    defaults: DefaultsConfig,
}

impl SigParser {
    pub fn new(defaults: DefaultsConfig) -> Self {
        Self { defaults }
    }

    pub fn parse(&self, sig: &str) -> ParsedSig {
        let text = prepare_sig(sig);

        let is_prn = RE_PRN.is_match(&text);
        let bilateral = RE_BILATERAL.is_match(&text);
        let interval_days = parse_interval_days(&text);
        let daily = parse_daily_frequency(&text);
        let dose = parse_dose(&text);

        let schedule_recognized = daily.is_some() || interval_days.is_some();
        let mut frequency = match (daily, interval_days) {
            (Some(freq), _) => freq,
            // One administration on each scheduled day.
            (None, Some(_)) => 1.0,
            (None, None) => self.defaults.frequency,
        };
        if is_prn && daily.is_some() {
            frequency *= self.defaults.prn_usage_factor;
        }
        let frequency_per_day = frequency.max(self.defaults.frequency_floor);

        let (dose_amount, dose_unit, dose_stated) = match dose {
            Some((amount, unit)) => (amount, unit.map(str::to_string), true),
            None => (self.defaults.dose, None, false),
        };
        let dose_amount = dose_amount.max(self.defaults.dose_floor);

        let confidence = match (schedule_recognized, dose_stated) {
            (true, true) => ParseConfidence::Full,
            (false, false) => ParseConfidence::Fallback,
            _ => ParseConfidence::Partial,
        };

        if !schedule_recognized {
            tracing::debug!(
                sig,
                default_frequency = self.defaults.frequency,
                "Frequency not recognized, using default"
            );
        }

        ParsedSig {
            dose_amount,
            dose_unit,
            frequency_per_day,
            interval_days,
            is_prn,
            bilateral,
            dose_stated,
            schedule_recognized,
            confidence,
        }
    }
}
