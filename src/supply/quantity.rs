//! Quantity normalization: free-text quantity → number + canonical unit.
//!
//! Numbers and unit tokens may appear in any order and adjacency ("10ml",
//! "1000mcg", "3 pens", "pens x3"). When several numbers appear the first one
//! that parses wins; "2 x 3ml" therefore reads as 2 mL.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::models::enums::{ParseConfidence, QuantityUnit};

use super::helpers::number_word;
use super::types::NormalizedQuantity;

static RE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?|\.\d+").unwrap());
static RE_THOUSANDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,3}(?:,\d{3})+").unwrap());
static RE_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-zµμ]+").unwrap());

/// Map a lowercase token to its canonical unit.
pub fn unit_for_token(token: &str) -> Option<QuantityUnit> {
    let unit = match token {
        "ml" | "mls" | "milliliter" | "milliliters" | "millilitre" | "millilitres" | "cc" => {
            QuantityUnit::Milliliter
        }
        "mcg" | "ug" | "µg" | "μg" | "microgram" | "micrograms" => QuantityUnit::Microgram,
        "mg" | "milligram" | "milligrams" => QuantityUnit::Milligram,
        "g" | "gm" | "gms" | "gram" | "grams" | "gr" => QuantityUnit::Gram,
        "u" | "iu" | "unit" | "units" => QuantityUnit::Unit,
        "pen" | "pens" | "vial" | "vials" | "inhaler" | "inhalers" | "bottle" | "bottles"
        | "tube" | "tubes" | "box" | "boxes" | "pack" | "packs" | "package" | "packages"
        | "kit" | "kits" | "cartridge" | "cartridges" | "syringe" | "syringes" | "device"
        | "devices" | "canister" | "canisters" | "each" | "ea" | "ct" | "count" | "jar"
        | "jars" | "autoinjector" | "autoinjectors" => QuantityUnit::Count,
        _ => return None,
    };
    Some(unit)
}

/// Parses free-text quantities, substituting a default when no number is present.
#[derive(Debug, Clone, Copy)]
pub struct QuantityNormalizer {
    default_value: f64,
}

impl QuantityNormalizer {
    pub fn new(default_value: f64) -> Self {
        Self { default_value }
    }

    pub fn normalize(&self, raw_quantity: &str) -> NormalizedQuantity {
        let lower = raw_quantity.to_lowercase();
        let cleaned = RE_THOUSANDS.replace_all(&lower, |caps: &Captures<'_>| {
            caps[0].replace(',', "")
        });

        let unit = RE_WORD
            .find_iter(&cleaned)
            .find_map(|m| unit_for_token(m.as_str()));

        let numeric = RE_NUMBER
            .find_iter(&cleaned)
            .find_map(|m| m.as_str().parse::<f64>().ok())
            .filter(|v| v.is_finite());

        let (value, number_found) = match numeric {
            Some(v) => (v, true),
            None => match RE_WORD
                .find_iter(&cleaned)
                .find_map(|m| number_word(m.as_str()).filter(|_| m.as_str().len() > 2))
            {
                Some(v) => (v, true),
                None => (self.default_value, false),
            },
        };

        let confidence = match (number_found, unit.is_some(), numeric.is_some()) {
            (true, true, true) => ParseConfidence::Full,
            (true, _, _) => ParseConfidence::Partial,
            (false, _, _) => ParseConfidence::Fallback,
        };

        if confidence == ParseConfidence::Fallback {
            tracing::debug!(
                raw = raw_quantity,
                default = self.default_value,
                "No numeric quantity found, using default"
            );
        }

        NormalizedQuantity {
            value,
            unit: unit.unwrap_or(QuantityUnit::Unspecified),
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> QuantityNormalizer {
        QuantityNormalizer::new(1.0)
    }

    #[test]
    fn adjacent_milliliters() {
        let q = normalizer().normalize("10ml");
        assert_eq!(q.value, 10.0);
        assert_eq!(q.unit, QuantityUnit::Milliliter);
        assert_eq!(q.confidence, ParseConfidence::Full);
    }

    #[test]
    fn adjacent_micrograms() {
        let q = normalizer().normalize("1000mcg");
        assert_eq!(q.value, 1000.0);
        assert_eq!(q.unit, QuantityUnit::Microgram);
    }

    #[test]
    fn bare_number_is_partial() {
        let q = normalizer().normalize("30");
        assert_eq!(q.value, 30.0);
        assert_eq!(q.unit, QuantityUnit::Unspecified);
        assert_eq!(q.confidence, ParseConfidence::Partial);
    }

    #[test]
    fn count_units() {
        let q = normalizer().normalize("3 pens");
        assert_eq!(q.value, 3.0);
        assert_eq!(q.unit, QuantityUnit::Count);
    }

    #[test]
    fn unit_before_number() {
        let q = normalizer().normalize("ML 15");
        assert_eq!(q.value, 15.0);
        assert_eq!(q.unit, QuantityUnit::Milliliter);
    }

    #[test]
    fn first_number_wins() {
        let q = normalizer().normalize("2 x 3ml");
        assert_eq!(q.value, 2.0);
        assert_eq!(q.unit, QuantityUnit::Milliliter);
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(normalizer().normalize("1,000 units").value, 1000.0);
        assert_eq!(normalizer().normalize("1,000,000 units").value, 1_000_000.0);
        assert_eq!(normalizer().normalize("2,500,000units").value, 2_500_000.0);
    }

    #[test]
    fn decimal_values() {
        assert_eq!(normalizer().normalize("2.5 mL").value, 2.5);
        assert_eq!(normalizer().normalize(".5g").value, 0.5);
    }

    #[test]
    fn no_number_falls_back_to_default() {
        let q = QuantityNormalizer::new(1.0).normalize("as needed");
        assert_eq!(q.value, 1.0);
        assert_eq!(q.confidence, ParseConfidence::Fallback);

        let q = QuantityNormalizer::new(2.0).normalize("");
        assert_eq!(q.value, 2.0);
        assert_eq!(q.confidence, ParseConfidence::Fallback);
    }

    #[test]
    fn unit_without_number_keeps_unit() {
        let q = normalizer().normalize("pen");
        assert_eq!(q.unit, QuantityUnit::Count);
        assert_eq!(q.confidence, ParseConfidence::Fallback);
    }

    #[test]
    fn number_word_quantity() {
        let q = normalizer().normalize("two inhalers");
        assert_eq!(q.value, 2.0);
        assert_eq!(q.confidence, ParseConfidence::Partial);
    }

    #[test]
    fn value_is_never_negative() {
        assert_eq!(normalizer().normalize("-5").value, 5.0);
    }
}
