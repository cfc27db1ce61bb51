use serde::{Deserialize, Serialize};

use crate::supply::types::SupplyError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = SupplyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(SupplyError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(MedicationCategory {
    NasalInhaler => "nasal_inhaler",
    OralInhaler => "oral_inhaler",
    Insulin => "insulin",
    BiologicInjectable => "biologic_injectable",
    NonBiologicInjectable => "non_biologic_injectable",
    DiabeticInjectable => "diabetic_injectable",
    EyeDrop => "eye_drop",
    Topical => "topical",
    Unknown => "unknown",
});

str_enum!(MatchMethod {
    Exact => "exact",
    Fuzzy => "fuzzy",
    Pattern => "pattern",
    Fallback => "fallback",
});

str_enum!(ParseConfidence {
    Full => "full",
    Partial => "partial",
    Fallback => "fallback",
});

str_enum!(QuantityUnit {
    Milliliter => "milliliter",
    Microgram => "microgram",
    Milligram => "milligram",
    Gram => "gram",
    Unit => "unit",
    Count => "count",
    Unspecified => "unspecified",
});

str_enum!(DiscrepancyKind {
    QuantityMismatch => "quantity_mismatch",
    ExpirationLimiting => "expiration_limiting",
    DaySupplyAdjusted => "day_supply_adjusted",
    UnknownDrug => "unknown_drug",
    MissingData => "missing_data",
});

str_enum!(WarningSeverity {
    Info => "info",
    Standard => "standard",
    Critical => "critical",
});

str_enum!(ThresholdBasis {
    Relative => "relative",
    Absolute => "absolute",
});
