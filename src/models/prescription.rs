use serde::{Deserialize, Deserializer, Serialize};

/// One free-text prescription record as received from upstream systems.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrescriptionInput {
    pub drug_name: String,
    /// Loosely formatted quantity ("10ml", "3 pens", "30"). Numbers in JSON are accepted too.
    #[serde(alias = "quantity", deserialize_with = "string_or_number")]
    pub raw_quantity: String,
    #[serde(alias = "sig_directions")]
    pub sig: String,
}

impl PrescriptionInput {
    pub fn new(
        drug_name: impl Into<String>,
        raw_quantity: impl Into<String>,
        sig: impl Into<String>,
    ) -> Self {
        Self {
            drug_name: drug_name.into(),
            raw_quantity: raw_quantity.into(),
            sig: sig.into(),
        }
    }

    /// Drug name and quantity both blank: nothing to reason about.
    pub fn is_structurally_empty(&self) -> bool {
        self.drug_name.trim().is_empty() && self.raw_quantity.trim().is_empty()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}
