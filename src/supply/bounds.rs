use crate::calculation_config::BoundsConfig;
use crate::models::enums::DiscrepancyKind;

use super::types::{DiscrepancySignal, SupplyError};

/// Clamps raw day supplies into the configured safe range.
#[derive(Debug, Clone, Copy)]
pub struct BoundsEnforcer {
    bounds: BoundsConfig,
}

impl BoundsEnforcer {
    pub fn new(bounds: BoundsConfig) -> Result<Self, SupplyError> {
        bounds.validate()?;
        Ok(Self { bounds })
    }

    /// Clamped value, plus a DaySupplyAdjusted signal whenever clamping changed it.
    pub fn enforce(&self, raw_days: u32) -> (u32, Option<DiscrepancySignal>) {
        let clamped = raw_days.clamp(self.bounds.min_days, self.bounds.max_days);
        if clamped == raw_days {
            return (clamped, None);
        }
        tracing::debug!(raw_days, clamped, "Day supply clamped to bounds");
        let signal = DiscrepancySignal::new(
            DiscrepancyKind::DaySupplyAdjusted,
            f64::from(raw_days),
            f64::from(clamped),
            format!("bounds {}..={}", self.bounds.min_days, self.bounds.max_days),
        );
        (clamped, Some(signal))
    }
}
