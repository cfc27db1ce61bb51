pub mod calculation_config;
pub mod config;
pub mod models;
pub mod supply;

use tracing_subscriber::EnvFilter;

pub use calculation_config::CalculationConfig;
pub use models::PrescriptionInput;
pub use supply::{
    CalculationResult, DefaultSupplyEngine, DrugCatalog, SupplyEngine, SupplyError, WarningPolicy,
};

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to the crate
/// default. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
    tracing::debug!(version = config::APP_VERSION, "Tracing initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }

    #[test]
    fn public_surface_calculates() {
        let engine = DefaultSupplyEngine::bundled().unwrap();
        let result = engine
            .calculate(&PrescriptionInput::new("Timolol", "1", "1 drop ou bid"))
            .unwrap();
        assert_eq!(result.calculated_day_supply, 25);
    }
}
