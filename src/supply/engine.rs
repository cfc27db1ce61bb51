use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;

use crate::calculation_config::CalculationConfig;
use crate::config;
use crate::models::PrescriptionInput;

use super::assemble::{AssemblyParts, ResultAssembler};
use super::bounds::BoundsEnforcer;
use super::catalog::DrugCatalog;
use super::classify::CategoryClassifier;
use super::formulas::{DaySupplyCalculator, FormulaInput};
use super::quantity::QuantityNormalizer;
use super::sig::SigParser;
use super::types::{CalculationResult, SupplyEngine, SupplyError};

/// Default implementation of the supply engine.
/// Runs classification, parsing, the category formula, bounds and the warning
/// policy over shared read-only reference data.
pub struct DefaultSupplyEngine {
    catalog: Arc<DrugCatalog>,
    config: Arc<CalculationConfig>,
    classifier: CategoryClassifier,
    quantity: QuantityNormalizer,
    sig: SigParser,
    calculator: DaySupplyCalculator,
    bounds: BoundsEnforcer,
    assembler: ResultAssembler,
}

impl DefaultSupplyEngine {
    pub fn new(
        catalog: Arc<DrugCatalog>,
        config: Arc<CalculationConfig>,
    ) -> Result<Self, SupplyError> {
        config.validate()?;
        Ok(Self {
            classifier: CategoryClassifier::new(config.matching.min_similarity),
            quantity: QuantityNormalizer::new(config.defaults.quantity),
            sig: SigParser::new(config.defaults),
            calculator: DaySupplyCalculator,
            bounds: BoundsEnforcer::new(config.bounds)?,
            assembler: ResultAssembler::new(config.penalties),
            catalog,
            config,
        })
    }

    /// Compiled-in catalog with default configuration.
    pub fn bundled() -> Result<Self, SupplyError> {
        Self::new(
            Arc::new(DrugCatalog::bundled()?),
            Arc::new(CalculationConfig::default()),
        )
    }

    /// Catalog and configuration read from a resources directory.
    pub fn from_resources(dir: &Path) -> Result<Self, SupplyError> {
        let catalog = DrugCatalog::load(&dir.join(config::CATALOG_FILE))?;
        let calculation = CalculationConfig::load(&dir.join(config::CONFIG_FILE))?;
        Self::new(Arc::new(catalog), Arc::new(calculation))
    }

    pub fn catalog(&self) -> &DrugCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &CalculationConfig {
        &self.config
    }
}

impl SupplyEngine for DefaultSupplyEngine {
    fn calculate(&self, input: &PrescriptionInput) -> Result<CalculationResult, SupplyError> {
        if input.is_structurally_empty() {
            tracing::warn!(sig = %input.sig, "Rejected prescription with no drug name or quantity");
            return Err(SupplyError::Structural(
                "drug name and quantity are both empty".into(),
            ));
        }

        let matched = self.classifier.classify(&input.drug_name, &self.catalog);
        let quantity = self.quantity.normalize(&input.raw_quantity);
        let sig = self.sig.parse(&input.sig);

        let outcome = self.calculator.calculate(&FormulaInput {
            record: matched.record,
            quantity: &quantity,
            sig: &sig,
            sig_text: &input.sig,
            defaults: &self.config.defaults,
            max_days: self.config.bounds.max_days,
            match_similarity: matched.similarity,
        });
        let (calculated_days, bounds_signal) = self.bounds.enforce(outcome.raw_days);

        let result = self.assembler.assemble(
            AssemblyParts {
                input,
                matched,
                quantity,
                sig,
                outcome,
                calculated_days,
                bounds_signal,
            },
            &self.config.warning_policy,
        );

        tracing::debug!(
            input_id = %result.input_id,
            drug = %result.drug_name,
            category = result.matched_category.as_str(),
            method = result.match_method.as_str(),
            days = result.calculated_day_supply,
            confidence = result.confidence_score,
            warnings = result.warnings.len(),
            "Day supply calculated"
        );

        Ok(result)
    }

    fn calculate_batch(
        &self,
        inputs: &[PrescriptionInput],
    ) -> Vec<Result<CalculationResult, SupplyError>> {
        let results: Vec<_> = inputs.par_iter().map(|input| self.calculate(input)).collect();

        let rejected = results.iter().filter(|r| r.is_err()).count();
        let warned = results
            .iter()
            .filter(|r| r.as_ref().is_ok_and(|res| !res.warnings.is_empty()))
            .count();
        tracing::info!(
            total = inputs.len(),
            rejected,
            with_warnings = warned,
            "Batch calculation complete"
        );

        results
    }
}
