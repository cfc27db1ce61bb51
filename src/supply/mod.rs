pub mod assemble;
pub mod bounds;
pub mod catalog;
pub mod classify;
pub mod engine;
pub mod formulas;
pub mod helpers;
pub mod messages;
pub mod policy;
pub mod quantity;
pub mod sig;
pub mod types;

pub use catalog::DrugCatalog;
pub use classify::{CatalogMatch, CategoryClassifier, MatchStrategy};
pub use engine::DefaultSupplyEngine;
pub use policy::{WarningPolicy, WarningRule};
pub use types::*;
