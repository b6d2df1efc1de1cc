//! # Pantry Engine
//!
//! Recipe-to-inventory ingredient resolution and consumption: parses a
//! recipe's free-text ingredient lines, matches each ingredient to on-hand
//! inventory lots, converts quantities across units, draws from the
//! oldest-expiring lots first, and applies the resulting deductions to the
//! inventory store atomically.
//!
//! The pipeline runs strictly downward — parser, matcher, lot selector,
//! planner, executor — and only the executor talks to the store. Matching
//! and parsing problems degrade into the plan's missing/shortfall lists;
//! only store-level failures during the atomic apply step surface as hard
//! errors.

pub mod consumption_planner;
pub mod engine_config;
pub mod ingredient_model;
pub mod ingredient_parser;
pub mod inventory_store;
pub mod lot_selector;
pub mod name_matcher;
pub mod transaction_executor;
pub mod unit_conversion;
pub mod unit_table;

pub use consumption_planner::{plan, UsageOverride};
pub use engine_config::EngineConfig;
pub use ingredient_model::{
    CompletionSummary, IngredientCoverage, InventoryLot, RecipeIngredient, UsagePlan,
};
pub use inventory_store::{InventoryStore, SqliteInventoryStore, StoreError};
pub use transaction_executor::{apply_plan, complete_recipe, CompletionError};
pub use unit_conversion::{ConversionTable, ConversionError};
