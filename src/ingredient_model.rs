//! # Ingredient and Inventory Data Model
//!
//! This module defines the data structures flowing through the resolution and
//! consumption pipeline: recipe ingredients parsed from free text, inventory
//! lots read from the store, match candidates, and the usage plan that the
//! transaction executor applies.
//!
//! ## Core Concepts
//!
//! - **RecipeIngredient**: one line of a recipe's ingredient list, parsed
//! - **InventoryLot**: one row of on-hand stock with its own quantity,
//!   expiration date, and concurrency version
//! - **MatchCandidate**: a scored pairing between an ingredient and a lot
//! - **UsagePlan**: the planned per-ingredient deductions for one request
//!
//! ## Usage
//!
//! ```rust
//! use pantry_engine::ingredient_model::{InventoryLot, RecipeIngredient};
//! use chrono::NaiveDate;
//!
//! let lot = InventoryLot::new(1, "milk", 0.5, "cup")
//!     .with_expiration(NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
//!
//! let ingredient = RecipeIngredient::new("1 cup milk", "milk")
//!     .with_amount(1.0)
//!     .with_unit("cup");
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One line from a recipe's ingredient list, parsed into structured form.
///
/// Derived once per recipe-completion request and discarded with the plan;
/// never persisted independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    /// The line as authored, untouched (e.g., "2 cups fresh broccoli")
    pub original_text: String,

    /// Parsed quantity, if one was found; always positive when present
    pub parsed_amount: Option<f64>,

    /// Canonical unit string (e.g., "tbsp", "g", "each"); `None` only when
    /// no amount was parsed either
    pub parsed_unit: Option<String>,

    /// Ingredient name with descriptor words removed ("4 large eggs" -> "eggs")
    pub normalized_name: String,
}

impl RecipeIngredient {
    /// Create an ingredient from its original text and normalized name
    pub fn new(original_text: &str, normalized_name: &str) -> Self {
        Self {
            original_text: original_text.to_string(),
            parsed_amount: None,
            parsed_unit: None,
            normalized_name: normalized_name.to_string(),
        }
    }

    /// Attach a parsed amount
    pub fn with_amount(mut self, amount: f64) -> Self {
        self.parsed_amount = Some(amount);
        self
    }

    /// Attach a canonical unit
    pub fn with_unit(mut self, unit: &str) -> Self {
        self.parsed_unit = Some(unit.to_string());
        self
    }

    /// Check whether a usable quantity was parsed from the line
    pub fn has_amount(&self) -> bool {
        self.parsed_amount.is_some()
    }
}

impl fmt::Display for RecipeIngredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.parsed_amount, self.parsed_unit.as_deref()) {
            (Some(amount), Some(unit)) => {
                write!(f, "{} {} {}", amount, unit, self.normalized_name)
            }
            _ => write!(f, "{}", self.normalized_name),
        }
    }
}

/// One row of on-hand stock.
///
/// The `version` field is the optimistic-concurrency token owned by the
/// inventory store; every store mutation bumps it. The engine only ever
/// decrements `quantity` or deletes the lot, and `quantity >= 0` holds at
/// all times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryLot {
    /// Unique identifier, owned by the inventory store
    pub id: i64,

    /// Product name as stored by the user
    pub product_name: String,

    /// On-hand quantity in `unit`; never negative
    pub quantity: f64,

    /// Normalized unit string the quantity is expressed in
    pub unit: String,

    /// Expiration date; lots without one are treated as expiring last
    pub expiration_date: Option<NaiveDate>,

    /// Optional semantic category (e.g., "dairy"); a weak matching signal only
    pub category: Option<String>,

    /// Concurrency token; bumped by the store on every mutation
    pub version: i64,
}

impl InventoryLot {
    /// Create a lot with no expiration date or category
    pub fn new(id: i64, product_name: &str, quantity: f64, unit: &str) -> Self {
        Self {
            id,
            product_name: product_name.to_string(),
            quantity,
            unit: unit.to_string(),
            expiration_date: None,
            category: None,
            version: 0,
        }
    }

    /// Attach an expiration date
    pub fn with_expiration(mut self, date: NaiveDate) -> Self {
        self.expiration_date = Some(date);
        self
    }

    /// Attach a semantic category
    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    /// Set the concurrency version
    pub fn with_version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }

    /// Sort key placing dated lots first, soonest expiration first, and
    /// undated lots last (infinite horizon)
    pub fn expiration_key(&self) -> NaiveDate {
        self.expiration_date.unwrap_or(NaiveDate::MAX)
    }
}

/// Why a lot was considered a match for an ingredient name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    /// Names identical after case-folding and trimming
    Exact,
    /// One name equals the other with a trailing "s"/"es" removed
    PluralVariant,
    /// The shorter name (>= 3 chars) is contained in the longer
    Substring,
    /// Names share at least one whole token
    WordOverlap,
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchReason::Exact => "exact",
            MatchReason::PluralVariant => "plural-variant",
            MatchReason::Substring => "substring",
            MatchReason::WordOverlap => "word-overlap",
        };
        write!(f, "{label}")
    }
}

/// A scored ingredient-to-lot pairing; ephemeral, recomputed per request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    /// Identifier of the matched inventory lot
    pub lot_id: i64,
    /// Match confidence, 0-100
    pub confidence: u8,
    /// Which tier produced the match
    pub reason: MatchReason,
}

/// One planned deduction against a single lot.
///
/// `amount_to_deduct` is expressed in the lot's native unit so the store can
/// apply it without converting. `lot_version` is the concurrency token the
/// executor must present when applying the deduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageAllocation {
    /// Lot the deduction draws from
    pub lot_id: i64,
    /// Amount to subtract, in the lot's native unit
    pub amount_to_deduct: f64,
    /// The lot's native unit the amount is expressed in
    pub unit: String,
    /// Lot quantity after the deduction; never negative
    pub resulting_quantity: f64,
    /// Version the lot had when the plan was computed
    pub lot_version: i64,
}

/// How much of an ingredient's requested amount the plan covers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientCoverage {
    /// The full requested amount is allocated
    Full,
    /// Inventory ran out; the unmet remainder is recorded, not dropped
    Partial {
        /// Unmet amount in the requested unit
        shortfall: f64,
        /// Unit the shortfall is expressed in
        unit: String,
    },
    /// No inventory lot matched the ingredient at all
    Missing,
}

/// Planned usage for one recipe ingredient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientPlan {
    /// The parsed ingredient this plan covers
    pub ingredient: RecipeIngredient,
    /// Deductions in draw order (soonest expiration first)
    pub allocations: Vec<UsageAllocation>,
    /// Whether the request was fully covered
    pub coverage: IngredientCoverage,
}

impl IngredientPlan {
    /// True when no lot matched this ingredient
    pub fn is_missing(&self) -> bool {
        matches!(self.coverage, IngredientCoverage::Missing)
    }

    /// True when matched inventory could not cover the full request
    pub fn has_shortfall(&self) -> bool {
        matches!(self.coverage, IngredientCoverage::Partial { .. })
    }
}

/// The full per-recipe output of the consumption planner.
///
/// Owned by the planner for the duration of one request; only the transaction
/// executor's writes persist.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UsagePlan {
    /// Per-ingredient plans, in recipe order
    pub ingredients: Vec<IngredientPlan>,
}

impl UsagePlan {
    /// Names of ingredients that matched no inventory lot
    pub fn missing(&self) -> Vec<String> {
        self.ingredients
            .iter()
            .filter(|p| p.is_missing())
            .map(|p| p.ingredient.normalized_name.clone())
            .collect()
    }

    /// Names of ingredients with only partial coverage
    pub fn shortfalls(&self) -> Vec<String> {
        self.ingredients
            .iter()
            .filter(|p| p.has_shortfall())
            .map(|p| p.ingredient.normalized_name.clone())
            .collect()
    }

    /// All planned deductions, flattened in plan order
    pub fn allocations(&self) -> Vec<&UsageAllocation> {
        self.ingredients
            .iter()
            .flat_map(|p| p.allocations.iter())
            .collect()
    }

    /// True when the plan deducts nothing at all
    pub fn is_empty(&self) -> bool {
        self.ingredients.iter().all(|p| p.allocations.is_empty())
    }
}

/// Result of a successfully applied recipe completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSummary {
    /// Lots decremented but still in stock
    pub lots_updated: usize,
    /// Lots consumed to (near) zero and removed
    pub lots_deleted: usize,
    /// Ingredients whose requested amount exceeded matched inventory
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shortfall_ingredients: Vec<String>,
    /// Ingredients with no inventory match at all
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_ingredients: Vec<String>,
}

impl fmt::Display for CompletionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lot(s) updated, {} lot(s) deleted",
            self.lots_updated, self.lots_deleted
        )?;
        if !self.shortfall_ingredients.is_empty() {
            write!(f, "; short on {}", self.shortfall_ingredients.join(", "))?;
        }
        if !self.missing_ingredients.is_empty() {
            write!(f, "; missing {}", self.missing_ingredients.join(", "))?;
        }
        Ok(())
    }
}
