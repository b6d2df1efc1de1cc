//! # Consumption Planner
//!
//! Orchestrates parser output, the name matcher, and the lot selector into a
//! per-recipe [`UsagePlan`]: which lots to draw from, how much, in which
//! unit. The planner is a pure function of its inputs plus the conversion
//! table — it never touches the store, which keeps it testable without one.
//!
//! Per ingredient: no matching lot means "missing"; a parsed amount (or a
//! caller override from the manual partial-usage UI) is partitioned across
//! the matched lots oldest-first; an ingredient with no parsed amount at all
//! ("salt to taste") consumes everything the best-matched lot holds, unless
//! an override supplies an explicit amount.

use log::{debug, info, warn};
use std::collections::HashMap;

use crate::engine_config::MatcherConfig;
use crate::ingredient_model::{
    IngredientCoverage, IngredientPlan, InventoryLot, RecipeIngredient, UsageAllocation, UsagePlan,
};
use crate::lot_selector::{self, AMOUNT_EPSILON};
use crate::name_matcher;
use crate::unit_conversion::ConversionTable;
use crate::unit_table::COUNT_UNIT_EACH;

/// Caller-approved explicit usage for one ingredient, e.g. from a UI slider
#[derive(Debug, Clone, PartialEq)]
pub struct UsageOverride {
    /// Amount to consume instead of the parsed amount
    pub amount: f64,
    /// Unit for the amount; `None` inherits the parsed unit, falling back to
    /// the best-matched lot's native unit
    pub unit: Option<String>,
}

impl UsageOverride {
    /// Override the amount, keeping the ingredient's own unit
    pub fn new(amount: f64) -> Self {
        Self { amount, unit: None }
    }

    /// Override both amount and unit
    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }
}

/// Build the usage plan for a whole recipe against an inventory snapshot.
///
/// `overrides` is keyed by ingredient index in `ingredients`. The returned
/// plan carries every ingredient in recipe order, including missing and
/// short ones; nothing here mutates inventory.
pub fn plan(
    ingredients: &[RecipeIngredient],
    lots: &[InventoryLot],
    overrides: &HashMap<usize, UsageOverride>,
    table: &ConversionTable,
    config: &MatcherConfig,
) -> UsagePlan {
    let mut plans = Vec::with_capacity(ingredients.len());

    // Earlier ingredients' draws reduce what later ones see, so two
    // ingredients matching the same lot cannot both plan its full quantity
    let mut remaining: HashMap<i64, f64> = lots.iter().map(|l| (l.id, l.quantity)).collect();

    for (index, ingredient) in ingredients.iter().enumerate() {
        let effective: Vec<InventoryLot> = lots
            .iter()
            .map(|lot| {
                let mut adjusted = lot.clone();
                adjusted.quantity = remaining.get(&lot.id).copied().unwrap_or(lot.quantity);
                adjusted
            })
            .collect();

        let ingredient_plan = plan_ingredient(
            ingredient,
            overrides.get(&index),
            &effective,
            table,
            config,
        );

        for allocation in &ingredient_plan.allocations {
            if let Some(quantity) = remaining.get_mut(&allocation.lot_id) {
                *quantity = (*quantity - allocation.amount_to_deduct).max(0.0);
            }
        }

        plans.push(ingredient_plan);
    }

    info!(
        "Planned {} ingredient(s): {} missing, {} short",
        plans.len(),
        plans.iter().filter(|p| p.is_missing()).count(),
        plans.iter().filter(|p| p.has_shortfall()).count()
    );

    UsagePlan { ingredients: plans }
}

fn plan_ingredient(
    ingredient: &RecipeIngredient,
    usage_override: Option<&UsageOverride>,
    lots: &[InventoryLot],
    table: &ConversionTable,
    config: &MatcherConfig,
) -> IngredientPlan {
    let candidates = name_matcher::match_candidates(
        &ingredient.normalized_name,
        lots,
        config.min_confidence,
    );

    if candidates.is_empty() {
        debug!("No inventory match for '{}'", ingredient.normalized_name);
        return IngredientPlan {
            ingredient: ingredient.clone(),
            allocations: vec![],
            coverage: IngredientCoverage::Missing,
        };
    }

    // Candidate order is confidence order; resolve back to the lot rows
    let matched_lots: Vec<&InventoryLot> = candidates
        .iter()
        .filter_map(|candidate| lots.iter().find(|lot| lot.id == candidate.lot_id))
        .collect();

    let requested = requested_usage(ingredient, usage_override, &matched_lots);

    let (amount, unit) = match requested {
        Some(request) => request,
        None => {
            // No parsed amount and no override: consume all of the best match
            let best = matched_lots[0];
            warn!(
                "'{}' has no parsed amount; consuming all {} {} of lot {} ({})",
                ingredient.normalized_name, best.quantity, best.unit, best.id, best.product_name
            );
            let allocations = if best.quantity > AMOUNT_EPSILON {
                vec![UsageAllocation {
                    lot_id: best.id,
                    amount_to_deduct: best.quantity,
                    unit: best.unit.clone(),
                    resulting_quantity: 0.0,
                    lot_version: best.version,
                }]
            } else {
                vec![]
            };
            return IngredientPlan {
                ingredient: ingredient.clone(),
                allocations,
                coverage: IngredientCoverage::Full,
            };
        }
    };

    let outcome = lot_selector::allocate(
        &ingredient.normalized_name,
        amount,
        &unit,
        &matched_lots,
        table,
    );

    let coverage = if outcome.fully_covered() {
        IngredientCoverage::Full
    } else {
        IngredientCoverage::Partial {
            shortfall: outcome.shortfall,
            unit: unit.clone(),
        }
    };

    IngredientPlan {
        ingredient: ingredient.clone(),
        allocations: outcome.allocations,
        coverage,
    }
}

/// Resolve the requested amount and unit for an ingredient, if any
fn requested_usage(
    ingredient: &RecipeIngredient,
    usage_override: Option<&UsageOverride>,
    matched_lots: &[&InventoryLot],
) -> Option<(f64, String)> {
    if let Some(request) = usage_override {
        let unit = request
            .unit
            .clone()
            .or_else(|| ingredient.parsed_unit.clone())
            .unwrap_or_else(|| matched_lots[0].unit.clone());
        return Some((request.amount, unit));
    }

    ingredient.parsed_amount.map(|amount| {
        let unit = ingredient
            .parsed_unit
            .clone()
            .unwrap_or_else(|| COUNT_UNIT_EACH.to_string());
        (amount, unit)
    })
}
