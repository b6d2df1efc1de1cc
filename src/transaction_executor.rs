//! # Transaction Executor
//!
//! Applies a [`UsagePlan`] against the inventory store as a single logical
//! unit: either every deduction lands, or the store is left unchanged and a
//! structured error is raised. Lots drained to a negligible residual are
//! deleted rather than left near zero.
//!
//! Concurrency follows the optimistic discipline: every mutation presents
//! the version its plan was computed against; a competing writer makes the
//! batch roll back, and [`complete_recipe`] re-plans against a fresh
//! snapshot with exponential backoff and jitter, bounded by
//! [`crate::engine_config::RetryConfig::max_attempts`]. The loser of a race
//! may legitimately end up with more shortfall than its first plan had —
//! that mirrors what actually happened to the pantry.

use log::{debug, info, warn};
use rand::Rng;
use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use crate::consumption_planner::{self, UsageOverride};
use crate::engine_config::EngineConfig;
use crate::ingredient_model::{CompletionSummary, UsagePlan};
use crate::ingredient_parser;
use crate::inventory_store::{InventoryStore, LotMutation, MutationOp, MutationReport, StoreError};
use crate::unit_conversion::ConversionTable;

/// Hard failures of the apply step; planning problems never surface here
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionError {
    /// Competing writers kept invalidating the plan's version tokens
    ConcurrentModification { attempts: u32 },
    /// The persistence layer failed; no partial writes persist
    StoreUnavailable(String),
}

impl std::fmt::Display for CompletionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionError::ConcurrentModification { attempts } => {
                write!(f, "concurrent modification after {attempts} attempt(s)")
            }
            CompletionError::StoreUnavailable(msg) => write!(f, "store unavailable: {msg}"),
        }
    }
}

impl std::error::Error for CompletionError {}

/// Apply an already-computed plan in one store transaction.
///
/// This is a single attempt: a version conflict is returned to the caller
/// rather than retried, which is also what rejects a plan that was already
/// committed once — its version tokens are stale by construction. Use
/// [`complete_recipe`] for the retrying end-to-end flow.
pub fn apply_plan<S: InventoryStore>(
    plan: &UsagePlan,
    store: &mut S,
    config: &EngineConfig,
) -> Result<CompletionSummary, CompletionError> {
    let mutations = mutations_for(plan, config.negligible_quantity);
    match store.apply_mutations(&mutations) {
        Ok(report) => Ok(summarize(plan, report)),
        Err(StoreError::VersionConflict { lot_id }) => {
            warn!("Plan rejected: lot {} changed since planning", lot_id);
            Err(CompletionError::ConcurrentModification { attempts: 1 })
        }
        Err(StoreError::Unavailable(msg)) => Err(CompletionError::StoreUnavailable(msg)),
    }
}

/// Run a full recipe completion: parse the ingredient lines, plan against a
/// snapshot of the store, and apply, re-planning on conflict.
///
/// Each retry reads fresh inventory, so the loser of a race replans against
/// the post-conflict state. Attempts are bounded; the final failure is
/// [`CompletionError::ConcurrentModification`].
pub fn complete_recipe<S: InventoryStore>(
    ingredient_lines: &str,
    store: &mut S,
    overrides: &HashMap<usize, UsageOverride>,
    table: &ConversionTable,
    config: &EngineConfig,
) -> Result<CompletionSummary, CompletionError> {
    let ingredients = ingredient_parser::parse_ingredient_list(ingredient_lines);
    info!(
        "Completing recipe with {} ingredient line(s)",
        ingredients.len()
    );

    let mut attempts = 0;
    loop {
        attempts += 1;

        let lots = match store.all_lots() {
            Ok(lots) => lots,
            Err(err) => return Err(store_failure(err)),
        };

        let plan =
            consumption_planner::plan(&ingredients, &lots, overrides, table, &config.matcher);
        let mutations = mutations_for(&plan, config.negligible_quantity);

        match store.apply_mutations(&mutations) {
            Ok(report) => {
                let summary = summarize(&plan, report);
                info!("Recipe completed on attempt {}: {}", attempts, summary);
                return Ok(summary);
            }
            Err(StoreError::VersionConflict { lot_id }) => {
                if attempts >= config.retry.max_attempts {
                    warn!(
                        "Giving up after {} attempt(s); lot {} kept changing",
                        attempts, lot_id
                    );
                    return Err(CompletionError::ConcurrentModification { attempts });
                }
                let delay = retry_delay(attempts, config);
                debug!(
                    "Attempt {} lost the race on lot {}; retrying in {:?}",
                    attempts, lot_id, delay
                );
                thread::sleep(delay);
            }
            Err(StoreError::Unavailable(msg)) => {
                return Err(CompletionError::StoreUnavailable(msg));
            }
        }
    }
}

/// Translate a plan into store mutations, coalescing allocations that
/// target the same lot and deleting lots drained to a negligible residual.
fn mutations_for(plan: &UsagePlan, negligible_quantity: f64) -> Vec<LotMutation> {
    struct PendingMutation {
        total_deduct: f64,
        resulting: f64,
        version: i64,
    }

    let mut order: Vec<i64> = Vec::new();
    let mut pending: HashMap<i64, PendingMutation> = HashMap::new();

    for allocation in plan.allocations() {
        let entry = pending
            .entry(allocation.lot_id)
            .or_insert_with(|| {
                order.push(allocation.lot_id);
                PendingMutation {
                    total_deduct: 0.0,
                    resulting: allocation.resulting_quantity,
                    version: allocation.lot_version,
                }
            });
        entry.total_deduct += allocation.amount_to_deduct;
        // Allocations arrive in plan order, so the last one holds the
        // lot's final quantity
        entry.resulting = allocation.resulting_quantity;
    }

    order
        .into_iter()
        .map(|lot_id| {
            let mutation = &pending[&lot_id];
            let op = if mutation.resulting <= negligible_quantity {
                MutationOp::Delete
            } else {
                MutationOp::Decrement(mutation.total_deduct)
            };
            LotMutation {
                lot_id,
                expected_version: mutation.version,
                op,
            }
        })
        .collect()
}

fn summarize(plan: &UsagePlan, report: MutationReport) -> CompletionSummary {
    CompletionSummary {
        lots_updated: report.updated,
        lots_deleted: report.deleted,
        shortfall_ingredients: plan.shortfalls(),
        missing_ingredients: plan.missing(),
    }
}

fn store_failure(err: StoreError) -> CompletionError {
    match err {
        StoreError::Unavailable(msg) => CompletionError::StoreUnavailable(msg),
        StoreError::VersionConflict { .. } => {
            CompletionError::ConcurrentModification { attempts: 1 }
        }
    }
}

/// Exponential backoff with random jitter, capped at the configured maximum
fn retry_delay(attempt: u32, config: &EngineConfig) -> Duration {
    let base = config.retry.base_delay_ms;
    let exponential = base.saturating_mul(1_u64 << (attempt - 1).min(16));
    let capped = exponential.min(config.retry.max_delay_ms);
    let jitter = rand::thread_rng().gen_range(0..=capped / 2);
    Duration::from_millis((capped + jitter).min(config.retry.max_delay_ms))
}
