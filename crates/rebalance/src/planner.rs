//! Rebalance planner: matches overstocked stores against understocked ones.
//!
//! Given identical snapshots and strategy, the planner produces the same
//! suggestion list in the same order. Suggestion ids are content-derived, so
//! determinism here is what makes replanning and idempotent execution work.

use restock_core::SuggestionId;
use restock_inventory::{ProductSnapshot, StoreStockRecord};
use serde::{Deserialize, Serialize};

use crate::strategy::{OptimizationStrategy, StrategyKind, StrategyPriority};
use crate::suggestion::{EstimatedImpact, SuggestionPriority, TransferSuggestion};

/// Share of unit cost treated as avoided holding cost per unit moved.
const HOLDING_COST_RATE: f64 = 0.18;
/// Extra weighting applied to cost savings under the `cost` priority.
const COST_PRIORITY_WEIGHT: f64 = 1.25;
/// Scale factor turning (units x turnover gap) into a turnover improvement.
const TURNOVER_GAIN_PER_UNIT: f64 = 0.05;

/// A product the planner could not evaluate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedProduct {
    pub product_id: restock_core::ProductId,
    pub reason: String,
}

/// Result of one planning run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub suggestions: Vec<TransferSuggestion>,
    pub skipped: Vec<SkippedProduct>,
}

/// Plan transfers for a batch of product snapshots.
///
/// A product without usable records is skipped with a warning; the remaining
/// products still produce suggestions.
pub fn plan(snapshots: &[ProductSnapshot], strategy: &OptimizationStrategy) -> PlanOutcome {
    let mut outcome = PlanOutcome::default();

    for snapshot in snapshots {
        if snapshot.records.is_empty() {
            tracing::warn!(product_id = %snapshot.product.id, "no stock records; skipping product");
            outcome.skipped.push(SkippedProduct {
                product_id: snapshot.product.id,
                reason: "no stock records".to_string(),
            });
            continue;
        }
        outcome.suggestions.extend(plan_product(snapshot, strategy));
    }

    outcome
}

/// Working copy of a record taking part in the pairing.
struct Leg<'a> {
    record: &'a StoreStockRecord,
    remaining: i64,
}

/// Plan transfers for a single product.
///
/// Pairing runs over *remaining* surplus and deficit, so a suggestion never
/// drains a source below its maximum nor fills a destination above its
/// minimum, regardless of strategy.
pub fn plan_product(
    snapshot: &ProductSnapshot,
    strategy: &OptimizationStrategy,
) -> Vec<TransferSuggestion> {
    let valid: Vec<&StoreStockRecord> = snapshot
        .records
        .iter()
        .filter(|r| r.validate().is_ok())
        .collect();

    let mut sources: Vec<Leg<'_>> = valid
        .iter()
        .copied()
        .filter(|r| r.is_overstocked())
        .map(|r| Leg {
            record: r,
            remaining: r.surplus(),
        })
        .collect();

    let mut destinations: Vec<Leg<'_>> = valid
        .iter()
        .copied()
        .filter(|r| r.is_understocked())
        .map(|r| Leg {
            record: r,
            remaining: r.deficit(),
        })
        .collect();

    if sources.is_empty() || destinations.is_empty() {
        return Vec::new();
    }

    // Largest surplus first; ties broken by store id to keep the order total.
    sources.sort_by(|a, b| {
        b.remaining
            .cmp(&a.remaining)
            .then(a.record.store_id.cmp(&b.record.store_id))
    });

    match strategy.kind {
        // Serve the neediest store first.
        StrategyKind::Balance => destinations.sort_by(|a, b| {
            a.record
                .quantity
                .cmp(&b.record.quantity)
                .then(a.record.store_id.cmp(&b.record.store_id))
        }),
        // Largest need first, so one source covers as much as possible per stop.
        StrategyKind::MinimizeTransfers => destinations.sort_by(|a, b| {
            b.remaining
                .cmp(&a.remaining)
                .then(a.record.store_id.cmp(&b.record.store_id))
        }),
        // Fastest-moving store first.
        StrategyKind::MaximizeTurnover => destinations.sort_by(|a, b| {
            b.record
                .turnover_rate
                .total_cmp(&a.record.turnover_rate)
                .then(a.record.store_id.cmp(&b.record.store_id))
        }),
    }

    let mean_turnover = mean_turnover(&valid);
    let mut suggestions = match strategy.kind {
        StrategyKind::MinimizeTransfers => {
            pair_sources_first(snapshot, strategy, &mut sources, &mut destinations, mean_turnover)
        }
        _ => pair_destinations_first(snapshot, strategy, &mut sources, &mut destinations, mean_turnover),
    };

    if strategy.kind == StrategyKind::MinimizeTransfers {
        mark_residual_transfers(&mut suggestions, &destinations);
    }

    suggestions
}

fn mean_turnover(records: &[&StoreStockRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().map(|r| r.turnover_rate).sum::<f64>() / records.len() as f64
}

/// `balance` / `maximize_turnover` pairing: walk destinations in strategy
/// order, drawing from the largest remaining surplus first.
fn pair_destinations_first(
    snapshot: &ProductSnapshot,
    strategy: &OptimizationStrategy,
    sources: &mut [Leg<'_>],
    destinations: &mut [Leg<'_>],
    mean_turnover: f64,
) -> Vec<TransferSuggestion> {
    let mut suggestions = Vec::new();

    for dest in destinations.iter_mut() {
        for source in sources.iter_mut() {
            if dest.remaining == 0 {
                break;
            }
            let quantity = source.remaining.min(dest.remaining);
            if quantity <= 0 {
                continue;
            }
            source.remaining -= quantity;
            dest.remaining -= quantity;
            suggestions.push(build_suggestion(
                snapshot,
                strategy,
                source.record,
                dest.record,
                quantity,
                mean_turnover,
            ));
        }
    }

    suggestions
}

/// `minimize_transfers` pairing: drain one source across destinations before
/// touching the next, so destinations merge against as few sources as possible.
fn pair_sources_first(
    snapshot: &ProductSnapshot,
    strategy: &OptimizationStrategy,
    sources: &mut [Leg<'_>],
    destinations: &mut [Leg<'_>],
    mean_turnover: f64,
) -> Vec<TransferSuggestion> {
    let mut suggestions = Vec::new();

    for source in sources.iter_mut() {
        for dest in destinations.iter_mut() {
            if source.remaining == 0 {
                break;
            }
            let quantity = source.remaining.min(dest.remaining);
            if quantity <= 0 {
                continue;
            }
            source.remaining -= quantity;
            dest.remaining -= quantity;
            suggestions.push(build_suggestion(
                snapshot,
                strategy,
                source.record,
                dest.record,
                quantity,
                mean_turnover,
            ));
        }
    }

    suggestions
}

/// Downgrade the last transfer into a destination the source pool could not
/// fully serve. The deferral never outranks the empty-store rule.
fn mark_residual_transfers(suggestions: &mut [TransferSuggestion], destinations: &[Leg<'_>]) {
    for dest in destinations {
        if dest.remaining == 0 {
            continue;
        }
        if let Some(last) = suggestions
            .iter_mut()
            .rev()
            .find(|s| s.to_store_id == dest.record.store_id)
        {
            if last.priority == SuggestionPriority::Medium {
                last.priority = SuggestionPriority::Low;
            }
        }
    }
}

fn build_suggestion(
    snapshot: &ProductSnapshot,
    strategy: &OptimizationStrategy,
    from: &StoreStockRecord,
    to: &StoreStockRecord,
    quantity: i64,
    mean_turnover: f64,
) -> TransferSuggestion {
    let product = &snapshot.product;

    let mut priority = if to.quantity == 0 {
        SuggestionPriority::High
    } else {
        SuggestionPriority::Medium
    };

    // maximize_turnover intentionally defers stores trailing the product's
    // mean velocity; they are replenished last and flagged as such.
    if strategy.kind == StrategyKind::MaximizeTurnover
        && priority == SuggestionPriority::Medium
        && to.turnover_rate < mean_turnover
    {
        priority = SuggestionPriority::Low;
    }

    TransferSuggestion {
        id: SuggestionId::derive(product.id, from.store_id, to.store_id),
        product_id: product.id,
        product_name: product.name.clone(),
        from_store_id: from.store_id,
        from_store_name: from.store_name.clone(),
        to_store_id: to.store_id,
        to_store_name: to.store_name.clone(),
        quantity,
        reason: format!(
            "redistribute {} units of {} from {} (over max by {}) to {} (under min by {})",
            quantity,
            product.name,
            from.store_name,
            from.surplus(),
            to.store_name,
            to.deficit()
        ),
        priority,
        estimated_impact: estimate_impact(strategy, product, to, quantity, mean_turnover),
    }
}

/// Strategy-weighted impact heuristic.
///
/// Both components are monotonic in the quantity moved. The coefficients are
/// free parameters, not calibrated business values.
fn estimate_impact(
    strategy: &OptimizationStrategy,
    product: &restock_inventory::ProductRef,
    to: &StoreStockRecord,
    quantity: i64,
    mean_turnover: f64,
) -> EstimatedImpact {
    let unit_cost = product.unit_cost_cents as f64 / 100.0;
    let cost_weight = if strategy.priority == StrategyPriority::Cost {
        COST_PRIORITY_WEIGHT
    } else {
        1.0
    };
    let cost_savings = quantity as f64 * unit_cost * HOLDING_COST_RATE * cost_weight;

    let turnover_gap = (to.turnover_rate - mean_turnover).max(0.0);
    let turnover_improvement = quantity as f64 * turnover_gap * TURNOVER_GAIN_PER_UNIT;

    EstimatedImpact {
        cost_savings,
        turnover_improvement,
    }
}
