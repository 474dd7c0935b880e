//! Rebalance planning: turns stock imbalance into transfer suggestions.
//!
//! Pure domain logic — the planner reads snapshots and produces an ordered,
//! deterministic suggestion list. Nothing here mutates stock.

pub mod planner;
pub mod strategy;
pub mod suggestion;

pub use planner::{PlanOutcome, SkippedProduct, plan, plan_product};
pub use strategy::{OptimizationStrategy, StrategyKind, StrategyPriority};
pub use suggestion::{EstimatedImpact, SuggestionPriority, TransferSuggestion};
