use serde::{Deserialize, Serialize};

use restock_core::{ProductId, StoreId, SuggestionId};

/// Urgency of acting on a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionPriority {
    High,
    Medium,
    /// Intentionally deferred by the strategy variant (see planner docs).
    Low,
}

/// Strategy-dependent estimate of what executing a suggestion is worth.
/// Deterministic given identical inputs; both components are non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatedImpact {
    pub cost_savings: f64,
    pub turnover_improvement: f64,
}

/// A proposed, not-yet-applied stock transfer between two stores.
///
/// The id is derived from (product, source, destination), so replanning the
/// same imbalance yields the same id — the executor relies on that to reject
/// resubmissions of an already-applied suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferSuggestion {
    pub id: SuggestionId,
    pub product_id: ProductId,
    pub product_name: String,
    pub from_store_id: StoreId,
    pub from_store_name: String,
    pub to_store_id: StoreId,
    pub to_store_name: String,
    pub quantity: i64,
    pub reason: String,
    pub priority: SuggestionPriority,
    pub estimated_impact: EstimatedImpact,
}
