use serde::Deserialize;

use restock_core::{ProductId, StoreId, SuggestionId};
use restock_rebalance::OptimizationStrategy;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    pub product_id: Option<ProductId>,
    pub store_id: Option<StoreId>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshAlertsRequest {
    /// Restrict the pass to these products; omit to classify everything.
    #[serde(default)]
    pub product_ids: Option<Vec<ProductId>>,
}

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub product_ids: Vec<ProductId>,
    #[serde(default)]
    pub strategy: OptimizationStrategy,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub suggestion_ids: Vec<SuggestionId>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub target_quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct MovementsQuery {
    pub product_id: Option<ProductId>,
    pub store_id: Option<StoreId>,
}
