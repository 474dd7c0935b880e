use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use restock_infra::StockRepository;
use restock_inventory::{ProductRef, StoreStockRecord};

use crate::app::{dto, errors, services::AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/products", put(upsert_product))
        .route("/stock/records", put(upsert_record))
        .route("/stock/adjust", post(adjust_stock))
        .route("/movements", get(movement_history))
}

/// Snapshot provider feed: register or refresh a catalog product.
pub async fn upsert_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(product): Json<ProductRef>,
) -> axum::response::Response {
    match services.stock.upsert_product(product) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::engine_error_to_response(e.into()),
    }
}

/// Snapshot provider feed: create or replace one stock record.
pub async fn upsert_record(
    Extension(services): Extension<Arc<AppServices>>,
    Json(record): Json<StoreStockRecord>,
) -> axum::response::Response {
    match services.stock.upsert_record(record) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::engine_error_to_response(e.into()),
    }
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    match services
        .engine
        .adjust_stock(body.product_id, body.store_id, body.target_quantity)
    {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn movement_history(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::MovementsQuery>,
) -> axum::response::Response {
    match services
        .engine
        .movement_history(query.product_id, query.store_id)
    {
        Ok(movements) => Json(movements).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
