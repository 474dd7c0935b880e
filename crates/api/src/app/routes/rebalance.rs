use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    response::IntoResponse,
    routing::post,
};

use crate::app::{dto, errors, services::AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/rebalance/plan", post(plan_rebalance))
        .route("/transfers/execute", post(execute_transfers))
}

pub async fn plan_rebalance(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::PlanRequest>,
) -> axum::response::Response {
    match services
        .engine
        .plan_rebalance(&body.product_ids, &body.strategy)
    {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn execute_transfers(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ExecuteRequest>,
) -> axum::response::Response {
    let report = services.engine.execute_transfers(&body.suggestion_ids);
    Json(report).into_response()
}
