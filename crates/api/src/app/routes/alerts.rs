use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use restock_core::AlertId;

use crate::app::{dto, errors, services::AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/alerts", get(list_alerts))
        .route("/alerts/refresh", post(refresh_alerts))
        .route("/alerts/:id/resolve", post(resolve_alert))
}

pub async fn list_alerts(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::AlertsQuery>,
) -> axum::response::Response {
    match services.engine.list_alerts(query.product_id, query.store_id) {
        Ok(alerts) => Json(alerts).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn refresh_alerts(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RefreshAlertsRequest>,
) -> axum::response::Response {
    match services.engine.refresh_alerts(body.product_ids.as_deref()) {
        Ok(report) => Json(report).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn resolve_alert(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let alert_id: AlertId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid alert id");
        }
    };

    match services.engine.resolve_alert(alert_id) {
        Ok(alert) => Json(alert).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
