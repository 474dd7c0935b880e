use axum::Router;

pub mod alerts;
pub mod rebalance;
pub mod stock;
pub mod system;

pub fn router() -> Router {
    Router::new()
        .merge(alerts::router())
        .merge(rebalance::router())
        .merge(stock::router())
}
