#[tokio::main]
async fn main() {
    restock_observability::init();

    let addr = std::env::var("RESTOCK_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let app = restock_api::app::build_app();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {addr}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
