use std::sync::Arc;

use restock_infra::{
    InMemoryAlertRepository, InMemoryLedgerRepository, InMemoryStockRepository, RebalanceEngine,
};

/// Concrete engine type served by this process (in-memory repositories).
pub type Engine = RebalanceEngine<
    Arc<InMemoryStockRepository>,
    Arc<InMemoryLedgerRepository>,
    Arc<InMemoryAlertRepository>,
>;

/// Shared application services handed to every handler.
pub struct AppServices {
    pub engine: Engine,
    /// Direct handle for the snapshot provider feed (`PUT /products`,
    /// `PUT /stock/records`); everything else goes through the engine.
    pub stock: Arc<InMemoryStockRepository>,
}

/// Wire up the engine against fresh in-memory repositories.
pub fn build_services() -> AppServices {
    let stock = Arc::new(InMemoryStockRepository::new());
    let ledger = Arc::new(InMemoryLedgerRepository::new());
    let alerts = Arc::new(InMemoryAlertRepository::new());

    AppServices {
        engine: RebalanceEngine::new(stock.clone(), ledger, alerts),
        stock,
    }
}
