//! In-memory repository implementations.
//!
//! Intended for tests/dev. Not optimized for performance. The stock store
//! applies a two-row transfer under one write lock, which is the in-memory
//! equivalent of a serializable transaction.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use restock_core::{AlertId, ExpectedVersion, ProductId, StoreId, SuggestionId};
use restock_inventory::{
    AlertKind, MovementRecord, ProductRef, ProductSnapshot, StockAlert, StoreStockRecord,
};

use super::{AlertRepository, LedgerRepository, StockRepository, StoreError, VersionedStock};

#[derive(Debug, Default)]
struct StockState {
    products: BTreeMap<ProductId, ProductRef>,
    rows: HashMap<(ProductId, StoreId), VersionedStock>,
}

/// In-memory stock store with per-row versions.
#[derive(Debug, Default)]
pub struct InMemoryStockRepository {
    state: RwLock<StockState>,
}

impl InMemoryStockRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StockRepository for InMemoryStockRepository {
    fn upsert_product(&self, product: ProductRef) -> Result<(), StoreError> {
        product
            .validate()
            .map_err(|e| StoreError::InvalidRecord(e.to_string()))?;
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        state.products.insert(product.id, product);
        Ok(())
    }

    fn upsert_record(&self, record: StoreStockRecord) -> Result<(), StoreError> {
        record
            .validate()
            .map_err(|e| StoreError::InvalidRecord(e.to_string()))?;
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        if !state.products.contains_key(&record.product_id) {
            return Err(StoreError::NotFound(format!(
                "product {} is not registered",
                record.product_id
            )));
        }
        let key = (record.product_id, record.store_id);
        let version = state.rows.get(&key).map(|v| v.version).unwrap_or(0) + 1;
        state.rows.insert(key, VersionedStock { record, version });
        Ok(())
    }

    fn list_product_ids(&self) -> Result<Vec<ProductId>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.products.keys().copied().collect())
    }

    fn product_snapshot(&self, product_id: ProductId) -> Result<Option<ProductSnapshot>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        let Some(product) = state.products.get(&product_id) else {
            return Ok(None);
        };
        let records = state
            .rows
            .iter()
            .filter(|((pid, _), _)| *pid == product_id)
            .map(|(_, v)| v.record.clone())
            .collect();
        Ok(Some(ProductSnapshot::new(product.clone(), records)))
    }

    fn get(
        &self,
        product_id: ProductId,
        store_id: StoreId,
    ) -> Result<Option<VersionedStock>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.rows.get(&(product_id, store_id)).cloned())
    }

    fn update_quantity(
        &self,
        product_id: ProductId,
        store_id: StoreId,
        quantity: i64,
        moved_at: DateTime<Utc>,
        expected: ExpectedVersion,
    ) -> Result<VersionedStock, StoreError> {
        if quantity < 0 {
            return Err(StoreError::InvalidRecord(
                "quantity cannot be negative".to_string(),
            ));
        }
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        let row = state
            .rows
            .get_mut(&(product_id, store_id))
            .ok_or_else(|| StoreError::NotFound(stock_row_name(product_id, store_id)))?;

        if !expected.matches(row.version) {
            return Err(StoreError::Concurrency(format!(
                "expected {expected:?}, found {}",
                row.version
            )));
        }

        row.record.quantity = quantity;
        row.record.last_movement_at = moved_at;
        row.version += 1;
        Ok(row.clone())
    }

    fn transfer_quantity(
        &self,
        product_id: ProductId,
        from: StoreId,
        to: StoreId,
        quantity: i64,
        moved_at: DateTime<Utc>,
        expected_from: ExpectedVersion,
        expected_to: ExpectedVersion,
    ) -> Result<(), StoreError> {
        if quantity <= 0 {
            return Err(StoreError::InvalidRecord(
                "transfer quantity must be positive".to_string(),
            ));
        }

        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;

        // Validate both rows before touching either one.
        let from_row = state
            .rows
            .get(&(product_id, from))
            .ok_or_else(|| StoreError::NotFound(stock_row_name(product_id, from)))?;
        let to_row = state
            .rows
            .get(&(product_id, to))
            .ok_or_else(|| StoreError::NotFound(stock_row_name(product_id, to)))?;

        if !expected_from.matches(from_row.version) {
            return Err(StoreError::Concurrency(format!(
                "source row: expected {expected_from:?}, found {}",
                from_row.version
            )));
        }
        if !expected_to.matches(to_row.version) {
            return Err(StoreError::Concurrency(format!(
                "destination row: expected {expected_to:?}, found {}",
                to_row.version
            )));
        }
        if from_row.record.quantity < quantity {
            return Err(StoreError::Concurrency(format!(
                "source holds {} units, cannot move {}",
                from_row.record.quantity, quantity
            )));
        }

        let from_row = state
            .rows
            .get_mut(&(product_id, from))
            .ok_or_else(|| StoreError::NotFound(stock_row_name(product_id, from)))?;
        from_row.record.quantity -= quantity;
        from_row.record.last_movement_at = moved_at;
        from_row.version += 1;

        let to_row = state
            .rows
            .get_mut(&(product_id, to))
            .ok_or_else(|| StoreError::NotFound(stock_row_name(product_id, to)))?;
        to_row.record.quantity += quantity;
        to_row.record.last_movement_at = moved_at;
        to_row.version += 1;

        Ok(())
    }
}

fn stock_row_name(product_id: ProductId, store_id: StoreId) -> String {
    format!("stock record for product {product_id} at store {store_id}")
}

/// In-memory append-only movement ledger.
#[derive(Debug, Default)]
pub struct InMemoryLedgerRepository {
    entries: RwLock<Vec<MovementRecord>>,
}

impl InMemoryLedgerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerRepository for InMemoryLedgerRepository {
    fn append(&self, records: Vec<MovementRecord>) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        entries.extend(records);
        Ok(())
    }

    fn history(
        &self,
        product_id: Option<ProductId>,
        store_id: Option<StoreId>,
    ) -> Result<Vec<MovementRecord>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(entries
            .iter()
            .filter(|m| product_id.is_none_or(|p| m.product_id == p))
            .filter(|m| store_id.is_none_or(|s| m.store_id == s))
            .cloned()
            .collect())
    }

    fn has_reference(&self, reference: SuggestionId) -> Result<bool, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(entries.iter().any(|m| m.reference == Some(reference)))
    }
}

/// In-memory alert store, keyed by product for pass-level supersession.
#[derive(Debug, Default)]
pub struct InMemoryAlertRepository {
    alerts: RwLock<BTreeMap<ProductId, Vec<StockAlert>>>,
}

impl InMemoryAlertRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AlertRepository for InMemoryAlertRepository {
    fn replace_for_product(
        &self,
        product_id: ProductId,
        alerts: Vec<StockAlert>,
    ) -> Result<(), StoreError> {
        let mut map = self.alerts.write().map_err(|_| StoreError::LockPoisoned)?;
        map.insert(product_id, alerts);
        Ok(())
    }

    fn list(
        &self,
        product_id: Option<ProductId>,
        store_id: Option<StoreId>,
    ) -> Result<Vec<StockAlert>, StoreError> {
        let map = self.alerts.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map
            .values()
            .flatten()
            .filter(|a| product_id.is_none_or(|p| a.product_id == p))
            .filter(|a| store_id.is_none_or(|s| a.store_id == s))
            .cloned()
            .collect())
    }

    fn resolve(&self, alert_id: AlertId) -> Result<StockAlert, StoreError> {
        let mut map = self.alerts.write().map_err(|_| StoreError::LockPoisoned)?;
        for alerts in map.values_mut() {
            if let Some(alert) = alerts.iter_mut().find(|a| a.id == alert_id) {
                alert.resolved = true;
                return Ok(alert.clone());
            }
        }
        Err(StoreError::NotFound(format!("alert {alert_id}")))
    }

    fn resolve_matching(
        &self,
        product_id: ProductId,
        store_id: StoreId,
        kind: AlertKind,
    ) -> Result<usize, StoreError> {
        let mut map = self.alerts.write().map_err(|_| StoreError::LockPoisoned)?;
        let Some(alerts) = map.get_mut(&product_id) else {
            return Ok(0);
        };
        let mut updated = 0;
        for alert in alerts
            .iter_mut()
            .filter(|a| a.store_id == store_id && a.kind == kind && !a.resolved)
        {
            alert.resolved = true;
            updated += 1;
        }
        Ok(updated)
    }
}
