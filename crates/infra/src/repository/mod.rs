//! Repository traits: the storage seams of the engine.
//!
//! These make no storage assumptions — the in-memory implementations back
//! tests and the dev server, and a SQL backend would implement the same
//! traits with transactions where the in-memory versions use a single lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use restock_core::{AlertId, ExpectedVersion, ProductId, StoreId, SuggestionId};
use restock_inventory::{
    AlertKind, MovementRecord, ProductRef, ProductSnapshot, StockAlert, StoreStockRecord,
};

mod in_memory;

pub use in_memory::{InMemoryAlertRepository, InMemoryLedgerRepository, InMemoryStockRepository};

/// Storage operation error.
///
/// Infrastructure failures (concurrency, missing rows, malformed writes) as
/// opposed to domain errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("store lock poisoned")]
    LockPoisoned,
}

/// A stock row together with its optimistic concurrency version.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedStock {
    pub record: StoreStockRecord,
    pub version: u64,
}

/// Authoritative store for per-(product, store) stock rows.
///
/// Quantity mutations are compare-and-swap: callers pass the version they
/// read, and a mismatch fails with [`StoreError::Concurrency`] so the caller
/// re-reads and retries. `transfer_quantity` is the executor's critical
/// section: both rows change atomically or not at all, with no external IO
/// inside the operation.
pub trait StockRepository: Send + Sync {
    /// Register (or refresh) the catalog reference for a product.
    fn upsert_product(&self, product: ProductRef) -> Result<(), StoreError>;

    /// Create or replace the stock row for (product, store). Bumps the row
    /// version. The product must be registered first.
    fn upsert_record(&self, record: StoreStockRecord) -> Result<(), StoreError>;

    /// All registered product ids, in a stable order.
    fn list_product_ids(&self) -> Result<Vec<ProductId>, StoreError>;

    /// The product's reference data plus all of its stock rows, or `None` if
    /// the product is not registered.
    fn product_snapshot(&self, product_id: ProductId) -> Result<Option<ProductSnapshot>, StoreError>;

    /// One stock row with its version.
    fn get(&self, product_id: ProductId, store_id: StoreId)
    -> Result<Option<VersionedStock>, StoreError>;

    /// CAS update of one row's quantity; also refreshes `last_movement_at`.
    fn update_quantity(
        &self,
        product_id: ProductId,
        store_id: StoreId,
        quantity: i64,
        moved_at: DateTime<Utc>,
        expected: ExpectedVersion,
    ) -> Result<VersionedStock, StoreError>;

    /// Atomically move `quantity` units between two rows of the same product.
    /// Fails without partial effect if either version check fails or the
    /// source would go negative.
    fn transfer_quantity(
        &self,
        product_id: ProductId,
        from: StoreId,
        to: StoreId,
        quantity: i64,
        moved_at: DateTime<Utc>,
        expected_from: ExpectedVersion,
        expected_to: ExpectedVersion,
    ) -> Result<(), StoreError>;
}

/// Append-only movement ledger.
pub trait LedgerRepository: Send + Sync {
    /// Append entries atomically — a transfer's SALIDA/ENTRADA pair lands
    /// together or not at all.
    fn append(&self, records: Vec<MovementRecord>) -> Result<(), StoreError>;

    /// Ledger entries in append order, optionally filtered.
    fn history(
        &self,
        product_id: Option<ProductId>,
        store_id: Option<StoreId>,
    ) -> Result<Vec<MovementRecord>, StoreError>;

    /// Whether any entry references the given suggestion (idempotence guard).
    fn has_reference(&self, reference: SuggestionId) -> Result<bool, StoreError>;
}

/// Store for the current alert set.
pub trait AlertRepository: Send + Sync {
    /// Replace the alert set for a product with the output of a fresh
    /// classification pass (previous pass is superseded).
    fn replace_for_product(
        &self,
        product_id: ProductId,
        alerts: Vec<StockAlert>,
    ) -> Result<(), StoreError>;

    /// Current alerts in a stable order, optionally filtered.
    fn list(
        &self,
        product_id: Option<ProductId>,
        store_id: Option<StoreId>,
    ) -> Result<Vec<StockAlert>, StoreError>;

    /// Mark one alert resolved.
    fn resolve(&self, alert_id: AlertId) -> Result<StockAlert, StoreError>;

    /// Mark all alerts matching (product, store, kind) resolved; returns how
    /// many were updated. Zero matches is not an error.
    fn resolve_matching(
        &self,
        product_id: ProductId,
        store_id: StoreId,
        kind: AlertKind,
    ) -> Result<usize, StoreError>;
}

impl<S> StockRepository for Arc<S>
where
    S: StockRepository + ?Sized,
{
    fn upsert_product(&self, product: ProductRef) -> Result<(), StoreError> {
        (**self).upsert_product(product)
    }

    fn upsert_record(&self, record: StoreStockRecord) -> Result<(), StoreError> {
        (**self).upsert_record(record)
    }

    fn list_product_ids(&self) -> Result<Vec<ProductId>, StoreError> {
        (**self).list_product_ids()
    }

    fn product_snapshot(&self, product_id: ProductId) -> Result<Option<ProductSnapshot>, StoreError> {
        (**self).product_snapshot(product_id)
    }

    fn get(
        &self,
        product_id: ProductId,
        store_id: StoreId,
    ) -> Result<Option<VersionedStock>, StoreError> {
        (**self).get(product_id, store_id)
    }

    fn update_quantity(
        &self,
        product_id: ProductId,
        store_id: StoreId,
        quantity: i64,
        moved_at: DateTime<Utc>,
        expected: ExpectedVersion,
    ) -> Result<VersionedStock, StoreError> {
        (**self).update_quantity(product_id, store_id, quantity, moved_at, expected)
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
        (**self).transfer_quantity(
            product_id,
            from,
            to,
            quantity,
            moved_at,
            expected_from,
            expected_to,
        )
    }
}

impl<L> LedgerRepository for Arc<L>
where
    L: LedgerRepository + ?Sized,
{
    fn append(&self, records: Vec<MovementRecord>) -> Result<(), StoreError> {
        (**self).append(records)
    }

    fn history(
        &self,
        product_id: Option<ProductId>,
        store_id: Option<StoreId>,
    ) -> Result<Vec<MovementRecord>, StoreError> {
        (**self).history(product_id, store_id)
    }

    fn has_reference(&self, reference: SuggestionId) -> Result<bool, StoreError> {
        (**self).has_reference(reference)
    }
}

impl<A> AlertRepository for Arc<A>
where
    A: AlertRepository + ?Sized,
{
    fn replace_for_product(
        &self,
        product_id: ProductId,
        alerts: Vec<StockAlert>,
    ) -> Result<(), StoreError> {
        (**self).replace_for_product(product_id, alerts)
    }

    fn list(
        &self,
        product_id: Option<ProductId>,
        store_id: Option<StoreId>,
    ) -> Result<Vec<StockAlert>, StoreError> {
        (**self).list(product_id, store_id)
    }

    fn resolve(&self, alert_id: AlertId) -> Result<StockAlert, StoreError> {
        (**self).resolve(alert_id)
    }

    fn resolve_matching(
        &self,
        product_id: ProductId,
        store_id: StoreId,
        kind: AlertKind,
    ) -> Result<usize, StoreError> {
        (**self).resolve_matching(product_id, store_id, kind)
    }
}
