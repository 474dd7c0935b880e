use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use restock_core::{DomainError, DomainResult, ProductId, StoreId};

use crate::product::ProductRef;

/// Current stock state of one product at one store.
///
/// Exactly one record exists per (product, store) pair; it is the
/// authoritative quantity for that pair. Only the transfer executor and the
/// manual adjustment operation mutate `quantity` inside this system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreStockRecord {
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub store_name: String,
    pub quantity: i64,
    pub min_stock: i64,
    pub max_stock: i64,
    /// Sales velocity (units per period). Used to prioritize replenishment.
    pub turnover_rate: f64,
    pub days_of_stock: f64,
    pub last_movement_at: DateTime<Utc>,
}

impl StoreStockRecord {
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity < 0 {
            return Err(DomainError::validation(format!(
                "quantity cannot be negative (got {})",
                self.quantity
            )));
        }
        if self.min_stock < 0 || self.max_stock < 0 {
            return Err(DomainError::validation(
                "stock thresholds cannot be negative",
            ));
        }
        if self.min_stock > self.max_stock {
            return Err(DomainError::validation(format!(
                "min_stock ({}) cannot exceed max_stock ({})",
                self.min_stock, self.max_stock
            )));
        }
        if !self.turnover_rate.is_finite() || self.turnover_rate < 0.0 {
            return Err(DomainError::validation(
                "turnover_rate must be a finite non-negative number",
            ));
        }
        if !self.days_of_stock.is_finite() || self.days_of_stock < 0.0 {
            return Err(DomainError::validation(
                "days_of_stock must be a finite non-negative number",
            ));
        }
        Ok(())
    }

    pub fn is_overstocked(&self) -> bool {
        self.quantity > self.max_stock
    }

    pub fn is_understocked(&self) -> bool {
        self.quantity < self.min_stock
    }

    /// Units above the configured maximum (0 when in range).
    pub fn surplus(&self) -> i64 {
        (self.quantity - self.max_stock).max(0)
    }

    /// Units below the configured minimum (0 when in range).
    pub fn deficit(&self) -> i64 {
        (self.min_stock - self.quantity).max(0)
    }
}

/// One product's stock records across the store network, as handed over by the
/// snapshot provider. Records are kept sorted by store id so every consumer
/// iterates in the same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product: ProductRef,
    pub records: Vec<StoreStockRecord>,
}

impl ProductSnapshot {
    pub fn new(product: ProductRef, mut records: Vec<StoreStockRecord>) -> Self {
        records.sort_by_key(|r| r.store_id);
        Self { product, records }
    }
}
