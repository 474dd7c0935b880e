use serde::{Deserialize, Serialize};

use restock_core::{DomainError, DomainResult, ProductId};

/// Read-only reference copy of a catalog product.
///
/// The catalog owns products; the engine keeps this slice of them so alerts
/// and suggestions can carry names and the impact heuristic can price moved
/// units. Prices are in the smallest currency unit (e.g. cents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub unit_price_cents: i64,
    pub unit_cost_cents: i64,
}

impl ProductRef {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if self.unit_price_cents < 0 || self.unit_cost_cents < 0 {
            return Err(DomainError::validation("product prices cannot be negative"));
        }
        Ok(())
    }
}
