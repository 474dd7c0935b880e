//! Manual stock adjustment: sets an absolute quantity and records the delta.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use restock_core::{ExpectedVersion, ProductId, StoreId};
use restock_inventory::{MovementKind, MovementRecord, StoreStockRecord};

use crate::repository::{AlertRepository, LedgerRepository, StockRepository, StoreError};

use super::{EngineError, RebalanceEngine};

const CAS_RETRIES: usize = 3;

/// Result of a manual adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdjustOutcome {
    /// The target matched the current quantity; nothing changed and nothing
    /// was written to the ledger.
    Noop { current: StoreStockRecord },
    /// The quantity was updated and one ledger entry appended.
    Applied {
        movement: MovementRecord,
        record: StoreStockRecord,
    },
}

impl<S, L, A> RebalanceEngine<S, L, A>
where
    S: StockRepository,
    L: LedgerRepository,
    A: AlertRepository,
{
    /// Set the absolute quantity for one (product, store) pair.
    ///
    /// The delta against the live quantity decides the ledger entry kind:
    /// ENTRADA when raising, SALIDA when lowering. AJUSTE stays reserved for
    /// corrections that don't net to a simple sign. A zero delta is a
    /// reported no-op, not an error.
    pub fn adjust_stock(
        &self,
        product_id: ProductId,
        store_id: StoreId,
        target_quantity: i64,
    ) -> Result<AdjustOutcome, EngineError> {
        if target_quantity < 0 {
            return Err(EngineError::Validation(
                "target quantity cannot be negative".to_string(),
            ));
        }

        for attempt in 0..CAS_RETRIES {
            let current = self.stock.get(product_id, store_id)?.ok_or_else(|| {
                EngineError::NotFound(format!(
                    "no stock record for product {product_id} at store {store_id}"
                ))
            })?;

            let delta = target_quantity - current.record.quantity;
            if delta == 0 {
                return Ok(AdjustOutcome::Noop {
                    current: current.record,
                });
            }

            let kind = if delta > 0 {
                MovementKind::Entrada
            } else {
                MovementKind::Salida
            };

            let now = Utc::now();
            let updated = match self.stock.update_quantity(
                product_id,
                store_id,
                target_quantity,
                now,
                ExpectedVersion::Exact(current.version),
            ) {
                Ok(updated) => updated,
                Err(StoreError::Concurrency(_)) if attempt + 1 < CAS_RETRIES => continue,
                Err(err) => return Err(err.into()),
            };

            let movement = MovementRecord::new(product_id, store_id, kind, delta, "manual stock adjustment", now)
                .with_notes(format!("quantity set to {target_quantity}"));
            self.ledger.append(vec![movement.clone()])?;

            tracing::info!(
                %product_id,
                %store_id,
                delta,
                new_quantity = updated.record.quantity,
                "stock adjusted"
            );

            return Ok(AdjustOutcome::Applied {
                movement,
                record: updated.record,
            });
        }

        Err(EngineError::Conflict(
            "stock changed concurrently; retries exhausted".to_string(),
        ))
    }
}
