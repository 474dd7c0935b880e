//! Transfer executor: applies approved suggestions to live stock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use restock_core::{ExpectedVersion, SuggestionId};
use restock_inventory::{AlertKind, MovementKind, MovementRecord};
use restock_rebalance::TransferSuggestion;

use crate::repository::{AlertRepository, LedgerRepository, StockRepository, StoreError};

use super::{EngineError, RebalanceEngine};

/// Bounded retries when a CAS loses a version race before giving up.
const CAS_RETRIES: usize = 3;

/// One suggestion the executor refused, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedTransfer {
    pub id: SuggestionId,
    pub reason: String,
}

/// Aggregate outcome of executing a batch of suggestions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecuteReport {
    pub applied: usize,
    pub rejected: Vec<RejectedTransfer>,
}

impl<S, L, A> RebalanceEngine<S, L, A>
where
    S: StockRepository,
    L: LedgerRepository,
    A: AlertRepository,
{
    /// Execute a batch of previously planned suggestions.
    ///
    /// Each suggestion is an atomic unit: it either fully applies (both
    /// quantities moved, both ledger entries appended) or is rejected with a
    /// reason. A rejection never blocks the other suggestions in the batch.
    pub fn execute_transfers(&self, suggestion_ids: &[SuggestionId]) -> ExecuteReport {
        let mut report = ExecuteReport::default();

        for &id in suggestion_ids {
            match self.execute_one(id) {
                Ok(()) => report.applied += 1,
                Err(err) => {
                    tracing::warn!(suggestion_id = %id, error = %err, "transfer rejected");
                    report.rejected.push(RejectedTransfer {
                        id,
                        reason: err.to_string(),
                    });
                }
            }
        }

        report
    }

    fn execute_one(&self, id: SuggestionId) -> Result<(), EngineError> {
        // Durable idempotence guard: an already-executed suggestion left its
        // mark in the ledger even if the pending cache has moved on.
        if self.ledger.has_reference(id)? {
            return Err(EngineError::Conflict("suggestion already applied".to_string()));
        }

        // Taking the suggestion out of the cache is what serializes two
        // callers submitting the same id at the same time.
        let Some(suggestion) = self.take_pending(id)? else {
            return Err(EngineError::NotFound(
                "suggestion is not pending; already applied or never planned".to_string(),
            ));
        };

        let now = Utc::now();
        match self.apply_suggestion(&suggestion, now) {
            Ok(()) => {
                tracing::info!(
                    suggestion_id = %id,
                    product_id = %suggestion.product_id,
                    from = %suggestion.from_store_name,
                    to = %suggestion.to_store_name,
                    quantity = suggestion.quantity,
                    "transfer applied"
                );
                Ok(())
            }
            Err(err) => {
                self.restore_pending(suggestion);
                Err(err)
            }
        }
    }

    /// Re-read, check, and move stock, then write the ledger pair.
    ///
    /// The suggestion carries intent only; quantities are always re-read from
    /// the authoritative rows before mutating.
    fn apply_suggestion(
        &self,
        suggestion: &TransferSuggestion,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let product_id = suggestion.product_id;
        self.move_stock(suggestion, now)?;

        let reason = format!(
            "rebalance transfer {} -> {}",
            suggestion.from_store_name, suggestion.to_store_name
        );
        self.ledger.append(vec![
            MovementRecord::new(
                product_id,
                suggestion.from_store_id,
                MovementKind::Salida,
                -suggestion.quantity,
                reason.clone(),
                now,
            )
            .with_notes(suggestion.reason.clone())
            .with_reference(suggestion.id),
            MovementRecord::new(
                product_id,
                suggestion.to_store_id,
                MovementKind::Entrada,
                suggestion.quantity,
                reason,
                now,
            )
            .with_notes(suggestion.reason.clone())
            .with_reference(suggestion.id),
        ])?;

        // Best effort: the destination's low-stock alerts are what this
        // transfer was relieving. A missing alert is not an error.
        match self
            .alerts
            .resolve_matching(product_id, suggestion.to_store_id, AlertKind::LowStock)
        {
            Ok(resolved) if resolved > 0 => {
                tracing::debug!(suggestion_id = %suggestion.id, resolved, "low-stock alerts resolved");
            }
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(suggestion_id = %suggestion.id, error = %err, "alert resolution skipped");
            }
        }

        Ok(())
    }

    /// The critical section: re-read both rows, check sufficiency, and apply
    /// the CAS-guarded transfer, retrying a bounded number of version races.
    fn move_stock(
        &self,
        suggestion: &TransferSuggestion,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let product_id = suggestion.product_id;

        for attempt in 0..CAS_RETRIES {
            let from = self
                .stock
                .get(product_id, suggestion.from_store_id)?
                .ok_or_else(|| EngineError::NotFound("source stock record not found".to_string()))?;
            let to = self
                .stock
                .get(product_id, suggestion.to_store_id)?
                .ok_or_else(|| {
                    EngineError::NotFound("destination stock record not found".to_string())
                })?;

            if from.record.quantity < suggestion.quantity {
                return Err(EngineError::Conflict(format!(
                    "insufficient source stock ({} on hand, {} requested)",
                    from.record.quantity, suggestion.quantity
                )));
            }

            match self.stock.transfer_quantity(
                product_id,
                suggestion.from_store_id,
                suggestion.to_store_id,
                suggestion.quantity,
                now,
                ExpectedVersion::Exact(from.version),
                ExpectedVersion::Exact(to.version),
            ) {
                Ok(()) => return Ok(()),
                Err(StoreError::Concurrency(_)) if attempt + 1 < CAS_RETRIES => continue,
                Err(err) => return Err(err.into()),
            }
        }

        Err(EngineError::Conflict(
            "stock changed concurrently; retries exhausted".to_string(),
        ))
    }
}
