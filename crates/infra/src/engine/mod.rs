//! Engine services: the request/response operations exposed to callers.
//!
//! Each operation is invoked synchronously and returns a complete result.
//! Batch operations (classify, plan, execute) report per-item outcomes and
//! never abort siblings; single-item mutations fail hard.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use restock_core::{AlertId, ProductId, StoreId, SuggestionId};
use restock_inventory::{
    ClassifierConfig, MovementRecord, RejectedRecord, StockAlert, classify_snapshot,
};
use restock_rebalance::{OptimizationStrategy, PlanOutcome, SkippedProduct, TransferSuggestion, plan};

use crate::repository::{AlertRepository, LedgerRepository, StockRepository, StoreError};

mod adjust;
mod transfer;

pub use adjust::AdjustOutcome;
pub use transfer::{ExecuteReport, RejectedTransfer};

/// Service-boundary error, mirroring the error taxonomy callers see.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Concurrency(msg) => EngineError::Conflict(msg),
            StoreError::NotFound(msg) => EngineError::NotFound(msg),
            StoreError::InvalidRecord(msg) => EngineError::Validation(msg),
            StoreError::LockPoisoned => EngineError::Storage(err.to_string()),
        }
    }
}

/// Outcome of one classification pass across products.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub alerts: Vec<StockAlert>,
    pub rejected: Vec<RejectedRecord>,
}

/// The rebalancing engine: alert lifecycle, planning, execution, adjustment.
///
/// Generic over its repositories so storage can be swapped without touching
/// the operations. Holds the last plan's suggestions in a pending cache; the
/// executor consumes entries from it by id.
pub struct RebalanceEngine<S, L, A> {
    stock: S,
    ledger: L,
    alerts: A,
    classifier: ClassifierConfig,
    pending: RwLock<HashMap<SuggestionId, TransferSuggestion>>,
}

impl<S, L, A> RebalanceEngine<S, L, A>
where
    S: StockRepository,
    L: LedgerRepository,
    A: AlertRepository,
{
    pub fn new(stock: S, ledger: L, alerts: A) -> Self {
        Self {
            stock,
            ledger,
            alerts,
            classifier: ClassifierConfig::default(),
            pending: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_classifier_config(mut self, config: ClassifierConfig) -> Self {
        self.classifier = config;
        self
    }

    /// Run a classification pass and replace the stored alert sets.
    ///
    /// With `product_ids = None` every registered product is classified.
    /// Products without a snapshot are skipped with a warning; malformed
    /// records are reported per record without aborting the pass.
    pub fn refresh_alerts(
        &self,
        product_ids: Option<&[ProductId]>,
    ) -> Result<ClassificationReport, EngineError> {
        let ids: Vec<ProductId> = match product_ids {
            Some(ids) => ids.to_vec(),
            None => self.stock.list_product_ids()?,
        };

        let now = Utc::now();
        let mut report = ClassificationReport::default();

        for product_id in ids {
            let Some(snapshot) = self.stock.product_snapshot(product_id)? else {
                tracing::warn!(%product_id, "no stock records; skipping classification");
                continue;
            };
            let outcome = classify_snapshot(&snapshot, &self.classifier, now);
            self.alerts
                .replace_for_product(product_id, outcome.alerts.clone())?;
            report.alerts.extend(outcome.alerts);
            report.rejected.extend(outcome.rejected);
        }

        Ok(report)
    }

    /// Current alerts, optionally narrowed to one store and/or product.
    pub fn list_alerts(
        &self,
        product_id: Option<ProductId>,
        store_id: Option<StoreId>,
    ) -> Result<Vec<StockAlert>, EngineError> {
        Ok(self.alerts.list(product_id, store_id)?)
    }

    /// Manually resolve one alert. Unknown ids are a hard error.
    pub fn resolve_alert(&self, alert_id: AlertId) -> Result<StockAlert, EngineError> {
        Ok(self.alerts.resolve(alert_id)?)
    }

    /// Plan transfers for the given products under a strategy.
    ///
    /// The resulting suggestions are cached as pending so they can later be
    /// executed by id; replanning overwrites cache entries (same imbalance,
    /// same id).
    pub fn plan_rebalance(
        &self,
        product_ids: &[ProductId],
        strategy: &OptimizationStrategy,
    ) -> Result<PlanOutcome, EngineError> {
        if product_ids.is_empty() {
            return Err(EngineError::Validation(
                "product id list cannot be empty".to_string(),
            ));
        }

        let mut snapshots = Vec::with_capacity(product_ids.len());
        let mut missing = Vec::new();

        for &product_id in product_ids {
            match self.stock.product_snapshot(product_id)? {
                Some(snapshot) => snapshots.push(snapshot),
                None => {
                    tracing::warn!(%product_id, "unknown product; skipping planning");
                    missing.push(SkippedProduct {
                        product_id,
                        reason: "no stock records for product".to_string(),
                    });
                }
            }
        }

        let mut outcome = plan(&snapshots, strategy);
        outcome.skipped.extend(missing);

        let mut pending = self
            .pending
            .write()
            .map_err(|_| EngineError::Storage("pending plan lock poisoned".to_string()))?;
        for suggestion in &outcome.suggestions {
            pending.insert(suggestion.id, suggestion.clone());
        }

        Ok(outcome)
    }

    /// Ledger entries in append order, optionally filtered.
    pub fn movement_history(
        &self,
        product_id: Option<ProductId>,
        store_id: Option<StoreId>,
    ) -> Result<Vec<MovementRecord>, EngineError> {
        Ok(self.ledger.history(product_id, store_id)?)
    }

    /// Take a suggestion out of the pending cache, if present.
    ///
    /// Removal is the mutual exclusion point for concurrent executors: only
    /// one caller can take a given id.
    pub(crate) fn take_pending(
        &self,
        id: SuggestionId,
    ) -> Result<Option<TransferSuggestion>, EngineError> {
        let mut pending = self
            .pending
            .write()
            .map_err(|_| EngineError::Storage("pending plan lock poisoned".to_string()))?;
        Ok(pending.remove(&id))
    }

    /// Put a suggestion back after a failed execution attempt so the caller
    /// can retry or replan.
    pub(crate) fn restore_pending(&self, suggestion: TransferSuggestion) {
        if let Ok(mut pending) = self.pending.write() {
            pending.insert(suggestion.id, suggestion);
        }
    }
}
