use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use restock_core::{MovementId, ProductId, StoreId, SuggestionId};

/// Direction of a ledger entry.
///
/// The ledger keeps the source system's Spanish vocabulary: ENTRADA is
/// inbound, SALIDA outbound, AJUSTE a correction that nets to neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementKind {
    Entrada,
    Salida,
    Ajuste,
}

/// Immutable movement ledger entry. Append-only: never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub id: MovementId,
    pub product_id: ProductId,
    pub store_id: StoreId,
    #[serde(rename = "type")]
    pub kind: MovementKind,
    /// Signed stock delta: positive for ENTRADA, negative for SALIDA.
    pub quantity: i64,
    pub reason: String,
    pub notes: Option<String>,
    /// Correlation to the transfer suggestion this entry executed, if any.
    /// The executor uses it as its idempotence guard.
    pub reference: Option<SuggestionId>,
    pub recorded_at: DateTime<Utc>,
}

impl MovementRecord {
    pub fn new(
        product_id: ProductId,
        store_id: StoreId,
        kind: MovementKind,
        quantity: i64,
        reason: impl Into<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MovementId::new(),
            product_id,
            store_id,
            kind,
            quantity,
            reason: reason.into(),
            notes: None,
            reference: None,
            recorded_at,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_reference(mut self, reference: SuggestionId) -> Self {
        self.reference = Some(reference);
        self
    }
}
