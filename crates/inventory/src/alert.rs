use serde::{Deserialize, Serialize};

use restock_core::{AlertId, ProductId, StoreId};

/// Category of stock condition an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LowStock,
    Overstock,
    NoMovement,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::LowStock => "low_stock",
            AlertKind::Overstock => "overstock",
            AlertKind::NoMovement => "no_movement",
        }
    }
}

/// Alert severity, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    High,
    Medium,
    Low,
}

/// A stock condition detected by one classification pass.
///
/// Alerts are derived, ephemeral facts: each pass emits a fresh set, and an
/// alert whose condition disappears is superseded rather than auto-resolved.
/// `resolved` is only ever set explicitly (by the transfer executor or a
/// manual resolution).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAlert {
    pub id: AlertId,
    pub product_id: ProductId,
    pub product_name: String,
    pub store_id: StoreId,
    pub store_name: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
    pub suggested_action: String,
    pub resolved: bool,
}
