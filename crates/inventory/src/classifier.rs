//! Alert classifier: scans stock snapshots and emits alerts.
//!
//! Pure function of the snapshot — no side effects, no IO. Malformed records
//! are rejected individually; the rest of the batch still classifies.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use restock_core::{AlertId, ProductId, StoreId};

use crate::alert::{AlertKind, AlertSeverity, StockAlert};
use crate::product::ProductRef;
use crate::record::{ProductSnapshot, StoreStockRecord};

/// Classifier tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// A record with stock but no movement for longer than this window emits a
    /// no-movement alert.
    pub staleness_window: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            staleness_window: Duration::days(30),
        }
    }
}

/// A record the classifier refused to evaluate, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub reason: String,
}

/// Outcome of classifying one product snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SnapshotClassification {
    pub alerts: Vec<StockAlert>,
    pub rejected: Vec<RejectedRecord>,
}

/// Classify every record in a snapshot.
///
/// Deterministic: records are evaluated in snapshot order and alert ids are
/// derived from content, so the same snapshot always yields the same alert
/// set in the same order.
pub fn classify_snapshot(
    snapshot: &ProductSnapshot,
    config: &ClassifierConfig,
    now: DateTime<Utc>,
) -> SnapshotClassification {
    let mut out = SnapshotClassification::default();

    for record in &snapshot.records {
        match record.validate() {
            Ok(()) => out
                .alerts
                .extend(classify_record(&snapshot.product, record, config, now)),
            Err(err) => out.rejected.push(RejectedRecord {
                product_id: record.product_id,
                store_id: record.store_id,
                reason: err.to_string(),
            }),
        }
    }

    out
}

/// Evaluate one record against all rule categories.
///
/// Categories are independent facts: a store can be low on stock *and* stale
/// at the same time, producing one alert per matching category.
fn classify_record(
    product: &ProductRef,
    record: &StoreStockRecord,
    config: &ClassifierConfig,
    now: DateTime<Utc>,
) -> Vec<StockAlert> {
    let mut alerts = Vec::new();

    if let Some(alert) = low_stock_alert(product, record) {
        alerts.push(alert);
    }
    if record.is_overstocked() {
        alerts.push(make_alert(
            product,
            record,
            AlertKind::Overstock,
            AlertSeverity::Medium,
            format!(
                "{} holds {} units at {}, above the maximum of {}",
                product.name, record.quantity, record.store_name, record.max_stock
            ),
            "redistribute or promote",
        ));
    }
    if record.quantity > 0 && now - record.last_movement_at > config.staleness_window {
        alerts.push(make_alert(
            product,
            record,
            AlertKind::NoMovement,
            AlertSeverity::Low,
            format!(
                "{} has not moved at {} since {}",
                product.name,
                record.store_name,
                record.last_movement_at.format("%Y-%m-%d")
            ),
            "review pricing or transfer to a higher-velocity store",
        ));
    }

    alerts
}

fn low_stock_alert(product: &ProductRef, record: &StoreStockRecord) -> Option<StockAlert> {
    if record.quantity == 0 {
        return Some(make_alert(
            product,
            record,
            AlertKind::LowStock,
            AlertSeverity::Critical,
            format!("{} is out of stock at {}", product.name, record.store_name),
            "urgent reorder or transfer from surplus stores",
        ));
    }

    if record.is_understocked() {
        // Below half the minimum is critical; the boundary itself is not
        // (strict <, so quantity == min_stock/2 stays high).
        let severity = if 2 * record.quantity < record.min_stock {
            AlertSeverity::Critical
        } else {
            AlertSeverity::High
        };
        return Some(make_alert(
            product,
            record,
            AlertKind::LowStock,
            severity,
            format!(
                "{} is down to {} units at {}, below the minimum of {}",
                product.name, record.quantity, record.store_name, record.min_stock
            ),
            "replenish via transfer or purchase order",
        ));
    }

    None
}

fn make_alert(
    product: &ProductRef,
    record: &StoreStockRecord,
    kind: AlertKind,
    severity: AlertSeverity,
    message: String,
    suggested_action: &str,
) -> StockAlert {
    StockAlert {
        id: AlertId::derive(record.product_id, record.store_id, kind.as_str()),
        product_id: record.product_id,
        product_name: product.name.clone(),
        store_id: record.store_id,
        store_name: record.store_name.clone(),
        kind,
        severity,
        message,
        suggested_action: suggested_action.to_string(),
        resolved: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use restock_core::{ProductId, StoreId};

    fn product() -> ProductRef {
        ProductRef {
            id: ProductId::new(),
            name: "Widget".to_string(),
            category: "hardware".to_string(),
            unit_price_cents: 1_999,
            unit_cost_cents: 850,
        }
    }

    fn record(product_id: ProductId, quantity: i64, min_stock: i64, max_stock: i64) -> StoreStockRecord {
        StoreStockRecord {
            product_id,
            store_id: StoreId::new(),
            store_name: "Downtown".to_string(),
            quantity,
            min_stock,
            max_stock,
            turnover_rate: 2.0,
            days_of_stock: 12.0,
            last_movement_at: Utc::now(),
        }
    }

    #[test]
    fn zero_quantity_emits_exactly_one_critical_low_stock_alert() {
        let p = product();
        let snapshot = ProductSnapshot::new(p.clone(), vec![record(p.id, 0, 10, 50)]);

        let out = classify_snapshot(&snapshot, &ClassifierConfig::default(), Utc::now());

        assert_eq!(out.alerts.len(), 1);
        let alert = &out.alerts[0];
        assert_eq!(alert.kind, AlertKind::LowStock);
        assert_eq!(alert.severity, AlertSeverity::Critical);
        assert_eq!(
            alert.suggested_action,
            "urgent reorder or transfer from surplus stores"
        );
        assert!(!alert.resolved);
    }

    #[test]
    fn below_half_minimum_is_critical() {
        let p = product();
        let snapshot = ProductSnapshot::new(p.clone(), vec![record(p.id, 4, 10, 50)]);

        let out = classify_snapshot(&snapshot, &ClassifierConfig::default(), Utc::now());
        assert_eq!(out.alerts[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn exactly_half_minimum_is_high_not_critical() {
        let p = product();
        let snapshot = ProductSnapshot::new(p.clone(), vec![record(p.id, 5, 10, 50)]);

        let out = classify_snapshot(&snapshot, &ClassifierConfig::default(), Utc::now());
        assert_eq!(out.alerts.len(), 1);
        assert_eq!(out.alerts[0].severity, AlertSeverity::High);
    }

    #[test]
    fn above_maximum_is_a_medium_overstock() {
        let p = product();
        let snapshot = ProductSnapshot::new(p.clone(), vec![record(p.id, 60, 10, 50)]);

        let out = classify_snapshot(&snapshot, &ClassifierConfig::default(), Utc::now());
        assert_eq!(out.alerts.len(), 1);
        assert_eq!(out.alerts[0].kind, AlertKind::Overstock);
        assert_eq!(out.alerts[0].severity, AlertSeverity::Medium);
        assert_eq!(out.alerts[0].suggested_action, "redistribute or promote");
    }

    #[test]
    fn stale_stock_emits_no_movement_but_empty_stock_does_not() {
        let p = product();
        let now = Utc::now();

        let mut stale = record(p.id, 20, 10, 50);
        stale.last_movement_at = now - Duration::days(45);

        let mut stale_but_empty = record(p.id, 0, 10, 50);
        stale_but_empty.last_movement_at = now - Duration::days(45);

        let snapshot = ProductSnapshot::new(p.clone(), vec![stale.clone(), stale_but_empty.clone()]);
        let out = classify_snapshot(&snapshot, &ClassifierConfig::default(), now);

        let for_stale: Vec<_> = out
            .alerts
            .iter()
            .filter(|a| a.store_id == stale.store_id)
            .collect();
        assert_eq!(for_stale.len(), 1);
        assert_eq!(for_stale[0].kind, AlertKind::NoMovement);
        assert_eq!(for_stale[0].severity, AlertSeverity::Low);

        // quantity == 0 only triggers the low-stock rule, never no-movement.
        let for_empty: Vec<_> = out
            .alerts
            .iter()
            .filter(|a| a.store_id == stale_but_empty.store_id)
            .collect();
        assert_eq!(for_empty.len(), 1);
        assert_eq!(for_empty[0].kind, AlertKind::LowStock);
    }

    #[test]
    fn independent_categories_stack_on_one_record() {
        let p = product();
        let now = Utc::now();
        let mut r = record(p.id, 3, 10, 50);
        r.last_movement_at = now - Duration::days(90);

        let snapshot = ProductSnapshot::new(p.clone(), vec![r]);
        let out = classify_snapshot(&snapshot, &ClassifierConfig::default(), now);

        let kinds: Vec<_> = out.alerts.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AlertKind::LowStock, AlertKind::NoMovement]);
    }

    #[test]
    fn malformed_record_is_rejected_without_aborting_the_batch() {
        let p = product();
        let good = record(p.id, 0, 10, 50);
        let mut bad = record(p.id, 5, 30, 10);
        bad.store_name = "Uptown".to_string();

        let snapshot = ProductSnapshot::new(p.clone(), vec![good, bad.clone()]);
        let out = classify_snapshot(&snapshot, &ClassifierConfig::default(), Utc::now());

        assert_eq!(out.alerts.len(), 1);
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].store_id, bad.store_id);
        assert!(out.rejected[0].reason.contains("min_stock"));
    }

    #[test]
    fn classification_is_deterministic() {
        let p = product();
        let now = Utc::now();
        let mut stale = record(p.id, 70, 10, 50);
        stale.last_movement_at = now - Duration::days(60);
        let snapshot = ProductSnapshot::new(p.clone(), vec![record(p.id, 2, 10, 50), stale]);

        let first = classify_snapshot(&snapshot, &ClassifierConfig::default(), now);
        let second = classify_snapshot(&snapshot, &ClassifierConfig::default(), now);
        assert_eq!(first, second);
    }

    proptest! {
        /// Property: a record never produces two alerts of the same category.
        #[test]
        fn at_most_one_alert_per_category(
            quantity in 0i64..200,
            min_stock in 0i64..50,
            spread in 0i64..100,
            stale_days in 0i64..90,
        ) {
            let p = product();
            let now = Utc::now();
            let mut r = record(p.id, quantity, min_stock, min_stock + spread);
            r.last_movement_at = now - Duration::days(stale_days);

            let snapshot = ProductSnapshot::new(p, vec![r]);
            let out = classify_snapshot(&snapshot, &ClassifierConfig::default(), now);

            let low = out.alerts.iter().filter(|a| a.kind == AlertKind::LowStock).count();
            let over = out.alerts.iter().filter(|a| a.kind == AlertKind::Overstock).count();
            let stale = out.alerts.iter().filter(|a| a.kind == AlertKind::NoMovement).count();

            prop_assert!(low <= 1);
            prop_assert!(over <= 1);
            prop_assert!(stale <= 1);
            // low-stock and overstock are mutually exclusive by construction
            prop_assert!(low + over <= 1);
        }
    }
}
