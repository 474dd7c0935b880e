//! Integration tests for the full engine pipeline.
//!
//! Tests: snapshot -> classifier -> planner -> executor -> ledger, through the
//! repository traits, including the concurrency discipline around stock rows.

use std::sync::Arc;

use chrono::Utc;

use restock_core::{AlertId, ProductId, StoreId};
use restock_inventory::{
    AlertKind, AlertSeverity, MovementKind, MovementRecord, ProductRef, StoreStockRecord,
};
use restock_rebalance::{OptimizationStrategy, SuggestionPriority};

use crate::engine::{AdjustOutcome, EngineError, RebalanceEngine};
use crate::repository::{
    InMemoryAlertRepository, InMemoryLedgerRepository, InMemoryStockRepository, LedgerRepository,
    StockRepository,
};

type TestEngine = RebalanceEngine<
    Arc<InMemoryStockRepository>,
    Arc<InMemoryLedgerRepository>,
    Arc<InMemoryAlertRepository>,
>;

struct Fixture {
    engine: Arc<TestEngine>,
    stock: Arc<InMemoryStockRepository>,
    ledger: Arc<InMemoryLedgerRepository>,
}

fn setup() -> Fixture {
    let stock = Arc::new(InMemoryStockRepository::new());
    let ledger = Arc::new(InMemoryLedgerRepository::new());
    let alerts = Arc::new(InMemoryAlertRepository::new());
    let engine = Arc::new(RebalanceEngine::new(
        stock.clone(),
        ledger.clone(),
        alerts.clone(),
    ));
    Fixture {
        engine,
        stock,
        ledger,
    }
}

fn seed_product(stock: &InMemoryStockRepository, name: &str) -> ProductRef {
    let product = ProductRef {
        id: ProductId::new(),
        name: name.to_string(),
        category: "hardware".to_string(),
        unit_price_cents: 1_999,
        unit_cost_cents: 800,
    };
    stock.upsert_product(product.clone()).unwrap();
    product
}

fn seed_record(
    stock: &InMemoryStockRepository,
    product_id: ProductId,
    store_name: &str,
    quantity: i64,
    min_stock: i64,
    max_stock: i64,
) -> StoreStockRecord {
    let record = StoreStockRecord {
        product_id,
        store_id: StoreId::new(),
        store_name: store_name.to_string(),
        quantity,
        min_stock,
        max_stock,
        turnover_rate: 2.0,
        days_of_stock: 14.0,
        last_movement_at: Utc::now(),
    };
    stock.upsert_record(record.clone()).unwrap();
    record
}

fn quantity_of(stock: &InMemoryStockRepository, product_id: ProductId, store_id: StoreId) -> i64 {
    stock
        .get(product_id, store_id)
        .unwrap()
        .unwrap()
        .record
        .quantity
}

#[test]
fn plan_and_execute_moves_stock_and_writes_the_ledger_pair() {
    let fx = setup();
    let product = seed_product(&fx.stock, "Widget");
    let x = seed_record(&fx.stock, product.id, "X", 50, 10, 30);
    let y = seed_record(&fx.stock, product.id, "Y", 2, 10, 30);

    fx.engine.refresh_alerts(None).unwrap();

    let outcome = fx
        .engine
        .plan_rebalance(&[product.id], &OptimizationStrategy::default())
        .unwrap();
    assert_eq!(outcome.suggestions.len(), 1);
    let suggestion = &outcome.suggestions[0];
    assert_eq!(suggestion.quantity, 8);
    assert_eq!(suggestion.priority, SuggestionPriority::Medium);

    let report = fx.engine.execute_transfers(&[suggestion.id]);
    assert_eq!(report.applied, 1);
    assert!(report.rejected.is_empty());

    // Conservation: 8 units moved, none created or lost.
    assert_eq!(quantity_of(&fx.stock, product.id, x.store_id), 42);
    assert_eq!(quantity_of(&fx.stock, product.id, y.store_id), 10);

    let movements = fx.ledger.history(Some(product.id), None).unwrap();
    assert_eq!(movements.len(), 2);
    let salida = movements.iter().find(|m| m.kind == MovementKind::Salida).unwrap();
    let entrada = movements.iter().find(|m| m.kind == MovementKind::Entrada).unwrap();
    assert_eq!(salida.store_id, x.store_id);
    assert_eq!(salida.quantity, -8);
    assert_eq!(entrada.store_id, y.store_id);
    assert_eq!(entrada.quantity, 8);
    assert_eq!(salida.reason, entrada.reason);
    assert_eq!(salida.reference, Some(suggestion.id));
    assert_eq!(entrada.reference, Some(suggestion.id));

    // The destination's low-stock alert was relieved by the transfer.
    let alerts = fx.engine.list_alerts(Some(product.id), Some(y.store_id)).unwrap();
    let low = alerts.iter().find(|a| a.kind == AlertKind::LowStock).unwrap();
    assert!(low.resolved);
}

#[test]
fn resubmitting_an_applied_suggestion_is_rejected() {
    let fx = setup();
    let product = seed_product(&fx.stock, "Widget");
    let x = seed_record(&fx.stock, product.id, "X", 50, 10, 30);
    let y = seed_record(&fx.stock, product.id, "Y", 2, 10, 30);

    let outcome = fx
        .engine
        .plan_rebalance(&[product.id], &OptimizationStrategy::default())
        .unwrap();
    let id = outcome.suggestions[0].id;

    assert_eq!(fx.engine.execute_transfers(&[id]).applied, 1);

    let second = fx.engine.execute_transfers(&[id]);
    assert_eq!(second.applied, 0);
    assert_eq!(second.rejected.len(), 1);
    assert!(second.rejected[0].reason.contains("already applied"));

    // Not double-applied.
    assert_eq!(quantity_of(&fx.stock, product.id, x.store_id), 42);
    assert_eq!(quantity_of(&fx.stock, product.id, y.store_id), 10);
}

#[test]
fn stale_suggestion_is_rejected_when_the_source_sold_down() {
    let fx = setup();
    let product = seed_product(&fx.stock, "Widget");
    let x = seed_record(&fx.stock, product.id, "X", 50, 10, 30);
    let y = seed_record(&fx.stock, product.id, "Y", 2, 10, 30);

    let outcome = fx
        .engine
        .plan_rebalance(&[product.id], &OptimizationStrategy::default())
        .unwrap();
    let suggestion = &outcome.suggestions[0];
    assert_eq!(suggestion.quantity, 8);

    // A concurrent sale drains the source below the suggested quantity.
    fx.engine.adjust_stock(product.id, x.store_id, 5).unwrap();

    let report = fx.engine.execute_transfers(&[suggestion.id]);
    assert_eq!(report.applied, 0);
    assert_eq!(report.rejected.len(), 1);
    assert!(report.rejected[0].reason.contains("insufficient source stock"));

    // Destination untouched; only the adjustment reached the ledger.
    assert_eq!(quantity_of(&fx.stock, product.id, y.store_id), 2);
    assert_eq!(quantity_of(&fx.stock, product.id, x.store_id), 5);
    let movements = fx.ledger.history(Some(product.id), None).unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].kind, MovementKind::Salida);
    assert_eq!(movements[0].reference, None);
}

#[test]
fn disjoint_pairs_execute_independently_in_one_batch() {
    let fx = setup();
    let widget = seed_product(&fx.stock, "Widget");
    let wx = seed_record(&fx.stock, widget.id, "WX", 50, 10, 30);
    let wy = seed_record(&fx.stock, widget.id, "WY", 2, 10, 30);
    let gadget = seed_product(&fx.stock, "Gadget");
    let gx = seed_record(&fx.stock, gadget.id, "GX", 50, 10, 30);
    let gy = seed_record(&fx.stock, gadget.id, "GY", 2, 10, 30);

    let outcome = fx
        .engine
        .plan_rebalance(&[widget.id, gadget.id], &OptimizationStrategy::default())
        .unwrap();
    assert_eq!(outcome.suggestions.len(), 2);
    let ids: Vec<_> = outcome.suggestions.iter().map(|s| s.id).collect();

    // Invalidate the gadget transfer by draining its source.
    fx.engine.adjust_stock(gadget.id, gx.store_id, 0).unwrap();

    let report = fx.engine.execute_transfers(&ids);
    assert_eq!(report.applied, 1);
    assert_eq!(report.rejected.len(), 1);
    assert!(report.rejected[0].reason.contains("insufficient source stock"));

    // The widget transfer landed despite its batch sibling being rejected.
    assert_eq!(quantity_of(&fx.stock, widget.id, wx.store_id), 42);
    assert_eq!(quantity_of(&fx.stock, widget.id, wy.store_id), 10);
    assert_eq!(quantity_of(&fx.stock, gadget.id, gy.store_id), 2);
}

#[test]
fn adjustment_reports_noop_and_writes_signed_deltas() {
    let fx = setup();
    let product = seed_product(&fx.stock, "Widget");
    let store = seed_record(&fx.stock, product.id, "X", 50, 10, 60);

    // Same target: reported, nothing written.
    let noop = fx.engine.adjust_stock(product.id, store.store_id, 50).unwrap();
    assert!(matches!(noop, AdjustOutcome::Noop { .. }));
    assert!(fx.ledger.history(Some(product.id), None).unwrap().is_empty());

    let raised = fx.engine.adjust_stock(product.id, store.store_id, 60).unwrap();
    match raised {
        AdjustOutcome::Applied { movement, record } => {
            assert_eq!(movement.kind, MovementKind::Entrada);
            assert_eq!(movement.quantity, 10);
            assert_eq!(record.quantity, 60);
        }
        other => panic!("expected applied adjustment, got {other:?}"),
    }

    let lowered = fx.engine.adjust_stock(product.id, store.store_id, 45).unwrap();
    match lowered {
        AdjustOutcome::Applied { movement, record } => {
            assert_eq!(movement.kind, MovementKind::Salida);
            assert_eq!(movement.quantity, -15);
            assert_eq!(record.quantity, 45);
        }
        other => panic!("expected applied adjustment, got {other:?}"),
    }

    assert_eq!(fx.ledger.history(Some(product.id), None).unwrap().len(), 2);

    let err = fx
        .engine
        .adjust_stock(product.id, store.store_id, -1)
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = fx
        .engine
        .adjust_stock(product.id, StoreId::new(), 10)
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[test]
fn refresh_supersedes_the_previous_pass_but_resolution_is_explicit() {
    let fx = setup();
    let product = seed_product(&fx.stock, "Widget");
    let store = seed_record(&fx.stock, product.id, "X", 2, 10, 30);

    let report = fx.engine.refresh_alerts(Some(&[product.id])).unwrap();
    assert_eq!(report.alerts.len(), 1);
    let alert = &report.alerts[0];
    assert_eq!(alert.kind, AlertKind::LowStock);
    assert_eq!(alert.severity, AlertSeverity::Critical);

    let resolved = fx.engine.resolve_alert(alert.id).unwrap();
    assert!(resolved.resolved);

    // The condition persists, so the next pass emits the same alert id,
    // fresh and unresolved: recomputation never resolves anything.
    fx.engine.refresh_alerts(Some(&[product.id])).unwrap();
    let alerts = fx.engine.list_alerts(Some(product.id), Some(store.store_id)).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].id, alert.id);
    assert!(!alerts[0].resolved);

    let err = fx
        .engine
        .resolve_alert(AlertId::derive(product.id, StoreId::new(), "low_stock"))
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[test]
fn planning_validates_input_and_skips_unknown_products() {
    let fx = setup();
    let product = seed_product(&fx.stock, "Widget");
    seed_record(&fx.stock, product.id, "X", 50, 10, 30);
    seed_record(&fx.stock, product.id, "Y", 2, 10, 30);

    let err = fx
        .engine
        .plan_rebalance(&[], &OptimizationStrategy::default())
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let unknown = ProductId::new();
    let outcome = fx
        .engine
        .plan_rebalance(&[product.id, unknown], &OptimizationStrategy::default())
        .unwrap();
    assert_eq!(outcome.suggestions.len(), 1);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].product_id, unknown);
}

#[test]
fn concurrent_executors_apply_a_suggestion_exactly_once() {
    let fx = setup();
    let product = seed_product(&fx.stock, "Widget");
    let x = seed_record(&fx.stock, product.id, "X", 50, 10, 30);
    let y = seed_record(&fx.stock, product.id, "Y", 2, 10, 30);

    let outcome = fx
        .engine
        .plan_rebalance(&[product.id], &OptimizationStrategy::default())
        .unwrap();
    let id = outcome.suggestions[0].id;

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let engine = fx.engine.clone();
            std::thread::spawn(move || engine.execute_transfers(&[id]))
        })
        .collect();

    let reports: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let applied: usize = reports.iter().map(|r| r.applied).sum();
    assert_eq!(applied, 1);

    assert_eq!(quantity_of(&fx.stock, product.id, x.store_id), 42);
    assert_eq!(quantity_of(&fx.stock, product.id, y.store_id), 10);
    assert_eq!(fx.ledger.history(Some(product.id), None).unwrap().len(), 2);
}

#[test]
fn concurrent_adjustments_serialize_on_the_row_version() {
    let fx = setup();
    let product = seed_product(&fx.stock, "Widget");
    let store = seed_record(&fx.stock, product.id, "X", 10, 2, 60);

    let handles: Vec<_> = [7i64, 3]
        .into_iter()
        .map(|target| {
            let engine = fx.engine.clone();
            let product_id = product.id;
            let store_id = store.store_id;
            std::thread::spawn(move || engine.adjust_stock(product_id, store_id, target))
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let final_quantity = quantity_of(&fx.stock, product.id, store.store_id);
    assert!(final_quantity == 7 || final_quantity == 3);
    assert_eq!(fx.ledger.history(Some(product.id), None).unwrap().len(), 2);
}

#[test]
fn ledger_accepts_manual_correction_entries() {
    let fx = setup();
    let product = seed_product(&fx.stock, "Widget");
    let store = seed_record(&fx.stock, product.id, "X", 10, 2, 60);

    fx.ledger
        .append(vec![MovementRecord::new(
            product.id,
            store.store_id,
            MovementKind::Ajuste,
            0,
            "cycle count correction",
            Utc::now(),
        )
        .with_notes("counted quantity matched after recount")])
        .unwrap();

    let movements = fx.engine.movement_history(Some(product.id), Some(store.store_id)).unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].kind, MovementKind::Ajuste);
}
