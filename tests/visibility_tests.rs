//! Visible stock reconciliation tests
//!
//! visible == max(0, factual - sum of open order line quantities), recomputed
//! on demand and safe to call redundantly.

use stockroom::config::OrdersConfig;
use stockroom::models::{CheckoutItem, StockKey};
use stockroom::services::{
    MechanicOrderService, Notifier, StockLedgerService, VisibilityService,
};
use stockroom::store::Store;

fn setup() -> (Store, StockLedgerService, VisibilityService, MechanicOrderService) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let store = Store::new();
    let ledger = StockLedgerService::new(store.clone());
    let visibility = VisibilityService::new(store.clone());
    let orders = MechanicOrderService::new(
        store.clone(),
        ledger.clone(),
        visibility.clone(),
        Notifier::Disabled,
        &OrdersConfig::default(),
    );
    (store, ledger, visibility, orders)
}

fn item(material: &str, qty: i64) -> CheckoutItem {
    CheckoutItem {
        material_code: material.to_string(),
        title: None,
        qty,
    }
}

#[tokio::test]
async fn recalculate_nets_out_open_orders() {
    let (_, ledger, visibility, orders) = setup();

    ledger.set(&StockKey::new("WH1", "M1"), 10, "Bolt").await.unwrap();
    orders.checkout("O1", "mech", "WH1", &[item("M1", 4)]).await.unwrap();

    let visible = visibility.recalculate("WH1", "M1").await.unwrap();
    assert_eq!(visible.visible_qty, 6);
    assert_eq!(visible.material_description, "Bolt");
}

#[tokio::test]
async fn recalculate_clamps_at_zero() {
    let (_, ledger, visibility, orders) = setup();

    ledger.set(&StockKey::new("WH1", "M1"), 10, "").await.unwrap();
    orders.checkout("O1", "mech", "WH1", &[item("M1", 8)]).await.unwrap();

    // factual stock drops below the open reservation after the order exists
    ledger.set(&StockKey::new("WH1", "M1"), 5, "").await.unwrap();

    let visible = visibility.recalculate("WH1", "M1").await.unwrap();
    assert_eq!(visible.visible_qty, 0);
}

#[tokio::test]
async fn recalculate_is_a_noop_without_a_stock_record() {
    let (store, _, visibility, _) = setup();

    assert!(visibility.recalculate("WH1", "M1").await.is_none());
    assert!(store.get_visible(&StockKey::new("WH1", "M1")).await.is_none());
}

#[tokio::test]
async fn recalculate_ignores_terminal_orders() {
    let (_, ledger, visibility, orders) = setup();

    ledger.set(&StockKey::new("WH1", "M1"), 10, "").await.unwrap();
    orders.checkout("O1", "mech", "WH1", &[item("M1", 4)]).await.unwrap();
    orders.cancel("O1").await.unwrap();

    let visible = visibility.recalculate("WH1", "M1").await.unwrap();
    assert_eq!(visible.visible_qty, 10);
}

#[tokio::test]
async fn recalculate_filters_by_storage_type() {
    let (_, ledger, visibility, orders) = setup();

    ledger.set(&StockKey::new("WH1", "M1"), 10, "").await.unwrap();
    ledger.set(&StockKey::new("WH2", "M1"), 10, "").await.unwrap();
    orders.checkout("O1", "mech", "WH1", &[item("M1", 4)]).await.unwrap();

    assert_eq!(visibility.recalculate("WH1", "M1").await.unwrap().visible_qty, 6);
    assert_eq!(visibility.recalculate("WH2", "M1").await.unwrap().visible_qty, 10);
}

#[tokio::test]
async fn recalculate_is_idempotent() {
    let (_, ledger, visibility, orders) = setup();

    ledger.set(&StockKey::new("WH1", "M1"), 10, "").await.unwrap();
    orders.checkout("O1", "mech", "WH1", &[item("M1", 3)]).await.unwrap();

    let first = visibility.recalculate("WH1", "M1").await.unwrap();
    let second = visibility.recalculate("WH1", "M1").await.unwrap();
    assert_eq!(first.visible_qty, second.visible_qty);
    assert_eq!(second.visible_qty, 7);
}

#[tokio::test]
async fn clear_for_storage_zeroes_only_that_storage() {
    let (store, ledger, visibility, _) = setup();

    ledger.set(&StockKey::new("WH1", "M1"), 5, "").await.unwrap();
    ledger.set(&StockKey::new("WH2", "M1"), 5, "").await.unwrap();
    visibility.recalculate("WH1", "M1").await.unwrap();
    visibility.recalculate("WH2", "M1").await.unwrap();

    visibility.clear_for_storage("WH1").await;

    assert_eq!(store.get_visible(&StockKey::new("WH1", "M1")).await.unwrap().visible_qty, 0);
    assert_eq!(store.get_visible(&StockKey::new("WH2", "M1")).await.unwrap().visible_qty, 5);
}

#[tokio::test]
async fn visible_stock_is_never_negative() {
    let (_, ledger, visibility, orders) = setup();

    ledger.set(&StockKey::new("WH1", "M1"), 100, "").await.unwrap();
    orders.checkout("O1", "mech", "WH1", &[item("M1", 60)]).await.unwrap();
    orders.checkout("O2", "mech", "WH1", &[item("M1", 40)]).await.unwrap();
    ledger.set(&StockKey::new("WH1", "M1"), 1, "").await.unwrap();

    let visible = visibility.recalculate("WH1", "M1").await.unwrap();
    assert!(visible.visible_qty >= 0);
    assert_eq!(visible.visible_qty, 0);
}
