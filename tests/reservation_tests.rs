//! Cart reservation tests
//!
//! Covers upsert uniqueness, TTL exclusion, heartbeat extension and the lazy
//! expiry sweep.

use chrono::{Duration, Utc};
use uuid::Uuid;

use stockroom::config::ReservationConfig;
use stockroom::models::ReservedItem;
use stockroom::services::CartReservationService;
use stockroom::store::Store;
use stockroom::AppError;

fn setup() -> (Store, CartReservationService) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let store = Store::new();
    let service = CartReservationService::new(store.clone(), &ReservationConfig::default());
    (store, service)
}

/// Build a reservation row directly, bypassing the service, so tests can
/// plant expired or stale rows
fn raw_reservation(
    user: &str,
    material: &str,
    qty: i64,
    age: Duration,
    lifetime: Duration,
) -> ReservedItem {
    let now = Utc::now();
    ReservedItem {
        id: Uuid::new_v4(),
        material_code: material.to_string(),
        qty,
        reserved_by: user.to_string(),
        reserved_at: now - age,
        expires_at: now - age + lifetime,
        storage_type: "WH1".to_string(),
    }
}

#[tokio::test]
async fn reserve_twice_overwrites_not_sums() {
    let (store, service) = setup();

    service.reserve("M3", 5, "userA", "WH1").await.unwrap();
    service.reserve("M3", 3, "userA", "WH1").await.unwrap();

    let rows = store.reservations_for_user("userA").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].qty, 3);
    assert_eq!(rows[0].material_code, "M3");
}

#[tokio::test]
async fn reserve_keeps_row_identity_across_upserts() {
    let (store, service) = setup();

    let first = service.reserve("M1", 2, "userA", "WH1").await.unwrap();
    let second = service.reserve("M1", 7, "userA", "WH1").await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(store.reservations_for_user("userA").await.len(), 1);
}

#[tokio::test]
async fn reserve_rejects_non_positive_quantity() {
    let (_, service) = setup();

    let err = service.reserve("M1", 0, "userA", "WH1").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidQuantity(_)));
}

#[tokio::test]
async fn release_is_idempotent() {
    let (store, service) = setup();

    service.reserve("M1", 2, "userA", "WH1").await.unwrap();
    service.release("M1", "userA").await;
    assert!(store.get_reservation("userA", "M1").await.is_none());

    // repeated release of a missing row is a no-op
    service.release("M1", "userA").await;
    service.release("M9", "nobody").await;
}

#[tokio::test]
async fn release_all_clears_only_that_user() {
    let (store, service) = setup();

    service.reserve("M1", 1, "userA", "WH1").await.unwrap();
    service.reserve("M2", 2, "userA", "WH1").await.unwrap();
    service.reserve("M1", 3, "userB", "WH1").await.unwrap();

    service.release_all("userA").await;

    assert!(store.reservations_for_user("userA").await.is_empty());
    assert_eq!(store.reservations_for_user("userB").await.len(), 1);
}

#[tokio::test]
async fn extend_pushes_expiry_of_live_rows() {
    let (store, service) = setup();

    // live, but close to expiry
    store
        .put_reservation(raw_reservation(
            "userA",
            "M1",
            2,
            Duration::seconds(55),
            Duration::seconds(60),
        ))
        .await;

    let before = store.get_reservation("userA", "M1").await.unwrap();
    service.extend("userA").await;
    let after = store.get_reservation("userA", "M1").await.unwrap();

    assert!(after.expires_at > before.expires_at);
}

#[tokio::test]
async fn extend_never_revives_expired_rows() {
    let (store, service) = setup();

    store
        .put_reservation(raw_reservation(
            "userA",
            "M1",
            2,
            Duration::seconds(120),
            Duration::seconds(60),
        ))
        .await;

    let before = store.get_reservation("userA", "M1").await.unwrap();
    service.extend("userA").await;
    let after = store.get_reservation("userA", "M1").await.unwrap();

    assert_eq!(before.expires_at, after.expires_at);
    assert!(!after.is_live(Utc::now()));
}

#[tokio::test]
async fn active_reservations_excludes_expired_rows() {
    let (store, service) = setup();

    service.reserve("M1", 2, "userA", "WH1").await.unwrap();
    store
        .put_reservation(raw_reservation(
            "userA",
            "M2",
            4,
            Duration::seconds(120),
            Duration::seconds(60),
        ))
        .await;

    let active = service.active_reservations("userA").await;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].material_code, "M1");
}

#[tokio::test]
async fn active_reservations_sweeps_stale_rows_of_any_user() {
    let (store, service) = setup();

    // reserved two hours ago, far past the one-hour retention window
    store
        .put_reservation(raw_reservation(
            "userB",
            "M7",
            1,
            Duration::hours(2),
            Duration::seconds(60),
        ))
        .await;

    service.active_reservations("userA").await;

    assert!(store.get_reservation("userB", "M7").await.is_none());
}

#[tokio::test]
async fn sum_reserved_excluding_counts_only_live_rows_of_others() {
    let (store, service) = setup();
    let now = Utc::now();

    service.reserve("M1", 5, "userA", "WH1").await.unwrap();
    service.reserve("M1", 3, "userB", "WH1").await.unwrap();
    service.reserve("M1", 2, "userC", "WH1").await.unwrap();
    // expired hold by another user must not count
    store
        .put_reservation(raw_reservation(
            "userD",
            "M1",
            10,
            Duration::seconds(120),
            Duration::seconds(60),
        ))
        .await;

    let sum = service.sum_reserved_excluding("M1", "userA", now).await;
    assert_eq!(sum, 5); // userB 3 + userC 2
}

#[tokio::test]
async fn reserved_counts_reports_per_material() {
    let (_, service) = setup();

    service.reserve("M1", 3, "userB", "WH1").await.unwrap();
    service.reserve("M2", 4, "userB", "WH1").await.unwrap();
    service.reserve("M1", 9, "userA", "WH1").await.unwrap();

    let materials = vec!["M1".to_string(), "M2".to_string(), "M3".to_string()];
    let counts = service.reserved_counts(&materials, "userA").await;

    assert_eq!(counts["M1"], 3);
    assert_eq!(counts["M2"], 4);
    assert_eq!(counts["M3"], 0);
}
