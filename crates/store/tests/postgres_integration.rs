//! PostgreSQL integration tests.
//!
//! A single shared container backs all tests; tables are truncated between
//! tests, so they run serially. Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration
//! ```

use std::sync::Arc;

use chrono::Utc;
use common::{OrderId, ProductId, ReservationId};
use domain::{Product, Reservation, ReservationStatus};
use serial_test::serial;
use sqlx::PgPool;
use store::{InventoryStore, PostgresInventoryStore, StoreError};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Run migrations using raw_sql to execute multiple statements
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_inventory_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresInventoryStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE reservations, products")
        .execute(&pool)
        .await
        .unwrap();

    PostgresInventoryStore::new(pool)
}

async fn seed_product(store: &PostgresInventoryStore, id: &str, stock: u32) -> ProductId {
    let product_id = ProductId::new(id);
    store
        .upsert_product(Product::new(product_id.clone(), "Test product", stock))
        .await
        .unwrap();
    product_id
}

fn new_reservation(product_id: &ProductId, quantity: u32) -> Reservation {
    Reservation::reserve(
        ReservationId::new(),
        product_id.clone(),
        OrderId::new(),
        quantity,
        Utc::now(),
    )
    .unwrap()
}

#[tokio::test]
#[serial]
async fn upsert_and_get_product() {
    let store = get_test_store().await;
    let product_id = seed_product(&store, "SKU-001", 10).await;

    let product = store.get_product(&product_id).await.unwrap().unwrap();
    assert_eq!(product.stock, 10);
    assert_eq!(product.name, "Test product");

    // Upsert replaces.
    store
        .upsert_product(Product::new(product_id.clone(), "Renamed", 7))
        .await
        .unwrap();
    let product = store.get_product(&product_id).await.unwrap().unwrap();
    assert_eq!(product.stock, 7);
    assert_eq!(product.name, "Renamed");
}

#[tokio::test]
#[serial]
async fn get_missing_product_returns_none() {
    let store = get_test_store().await;
    let result = store.get_product(&ProductId::new("SKU-404")).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
#[serial]
async fn reserve_roundtrips_all_fields() {
    let store = get_test_store().await;
    let product_id = seed_product(&store, "SKU-001", 10).await;

    let reservation = new_reservation(&product_id, 4);
    let levels = store
        .reserve_if_available(reservation.clone())
        .await
        .unwrap();
    assert_eq!(levels.total_stock, 10);
    assert_eq!(levels.active_reserved, 4);
    assert_eq!(levels.available, 6);

    let loaded = store
        .get_reservation(reservation.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded, reservation);
}

#[tokio::test]
#[serial]
async fn reserve_unknown_product_fails() {
    let store = get_test_store().await;
    let reservation = new_reservation(&ProductId::new("SKU-404"), 1);

    let err = store.reserve_if_available(reservation).await.unwrap_err();
    assert!(matches!(err, StoreError::ProductNotFound(_)));
}

#[tokio::test]
#[serial]
async fn reserve_beyond_availability_fails_and_inserts_nothing() {
    let store = get_test_store().await;
    let product_id = seed_product(&store, "SKU-001", 10).await;

    store
        .reserve_if_available(new_reservation(&product_id, 4))
        .await
        .unwrap();

    let rejected = new_reservation(&product_id, 7);
    let err = store
        .reserve_if_available(rejected.clone())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::InsufficientAvailability {
            available: 6,
            requested: 7,
            ..
        }
    ));
    assert!(store.get_reservation(rejected.id()).await.unwrap().is_none());
    assert_eq!(store.active_reserved(&product_id).await.unwrap(), 4);
}

#[tokio::test]
#[serial]
async fn duplicate_reservation_id_rejected() {
    let store = get_test_store().await;
    let product_id = seed_product(&store, "SKU-001", 10).await;

    let reservation = new_reservation(&product_id, 1);
    store.insert_reservation(reservation.clone()).await.unwrap();

    let err = store.insert_reservation(reservation).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateReservation(_)));
}

#[tokio::test]
#[serial]
async fn confirm_decrements_stock_and_flips_status() {
    let store = get_test_store().await;
    let product_id = seed_product(&store, "SKU-001", 10).await;

    let reservation = new_reservation(&product_id, 4);
    store
        .reserve_if_available(reservation.clone())
        .await
        .unwrap();

    let at = Utc::now();
    let (confirmed, new_stock) = store.confirm_reservation(reservation.id(), at).await.unwrap();
    assert_eq!(new_stock, 6);
    assert_eq!(confirmed.status(), ReservationStatus::Confirmed);

    // Both effects persisted.
    let product = store.get_product(&product_id).await.unwrap().unwrap();
    assert_eq!(product.stock, 6);
    let loaded = store
        .get_reservation(reservation.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.status(), ReservationStatus::Confirmed);
    assert!(loaded.confirmed_at().is_some());
    assert_eq!(store.active_reserved(&product_id).await.unwrap(), 0);
}

#[tokio::test]
#[serial]
async fn confirm_non_reserved_fails_without_mutation() {
    let store = get_test_store().await;
    let product_id = seed_product(&store, "SKU-001", 10).await;

    let reservation = new_reservation(&product_id, 4);
    store
        .reserve_if_available(reservation.clone())
        .await
        .unwrap();
    store
        .release_reservation(reservation.id(), Utc::now(), "cancelled")
        .await
        .unwrap();

    let err = store
        .confirm_reservation(reservation.id(), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::StatusConflict {
            actual: ReservationStatus::Released,
            ..
        }
    ));
    let product = store.get_product(&product_id).await.unwrap().unwrap();
    assert_eq!(product.stock, 10);
}

#[tokio::test]
#[serial]
async fn confirm_missing_reservation_fails() {
    let store = get_test_store().await;

    let err = store
        .confirm_reservation(ReservationId::new(), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ReservationNotFound(_)));
}

#[tokio::test]
#[serial]
async fn release_records_timestamp_and_reason() {
    let store = get_test_store().await;
    let product_id = seed_product(&store, "SKU-001", 10).await;

    let reservation = new_reservation(&product_id, 4);
    store
        .reserve_if_available(reservation.clone())
        .await
        .unwrap();

    let released = store
        .release_reservation(reservation.id(), Utc::now(), "order cancelled")
        .await
        .unwrap();
    assert_eq!(released.status(), ReservationStatus::Released);
    assert_eq!(released.release_reason(), Some("order cancelled"));

    // The hold no longer counts against availability; stock is untouched.
    assert_eq!(store.active_reserved(&product_id).await.unwrap(), 0);
    let product = store.get_product(&product_id).await.unwrap().unwrap();
    assert_eq!(product.stock, 10);
}

#[tokio::test]
#[serial]
async fn release_non_reserved_fails() {
    let store = get_test_store().await;
    let product_id = seed_product(&store, "SKU-001", 10).await;

    let reservation = new_reservation(&product_id, 4);
    store
        .reserve_if_available(reservation.clone())
        .await
        .unwrap();
    store
        .confirm_reservation(reservation.id(), Utc::now())
        .await
        .unwrap();

    let err = store
        .release_reservation(reservation.id(), Utc::now(), "too late")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::StatusConflict {
            actual: ReservationStatus::Confirmed,
            ..
        }
    ));
}

#[tokio::test]
#[serial]
async fn reservations_for_order_ordered_by_creation() {
    let store = get_test_store().await;
    let product_id = seed_product(&store, "SKU-001", 10).await;
    let order_id = OrderId::new();

    let first = Reservation::reserve(
        ReservationId::new(),
        product_id.clone(),
        order_id,
        1,
        Utc::now() - chrono::Duration::seconds(10),
    )
    .unwrap();
    let second = Reservation::reserve(
        ReservationId::new(),
        product_id.clone(),
        order_id,
        2,
        Utc::now(),
    )
    .unwrap();
    store.reserve_if_available(second.clone()).await.unwrap();
    store.reserve_if_available(first.clone()).await.unwrap();

    let for_order = store.reservations_for_order(order_id).await.unwrap();
    assert_eq!(for_order.len(), 2);
    assert_eq!(for_order[0].id(), first.id());
    assert_eq!(for_order[1].id(), second.id());
}

/// Racing reserves for the same product serialize on the product row lock;
/// the sum of winning quantities never exceeds stock.
#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn concurrent_reserves_never_oversell() {
    let store = get_test_store().await;
    let product_id = seed_product(&store, "SKU-001", 10).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = store.clone();
        let reservation = new_reservation(&product_id, 4);
        handles.push(tokio::spawn(async move {
            store.reserve_if_available(reservation).await
        }));
    }

    let mut won = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            won += 1;
        }
    }

    assert_eq!(won, 2);
    assert_eq!(store.active_reserved(&product_id).await.unwrap(), 8);
}

/// Two racing confirms for the same reservation: one wins, one observes
/// the conflict, and stock is decremented exactly once.
#[tokio::test(flavor = "multi_thread")]
#[serial]
async fn concurrent_confirms_decrement_once() {
    let store = get_test_store().await;
    let product_id = seed_product(&store, "SKU-001", 10).await;

    let reservation = new_reservation(&product_id, 4);
    store
        .reserve_if_available(reservation.clone())
        .await
        .unwrap();

    let a = {
        let store = store.clone();
        let id = reservation.id();
        tokio::spawn(async move { store.confirm_reservation(id, Utc::now()).await })
    };
    let b = {
        let store = store.clone();
        let id = reservation.id();
        tokio::spawn(async move { store.confirm_reservation(id, Utc::now()).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);

    let product = store.get_product(&product_id).await.unwrap().unwrap();
    assert_eq!(product.stock, 6);
}
