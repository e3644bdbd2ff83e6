//! HTTP API server with observability for the inventory-reservation system.
//!
//! Provides REST endpoints for the reservation lifecycle and availability
//! reads, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use common::ProductId;
use domain::Product;
use engine::ReservationEngine;
use metrics_exporter_prometheus::PrometheusHandle;
use store::InventoryStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::reservations::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: InventoryStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/reservations", post(routes::reservations::reserve::<S>))
        .route("/reservations/{id}", get(routes::reservations::get::<S>))
        .route(
            "/reservations/{id}/confirm",
            post(routes::reservations::confirm::<S>),
        )
        .route(
            "/reservations/{id}/release",
            post(routes::reservations::release::<S>),
        )
        .route(
            "/products/{id}/availability",
            get(routes::availability::check::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state over the given store.
pub fn create_default_state<S: InventoryStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        engine: ReservationEngine::new(store),
    })
}

/// Seeds a small demo catalog so the API is usable out of the box.
pub async fn seed_demo_catalog<S: InventoryStore>(store: &S) -> store::Result<()> {
    let catalog = [
        ("SKU-LAPTOP", "Laptop", 10),
        ("SKU-MOUSE", "Wireless Mouse", 50),
        ("SKU-KEYBOARD", "Mechanical Keyboard", 25),
        ("SKU-MONITOR", "27\" Monitor", 15),
    ];

    for (id, name, stock) in catalog {
        store
            .upsert_product(Product::new(ProductId::new(id), name, stock))
            .await?;
    }

    tracing::info!(products = catalog.len(), "demo catalog seeded");
    Ok(())
}
