use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, ReservationId};
use domain::{Product, Reservation, ReservationError};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::store::{InventoryStore, StockLevels};

#[derive(Debug, Default)]
struct InventoryState {
    products: HashMap<ProductId, Product>,
    reservations: HashMap<ReservationId, Reservation>,
}

impl InventoryState {
    fn active_reserved(&self, product_id: &ProductId) -> u32 {
        self.reservations
            .values()
            .filter(|r| r.product_id() == product_id && r.is_active())
            .map(Reservation::quantity)
            .sum()
    }
}

/// In-memory inventory store.
///
/// All state lives behind a single `RwLock`, so every trait primitive is
/// trivially atomic: the conditional insert and the confirm/release
/// compare-and-swaps each run under one write-lock acquisition. Used for
/// tests and the default server mode.
#[derive(Clone, Default)]
pub struct InMemoryInventoryStore {
    state: Arc<RwLock<InventoryState>>,
}

impl InMemoryInventoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of reservation records (any status).
    pub async fn reservation_count(&self) -> usize {
        self.state.read().await.reservations.len()
    }

    /// Clears all products and reservations.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.products.clear();
        state.reservations.clear();
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn upsert_product(&self, product: Product) -> Result<()> {
        let mut state = self.state.write().await;
        state.products.insert(product.id.clone(), product);
        Ok(())
    }

    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        let state = self.state.read().await;
        Ok(state.products.get(product_id).cloned())
    }

    async fn insert_reservation(&self, reservation: Reservation) -> Result<()> {
        let mut state = self.state.write().await;
        if state.reservations.contains_key(&reservation.id()) {
            return Err(StoreError::DuplicateReservation(reservation.id()));
        }
        state.reservations.insert(reservation.id(), reservation);
        Ok(())
    }

    async fn get_reservation(&self, id: ReservationId) -> Result<Option<Reservation>> {
        let state = self.state.read().await;
        Ok(state.reservations.get(&id).cloned())
    }

    async fn active_reserved(&self, product_id: &ProductId) -> Result<u32> {
        let state = self.state.read().await;
        Ok(state.active_reserved(product_id))
    }

    async fn reservations_for_order(&self, order_id: OrderId) -> Result<Vec<Reservation>> {
        let state = self.state.read().await;
        let mut reservations: Vec<_> = state
            .reservations
            .values()
            .filter(|r| r.order_id() == order_id)
            .cloned()
            .collect();
        reservations.sort_by_key(Reservation::created_at);
        Ok(reservations)
    }

    async fn reserve_if_available(&self, reservation: Reservation) -> Result<StockLevels> {
        let mut state = self.state.write().await;

        if state.reservations.contains_key(&reservation.id()) {
            return Err(StoreError::DuplicateReservation(reservation.id()));
        }

        let product_id = reservation.product_id().clone();
        let stock = state
            .products
            .get(&product_id)
            .ok_or_else(|| StoreError::ProductNotFound(product_id.clone()))?
            .stock;

        let active = state.active_reserved(&product_id);
        let available = i64::from(stock) - i64::from(active);

        if available < i64::from(reservation.quantity()) {
            return Err(StoreError::InsufficientAvailability {
                product_id,
                available,
                requested: reservation.quantity(),
            });
        }

        let quantity = reservation.quantity();
        state.reservations.insert(reservation.id(), reservation);

        Ok(StockLevels::new(stock, active + quantity))
    }

    async fn confirm_reservation(
        &self,
        id: ReservationId,
        at: DateTime<Utc>,
    ) -> Result<(Reservation, u32)> {
        let mut state = self.state.write().await;

        let reservation = state
            .reservations
            .get(&id)
            .ok_or(StoreError::ReservationNotFound(id))?;
        let product_id = reservation.product_id().clone();
        let quantity = reservation.quantity();
        let status = reservation.status();

        if !status.can_confirm() {
            return Err(StoreError::StatusConflict { id, actual: status });
        }

        let stock = state
            .products
            .get(&product_id)
            .ok_or_else(|| StoreError::ProductNotFound(product_id.clone()))?
            .stock;
        if stock < quantity {
            return Err(StoreError::InsufficientStock {
                product_id,
                stock,
                requested: quantity,
            });
        }

        // Both mutations happen under the same write lock.
        if let Some(reservation) = state.reservations.get_mut(&id) {
            reservation
                .confirm(at)
                .map_err(|_| StoreError::StatusConflict { id, actual: status })?;
        }
        let new_stock = stock - quantity;
        if let Some(product) = state.products.get_mut(&product_id) {
            product.stock = new_stock;
        }

        let updated = state
            .reservations
            .get(&id)
            .cloned()
            .ok_or(StoreError::ReservationNotFound(id))?;
        Ok((updated, new_stock))
    }

    async fn release_reservation(
        &self,
        id: ReservationId,
        at: DateTime<Utc>,
        reason: &str,
    ) -> Result<Reservation> {
        let mut state = self.state.write().await;

        let reservation = state
            .reservations
            .get_mut(&id)
            .ok_or(StoreError::ReservationNotFound(id))?;

        let actual = reservation.status();
        reservation
            .release(at, reason)
            .map_err(|_: ReservationError| StoreError::StatusConflict { id, actual })?;

        Ok(reservation.clone())
    }
}
