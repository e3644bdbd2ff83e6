//! Reserve / Confirm / Release orchestration.

use std::time::Instant;

use chrono::Utc;
use common::{OrderId, ProductId, ReservationId};
use domain::{Reservation, ReservationError, ReservationStatus};
use metrics::{counter, histogram};
use store::{InventoryStore, StoreError};
use tracing::{info, instrument, warn};

use crate::availability::AvailabilityCalculator;
use crate::error::EngineError;
use crate::receipt::{ConfirmReceipt, ReleaseReceipt, ReserveReceipt};

/// The reservation engine.
///
/// Thin orchestration over the store's atomic primitives: generates IDs and
/// timestamps, maps store outcomes to business results, and records
/// observability signals. All concurrency control lives in the store.
#[derive(Clone)]
pub struct ReservationEngine<S> {
    store: S,
    availability: AvailabilityCalculator<S>,
}

impl<S: InventoryStore + Clone> ReservationEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            availability: AvailabilityCalculator::new(store.clone()),
            store,
        }
    }

    /// Availability reads over the same store.
    pub fn availability(&self) -> &AvailabilityCalculator<S> {
        &self.availability
    }

    /// Places a hold of `quantity` units of `product_id` for `order_id`.
    ///
    /// The availability check and the insert happen atomically in the
    /// store, so two racing reserves can never jointly oversell a product.
    #[instrument(skip(self), fields(%product_id, %order_id, quantity))]
    pub async fn reserve(
        &self,
        product_id: ProductId,
        order_id: OrderId,
        quantity: u32,
    ) -> Result<ReserveReceipt, EngineError> {
        let started = Instant::now();

        let reservation = Reservation::reserve(
            ReservationId::new(),
            product_id.clone(),
            order_id,
            quantity,
            Utc::now(),
        )
        .inspect_err(|e| {
            warn!(error = %e, "reserve rejected");
            counter!("reservations_rejected_total", "reason" => "invalid_quantity").increment(1);
        })?;
        let id = reservation.id();

        match self.store.reserve_if_available(reservation.clone()).await {
            Ok(levels) => {
                info!(%id, available = levels.available, "stock reserved");
                counter!("reservations_reserved_total").increment(1);
                histogram!("reservation_op_duration_seconds", "op" => "reserve")
                    .record(started.elapsed().as_secs_f64());

                Ok(ReserveReceipt {
                    reservation,
                    levels,
                    message: format!(
                        "Stock reserved. Available after reservation: {}",
                        levels.available
                    ),
                })
            }
            Err(e) => {
                let reason = match &e {
                    StoreError::ProductNotFound(_) => "product_not_found",
                    StoreError::InsufficientAvailability { .. } => "insufficient_stock",
                    _ => "store_error",
                };
                warn!(%id, error = %e, "reserve rejected");
                counter!("reservations_rejected_total", "reason" => reason).increment(1);
                Err(EngineError::from_store(e))
            }
        }
    }

    /// Confirms a reservation, decrementing product stock by its quantity.
    #[instrument(skip(self), fields(%id))]
    pub async fn confirm(&self, id: ReservationId) -> Result<ConfirmReceipt, EngineError> {
        let started = Instant::now();

        match self.store.confirm_reservation(id, Utc::now()).await {
            Ok((reservation, new_stock)) => {
                info!(product_id = %reservation.product_id(), new_stock, "reservation confirmed");
                counter!("reservations_confirmed_total").increment(1);
                histogram!("reservation_op_duration_seconds", "op" => "confirm")
                    .record(started.elapsed().as_secs_f64());

                Ok(ConfirmReceipt {
                    reservation,
                    new_stock,
                    message: format!("Reservation confirmed. Stock is now {new_stock}"),
                })
            }
            Err(StoreError::StatusConflict { actual, .. }) => {
                warn!(status = %actual, "confirm rejected: not in reserved state");
                counter!("reservations_rejected_total", "reason" => "invalid_state").increment(1);
                Err(ReservationError::InvalidStateTransition { current: actual }.into())
            }
            Err(e) => {
                warn!(error = %e, "confirm failed");
                Err(EngineError::from_store(e))
            }
        }
    }

    /// Releases a reservation, returning its quantity to availability.
    ///
    /// Idempotent: releasing an already-released reservation succeeds
    /// without side effects. Releasing a confirmed reservation fails with
    /// `AlreadyConfirmed`; stock already moved, so there is nothing to
    /// give back.
    #[instrument(skip(self, reason), fields(%id))]
    pub async fn release(
        &self,
        id: ReservationId,
        reason: &str,
    ) -> Result<ReleaseReceipt, EngineError> {
        let started = Instant::now();

        match self.store.release_reservation(id, Utc::now(), reason).await {
            Ok(reservation) => {
                info!(product_id = %reservation.product_id(), "reservation released");
                counter!("reservations_released_total").increment(1);
                histogram!("reservation_op_duration_seconds", "op" => "release")
                    .record(started.elapsed().as_secs_f64());

                Ok(ReleaseReceipt {
                    reservation,
                    already_released: false,
                    message: "Reservation released. Stock is available again".to_string(),
                })
            }
            Err(StoreError::StatusConflict {
                actual: ReservationStatus::Released,
                ..
            }) => {
                // Lost race or repeated compensation; both are fine.
                let reservation = self
                    .store
                    .get_reservation(id)
                    .await
                    .map_err(EngineError::from_store)?
                    .ok_or(ReservationError::ReservationNotFound(id))?;
                info!("reservation was already released");

                Ok(ReleaseReceipt {
                    reservation,
                    already_released: true,
                    message: "Reservation was already released".to_string(),
                })
            }
            Err(StoreError::StatusConflict { actual, .. }) => {
                warn!(status = %actual, "release rejected: reservation is confirmed");
                counter!("reservations_rejected_total", "reason" => "already_confirmed")
                    .increment(1);
                Err(ReservationError::AlreadyConfirmed.into())
            }
            Err(e) => {
                warn!(error = %e, "release failed");
                Err(EngineError::from_store(e))
            }
        }
    }

    /// Loads a reservation by ID.
    pub async fn get_reservation(&self, id: ReservationId) -> Result<Reservation, EngineError> {
        self.store
            .get_reservation(id)
            .await
            .map_err(EngineError::from_store)?
            .ok_or_else(|| ReservationError::ReservationNotFound(id).into())
    }

    /// Returns all reservations recorded for an order, oldest first.
    pub async fn reservations_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<Reservation>, EngineError> {
        self.store
            .reservations_for_order(order_id)
            .await
            .map_err(EngineError::from_store)
    }
}
