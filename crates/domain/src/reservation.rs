//! Reservation entity.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, ReservationId};
use serde::{Deserialize, Serialize};

use crate::error::ReservationError;
use crate::status::ReservationStatus;

/// A provisional hold against a product's stock, tied to an order.
///
/// Created in `Reserved` state by the engine; mutated at most once by a
/// confirm or release transition; never deleted (audit trail). Identity and
/// quantity are immutable for the lifetime of the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    id: ReservationId,
    product_id: ProductId,
    order_id: OrderId,
    quantity: u32,
    status: ReservationStatus,
    created_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
    released_at: Option<DateTime<Utc>>,
    release_reason: Option<String>,
}

impl Reservation {
    /// Creates a new active reservation.
    ///
    /// Fails with [`ReservationError::InvalidQuantity`] when `quantity` is
    /// zero; a hold for nothing is always a caller bug.
    pub fn reserve(
        id: ReservationId,
        product_id: ProductId,
        order_id: OrderId,
        quantity: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ReservationError> {
        if quantity == 0 {
            return Err(ReservationError::InvalidQuantity { quantity });
        }

        Ok(Self {
            id,
            product_id,
            order_id,
            quantity,
            status: ReservationStatus::Reserved,
            created_at,
            confirmed_at: None,
            released_at: None,
            release_reason: None,
        })
    }

    /// Transitions the reservation to `Confirmed`.
    ///
    /// The caller is responsible for decrementing product stock in the same
    /// atomic unit; this method only enforces the state machine.
    pub fn confirm(&mut self, at: DateTime<Utc>) -> Result<(), ReservationError> {
        if !self.status.can_confirm() {
            return Err(ReservationError::InvalidStateTransition {
                current: self.status,
            });
        }

        self.status = ReservationStatus::Confirmed;
        self.confirmed_at = Some(at);
        Ok(())
    }

    /// Transitions the reservation to `Released`, recording the reason.
    pub fn release(
        &mut self,
        at: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Result<(), ReservationError> {
        match self.status {
            ReservationStatus::Confirmed => Err(ReservationError::AlreadyConfirmed),
            ReservationStatus::Released => Err(ReservationError::InvalidStateTransition {
                current: self.status,
            }),
            ReservationStatus::Reserved => {
                self.status = ReservationStatus::Released;
                self.released_at = Some(at);
                self.release_reason = Some(reason.into());
                Ok(())
            }
        }
    }

    /// Returns the reservation ID.
    pub fn id(&self) -> ReservationId {
        self.id
    }

    /// Returns the product this reservation holds stock for.
    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    /// Returns the order this reservation belongs to.
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// Returns the reserved quantity.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns the current lifecycle status.
    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    /// Returns the creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the confirmation timestamp, if confirmed.
    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at
    }

    /// Returns the release timestamp, if released.
    pub fn released_at(&self) -> Option<DateTime<Utc>> {
        self.released_at
    }

    /// Returns the release reason, if released.
    pub fn release_reason(&self) -> Option<&str> {
        self.release_reason.as_deref()
    }

    /// Returns true if this hold still counts against available stock.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Reconstructs a reservation from stored fields.
    ///
    /// For store implementations rehydrating persisted rows; does not
    /// re-validate beyond what the row already guarantees.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: ReservationId,
        product_id: ProductId,
        order_id: OrderId,
        quantity: u32,
        status: ReservationStatus,
        created_at: DateTime<Utc>,
        confirmed_at: Option<DateTime<Utc>>,
        released_at: Option<DateTime<Utc>>,
        release_reason: Option<String>,
    ) -> Self {
        Self {
            id,
            product_id,
            order_id,
            quantity,
            status,
            created_at,
            confirmed_at,
            released_at,
            release_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_reservation(quantity: u32) -> Result<Reservation, ReservationError> {
        Reservation::reserve(
            ReservationId::new(),
            ProductId::new("SKU-001"),
            OrderId::new(),
            quantity,
            Utc::now(),
        )
    }

    #[test]
    fn test_reserve_creates_active_reservation() {
        let reservation = new_reservation(4).unwrap();
        assert_eq!(reservation.status(), ReservationStatus::Reserved);
        assert_eq!(reservation.quantity(), 4);
        assert!(reservation.is_active());
        assert!(reservation.confirmed_at().is_none());
        assert!(reservation.released_at().is_none());
        assert!(reservation.release_reason().is_none());
    }

    #[test]
    fn test_reserve_zero_quantity_fails() {
        let result = new_reservation(0);
        assert!(matches!(
            result,
            Err(ReservationError::InvalidQuantity { quantity: 0 })
        ));
    }

    #[test]
    fn test_confirm_sets_status_and_timestamp() {
        let mut reservation = new_reservation(4).unwrap();
        let at = Utc::now();

        reservation.confirm(at).unwrap();

        assert_eq!(reservation.status(), ReservationStatus::Confirmed);
        assert_eq!(reservation.confirmed_at(), Some(at));
        assert!(reservation.released_at().is_none());
        assert!(!reservation.is_active());
    }

    #[test]
    fn test_confirm_twice_fails() {
        let mut reservation = new_reservation(4).unwrap();
        reservation.confirm(Utc::now()).unwrap();

        let result = reservation.confirm(Utc::now());
        assert!(matches!(
            result,
            Err(ReservationError::InvalidStateTransition {
                current: ReservationStatus::Confirmed
            })
        ));
        assert_eq!(reservation.status(), ReservationStatus::Confirmed);
    }

    #[test]
    fn test_confirm_released_fails() {
        let mut reservation = new_reservation(4).unwrap();
        reservation.release(Utc::now(), "cancelled").unwrap();

        let result = reservation.confirm(Utc::now());
        assert!(matches!(
            result,
            Err(ReservationError::InvalidStateTransition {
                current: ReservationStatus::Released
            })
        ));
    }

    #[test]
    fn test_release_sets_status_timestamp_and_reason() {
        let mut reservation = new_reservation(4).unwrap();
        let at = Utc::now();

        reservation.release(at, "order cancelled").unwrap();

        assert_eq!(reservation.status(), ReservationStatus::Released);
        assert_eq!(reservation.released_at(), Some(at));
        assert_eq!(reservation.release_reason(), Some("order cancelled"));
        assert!(reservation.confirmed_at().is_none());
        assert!(!reservation.is_active());
    }

    #[test]
    fn test_release_confirmed_fails() {
        let mut reservation = new_reservation(4).unwrap();
        reservation.confirm(Utc::now()).unwrap();

        let result = reservation.release(Utc::now(), "too late");
        assert!(matches!(result, Err(ReservationError::AlreadyConfirmed)));
        assert_eq!(reservation.status(), ReservationStatus::Confirmed);
        assert!(reservation.released_at().is_none());
    }

    #[test]
    fn test_release_twice_fails_at_entity_level() {
        // Idempotent release is an engine concern; the entity itself
        // rejects a second transition to keep state monotonic.
        let mut reservation = new_reservation(4).unwrap();
        reservation.release(Utc::now(), "first").unwrap();

        let result = reservation.release(Utc::now(), "second");
        assert!(matches!(
            result,
            Err(ReservationError::InvalidStateTransition {
                current: ReservationStatus::Released
            })
        ));
        assert_eq!(reservation.release_reason(), Some("first"));
    }

    #[test]
    fn test_exactly_one_terminal_timestamp() {
        let mut confirmed = new_reservation(1).unwrap();
        confirmed.confirm(Utc::now()).unwrap();
        assert!(confirmed.confirmed_at().is_some() && confirmed.released_at().is_none());

        let mut released = new_reservation(1).unwrap();
        released.release(Utc::now(), "test").unwrap();
        assert!(released.released_at().is_some() && released.confirmed_at().is_none());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let reservation = new_reservation(4).unwrap();
        let json = serde_json::to_string(&reservation).unwrap();
        let deserialized: Reservation = serde_json::from_str(&json).unwrap();
        assert_eq!(reservation, deserialized);
    }
}
