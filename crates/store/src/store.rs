use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, ReservationId};
use domain::{Product, Reservation};

use crate::error::Result;

/// Stock levels for a product after a store mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevels {
    /// Physical stock on hand.
    pub total_stock: u32,

    /// Sum of quantities held by active (`Reserved`) reservations.
    pub active_reserved: u32,

    /// `total_stock − active_reserved`. Negative only if an external
    /// invariant violation occurred.
    pub available: i64,
}

impl StockLevels {
    /// Computes levels from a stock count and the active reserved sum.
    pub fn new(total_stock: u32, active_reserved: u32) -> Self {
        Self {
            total_stock,
            active_reserved,
            available: i64::from(total_stock) - i64::from(active_reserved),
        }
    }
}

/// Durable collection of reservation records plus the product stock table.
///
/// Both live behind one trait because the engine's correctness depends on
/// primitives that touch them together atomically:
///
/// - [`reserve_if_available`](InventoryStore::reserve_if_available) couples
///   the availability read with the reservation insert, closing the
///   check-then-act race that would otherwise permit oversell under
///   concurrent reserves for the same product.
/// - [`confirm_reservation`](InventoryStore::confirm_reservation) couples
///   the stock decrement with the status flip so a crash between the two
///   cannot leave them inconsistent.
///
/// Operations on different products are independent; implementations must
/// not serialize them against each other.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Inserts or replaces a product record. Seeding and tests only; the
    /// catalog CRUD surface proper is out of scope.
    async fn upsert_product(&self, product: Product) -> Result<()>;

    /// Loads a product by ID.
    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>>;

    /// Inserts a reservation record, rejecting duplicate IDs.
    async fn insert_reservation(&self, reservation: Reservation) -> Result<()>;

    /// Loads a reservation by ID.
    async fn get_reservation(&self, id: ReservationId) -> Result<Option<Reservation>>;

    /// Sums the quantities of active (`Reserved`) reservations for a product.
    async fn active_reserved(&self, product_id: &ProductId) -> Result<u32>;

    /// Returns all reservations recorded for an order, oldest first.
    async fn reservations_for_order(&self, order_id: OrderId) -> Result<Vec<Reservation>>;

    /// Atomically inserts the reservation iff
    /// `stock − active_reserved ≥ quantity` for its product.
    ///
    /// Returns the stock levels after the insert. Fails with
    /// `InsufficientAvailability` when the condition does not hold,
    /// `ProductNotFound` for unknown products, and `DuplicateReservation`
    /// for reused IDs. Concurrent calls for the same product serialize on
    /// this primitive.
    async fn reserve_if_available(&self, reservation: Reservation) -> Result<StockLevels>;

    /// Atomically confirms a reservation: compare-and-swap the status from
    /// `Reserved` to `Confirmed` and decrement the product stock by the
    /// reserved quantity, as one unit.
    ///
    /// Returns the updated reservation and the new stock level. Fails with
    /// `StatusConflict` when the reservation is not `Reserved` and
    /// `InsufficientStock` when the physical stock cannot cover the
    /// quantity; in both cases nothing is mutated.
    async fn confirm_reservation(
        &self,
        id: ReservationId,
        at: DateTime<Utc>,
    ) -> Result<(Reservation, u32)>;

    /// Atomically releases a reservation: compare-and-swap the status from
    /// `Reserved` to `Released`, recording timestamp and reason. No stock
    /// mutation.
    ///
    /// Fails with `StatusConflict` when the reservation is not `Reserved`.
    async fn release_reservation(
        &self,
        id: ReservationId,
        at: DateTime<Utc>,
        reason: &str,
    ) -> Result<Reservation>;
}
