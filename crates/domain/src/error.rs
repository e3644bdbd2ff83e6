//! Business error taxonomy.

use common::{ProductId, ReservationId};
use thiserror::Error;

use crate::status::ReservationStatus;

/// Deterministic business failures of the reservation engine.
///
/// These are outcomes the calling saga branches on (retry, compensate,
/// abort); infrastructure failures live in the store layer and are kept
/// distinct so callers can tell the two apart.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReservationError {
    /// Requested quantity was zero (or otherwise malformed).
    #[error("Invalid quantity: {quantity}, must be greater than zero")]
    InvalidQuantity { quantity: u32 },

    /// The referenced product does not exist in the catalog.
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    /// The referenced reservation does not exist.
    #[error("Reservation {0} not found")]
    ReservationNotFound(ReservationId),

    /// Availability below the requested quantity.
    #[error("Insufficient stock. Available: {available}, Requested: {requested}")]
    InsufficientStock { available: i64, requested: u32 },

    /// Confirm attempted on a reservation that is not in `Reserved` state.
    #[error("Reservation cannot be confirmed. Current status: {current}")]
    InvalidStateTransition { current: ReservationStatus },

    /// Release attempted on a confirmed reservation; the stock deduction
    /// already committed and cannot be rolled back through this path.
    #[error("Reservation was already confirmed and cannot be released")]
    AlreadyConfirmed,
}
