use common::{ProductId, ReservationId};
use domain::ReservationStatus;
use thiserror::Error;

/// Errors that can occur when interacting with the inventory store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A reservation with this ID already exists.
    #[error("Duplicate reservation id: {0}")]
    DuplicateReservation(ReservationId),

    /// The product was not found.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The reservation was not found.
    #[error("Reservation not found: {0}")]
    ReservationNotFound(ReservationId),

    /// Conditional insert rejected: available stock below the requested
    /// quantity at commit time.
    #[error(
        "Insufficient availability for {product_id}: available {available}, requested {requested}"
    )]
    InsufficientAvailability {
        product_id: ProductId,
        available: i64,
        requested: u32,
    },

    /// Confirm rejected: physical stock below the reserved quantity.
    #[error("Insufficient stock for {product_id}: stock {stock}, requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        stock: u32,
        requested: u32,
    },

    /// Compare-and-swap on reservation status failed; the reservation was
    /// not in `Reserved` state at commit time.
    #[error("Status conflict for reservation {id}: found {actual}")]
    StatusConflict {
        id: ReservationId,
        actual: ReservationStatus,
    },

    /// A stored row held a value the domain model rejects.
    #[error("Invalid stored row: {0}")]
    InvalidRow(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for inventory store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
