//! Operation receipts returned by the engine.

use domain::Reservation;
use store::StockLevels;

/// Outcome of a successful reserve.
#[derive(Debug, Clone)]
pub struct ReserveReceipt {
    /// The newly created reservation, in `Reserved` state.
    pub reservation: Reservation,

    /// Stock levels for the product after the hold was taken.
    pub levels: StockLevels,

    /// Human-readable summary for API responses.
    pub message: String,
}

/// Outcome of a successful confirm.
#[derive(Debug, Clone)]
pub struct ConfirmReceipt {
    /// The reservation, now `Confirmed`.
    pub reservation: Reservation,

    /// Product stock after the decrement.
    pub new_stock: u32,

    /// Human-readable summary for API responses.
    pub message: String,
}

/// Outcome of a successful release.
///
/// Releasing an already-released reservation succeeds without side effects;
/// `already_released` distinguishes that case for callers that care.
#[derive(Debug, Clone)]
pub struct ReleaseReceipt {
    /// The reservation, in `Released` state.
    pub reservation: Reservation,

    /// True when the reservation had already been released and this call
    /// changed nothing.
    pub already_released: bool,

    /// Human-readable summary for API responses.
    pub message: String,
}
