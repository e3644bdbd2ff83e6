//! Reservation engine for the inventory-reservation system.
//!
//! Orchestrates Reserve / Confirm / Release against the inventory store,
//! enforcing the reservation state machine and the oversell-prevention
//! invariant: for every product, the sum of active reserved quantities
//! never exceeds its stock.

mod availability;
mod engine;
mod error;
mod receipt;

pub use availability::{Availability, AvailabilityCalculator, AvailabilityCheck};
pub use engine::ReservationEngine;
pub use error::EngineError;
pub use receipt::{ConfirmReceipt, ReleaseReceipt, ReserveReceipt};
