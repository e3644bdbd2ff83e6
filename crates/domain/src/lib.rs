//! Domain layer for the inventory-reservation system.
//!
//! Holds the [`Reservation`] entity with its lifecycle state machine,
//! the [`Product`] record the engine reads stock from, and the business
//! error taxonomy shared by the engine and its callers.

mod error;
mod product;
mod reservation;
mod status;

pub use error::ReservationError;
pub use product::Product;
pub use reservation::Reservation;
pub use status::ReservationStatus;
