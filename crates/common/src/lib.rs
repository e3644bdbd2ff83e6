//! Shared identifier types for the inventory-reservation system.

mod types;

pub use types::{OrderId, ProductId, ReservationId};
