//! Durable inventory store.
//!
//! The store keeps the product stock counter and the reservation records in
//! one durable unit so the engine's atomicity requirements (conditional
//! insert on reserve, coupled stock decrement and status flip on confirm)
//! can be satisfied by a single store primitive.

mod error;
mod memory;
mod postgres;
mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryInventoryStore;
pub use postgres::PostgresInventoryStore;
pub use store::{InventoryStore, StockLevels};
