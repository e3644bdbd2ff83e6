//! Derived availability over products and active reservations.

use common::ProductId;
use domain::ReservationError;
use store::InventoryStore;

use crate::error::EngineError;

/// Availability snapshot for a product.
///
/// `available` is derived, never stored: `total_stock − active_reserved`,
/// recomputed from the authoritative tables on every read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    pub product_id: ProductId,
    pub product_name: String,
    pub total_stock: u32,
    pub active_reserved: u32,
    pub available: i64,
}

/// Result of checking whether a requested quantity fits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityCheck {
    pub availability: Availability,
    pub requested: u32,
    pub is_available: bool,
    pub message: String,
}

/// Computes availability snapshots from the inventory store.
#[derive(Clone)]
pub struct AvailabilityCalculator<S> {
    store: S,
}

impl<S: InventoryStore> AvailabilityCalculator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Computes the current availability snapshot for a product.
    pub async fn compute(&self, product_id: &ProductId) -> Result<Availability, EngineError> {
        let product = self
            .store
            .get_product(product_id)
            .await
            .map_err(EngineError::from_store)?
            .ok_or_else(|| ReservationError::ProductNotFound(product_id.clone()))?;
        let active_reserved = self
            .store
            .active_reserved(product_id)
            .await
            .map_err(EngineError::from_store)?;

        Ok(Availability {
            product_id: product.id,
            product_name: product.name,
            total_stock: product.stock,
            active_reserved,
            available: i64::from(product.stock) - i64::from(active_reserved),
        })
    }

    /// Checks whether `requested` units could be reserved right now.
    ///
    /// Advisory only: the answer can be stale by the time a reserve runs,
    /// which is why the reserve path re-checks atomically in the store.
    pub async fn check(
        &self,
        product_id: &ProductId,
        requested: u32,
    ) -> Result<AvailabilityCheck, EngineError> {
        if requested == 0 {
            return Err(ReservationError::InvalidQuantity { quantity: 0 }.into());
        }

        let availability = self.compute(product_id).await?;
        let is_available = availability.available >= i64::from(requested);
        let message = if is_available {
            format!("Stock available: {} units", availability.available)
        } else {
            format!(
                "Insufficient stock. Available: {}, Requested: {}",
                availability.available, requested
            )
        };

        Ok(AvailabilityCheck {
            availability,
            requested,
            is_available,
            message,
        })
    }
}
