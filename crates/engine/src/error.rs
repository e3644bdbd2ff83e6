//! Engine error type.

use domain::ReservationError;
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the reservation engine.
///
/// `Business` failures are deterministic outcomes the calling saga branches
/// on; `Store` failures are infrastructure faults the caller may retry at
/// its own discretion.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A deterministic business-rule failure.
    #[error(transparent)]
    Business(#[from] ReservationError),

    /// An infrastructure failure in the underlying store.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl EngineError {
    /// Translates store errors, lifting the deterministic ones into the
    /// business taxonomy so callers see a single set of outcomes.
    ///
    /// `StatusConflict` is deliberately not handled here: its meaning
    /// depends on the operation (confirm vs. release) and the engine maps
    /// it in context.
    pub(crate) fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::ProductNotFound(id) => {
                EngineError::Business(ReservationError::ProductNotFound(id))
            }
            StoreError::ReservationNotFound(id) => {
                EngineError::Business(ReservationError::ReservationNotFound(id))
            }
            StoreError::InsufficientAvailability {
                available,
                requested,
                ..
            } => EngineError::Business(ReservationError::InsufficientStock {
                available,
                requested,
            }),
            StoreError::InsufficientStock {
                stock, requested, ..
            } => EngineError::Business(ReservationError::InsufficientStock {
                available: i64::from(stock),
                requested,
            }),
            other => EngineError::Store(other),
        }
    }

    /// Returns true for deterministic business failures.
    pub fn is_business(&self) -> bool {
        matches!(self, EngineError::Business(_))
    }

    /// Returns the business failure, if this is one.
    pub fn as_business(&self) -> Option<&ReservationError> {
        match self {
            EngineError::Business(e) => Some(e),
            EngineError::Store(_) => None,
        }
    }
}
