//! Reservation state machine.

use serde::{Deserialize, Serialize};

/// The state of a stock reservation in its lifecycle.
///
/// State transitions:
/// ```text
/// Reserved ──┬──► Confirmed   (stock permanently deducted)
///            └──► Released    (hold dropped, stock never deducted)
/// ```
///
/// `Confirmed` and `Released` are terminal; a reservation transitions away
/// from `Reserved` at most once and never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReservationStatus {
    /// Active hold counted against available stock, awaiting confirm or release.
    #[default]
    Reserved,

    /// Reservation committed; product stock was decremented (terminal state).
    Confirmed,

    /// Reservation cancelled without deducting stock (terminal state).
    Released,
}

impl ReservationStatus {
    /// Returns true if the reservation can be confirmed from this state.
    pub fn can_confirm(&self) -> bool {
        matches!(self, ReservationStatus::Reserved)
    }

    /// Returns true if the reservation can be released from this state.
    pub fn can_release(&self) -> bool {
        matches!(self, ReservationStatus::Reserved)
    }

    /// Returns true if this hold is counted against available stock.
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationStatus::Reserved)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Confirmed | ReservationStatus::Released
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Reserved => "Reserved",
            ReservationStatus::Confirmed => "Confirmed",
            ReservationStatus::Released => "Released",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
