//! Error types for the booking core.

use crate::state::SeatId;
use thiserror::Error;

/// Result type alias for booking operations.
pub type Result<T> = std::result::Result<T, BookingError>;

/// Error taxonomy for the booking core.
///
/// Variants are grouped by category: validation errors are resolved locally
/// and never reach the network layer; auth errors drive the
/// refresh-and-retry protocol; network and application errors come back from
/// the booking service as distinguishable failures.
///
/// Errors are `Clone + PartialEq` so they can ride inside actions and be
/// asserted on in tests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    // ═══════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════

    /// Guest email is empty or malformed.
    #[error("invalid email address: {email}")]
    InvalidEmail {
        /// The rejected input.
        email: String,
    },

    /// No seats are selected.
    #[error("select at least one seat")]
    EmptySelection,

    /// Bus detail (and its seat map) has not loaded.
    #[error("bus information not loaded")]
    BusNotLoaded,

    /// A selected seat is booked in the seat map snapshot.
    #[error("seat {seat} is no longer available")]
    SeatUnavailable {
        /// The unavailable seat.
        seat: SeatId,
    },

    // ═══════════════════════════════════════════════════════════
    // Auth Errors
    // ═══════════════════════════════════════════════════════════

    /// No refresh token is stored.
    #[error("no refresh token found")]
    NoRefreshToken,

    /// Token refresh failed; the session has been logged out.
    #[error("token refresh failed")]
    RefreshFailed,

    /// The service rejected the access token (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    // ═══════════════════════════════════════════════════════════
    // Transport and Service Errors
    // ═══════════════════════════════════════════════════════════

    /// The service was unreachable or timed out.
    #[error("network error: {0}")]
    Network(String),

    /// Well-formed response signaling a business-rule rejection.
    #[error("request rejected: {0}")]
    Application(String),

    /// The local key-value token store failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl BookingError {
    /// Returns `true` if this error is due to invalid user input.
    ///
    /// Validation errors are resolved locally and never reach the network.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidEmail { .. }
                | Self::EmptySelection
                | Self::BusNotLoaded
                | Self::SeatUnavailable { .. }
        )
    }

    /// Returns `true` if this error means the session is no longer usable.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::NoRefreshToken | Self::RefreshFailed | Self::Unauthorized
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_classification() {
        assert!(BookingError::EmptySelection.is_validation());
        assert!(
            BookingError::InvalidEmail {
                email: String::new()
            }
            .is_validation()
        );
        assert!(!BookingError::Unauthorized.is_validation());
    }

    #[test]
    fn auth_classification() {
        assert!(BookingError::Unauthorized.is_auth());
        assert!(BookingError::RefreshFailed.is_auth());
        assert!(!BookingError::Network("down".to_string()).is_auth());
    }
}
