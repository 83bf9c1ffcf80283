//! Booking actions.
//!
//! Actions split into user commands (sent by the presentation layer) and
//! feedback (dispatched by effects when async work settles). Feedback
//! carries explicit `Result`s so the reducers stay pure.

use crate::error::BookingError;
use crate::state::{
    BusDetail, BusId, BusSummary, Identity, SeatId, SearchQuery, Ticket, UserProfile,
};

/// All actions understood by the booking reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingAction {
    // ═══════════════════════════════════════════════════════════
    // Session Commands
    // ═══════════════════════════════════════════════════════════

    /// App launch: derive the identity from persisted credentials.
    RestoreSession,

    /// Guest form submitted an email.
    SubmitGuestEmail {
        /// The submitted email.
        email: String,
    },

    /// Google sign-in completed with an id token to exchange.
    LoginWithGoogle {
        /// Provider-issued id token.
        id_token: String,
    },

    /// Guest form supplied a passenger name for the booking.
    SetGuestName {
        /// The supplied name. Empty clears it.
        name: String,
    },

    /// User requested logout.
    Logout,

    // ═══════════════════════════════════════════════════════════
    // Trip Commands
    // ═══════════════════════════════════════════════════════════

    /// Search for buses.
    SearchBuses(SearchQuery),

    /// Open a bus detail view.
    OpenBus {
        /// Bus to open.
        bus_id: BusId,
    },

    /// Detail view regained focus; re-fetch for fresh availability.
    RefocusBus,

    /// Detail view closed.
    CloseBus,

    /// Seat tapped in the seat picker.
    ToggleSeat {
        /// The tapped seat.
        seat_id: SeatId,
    },

    // ═══════════════════════════════════════════════════════════
    // Checkout and Ticket Commands
    // ═══════════════════════════════════════════════════════════

    /// Pay pressed; submit the current selection.
    Pay,

    /// Receipt acknowledged.
    DismissReceipt,

    /// Ticket list requested.
    LoadTickets,

    // ═══════════════════════════════════════════════════════════
    // Effect Feedback
    // ═══════════════════════════════════════════════════════════

    /// Session restoration settled.
    IdentityRestored {
        /// The derived identity.
        identity: Identity,
    },

    /// Login settled successfully.
    LoggedIn {
        /// Profile returned by the booking service.
        user: UserProfile,
    },

    /// Login settled with an error.
    LoginFailed {
        /// Why the login failed.
        error: BookingError,
    },

    /// Bus search settled.
    SearchLoaded {
        /// Search outcome.
        result: Result<Vec<BusSummary>, BookingError>,
    },

    /// Bus detail fetch settled.
    DetailLoaded {
        /// Bus the response is for. Discarded unless it matches the
        /// currently viewed bus.
        bus_id: BusId,
        /// Fetch outcome.
        result: Result<Box<BusDetail>, BookingError>,
    },

    /// Booking submission settled.
    BookingSettled {
        /// Booking outcome.
        result: Result<Ticket, BookingError>,
    },

    /// Ticket list fetch settled.
    TicketsLoaded {
        /// Fetch outcome.
        result: Result<Vec<Ticket>, BookingError>,
    },
}
