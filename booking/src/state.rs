//! Booking state types.
//!
//! This module defines the data model of the booking core. Seat maps are
//! immutable snapshots: each fetch produces a new value and booked state
//! changes only via re-fetch, which makes the stale-selection guard a plain
//! membership check instead of defensive copying.

use crate::error::{BookingError, Result};
use crate::seats::Selection;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Identifier of a bus instance, issued by the booking service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusId(pub String);

impl std::fmt::Display for BusId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BusId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Seat number within a bus's seat map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatId(pub u32);

impl std::fmt::Display for SeatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Identity
// ═══════════════════════════════════════════════════════════════════════

/// Who is acting now.
///
/// Exactly one variant holds at a time. `Anonymous` is a precondition state:
/// no token and no guest email yet supplied, so no authorized calls can be
/// made.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Identity {
    /// Logged-in user with a stored access token.
    Authenticated {
        /// User id issued by the booking service.
        user_id: String,
    },

    /// Unauthenticated actor identified by a self-reported email.
    Guest {
        /// The guest's email, as explicitly submitted this app run.
        email: String,
    },

    /// No token and no guest email yet.
    #[default]
    Anonymous,
}

impl Identity {
    /// Returns `true` for the `Authenticated` variant.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// User profile returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User id issued by the booking service.
    pub user_id: String,

    /// Display name.
    pub name: Option<String>,

    /// Email address.
    pub email: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════
// Seat Map
// ═══════════════════════════════════════════════════════════════════════

/// A single seat in a seat map snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    /// Seat number.
    pub id: SeatId,

    /// Whether the seat is already booked.
    pub booked: bool,

    /// Optional seat tier (e.g. "sleeper", "window").
    pub tier: Option<String>,
}

/// Immutable seat layout snapshot for a bus instance.
///
/// Row-major, as served by the backend. Never mutated locally: booked state
/// changes only when a new snapshot is fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatMap {
    /// Seat rows.
    pub rows: Vec<Vec<Seat>>,
}

impl SeatMap {
    /// Iterate over all seats in row order.
    pub fn seats(&self) -> impl Iterator<Item = &Seat> {
        self.rows.iter().flatten()
    }

    /// Look up a seat by id.
    #[must_use]
    pub fn seat(&self, id: SeatId) -> Option<&Seat> {
        self.seats().find(|seat| seat.id == id)
    }

    /// Whether the seat exists and is not booked.
    #[must_use]
    pub fn is_bookable(&self, id: SeatId) -> bool {
        self.seat(id).is_some_and(|seat| !seat.booked)
    }

    /// Number of unbooked seats.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.seats().filter(|seat| !seat.booked).count()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Buses
// ═══════════════════════════════════════════════════════════════════════

/// One row in the bus search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusSummary {
    /// Bus id, used to open the detail view.
    pub bus_id: BusId,

    /// Operating company.
    pub company: String,

    /// Origin city.
    pub from: String,

    /// Destination city.
    pub to: String,

    /// Scheduled departure.
    pub departure_time: DateTime<Utc>,

    /// Scheduled arrival.
    pub arrival_time: DateTime<Utc>,

    /// Per-seat price.
    pub price: u32,

    /// Average rating, if the service provides one.
    pub rating: Option<f32>,
}

/// Full bus detail including the embedded seat map snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusDetail {
    /// Bus id.
    pub bus_id: BusId,

    /// Operating company.
    pub company: String,

    /// Bus type (e.g. "AC Sleeper").
    pub bus_type: String,

    /// Origin city.
    pub from: String,

    /// Destination city.
    pub to: String,

    /// Scheduled departure. Also the travel date on the booking request.
    pub departure_time: DateTime<Utc>,

    /// Scheduled arrival.
    pub arrival_time: DateTime<Utc>,

    /// Per-seat price.
    pub price: u32,

    /// Pre-discount price, when the service advertises one.
    pub original_price: Option<u32>,

    /// Average rating.
    pub rating: Option<f32>,

    /// Number of reviews behind the rating.
    pub total_reviews: Option<u32>,

    /// Marketing badges.
    pub badges: Vec<String>,

    /// Seat map snapshot fetched with this detail.
    pub seat_map: SeatMap,
}

// ═══════════════════════════════════════════════════════════════════════
// Booking Request and Ticket
// ═══════════════════════════════════════════════════════════════════════

/// Query for the bus search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Origin city.
    pub from: String,

    /// Destination city.
    pub to: String,

    /// Travel date.
    pub date: NaiveDate,
}

/// A validated ticket-booking request.
///
/// Construction enforces the core invariant: the request is never built
/// from a selection that does not belong to the seat map snapshot used to
/// build it, and never references a booked seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    /// Bus to book on.
    pub bus_id: BusId,

    /// Travel date (the bus's departure time).
    pub date: DateTime<Utc>,

    /// Seats to book, in user selection order (preserved for the receipt).
    pub seat_ids: Vec<SeatId>,

    /// Guest name, when a guest form supplied one.
    pub guest_name: Option<String>,

    /// Guest email, when booking as a guest.
    pub guest_email: Option<String>,
}

impl BookingRequest {
    /// Build a request from the current detail snapshot and selection.
    ///
    /// Guest fields are filled from the identity; authenticated bookings
    /// carry neither.
    ///
    /// # Errors
    ///
    /// - [`BookingError::EmptySelection`] if no seats are selected
    /// - [`BookingError::SeatUnavailable`] if any selected seat is missing
    ///   or booked in the detail's seat map
    pub fn from_parts(
        detail: &BusDetail,
        seats: &[SeatId],
        identity: &Identity,
        guest_name: Option<String>,
    ) -> Result<Self> {
        if seats.is_empty() {
            return Err(BookingError::EmptySelection);
        }

        for &seat in seats {
            if !detail.seat_map.is_bookable(seat) {
                return Err(BookingError::SeatUnavailable { seat });
            }
        }

        let guest_email = match identity {
            Identity::Guest { email } => Some(email.clone()),
            Identity::Authenticated { .. } | Identity::Anonymous => None,
        };

        Ok(Self {
            bus_id: detail.bus_id.clone(),
            date: detail.departure_time,
            seat_ids: seats.to_vec(),
            guest_name: if guest_email.is_some() { guest_name } else { None },
            guest_email,
        })
    }
}

/// Authoritative booking confirmation returned by the booking service.
///
/// Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket id.
    pub ticket_id: String,

    /// Passenger name record - the human-facing confirmation code.
    pub pnr: String,

    /// Booked seats, in the order they were requested.
    pub seat_ids: Vec<SeatId>,

    /// Total fare.
    pub fare: u32,

    /// Bus the ticket is for.
    pub bus_id: BusId,

    /// Travel date.
    pub date: DateTime<Utc>,

    /// Booking status (e.g. "Upcoming", "Completed"), if the service
    /// reports one.
    pub status: Option<String>,
}

/// Receipt view model shown after a successful booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Origin city.
    pub from: String,

    /// Destination city.
    pub to: String,

    /// Operating company.
    pub company: String,

    /// Bus type.
    pub bus_type: String,

    /// Scheduled departure.
    pub departure_time: DateTime<Utc>,

    /// Scheduled arrival.
    pub arrival_time: DateTime<Utc>,

    /// Booked seats in selection order.
    pub seats: Vec<SeatId>,

    /// Ticket id.
    pub ticket_id: String,

    /// Passenger name record.
    pub pnr: String,

    /// Total fare.
    pub fare: u32,

    /// When the booking settled, per the local clock.
    pub booked_at: DateTime<Utc>,
}

impl Receipt {
    /// Compose a receipt from the loaded detail and the returned ticket.
    #[must_use]
    pub fn compose(detail: &BusDetail, ticket: &Ticket, booked_at: DateTime<Utc>) -> Self {
        Self {
            from: detail.from.clone(),
            to: detail.to.clone(),
            company: detail.company.clone(),
            bus_type: detail.bus_type.clone(),
            departure_time: detail.departure_time,
            arrival_time: detail.arrival_time,
            seats: ticket.seat_ids.clone(),
            ticket_id: ticket.ticket_id.clone(),
            pnr: ticket.pnr.clone(),
            fare: ticket.fare,
            booked_at,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Orchestrator State
// ═══════════════════════════════════════════════════════════════════════

/// Submission phase of the booking orchestrator.
///
/// Failure is not a resting state: a failed submission surfaces a
/// [`Notice`] and resets the phase to `Idle` with the selection preserved,
/// so the user can retry without re-selecting seats.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum BookingPhase {
    /// No submission in flight.
    #[default]
    Idle,

    /// A booking request has been sent; awaiting the outcome. An in-flight
    /// submission is not cancellable - the server owns the commit.
    Submitting,

    /// Booking confirmed. Exited only by explicit dismissal.
    Succeeded(Receipt),
}

/// User-facing message queued by the reducers and drained by the
/// presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Pay pressed with an empty selection.
    SelectAtLeastOneSeat,

    /// Pay pressed before the bus detail loaded.
    BusNotLoaded,

    /// The stale-selection guard dropped seats taken by another booking.
    SeatsNoLongerAvailable {
        /// Seats removed from the selection.
        dropped: Vec<SeatId>,
    },

    /// The booking request failed; the selection is preserved.
    BookingFailed {
        /// Failure description.
        reason: String,
    },

    /// Guest email rejected by validation.
    InvalidEmail {
        /// The rejected input.
        email: String,
    },

    /// Ticket list requested without a usable identity.
    EmailRequired,

    /// Login attempt failed.
    LoginFailed {
        /// Failure description.
        reason: String,
    },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelectAtLeastOneSeat => f.write_str("Please select at least one seat."),
            Self::BusNotLoaded => f.write_str("Bus information not loaded."),
            Self::SeatsNoLongerAvailable { dropped } => {
                let seats: Vec<String> = dropped.iter().map(ToString::to_string).collect();
                write!(
                    f,
                    "Seats {} are no longer available and were removed.",
                    seats.join(", ")
                )
            },
            Self::BookingFailed { .. } => {
                f.write_str("Failed to book ticket. Please try again.")
            },
            Self::InvalidEmail { email } => {
                write!(f, "\"{email}\" is not a valid email address.")
            },
            Self::EmailRequired => f.write_str("Enter your email to view bookings."),
            Self::LoginFailed { .. } => f.write_str("Login failed. Please try again."),
        }
    }
}

/// Navigation reset requested by the core.
///
/// Navigation itself is an external collaborator; the core only records
/// the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTarget {
    /// Return to the login screen (after logout or session expiry).
    Login,

    /// Return to the home screen (after receipt dismissal).
    Home,
}

/// Root state of the booking core.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingState {
    /// Current actor identity.
    pub identity: Identity,

    /// Passenger name supplied by the guest form, attached to guest
    /// bookings.
    pub guest_name: Option<String>,

    /// Bus id of the currently open detail view. Responses keyed to a
    /// different bus are discarded.
    pub viewing: Option<BusId>,

    /// Latest bus detail snapshot for the viewed bus.
    pub detail: Option<BusDetail>,

    /// Why the detail fetch failed, when it did.
    pub detail_error: Option<BookingError>,

    /// Current seat selection, bounded to the detail's seat map.
    pub selection: Selection,

    /// Submission phase of the orchestrator.
    pub phase: BookingPhase,

    /// Latest search results.
    pub search_results: Vec<BusSummary>,

    /// Why the last search failed, when it did.
    pub search_error: Option<BookingError>,

    /// Tickets for the current identity.
    pub tickets: Vec<Ticket>,

    /// Why the last ticket-list fetch failed, when it did.
    pub tickets_error: Option<BookingError>,

    /// Queued user-facing messages.
    pub notices: Vec<Notice>,

    /// Pending navigation reset request.
    pub navigation: Option<NavTarget>,
}

impl BookingState {
    /// Queue a user-facing message.
    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Take all queued messages, leaving the queue empty.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Tickets matching a status tab; `"All"` matches everything.
    #[must_use]
    pub fn tickets_with_status(&self, tab: &str) -> Vec<&Ticket> {
        self.tickets
            .iter()
            .filter(|ticket| tab == "All" || ticket.status.as_deref() == Some(tab))
            .collect()
    }
}
