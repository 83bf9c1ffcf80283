//! Booking reducers.
//!
//! This module contains the pure business logic of the booking core.
//!
//! Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
//! [`BookingReducer`] routes actions to the session, trip, and checkout
//! sub-reducers.

pub mod checkout;
pub mod session;
pub mod trip;

use crate::actions::BookingAction;
use crate::environment::BookingEnvironment;
use crate::error::BookingError;
use crate::providers::{AuthApi, BusApi, TokenStore};
use crate::state::{BookingState, Identity, NavTarget};
use busway_core::environment::Clock;
use busway_core::{Effects, reducer::Reducer};

// Re-export
pub use checkout::CheckoutReducer;
pub use session::SessionReducer;
pub use trip::TripReducer;

/// Drop to an anonymous identity when a request failed for auth reasons.
///
/// The session manager has already cleared the stored credentials by the
/// time such an error surfaces; this keeps the state in agreement and
/// requests a return to the login screen.
pub(crate) fn note_auth_failure(state: &mut BookingState, error: &BookingError) {
    if error.is_auth() {
        state.identity = Identity::Anonymous;
        state.navigation = Some(NavTarget::Login);
    }
}

/// Unified booking reducer.
///
/// Combines the session, trip, and checkout flows into a single reducer
/// and routes actions to the appropriate sub-reducer.
#[derive(Debug, Clone)]
pub struct BookingReducer<T, A, B, C> {
    session: SessionReducer<T, A, B, C>,
    trip: TripReducer<T, A, B, C>,
    checkout: CheckoutReducer<T, A, B, C>,
}

impl<T, A, B, C> BookingReducer<T, A, B, C> {
    /// Create a new unified booking reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            session: SessionReducer::new(),
            trip: TripReducer::new(),
            checkout: CheckoutReducer::new(),
        }
    }
}

impl<T, A, B, C> Default for BookingReducer<T, A, B, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A, B, C> Reducer for BookingReducer<T, A, B, C>
where
    T: TokenStore + 'static,
    A: AuthApi + 'static,
    B: BusApi + 'static,
    C: Clock + 'static,
{
    type State = BookingState;
    type Action = BookingAction;
    type Environment = BookingEnvironment<T, A, B, C>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects<Self::Action> {
        match action {
            // Session actions
            BookingAction::RestoreSession
            | BookingAction::SubmitGuestEmail { .. }
            | BookingAction::SetGuestName { .. }
            | BookingAction::LoginWithGoogle { .. }
            | BookingAction::Logout
            | BookingAction::LoadTickets
            | BookingAction::IdentityRestored { .. }
            | BookingAction::LoggedIn { .. }
            | BookingAction::LoginFailed { .. }
            | BookingAction::TicketsLoaded { .. } => self.session.reduce(state, action, env),

            // Trip actions
            BookingAction::SearchBuses(..)
            | BookingAction::OpenBus { .. }
            | BookingAction::RefocusBus
            | BookingAction::CloseBus
            | BookingAction::ToggleSeat { .. }
            | BookingAction::SearchLoaded { .. }
            | BookingAction::DetailLoaded { .. } => self.trip.reduce(state, action, env),

            // Checkout actions
            BookingAction::Pay
            | BookingAction::DismissReceipt
            | BookingAction::BookingSettled { .. } => self.checkout.reduce(state, action, env),
        }
    }
}

#[cfg(test)]
pub(crate) mod support {
    use crate::environment::BookingEnvironment;
    use crate::gateway::BookingGateway;
    use crate::mocks::MockApi;
    use crate::providers::memory::MemoryTokenStore;
    use crate::session::SessionManager;
    use crate::state::{BookingState, BusDetail, BusId, Seat, SeatId, SeatMap};
    use busway_core::environment::FixedClock;
    use chrono::{DateTime, TimeZone, Utc};

    pub(crate) type TestEnv = BookingEnvironment<MemoryTokenStore, MockApi, MockApi, FixedClock>;

    pub(crate) fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    pub(crate) fn env_with(api: MockApi, store: MemoryTokenStore) -> TestEnv {
        let session = SessionManager::new(store, api.clone());
        BookingEnvironment::new(
            BookingGateway::new(api, session),
            FixedClock::new(test_time()),
        )
    }

    pub(crate) fn env() -> TestEnv {
        env_with(MockApi::new(), MemoryTokenStore::new())
    }

    pub(crate) fn detail(bus_id: &str, seats: &[(u32, bool)]) -> BusDetail {
        BusDetail {
            bus_id: BusId::from(bus_id),
            company: "Metro Travels".to_string(),
            bus_type: "AC Sleeper".to_string(),
            from: "Pune".to_string(),
            to: "Mumbai".to_string(),
            departure_time: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            arrival_time: Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap(),
            price: 450,
            original_price: None,
            rating: Some(4.5),
            total_reviews: Some(120),
            badges: Vec::new(),
            seat_map: SeatMap {
                rows: vec![
                    seats
                        .iter()
                        .map(|&(id, booked)| Seat {
                            id: SeatId(id),
                            booked,
                            tier: None,
                        })
                        .collect(),
                ],
            },
        }
    }

    pub(crate) fn state_with_open_bus(bus_id: &str, seats: &[(u32, bool)]) -> BookingState {
        BookingState {
            viewing: Some(BusId::from(bus_id)),
            detail: Some(detail(bus_id, seats)),
            ..BookingState::default()
        }
    }
}
