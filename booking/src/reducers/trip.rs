//! Trip reducer.
//!
//! Handles bus search, the detail view lifecycle, and seat picking. The
//! detail view is last-write-wins: responses are keyed to the bus id they
//! were requested for and discarded if another bus has been opened since.

use crate::actions::BookingAction;
use crate::environment::BookingEnvironment;
use crate::providers::{AuthApi, BusApi, TokenStore};
use crate::reducers::note_auth_failure;
use crate::state::{BookingPhase, BookingState, BusId, Notice};
use busway_core::environment::Clock;
use busway_core::{Effects, effect::Effect, reducer::Reducer, smallvec};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Trip reducer.
#[derive(Debug, Clone)]
pub struct TripReducer<T, A, B, C> {
    _phantom: PhantomData<(T, A, B, C)>,
}

impl<T, A, B, C> TripReducer<T, A, B, C> {
    /// Create a new trip reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T, A, B, C> Default for TripReducer<T, A, B, C> {
    fn default() -> Self {
        Self::new()
    }
}

fn fetch_detail<T, A, B, C>(
    env: &BookingEnvironment<T, A, B, C>,
    bus_id: BusId,
) -> Effect<BookingAction>
where
    T: TokenStore + 'static,
    A: AuthApi + 'static,
    B: BusApi + 'static,
    C: Clock,
{
    let gateway = Arc::clone(&env.gateway);
    Effect::future(async move {
        let result = gateway.fetch_bus_details(&bus_id).await.map(Box::new);
        Some(BookingAction::DetailLoaded { bus_id, result })
    })
}

impl<T, A, B, C> Reducer for TripReducer<T, A, B, C>
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
            // ═══════════════════════════════════════════════════════════
            // Search
            // ═══════════════════════════════════════════════════════════
            BookingAction::SearchBuses(query) => {
                let gateway = Arc::clone(&env.gateway);
                smallvec![Effect::future(async move {
                    let result = gateway.search_buses(&query).await;
                    Some(BookingAction::SearchLoaded { result })
                })]
            },

            BookingAction::SearchLoaded { result } => {
                match result {
                    Ok(buses) => {
                        state.search_results = buses;
                        state.search_error = None;
                    },
                    Err(error) => {
                        note_auth_failure(state, &error);
                        state.search_error = Some(error);
                    },
                }
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════
            // Detail View Lifecycle
            // ═══════════════════════════════════════════════════════════
            BookingAction::OpenBus { bus_id } => {
                state.viewing = Some(bus_id.clone());
                state.detail = None;
                state.detail_error = None;
                state.selection.clear();
                state.phase = BookingPhase::Idle;
                smallvec![fetch_detail(env, bus_id)]
            },

            // Re-fetch for fresh availability, keeping the selection so
            // reconciliation can report what was lost.
            BookingAction::RefocusBus => match state.viewing.clone() {
                Some(bus_id) => smallvec![fetch_detail(env, bus_id)],
                None => smallvec![Effect::None],
            },

            BookingAction::CloseBus => {
                if matches!(state.phase, BookingPhase::Submitting) {
                    // The in-flight booking still needs this context to
                    // settle; the view closes only after that.
                    debug!("ignoring close while a booking is submitting");
                    return smallvec![Effect::None];
                }
                state.viewing = None;
                state.detail = None;
                state.detail_error = None;
                state.selection.clear();
                state.phase = BookingPhase::Idle;
                smallvec![Effect::None]
            },

            BookingAction::DetailLoaded { bus_id, result } => {
                if state.viewing.as_ref() != Some(&bus_id) {
                    debug!(%bus_id, "discarding bus detail for a closed view");
                    return smallvec![Effect::None];
                }

                match result {
                    Ok(detail) => {
                        let dropped = state.selection.reconcile(&detail.seat_map);
                        if !dropped.is_empty() {
                            state.push_notice(Notice::SeatsNoLongerAvailable { dropped });
                        }
                        state.detail = Some(*detail);
                        state.detail_error = None;
                    },
                    Err(error) => {
                        note_auth_failure(state, &error);
                        state.detail_error = Some(error);
                    },
                }
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════
            // Seat Picking
            // ═══════════════════════════════════════════════════════════
            BookingAction::ToggleSeat { seat_id } => {
                if matches!(state.phase, BookingPhase::Submitting) {
                    return smallvec![Effect::None];
                }
                let BookingState {
                    detail, selection, ..
                } = state;
                if let Some(detail) = detail {
                    selection.toggle(seat_id, &detail.seat_map);
                }
                smallvec![Effect::None]
            },

            _ => smallvec![Effect::None],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BookingError;
    use crate::reducers::support::{detail, env, state_with_open_bus};
    use crate::state::{Identity, NavTarget, SeatId};
    use busway_testing::{ReducerTest, assertions};

    type TestReducer = TripReducer<
        crate::providers::memory::MemoryTokenStore,
        crate::mocks::MockApi,
        crate::mocks::MockApi,
        busway_core::environment::FixedClock,
    >;

    #[test]
    fn open_bus_resets_the_view_and_fetches() {
        let mut stale = state_with_open_bus("B1", &[(1, false)]);
        stale.selection.toggle(SeatId(1), &detail("B1", &[(1, false)]).seat_map);

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(stale)
            .when_action(BookingAction::OpenBus {
                bus_id: BusId::from("B2"),
            })
            .then_state(|state| {
                assert_eq!(state.viewing, Some(BusId::from("B2")));
                assert_eq!(state.detail, None);
                assert!(state.selection.is_empty());
            })
            .then_effects(|effects| {
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn detail_for_another_bus_is_discarded() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state_with_open_bus("B2", &[(1, false)]))
            .when_action(BookingAction::DetailLoaded {
                bus_id: BusId::from("B1"),
                result: Ok(Box::new(detail("B1", &[(1, true)]))),
            })
            .then_state(|state| {
                // The open view keeps its own snapshot untouched.
                assert_eq!(state.viewing, Some(BusId::from("B2")));
                assert!(state.detail.as_ref().is_some_and(|d| d.bus_id == BusId::from("B2")));
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn refreshed_detail_reconciles_the_selection() {
        let mut state = state_with_open_bus("B1", &[(1, false), (2, false)]);
        let map = detail("B1", &[(1, false), (2, false)]).seat_map;
        state.selection.toggle(SeatId(1), &map);
        state.selection.toggle(SeatId(2), &map);

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(BookingAction::DetailLoaded {
                bus_id: BusId::from("B1"),
                result: Ok(Box::new(detail("B1", &[(1, true), (2, false)]))),
            })
            .then_state(|state| {
                assert_eq!(state.selection.seat_ids(), &[SeatId(2)]);
                assert_eq!(
                    state.notices,
                    vec![Notice::SeatsNoLongerAvailable {
                        dropped: vec![SeatId(1)]
                    }]
                );
            })
            .run();
    }

    #[test]
    fn toggling_without_a_loaded_detail_is_a_no_op() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(BookingState::default())
            .when_action(BookingAction::ToggleSeat { seat_id: SeatId(1) })
            .then_state(|state| {
                assert!(state.selection.is_empty());
            })
            .run();
    }

    #[test]
    fn toggling_a_booked_seat_changes_nothing() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state_with_open_bus("B1", &[(1, true), (2, false)]))
            .when_action(BookingAction::ToggleSeat { seat_id: SeatId(1) })
            .then_state(|state| {
                assert!(state.selection.is_empty());
                assert!(state.notices.is_empty());
            })
            .run();
    }

    #[test]
    fn close_is_deferred_while_submitting() {
        let mut state = state_with_open_bus("B1", &[(1, false)]);
        state.phase = BookingPhase::Submitting;

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(BookingAction::CloseBus)
            .then_state(|state| {
                assert_eq!(state.viewing, Some(BusId::from("B1")));
                assert!(matches!(state.phase, BookingPhase::Submitting));
            })
            .run();
    }

    #[test]
    fn auth_failure_on_search_drops_to_anonymous() {
        let state = BookingState {
            identity: Identity::Authenticated {
                user_id: "u1".to_string(),
            },
            ..BookingState::default()
        };

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(BookingAction::SearchLoaded {
                result: Err(BookingError::RefreshFailed),
            })
            .then_state(|state| {
                assert_eq!(state.identity, Identity::Anonymous);
                assert_eq!(state.navigation, Some(NavTarget::Login));
                assert_eq!(state.search_error, Some(BookingError::RefreshFailed));
            })
            .run();
    }

    #[test]
    fn refocus_refetches_and_keeps_the_selection() {
        let mut state = state_with_open_bus("B1", &[(1, false)]);
        state.selection.toggle(SeatId(1), &detail("B1", &[(1, false)]).seat_map);

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(BookingAction::RefocusBus)
            .then_state(|state| {
                assert_eq!(state.selection.seat_ids(), &[SeatId(1)]);
            })
            .then_effects(|effects| {
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }
}
