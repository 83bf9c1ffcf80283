//! Checkout reducer.
//!
//! Owns the submission state machine. `Pay` revalidates the selection
//! against the latest seat map snapshot before anything leaves the device,
//! and a settled booking is only applied if a submission is actually in
//! flight.

use crate::actions::BookingAction;
use crate::environment::BookingEnvironment;
use crate::error::BookingError;
use crate::providers::{AuthApi, BusApi, TokenStore};
use crate::reducers::note_auth_failure;
use crate::state::{BookingPhase, BookingRequest, BookingState, Notice, NavTarget, Receipt};
use busway_core::environment::Clock;
use busway_core::{Effects, effect::Effect, reducer::Reducer, smallvec};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

/// Checkout reducer.
#[derive(Debug, Clone)]
pub struct CheckoutReducer<T, A, B, C> {
    _phantom: PhantomData<(T, A, B, C)>,
}

impl<T, A, B, C> CheckoutReducer<T, A, B, C> {
    /// Create a new checkout reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T, A, B, C> Default for CheckoutReducer<T, A, B, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A, B, C> Reducer for CheckoutReducer<T, A, B, C>
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
            // Submission
            // ═══════════════════════════════════════════════════════════
            BookingAction::Pay => {
                if !matches!(state.phase, BookingPhase::Idle) {
                    debug!("ignoring pay outside the idle phase");
                    return smallvec![Effect::None];
                }

                let Some(detail) = state.detail.clone() else {
                    state.push_notice(Notice::BusNotLoaded);
                    return smallvec![Effect::None];
                };

                // Revalidate against the latest snapshot. Dropping seats
                // here means the user confirms the reduced selection with
                // another tap instead of booking something they did not
                // see.
                let dropped = state.selection.reconcile(&detail.seat_map);
                if !dropped.is_empty() {
                    state.push_notice(Notice::SeatsNoLongerAvailable { dropped });
                    return smallvec![Effect::None];
                }

                if state.selection.is_empty() {
                    state.push_notice(Notice::SelectAtLeastOneSeat);
                    return smallvec![Effect::None];
                }

                let request = match BookingRequest::from_parts(
                    &detail,
                    state.selection.seat_ids(),
                    &state.identity,
                    state.guest_name.clone(),
                ) {
                    Ok(request) => request,
                    Err(BookingError::EmptySelection) => {
                        state.push_notice(Notice::SelectAtLeastOneSeat);
                        return smallvec![Effect::None];
                    },
                    Err(BookingError::SeatUnavailable { seat }) => {
                        state.push_notice(Notice::SeatsNoLongerAvailable {
                            dropped: vec![seat],
                        });
                        return smallvec![Effect::None];
                    },
                    Err(error) => {
                        state.push_notice(Notice::BookingFailed {
                            reason: error.to_string(),
                        });
                        return smallvec![Effect::None];
                    },
                };

                state.phase = BookingPhase::Submitting;
                let gateway = Arc::clone(&env.gateway);
                smallvec![Effect::future(async move {
                    let result = gateway.book_ticket(&request).await;
                    Some(BookingAction::BookingSettled { result })
                })]
            },

            BookingAction::BookingSettled { result } => {
                if !matches!(state.phase, BookingPhase::Submitting) {
                    debug!("discarding settlement with no submission in flight");
                    return smallvec![Effect::None];
                }

                match result {
                    Ok(ticket) => {
                        if let Some(detail) = &state.detail {
                            let receipt = Receipt::compose(detail, &ticket, env.clock.now());
                            state.phase = BookingPhase::Succeeded(receipt);
                        } else {
                            // The server committed; without the detail we
                            // cannot render a receipt, so surface it via
                            // the ticket list instead.
                            warn!(ticket_id = %ticket.ticket_id, "bus detail missing at settlement");
                            state.phase = BookingPhase::Idle;
                        }
                    },
                    Err(error) => {
                        state.phase = BookingPhase::Idle;
                        state.push_notice(Notice::BookingFailed {
                            reason: error.to_string(),
                        });
                        // Selection is preserved for a retry.
                        note_auth_failure(state, &error);
                    },
                }
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════
            // Receipt
            // ═══════════════════════════════════════════════════════════
            BookingAction::DismissReceipt => {
                if !matches!(state.phase, BookingPhase::Succeeded(_)) {
                    return smallvec![Effect::None];
                }
                state.phase = BookingPhase::Idle;
                state.selection.clear();
                state.viewing = None;
                state.detail = None;
                state.detail_error = None;
                state.navigation = Some(NavTarget::Home);
                smallvec![Effect::None]
            },

            _ => smallvec![Effect::None],
        }
    }
}
