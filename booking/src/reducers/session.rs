//! Session reducer.
//!
//! Handles identity: session restoration, guest identification, Google
//! login, logout, and ticket-list loading. Ticket loading lives here
//! because the endpoint to call is an identity decision.

use crate::actions::BookingAction;
use crate::environment::BookingEnvironment;
use crate::providers::{AuthApi, BusApi, TokenStore};
use crate::reducers::note_auth_failure;
use crate::state::{BookingState, Identity, NavTarget, Notice};
use crate::utils::is_valid_email;
use busway_core::environment::Clock;
use busway_core::{Effects, effect::Effect, reducer::Reducer, smallvec};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

/// Session reducer.
#[derive(Debug, Clone)]
pub struct SessionReducer<T, A, B, C> {
    _phantom: PhantomData<(T, A, B, C)>,
}

impl<T, A, B, C> SessionReducer<T, A, B, C> {
    /// Create a new session reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T, A, B, C> Default for SessionReducer<T, A, B, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A, B, C> Reducer for SessionReducer<T, A, B, C>
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
            // Session Restoration
            // ═══════════════════════════════════════════════════════════
            BookingAction::RestoreSession => {
                let gateway = Arc::clone(&env.gateway);
                smallvec![Effect::future(async move {
                    let identity = match gateway.session().current_identity().await {
                        Ok(identity) => identity,
                        Err(error) => {
                            warn!(%error, "session restore failed");
                            Identity::Anonymous
                        },
                    };
                    Some(BookingAction::IdentityRestored { identity })
                })]
            },

            BookingAction::IdentityRestored { identity } => {
                state.identity = identity;
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════
            // Guest Identification
            // ═══════════════════════════════════════════════════════════
            BookingAction::SubmitGuestEmail { email } => {
                if !is_valid_email(&email) {
                    state.push_notice(Notice::InvalidEmail { email });
                    return smallvec![Effect::None];
                }

                state.identity = Identity::Guest {
                    email: email.clone(),
                };
                let gateway = Arc::clone(&env.gateway);
                smallvec![Effect::future(async move {
                    if let Err(error) = gateway.session().set_guest_email(&email).await {
                        // Identity stays usable for this run even if
                        // persistence failed.
                        warn!(%error, "failed to persist guest email");
                    }
                    None
                })]
            },

            BookingAction::SetGuestName { name } => {
                let name = name.trim().to_string();
                state.guest_name = if name.is_empty() { None } else { Some(name) };
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════
            // Login and Logout
            // ═══════════════════════════════════════════════════════════
            BookingAction::LoginWithGoogle { id_token } => {
                let gateway = Arc::clone(&env.gateway);
                smallvec![Effect::future(async move {
                    match gateway.session().login_with_google(&id_token).await {
                        Ok(user) => Some(BookingAction::LoggedIn { user }),
                        Err(error) => Some(BookingAction::LoginFailed { error }),
                    }
                })]
            },

            BookingAction::LoggedIn { user } => {
                state.identity = Identity::Authenticated {
                    user_id: user.user_id,
                };
                smallvec![Effect::None]
            },

            BookingAction::LoginFailed { error } => {
                state.push_notice(Notice::LoginFailed {
                    reason: error.to_string(),
                });
                smallvec![Effect::None]
            },

            BookingAction::Logout => {
                state.identity = Identity::Anonymous;
                state.tickets.clear();
                state.tickets_error = None;
                state.navigation = Some(NavTarget::Login);

                let gateway = Arc::clone(&env.gateway);
                smallvec![Effect::future(async move {
                    if let Err(error) = gateway.session().logout().await {
                        warn!(%error, "failed to clear credentials");
                    }
                    None
                })]
            },

            // ═══════════════════════════════════════════════════════════
            // Tickets
            // ═══════════════════════════════════════════════════════════
            BookingAction::LoadTickets => match &state.identity {
                Identity::Authenticated { .. } => {
                    let gateway = Arc::clone(&env.gateway);
                    smallvec![Effect::future(async move {
                        let result = gateway.user_tickets().await;
                        Some(BookingAction::TicketsLoaded { result })
                    })]
                },
                Identity::Guest { email } => {
                    let gateway = Arc::clone(&env.gateway);
                    let email = email.clone();
                    smallvec![Effect::future(async move {
                        let result = gateway.guest_tickets(&email).await;
                        Some(BookingAction::TicketsLoaded { result })
                    })]
                },
                // No identity to query with, so no request goes out.
                Identity::Anonymous => {
                    state.push_notice(Notice::EmailRequired);
                    smallvec![Effect::None]
                },
            },

            BookingAction::TicketsLoaded { result } => {
                match result {
                    Ok(tickets) => {
                        state.tickets = tickets;
                        state.tickets_error = None;
                    },
                    Err(error) => {
                        note_auth_failure(state, &error);
                        state.tickets_error = Some(error);
                    },
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
    use crate::reducers::support::env;
    use busway_testing::{ReducerTest, assertions};

    type TestReducer = SessionReducer<
        crate::providers::memory::MemoryTokenStore,
        crate::mocks::MockApi,
        crate::mocks::MockApi,
        busway_core::environment::FixedClock,
    >;

    #[test]
    fn invalid_guest_email_is_rejected_without_effects() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(BookingState::default())
            .when_action(BookingAction::SubmitGuestEmail {
                email: "not-an-email".to_string(),
            })
            .then_state(|state| {
                assert_eq!(state.identity, Identity::Anonymous);
                assert_eq!(
                    state.notices,
                    vec![Notice::InvalidEmail {
                        email: "not-an-email".to_string()
                    }]
                );
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn valid_guest_email_sets_identity_and_persists() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(BookingState::default())
            .when_action(BookingAction::SubmitGuestEmail {
                email: "a@b.com".to_string(),
            })
            .then_state(|state| {
                assert_eq!(
                    state.identity,
                    Identity::Guest {
                        email: "a@b.com".to_string()
                    }
                );
                assert!(state.notices.is_empty());
            })
            .then_effects(|effects| {
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn anonymous_ticket_load_asks_for_email_and_stays_local() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(BookingState::default())
            .when_action(BookingAction::LoadTickets)
            .then_state(|state| {
                assert_eq!(state.notices, vec![Notice::EmailRequired]);
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn guest_ticket_load_emits_a_fetch() {
        let state = BookingState {
            identity: Identity::Guest {
                email: "a@b.com".to_string(),
            },
            ..BookingState::default()
        };

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(BookingAction::LoadTickets)
            .then_effects(|effects| {
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn logout_resets_identity_and_requests_login_screen() {
        let state = BookingState {
            identity: Identity::Authenticated {
                user_id: "u1".to_string(),
            },
            ..BookingState::default()
        };

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(BookingAction::Logout)
            .then_state(|state| {
                assert_eq!(state.identity, Identity::Anonymous);
                assert!(state.tickets.is_empty());
                assert_eq!(state.navigation, Some(NavTarget::Login));
            })
            .then_effects(|effects| {
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn auth_failure_on_ticket_load_drops_to_anonymous() {
        let state = BookingState {
            identity: Identity::Authenticated {
                user_id: "u1".to_string(),
            },
            ..BookingState::default()
        };

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(BookingAction::TicketsLoaded {
                result: Err(BookingError::Unauthorized),
            })
            .then_state(|state| {
                assert_eq!(state.identity, Identity::Anonymous);
                assert_eq!(state.navigation, Some(NavTarget::Login));
                assert_eq!(state.tickets_error, Some(BookingError::Unauthorized));
            })
            .run();
    }

    #[test]
    fn network_failure_on_ticket_load_keeps_identity() {
        let state = BookingState {
            identity: Identity::Guest {
                email: "a@b.com".to_string(),
            },
            ..BookingState::default()
        };

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(BookingAction::TicketsLoaded {
                result: Err(BookingError::Network("down".to_string())),
            })
            .then_state(|state| {
                assert_eq!(
                    state.identity,
                    Identity::Guest {
                        email: "a@b.com".to_string()
                    }
                );
                assert_eq!(state.navigation, None);
            })
            .run();
    }

    #[test]
    fn guest_name_is_trimmed_and_cleared_when_empty() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(BookingState::default())
            .when_action(BookingAction::SetGuestName {
                name: "  Asha  ".to_string(),
            })
            .then_state(|state| {
                assert_eq!(state.guest_name.as_deref(), Some("Asha"));
            })
            .run();

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(BookingState {
                guest_name: Some("Asha".to_string()),
                ..BookingState::default()
            })
            .when_action(BookingAction::SetGuestName {
                name: "   ".to_string(),
            })
            .then_state(|state| {
                assert_eq!(state.guest_name, None);
            })
            .run();
    }
}
