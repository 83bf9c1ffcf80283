//! Environment for the booking reducers.

use crate::config::GatewayConfig;
use crate::gateway::BookingGateway;
use crate::providers::http::HttpApi;
use crate::providers::{AuthApi, BusApi, TokenStore};
use crate::session::SessionManager;
use busway_core::environment::{Clock, SystemClock};
use std::sync::Arc;

/// Dependencies injected into the booking reducers.
///
/// Effects clone the environment into their futures, so everything here
/// is shared and cheap to clone.
#[derive(Debug)]
pub struct BookingEnvironment<T, A, B, C> {
    /// Gateway to the booking service.
    pub gateway: Arc<BookingGateway<T, A, B>>,

    /// Time source, used to stamp receipts.
    pub clock: C,
}

impl<T, A, B, C: Clone> Clone for BookingEnvironment<T, A, B, C> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            clock: self.clock.clone(),
        }
    }
}

impl<T: TokenStore, A: AuthApi, B: BusApi, C: Clock> BookingEnvironment<T, A, B, C> {
    /// Create an environment from a gateway and clock.
    pub fn new(gateway: BookingGateway<T, A, B>, clock: C) -> Self {
        Self {
            gateway: Arc::new(gateway),
            clock,
        }
    }
}

/// Environment wired to the live HTTP transport and system clock.
pub type LiveEnvironment<T> = BookingEnvironment<T, HttpApi, HttpApi, SystemClock>;

impl<T: TokenStore> LiveEnvironment<T> {
    /// Wire a live environment against the configured booking service.
    pub fn live(config: GatewayConfig, store: T) -> Self {
        let api = HttpApi::new(config);
        let session = SessionManager::new(store, api.clone());
        Self::new(BookingGateway::new(api, session), SystemClock)
    }
}
