//! Booking gateway.
//!
//! [`BookingGateway`] fronts the booking endpoints with token handling: it
//! attaches the stored access token and, on a 401, refreshes through the
//! session manager and retries exactly once. A second 401 surfaces as-is.

use crate::error::{BookingError, Result};
use crate::providers::{AuthApi, BusApi, TokenStore};
use crate::session::SessionManager;
use crate::state::{BookingRequest, BusDetail, BusId, BusSummary, SearchQuery, Ticket};
use tracing::debug;

macro_rules! with_refresh_retry {
    ($self:ident, $token:ident => $call:expr) => {{
        let $token = $self.session.stored_access_token().await?;
        match $call.await {
            Err(BookingError::Unauthorized) => {
                debug!("access token rejected, refreshing");
                if $self.session.refresh_access_token().await.is_err() {
                    // The session already cleared itself; report the
                    // rejection that triggered the refresh.
                    return Err(BookingError::Unauthorized);
                }
                let $token = $self.session.stored_access_token().await?;
                $call.await
            },
            other => other,
        }
    }};
}

/// Typed facade over the booking service.
#[derive(Debug)]
pub struct BookingGateway<T, A, B> {
    api: B,
    session: SessionManager<T, A>,
}

impl<T: TokenStore, A: AuthApi, B: BusApi> BookingGateway<T, A, B> {
    /// Create a gateway over the given transport and session.
    pub const fn new(api: B, session: SessionManager<T, A>) -> Self {
        Self { api, session }
    }

    /// The session manager behind this gateway.
    pub const fn session(&self) -> &SessionManager<T, A> {
        &self.session
    }

    /// Search buses for a route and date.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after the refresh-and-retry
    /// protocol.
    pub async fn search_buses(&self, query: &SearchQuery) -> Result<Vec<BusSummary>> {
        with_refresh_retry!(self, token => self.api.search_buses(query, token.as_deref()))
    }

    /// Fetch a bus's detail and seat map snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after the refresh-and-retry
    /// protocol.
    pub async fn fetch_bus_details(&self, bus_id: &BusId) -> Result<BusDetail> {
        with_refresh_retry!(self, token => self.api.fetch_bus_details(bus_id, token.as_deref()))
    }

    /// Submit a booking request.
    ///
    /// The retry after a refresh re-sends the same request once; the
    /// original attempt was rejected before the server committed anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after the refresh-and-retry
    /// protocol or the booking is rejected.
    pub async fn book_ticket(&self, request: &BookingRequest) -> Result<Ticket> {
        with_refresh_retry!(self, token => self.api.book_ticket(request, token.as_deref()))
    }

    /// Fetch the authenticated user's tickets.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after the refresh-and-retry
    /// protocol.
    pub async fn user_tickets(&self) -> Result<Vec<Ticket>> {
        with_refresh_retry!(self, token => self.api.user_tickets(token.as_deref()))
    }

    /// Fetch tickets booked under a guest email.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after the refresh-and-retry
    /// protocol.
    pub async fn guest_tickets(&self, email: &str) -> Result<Vec<Ticket>> {
        with_refresh_retry!(self, token => self.api.guest_tickets(email, token.as_deref()))
    }
}
