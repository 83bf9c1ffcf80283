//! Scripted mock of the booking service.

use crate::error::{BookingError, Result};
use crate::providers::{AuthApi, BusApi, LoginResponse, RefreshResponse};
use crate::state::{BookingRequest, BusDetail, BusId, BusSummary, SearchQuery, Ticket};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Inner {
    login_results: VecDeque<Result<LoginResponse>>,
    refresh_results: VecDeque<Result<RefreshResponse>>,
    search_results: VecDeque<Result<Vec<BusSummary>>>,
    // Keyed by bus id so concurrent fetches cannot steal each other's
    // scripted response.
    detail_results: HashMap<String, VecDeque<Result<BusDetail>>>,
    book_results: VecDeque<Result<Ticket>>,
    user_ticket_results: VecDeque<Result<Vec<Ticket>>>,
    guest_ticket_results: VecDeque<Result<Vec<Ticket>>>,

    login_calls: usize,
    refresh_calls: usize,
    search_calls: usize,
    detail_calls: usize,
    book_calls: usize,
    user_ticket_calls: usize,
    guest_ticket_calls: usize,

    refresh_delay: Duration,
    detail_delay: Duration,

    last_book_request: Option<BookingRequest>,
    book_tokens: Vec<Option<String>>,
    last_guest_ticket_email: Option<String>,
}

/// Mock implementation of [`AuthApi`] and [`BusApi`].
///
/// Responses are scripted with the `push_*` methods and consumed in FIFO
/// order; an unscripted call fails with an `Application` error. Call
/// counts and request captures allow asserting on what reached the
/// network.
#[derive(Debug, Clone, Default)]
pub struct MockApi {
    inner: Arc<Mutex<Inner>>,
}

impl MockApi {
    /// Create a mock with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn unscripted(endpoint: &str) -> BookingError {
        BookingError::Application(format!("unscripted mock call: {endpoint}"))
    }

    /// Script the next login response.
    pub async fn push_login(&self, result: Result<LoginResponse>) {
        self.inner.lock().await.login_results.push_back(result);
    }

    /// Script the next refresh response.
    pub async fn push_refresh(&self, result: Result<RefreshResponse>) {
        self.inner.lock().await.refresh_results.push_back(result);
    }

    /// Script the next search response.
    pub async fn push_search(&self, result: Result<Vec<BusSummary>>) {
        self.inner.lock().await.search_results.push_back(result);
    }

    /// Script the next bus-detail response for the given bus.
    pub async fn push_detail(&self, bus_id: &str, result: Result<BusDetail>) {
        self.inner
            .lock()
            .await
            .detail_results
            .entry(bus_id.to_string())
            .or_default()
            .push_back(result);
    }

    /// Script the next booking response.
    pub async fn push_book(&self, result: Result<Ticket>) {
        self.inner.lock().await.book_results.push_back(result);
    }

    /// Script the next user-tickets response.
    pub async fn push_user_tickets(&self, result: Result<Vec<Ticket>>) {
        self.inner.lock().await.user_ticket_results.push_back(result);
    }

    /// Script the next guest-tickets response.
    pub async fn push_guest_tickets(&self, result: Result<Vec<Ticket>>) {
        self.inner.lock().await.guest_ticket_results.push_back(result);
    }

    /// Delay every refresh call, for exercising in-flight coalescing.
    pub async fn set_refresh_delay(&self, delay: Duration) {
        self.inner.lock().await.refresh_delay = delay;
    }

    /// Delay every bus-detail call, for exercising superseded responses.
    pub async fn set_detail_delay(&self, delay: Duration) {
        self.inner.lock().await.detail_delay = delay;
    }

    /// Number of refresh calls made.
    pub async fn refresh_calls(&self) -> usize {
        self.inner.lock().await.refresh_calls
    }

    /// Number of login calls made.
    pub async fn login_calls(&self) -> usize {
        self.inner.lock().await.login_calls
    }

    /// Number of search calls made.
    pub async fn search_calls(&self) -> usize {
        self.inner.lock().await.search_calls
    }

    /// Number of bus-detail calls made.
    pub async fn detail_calls(&self) -> usize {
        self.inner.lock().await.detail_calls
    }

    /// Number of booking calls made.
    pub async fn book_calls(&self) -> usize {
        self.inner.lock().await.book_calls
    }

    /// Number of user-tickets calls made.
    pub async fn user_ticket_calls(&self) -> usize {
        self.inner.lock().await.user_ticket_calls
    }

    /// Number of guest-tickets calls made.
    pub async fn guest_ticket_calls(&self) -> usize {
        self.inner.lock().await.guest_ticket_calls
    }

    /// The last booking request that reached the service.
    pub async fn last_book_request(&self) -> Option<BookingRequest> {
        self.inner.lock().await.last_book_request.clone()
    }

    /// Access tokens attached to each booking call, in order.
    pub async fn book_tokens(&self) -> Vec<Option<String>> {
        self.inner.lock().await.book_tokens.clone()
    }

    /// The email sent with the last guest-tickets call.
    pub async fn last_guest_ticket_email(&self) -> Option<String> {
        self.inner.lock().await.last_guest_ticket_email.clone()
    }
}

impl AuthApi for MockApi {
    async fn login(&self, _id_token: &str) -> Result<LoginResponse> {
        let mut inner = self.inner.lock().await;
        inner.login_calls += 1;
        inner
            .login_results
            .pop_front()
            .unwrap_or_else(|| Err(Self::unscripted("login")))
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<RefreshResponse> {
        let delay = {
            let mut inner = self.inner.lock().await;
            inner.refresh_calls += 1;
            inner.refresh_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut inner = self.inner.lock().await;
        inner
            .refresh_results
            .pop_front()
            .unwrap_or_else(|| Err(Self::unscripted("refresh")))
    }
}

impl BusApi for MockApi {
    async fn search_buses(
        &self,
        _query: &SearchQuery,
        _access_token: Option<&str>,
    ) -> Result<Vec<BusSummary>> {
        let mut inner = self.inner.lock().await;
        inner.search_calls += 1;
        inner
            .search_results
            .pop_front()
            .unwrap_or_else(|| Err(Self::unscripted("search_buses")))
    }

    async fn fetch_bus_details(
        &self,
        bus_id: &BusId,
        _access_token: Option<&str>,
    ) -> Result<BusDetail> {
        let delay = {
            let mut inner = self.inner.lock().await;
            inner.detail_calls += 1;
            inner.detail_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut inner = self.inner.lock().await;
        inner
            .detail_results
            .get_mut(&bus_id.0)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(Self::unscripted("fetch_bus_details")))
    }

    async fn book_ticket(
        &self,
        request: &BookingRequest,
        access_token: Option<&str>,
    ) -> Result<Ticket> {
        let mut inner = self.inner.lock().await;
        inner.book_calls += 1;
        inner.last_book_request = Some(request.clone());
        inner.book_tokens.push(access_token.map(ToString::to_string));
        inner
            .book_results
            .pop_front()
            .unwrap_or_else(|| Err(Self::unscripted("book_ticket")))
    }

    async fn user_tickets(&self, _access_token: Option<&str>) -> Result<Vec<Ticket>> {
        let mut inner = self.inner.lock().await;
        inner.user_ticket_calls += 1;
        inner
            .user_ticket_results
            .pop_front()
            .unwrap_or_else(|| Err(Self::unscripted("user_tickets")))
    }

    async fn guest_tickets(
        &self,
        email: &str,
        _access_token: Option<&str>,
    ) -> Result<Vec<Ticket>> {
        let mut inner = self.inner.lock().await;
        inner.guest_ticket_calls += 1;
        inner.last_guest_ticket_email = Some(email.to_string());
        inner
            .guest_ticket_results
            .pop_front()
            .unwrap_or_else(|| Err(Self::unscripted("guest_tickets")))
    }
}
