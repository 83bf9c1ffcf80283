//! Provider traits for the booking core.
//!
//! Providers abstract the effectful edges: credential storage and the
//! booking service's HTTP endpoints. Production code wires
//! [`MemoryTokenStore`](memory::MemoryTokenStore) (or a keychain-backed
//! store) and [`HttpApi`](http::HttpApi); tests wire mocks.

pub mod http;
pub mod memory;

use crate::error::Result;
use crate::state::{BookingRequest, BusDetail, BusId, BusSummary, SearchQuery, Ticket, UserProfile};

/// Response to a successful login exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    /// Short-lived access token.
    pub access_token: String,

    /// Long-lived refresh token.
    pub refresh_token: String,

    /// Profile of the logged-in user.
    pub user: UserProfile,
}

/// Response to a successful token refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshResponse {
    /// The rotated access token.
    pub access_token: String,
}

/// Persistent credential store.
///
/// Backed by the platform key-value store on device. All writes are
/// visible to subsequent reads within the same process; [`clear`] wipes
/// every credential atomically so a half-logged-out state is never
/// observable.
///
/// [`clear`]: TokenStore::clear
pub trait TokenStore: Send + Sync {
    /// The stored access token, if any.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Storage`](crate::BookingError::Storage) if
    /// the underlying store fails.
    fn access_token(&self) -> impl std::future::Future<Output = Result<Option<String>>> + Send;

    /// The stored refresh token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    fn refresh_token(&self) -> impl std::future::Future<Output = Result<Option<String>>> + Send;

    /// The stored guest email, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    fn guest_email(&self) -> impl std::future::Future<Output = Result<Option<String>>> + Send;

    /// The stored user id, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    fn user_id(&self) -> impl std::future::Future<Output = Result<Option<String>>> + Send;

    /// Persist the full credential set from a login.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    fn store_login(
        &self,
        access_token: &str,
        refresh_token: &str,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Replace only the access token (refresh rotation).
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    fn store_access_token(
        &self,
        access_token: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Persist the guest email.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    fn store_guest_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Wipe all stored credentials in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    fn clear(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Authentication endpoints of the booking service.
pub trait AuthApi: Send + Sync {
    /// Exchange a Google id token for service tokens and a profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange is rejected or the service is
    /// unreachable.
    fn login(
        &self,
        id_token: &str,
    ) -> impl std::future::Future<Output = Result<LoginResponse>> + Send;

    /// Exchange a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh token is rejected or the service is
    /// unreachable.
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl std::future::Future<Output = Result<RefreshResponse>> + Send;
}

/// Booking endpoints of the booking service.
///
/// Every method takes the access token to attach, if any. Attaching is
/// the caller's decision; this trait is pure transport.
pub trait BusApi: Send + Sync {
    /// Search buses for a route and date.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn search_buses(
        &self,
        query: &SearchQuery,
        access_token: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Vec<BusSummary>>> + Send;

    /// Fetch a bus's detail, including its seat map snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn fetch_bus_details(
        &self,
        bus_id: &BusId,
        access_token: Option<&str>,
    ) -> impl std::future::Future<Output = Result<BusDetail>> + Send;

    /// Submit a booking request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the booking is rejected.
    fn book_ticket(
        &self,
        request: &BookingRequest,
        access_token: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Ticket>> + Send;

    /// Fetch the authenticated user's tickets.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn user_tickets(
        &self,
        access_token: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Vec<Ticket>>> + Send;

    /// Fetch tickets booked under a guest email.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn guest_tickets(
        &self,
        email: &str,
        access_token: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Vec<Ticket>>> + Send;
}
