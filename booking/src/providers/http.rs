//! HTTP transport for the booking service.
//!
//! Wire types mirror the service's JSON shapes (camelCase fields, `_id`
//! identifiers, single-key envelopes) and are converted to domain types at
//! this boundary so the rest of the crate never sees them.

use crate::config::GatewayConfig;
use crate::error::{BookingError, Result};
use crate::providers::{AuthApi, BusApi, LoginResponse, RefreshResponse};
use crate::state::{
    BookingRequest, BusDetail, BusId, BusSummary, SearchQuery, Seat, SeatId, SeatMap, Ticket,
    UserProfile,
};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// HTTP client for the booking service.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl HttpApi {
    /// Create a client for the configured service.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> Result<T> {
        let mut request = self
            .client
            .get(self.url(path))
            .timeout(self.config.request_timeout);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|error| BookingError::Network(error.to_string()))?;
        decode(check(response).await?).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<T> {
        let mut request = self
            .client
            .post(self.url(path))
            .timeout(self.config.request_timeout)
            .json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|error| BookingError::Network(error.to_string()))?;
        decode(check(response).await?).await
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(BookingError::Unauthorized);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BookingError::Application(format!("{status}: {body}")));
    }
    Ok(response)
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    response
        .json::<T>()
        .await
        .map_err(|error| BookingError::Application(format!("malformed response: {error}")))
}

impl AuthApi for HttpApi {
    async fn login(&self, id_token: &str) -> Result<LoginResponse> {
        // Login is the one snake_case body in the protocol.
        let body = LoginBody { id_token };
        let reply: LoginReply = self.post("user/login", &body, None).await?;
        Ok(LoginResponse {
            access_token: reply.access_token,
            refresh_token: reply.refresh_token,
            user: UserProfile {
                user_id: reply.user.id,
                name: reply.user.name,
                email: reply.user.email,
            },
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse> {
        let body = RefreshBody { refresh_token };
        let reply: RefreshReply = self.post("user/refresh", &body, None).await?;
        Ok(RefreshResponse {
            access_token: reply.access_token,
        })
    }
}

impl BusApi for HttpApi {
    async fn search_buses(
        &self,
        query: &SearchQuery,
        access_token: Option<&str>,
    ) -> Result<Vec<BusSummary>> {
        let envelope: DataEnvelope<Vec<WireBusSummary>> =
            self.post("bus/search", query, access_token).await?;
        Ok(envelope.data.into_iter().map(WireBusSummary::into_domain).collect())
    }

    async fn fetch_bus_details(
        &self,
        bus_id: &BusId,
        access_token: Option<&str>,
    ) -> Result<BusDetail> {
        let path = format!("bus/{bus_id}");
        let envelope: DataEnvelope<WireBusDetail> = self.get(&path, access_token).await?;
        Ok(envelope.data.into_domain())
    }

    async fn book_ticket(
        &self,
        request: &BookingRequest,
        access_token: Option<&str>,
    ) -> Result<Ticket> {
        let body = BookBody::from(request);
        let envelope: TicketEnvelope = self.post("ticket/book", &body, access_token).await?;
        Ok(envelope.ticket.into_domain())
    }

    async fn user_tickets(&self, access_token: Option<&str>) -> Result<Vec<Ticket>> {
        let envelope: TicketsEnvelope = self.get("ticket/my-tickets", access_token).await?;
        Ok(envelope.tickets.into_iter().map(WireTicket::into_domain).collect())
    }

    async fn guest_tickets(
        &self,
        email: &str,
        access_token: Option<&str>,
    ) -> Result<Vec<Ticket>> {
        let path = format!("ticket/guest-tickets?email={}", urlencoding::encode(email));
        let envelope: TicketsEnvelope = self.get(&path, access_token).await?;
        Ok(envelope.tickets.into_iter().map(WireTicket::into_domain).collect())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Wire Types
// ═══════════════════════════════════════════════════════════════════════

#[derive(Serialize)]
struct LoginBody<'a> {
    id_token: &'a str,
}

#[derive(Serialize)]
struct RefreshBody<'a> {
    #[serde(rename = "refreshToken")]
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct LoginReply {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(rename = "refreshToken")]
    refresh_token: String,
    user: WireUser,
}

#[derive(Deserialize)]
struct WireUser {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct RefreshReply {
    #[serde(rename = "accessToken")]
    access_token: String,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct TicketEnvelope {
    ticket: WireTicket,
}

#[derive(Deserialize)]
struct TicketsEnvelope {
    tickets: Vec<WireTicket>,
}

#[derive(Deserialize)]
struct WireBusSummary {
    #[serde(rename = "_id")]
    id: String,
    company: String,
    from: String,
    to: String,
    #[serde(rename = "departureTime")]
    departure_time: DateTime<Utc>,
    #[serde(rename = "arrivalTime")]
    arrival_time: DateTime<Utc>,
    price: u32,
    #[serde(default)]
    rating: Option<f32>,
}

impl WireBusSummary {
    fn into_domain(self) -> BusSummary {
        BusSummary {
            bus_id: BusId(self.id),
            company: self.company,
            from: self.from,
            to: self.to,
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            price: self.price,
            rating: self.rating,
        }
    }
}

#[derive(Deserialize)]
struct WireBusDetail {
    #[serde(rename = "_id")]
    id: String,
    company: String,
    #[serde(rename = "busType")]
    bus_type: String,
    from: String,
    to: String,
    #[serde(rename = "departureTime")]
    departure_time: DateTime<Utc>,
    #[serde(rename = "arrivalTime")]
    arrival_time: DateTime<Utc>,
    price: u32,
    #[serde(rename = "originalPrice", default)]
    original_price: Option<u32>,
    #[serde(default)]
    rating: Option<f32>,
    #[serde(rename = "totalReviews", default)]
    total_reviews: Option<u32>,
    #[serde(default)]
    badges: Vec<String>,
    #[serde(default)]
    seats: Vec<Vec<WireSeat>>,
}

impl WireBusDetail {
    fn into_domain(self) -> BusDetail {
        BusDetail {
            bus_id: BusId(self.id),
            company: self.company,
            bus_type: self.bus_type,
            from: self.from,
            to: self.to,
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            price: self.price,
            original_price: self.original_price,
            rating: self.rating,
            total_reviews: self.total_reviews,
            badges: self.badges,
            seat_map: SeatMap {
                rows: self
                    .seats
                    .into_iter()
                    .map(|row| row.into_iter().map(WireSeat::into_domain).collect())
                    .collect(),
            },
        }
    }
}

#[derive(Deserialize)]
struct WireSeat {
    #[serde(alias = "seat_id")]
    id: u32,
    #[serde(default)]
    booked: bool,
    #[serde(rename = "type", default)]
    tier: Option<String>,
}

impl WireSeat {
    fn into_domain(self) -> Seat {
        Seat {
            id: SeatId(self.id),
            booked: self.booked,
            tier: self.tier,
        }
    }
}

#[derive(Serialize)]
struct BookBody<'a> {
    #[serde(rename = "busId")]
    bus_id: &'a str,
    date: DateTime<Utc>,
    #[serde(rename = "seatNumbers")]
    seat_numbers: &'a [SeatId],
    #[serde(rename = "guestName", skip_serializing_if = "Option::is_none")]
    guest_name: Option<&'a str>,
    #[serde(rename = "guestEmail", skip_serializing_if = "Option::is_none")]
    guest_email: Option<&'a str>,
}

impl<'a> From<&'a BookingRequest> for BookBody<'a> {
    fn from(request: &'a BookingRequest) -> Self {
        Self {
            bus_id: &request.bus_id.0,
            date: request.date,
            seat_numbers: &request.seat_ids,
            guest_name: request.guest_name.as_deref(),
            guest_email: request.guest_email.as_deref(),
        }
    }
}

#[derive(Deserialize)]
struct WireTicket {
    #[serde(rename = "_id")]
    id: String,
    pnr: String,
    #[serde(rename = "seatNumbers", default)]
    seat_numbers: Vec<u32>,
    #[serde(default)]
    fare: u32,
    #[serde(rename = "busId")]
    bus_id: String,
    date: DateTime<Utc>,
    #[serde(default)]
    status: Option<String>,
}

impl WireTicket {
    fn into_domain(self) -> Ticket {
        Ticket {
            ticket_id: self.id,
            pnr: self.pnr,
            seat_ids: self.seat_numbers.into_iter().map(SeatId).collect(),
            fare: self.fare,
            bus_id: BusId(self.bus_id),
            date: self.date,
            status: self.status,
        }
    }
}
