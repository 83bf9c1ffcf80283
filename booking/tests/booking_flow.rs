//! End-to-end booking flows through the store runtime.
//!
//! These tests drive the full reducer stack with mock providers: actions
//! go in, effects run on the runtime, and feedback actions settle into
//! state exactly as they would in the app shell.

use busway_booking::mocks::MockApi;
use busway_booking::providers::memory::MemoryTokenStore;
use busway_booking::providers::TokenStore;
use busway_booking::{
    BookingAction, BookingEnvironment, BookingError, BookingGateway, BookingPhase, BookingReducer,
    BookingState, BusDetail, BusId, Identity, NavTarget, Notice, Seat, SeatId, SeatMap,
    SessionManager, Ticket,
};
use busway_runtime::Store;
use busway_testing::FixedClock;
use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;

type TestEnv = BookingEnvironment<MemoryTokenStore, MockApi, MockApi, FixedClock>;
type TestStore = Store<
    BookingState,
    BookingAction,
    TestEnv,
    BookingReducer<MemoryTokenStore, MockApi, MockApi, FixedClock>,
>;

const WAIT: Duration = Duration::from_secs(2);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn test_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

fn new_store(api: MockApi, tokens: MemoryTokenStore) -> TestStore {
    let session = SessionManager::new(tokens, api.clone());
    let gateway = BookingGateway::new(api, session);
    let env = BookingEnvironment::new(gateway, FixedClock::new(test_time()));
    Store::new(BookingState::default(), BookingReducer::new(), env)
}

fn detail(bus_id: &str, seats: &[(u32, bool)]) -> BusDetail {
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

fn ticket(seats: &[u32]) -> Ticket {
    Ticket {
        ticket_id: "T1".to_string(),
        pnr: "PNR1".to_string(),
        seat_ids: seats.iter().copied().map(SeatId).collect(),
        fare: 900,
        bus_id: BusId::from("B1"),
        date: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        status: Some("Upcoming".to_string()),
    }
}

async fn open_bus(store: &TestStore, bus_id: &str) {
    store
        .send_and_wait_for(
            BookingAction::OpenBus {
                bus_id: BusId::from(bus_id),
            },
            |action| matches!(action, BookingAction::DetailLoaded { .. }),
            WAIT,
        )
        .await
        .unwrap();
    store.drain(WAIT).await.unwrap();
}

async fn pay_and_settle(store: &TestStore) {
    store
        .send_and_wait_for(
            BookingAction::Pay,
            |action| matches!(action, BookingAction::BookingSettled { .. }),
            WAIT,
        )
        .await
        .unwrap();
    store.drain(WAIT).await.unwrap();
}

#[tokio::test]
async fn guest_books_seats_end_to_end() {
    init_tracing();
    let api = MockApi::new();
    api.push_detail("B1", Ok(detail("B1", &[(3, false), (4, false)]))).await;
    api.push_book(Ok(ticket(&[3, 4]))).await;
    let store = new_store(api.clone(), MemoryTokenStore::new());

    store
        .send(BookingAction::SubmitGuestEmail {
            email: "a@b.com".to_string(),
        })
        .await
        .unwrap();
    store.drain(WAIT).await.unwrap();

    open_bus(&store, "B1").await;
    store
        .send(BookingAction::ToggleSeat { seat_id: SeatId(3) })
        .await
        .unwrap();
    store
        .send(BookingAction::ToggleSeat { seat_id: SeatId(4) })
        .await
        .unwrap();
    pay_and_settle(&store).await;

    let state = store.state().await;
    let BookingPhase::Succeeded(receipt) = &state.phase else {
        panic!("expected a receipt, got {:?}", state.phase);
    };
    assert_eq!(receipt.pnr, "PNR1");
    assert_eq!(receipt.seats, vec![SeatId(3), SeatId(4)]);
    assert_eq!(receipt.booked_at, test_time());
    assert_eq!(receipt.from, "Pune");
    assert_eq!(receipt.to, "Mumbai");

    let request = api.last_book_request().await.unwrap();
    assert_eq!(request.guest_email.as_deref(), Some("a@b.com"));
    assert_eq!(request.seat_ids, vec![SeatId(3), SeatId(4)]);

    store.send(BookingAction::DismissReceipt).await.unwrap();
    let state = store.state().await;
    assert!(matches!(state.phase, BookingPhase::Idle));
    assert!(state.selection.is_empty());
    assert_eq!(state.viewing, None);
    assert_eq!(state.navigation, Some(NavTarget::Home));
}

#[tokio::test]
async fn rejected_token_is_refreshed_and_the_booking_retried_once() {
    init_tracing();
    let tokens = MemoryTokenStore::new();
    tokens.store_login("a1", "r1", "u1").await.unwrap();

    let api = MockApi::new();
    api.push_detail("B1", Ok(detail("B1", &[(3, false)]))).await;
    api.push_book(Err(BookingError::Unauthorized)).await;
    api.push_refresh(Ok(busway_booking::providers::RefreshResponse {
        access_token: "a2".to_string(),
    }))
    .await;
    api.push_book(Ok(ticket(&[3]))).await;

    let store = new_store(api.clone(), tokens);
    store
        .send_and_wait_for(
            BookingAction::RestoreSession,
            |action| matches!(action, BookingAction::IdentityRestored { .. }),
            WAIT,
        )
        .await
        .unwrap();
    store.drain(WAIT).await.unwrap();
    assert_eq!(
        store.state().await.identity,
        Identity::Authenticated {
            user_id: "u1".to_string()
        }
    );

    open_bus(&store, "B1").await;
    store
        .send(BookingAction::ToggleSeat { seat_id: SeatId(3) })
        .await
        .unwrap();
    pay_and_settle(&store).await;

    let state = store.state().await;
    assert!(matches!(state.phase, BookingPhase::Succeeded(_)));
    assert_eq!(api.refresh_calls().await, 1);
    assert_eq!(
        api.book_tokens().await,
        vec![Some("a1".to_string()), Some("a2".to_string())]
    );

    // An authenticated booking never carries guest fields.
    let request = api.last_book_request().await.unwrap();
    assert_eq!(request.guest_email, None);
    assert_eq!(request.guest_name, None);
}

#[tokio::test]
async fn expired_session_logs_out_and_returns_to_login() {
    init_tracing();
    let tokens = MemoryTokenStore::new();
    tokens.store_login("a1", "r1", "u1").await.unwrap();

    let api = MockApi::new();
    api.push_user_tickets(Err(BookingError::Unauthorized)).await;
    api.push_refresh(Err(BookingError::Unauthorized)).await;

    let store = new_store(api.clone(), tokens.clone());
    store
        .send_and_wait_for(
            BookingAction::RestoreSession,
            |action| matches!(action, BookingAction::IdentityRestored { .. }),
            WAIT,
        )
        .await
        .unwrap();
    store.drain(WAIT).await.unwrap();

    store
        .send_and_wait_for(
            BookingAction::LoadTickets,
            |action| matches!(action, BookingAction::TicketsLoaded { .. }),
            WAIT,
        )
        .await
        .unwrap();
    store.drain(WAIT).await.unwrap();

    let state = store.state().await;
    assert_eq!(state.identity, Identity::Anonymous);
    assert_eq!(state.navigation, Some(NavTarget::Login));
    assert_eq!(state.tickets_error, Some(BookingError::Unauthorized));
    assert_eq!(tokens.refresh_token().await.unwrap(), None);
    assert_eq!(tokens.access_token().await.unwrap(), None);
}

#[tokio::test]
async fn stale_seats_are_dropped_before_submission() {
    init_tracing();
    let api = MockApi::new();
    api.push_detail("B1", Ok(detail("B1", &[(3, false), (4, false)]))).await;
    // The refetch on refocus reports seat 3 as taken.
    api.push_detail("B1", Ok(detail("B1", &[(3, true), (4, false)]))).await;
    api.push_book(Ok(ticket(&[4]))).await;

    let store = new_store(api.clone(), MemoryTokenStore::new());
    store
        .send(BookingAction::SubmitGuestEmail {
            email: "a@b.com".to_string(),
        })
        .await
        .unwrap();
    store.drain(WAIT).await.unwrap();

    open_bus(&store, "B1").await;
    store
        .send(BookingAction::ToggleSeat { seat_id: SeatId(3) })
        .await
        .unwrap();
    store
        .send(BookingAction::ToggleSeat { seat_id: SeatId(4) })
        .await
        .unwrap();

    store
        .send_and_wait_for(
            BookingAction::RefocusBus,
            |action| matches!(action, BookingAction::DetailLoaded { .. }),
            WAIT,
        )
        .await
        .unwrap();
    store.drain(WAIT).await.unwrap();

    let state = store.state().await;
    assert_eq!(state.selection.seat_ids(), &[SeatId(4)]);
    assert!(state.notices.contains(&Notice::SeatsNoLongerAvailable {
        dropped: vec![SeatId(3)]
    }));

    pay_and_settle(&store).await;
    let request = api.last_book_request().await.unwrap();
    assert_eq!(request.seat_ids, vec![SeatId(4)]);
    assert!(matches!(
        store.state().await.phase,
        BookingPhase::Succeeded(_)
    ));
}

#[tokio::test]
async fn anonymous_ticket_load_never_reaches_the_network() {
    init_tracing();
    let api = MockApi::new();
    let store = new_store(api.clone(), MemoryTokenStore::new());

    store.send(BookingAction::LoadTickets).await.unwrap();
    store.drain(WAIT).await.unwrap();

    let state = store.state().await;
    assert_eq!(state.notices, vec![Notice::EmailRequired]);
    assert_eq!(api.user_ticket_calls().await, 0);
    assert_eq!(api.guest_ticket_calls().await, 0);
}

#[tokio::test]
async fn guest_ticket_load_queries_by_email() {
    init_tracing();
    let api = MockApi::new();
    api.push_guest_tickets(Ok(vec![ticket(&[3])])).await;

    let store = new_store(api.clone(), MemoryTokenStore::new());
    store
        .send(BookingAction::SubmitGuestEmail {
            email: "a@b.com".to_string(),
        })
        .await
        .unwrap();
    store.drain(WAIT).await.unwrap();

    store
        .send_and_wait_for(
            BookingAction::LoadTickets,
            |action| matches!(action, BookingAction::TicketsLoaded { .. }),
            WAIT,
        )
        .await
        .unwrap();
    store.drain(WAIT).await.unwrap();

    let state = store.state().await;
    assert_eq!(state.tickets.len(), 1);
    assert_eq!(
        api.last_guest_ticket_email().await.as_deref(),
        Some("a@b.com")
    );
}

#[tokio::test]
async fn switching_buses_keeps_only_the_latest_detail() {
    init_tracing();
    let api = MockApi::new();
    api.set_detail_delay(Duration::from_millis(20)).await;
    api.push_detail("B1", Ok(detail("B1", &[(1, false)]))).await;
    api.push_detail("B2", Ok(detail("B2", &[(2, false)]))).await;

    let store = new_store(api.clone(), MemoryTokenStore::new());
    store
        .send(BookingAction::OpenBus {
            bus_id: BusId::from("B1"),
        })
        .await
        .unwrap();
    store
        .send(BookingAction::OpenBus {
            bus_id: BusId::from("B2"),
        })
        .await
        .unwrap();
    store.drain(WAIT).await.unwrap();

    let state = store.state().await;
    assert_eq!(api.detail_calls().await, 2);
    assert_eq!(state.viewing, Some(BusId::from("B2")));
    assert_eq!(
        state.detail.map(|detail| detail.bus_id),
        Some(BusId::from("B2"))
    );
}

#[tokio::test]
async fn failed_booking_preserves_the_selection() {
    init_tracing();
    let api = MockApi::new();
    api.push_detail("B1", Ok(detail("B1", &[(3, false)]))).await;
    api.push_book(Err(BookingError::Application("sold out".to_string())))
        .await;

    let store = new_store(api.clone(), MemoryTokenStore::new());
    store
        .send(BookingAction::SubmitGuestEmail {
            email: "a@b.com".to_string(),
        })
        .await
        .unwrap();
    store.drain(WAIT).await.unwrap();

    open_bus(&store, "B1").await;
    store
        .send(BookingAction::ToggleSeat { seat_id: SeatId(3) })
        .await
        .unwrap();
    pay_and_settle(&store).await;

    let state = store.state().await;
    assert!(matches!(state.phase, BookingPhase::Idle));
    assert_eq!(state.selection.seat_ids(), &[SeatId(3)]);
    assert!(
        state
            .notices
            .iter()
            .any(|notice| matches!(notice, Notice::BookingFailed { .. }))
    );
}
