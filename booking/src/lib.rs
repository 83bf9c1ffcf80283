//! # Busway Booking
//!
//! Booking orchestration core for the Busway mobile client.
//!
//! This crate owns everything between the UI and the booking service:
//!
//! - **Session**: token lifecycle with single-flight refresh rotation and
//!   guest identification
//! - **Gateway**: typed HTTP access with refresh-and-retry on rejection
//! - **Seats**: an ordered selection engine over immutable seat map
//!   snapshots
//! - **Orchestrator**: the submission state machine, implemented as
//!   reducers over [`BookingState`]
//!
//! ## Architecture
//!
//! Booking logic is implemented as reducers and effects:
//!
//! ```text
//! Action → Reducer → (State, Effects) → Effect Execution → More Actions
//! ```
//!
//! ## Example: Booking a Seat
//!
//! ```rust,ignore
//! use busway_booking::*;
//!
//! // 1. Open a bus; its detail and seat map are fetched
//! let effects = reducer.reduce(
//!     &mut state,
//!     BookingAction::OpenBus { bus_id: BusId::from("B1") },
//!     &env,
//! );
//!
//! // 2. Pick seats and pay
//! reducer.reduce(&mut state, BookingAction::ToggleSeat { seat_id: SeatId(3) }, &env);
//! let effects = reducer.reduce(&mut state, BookingAction::Pay, &env);
//!
//! // 3. The settlement feeds back and produces a receipt
//! assert!(matches!(state.phase, BookingPhase::Submitting));
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod actions;
pub mod config;
pub mod environment;
pub mod error;
pub mod gateway;
pub mod providers;
pub mod reducers;
pub mod seats;
pub mod session;
pub mod state;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use actions::BookingAction;
pub use config::GatewayConfig;
pub use environment::{BookingEnvironment, LiveEnvironment};
pub use error::{BookingError, Result};
pub use gateway::BookingGateway;
pub use reducers::BookingReducer;
pub use seats::Selection;
pub use session::SessionManager;
pub use state::{
    BookingPhase, BookingState, BusDetail, BusId, BusSummary, Identity, NavTarget, Notice,
    Receipt, SearchQuery, Seat, SeatId, SeatMap, Ticket, UserProfile,
};
