//! # Busway Testing
//!
//! Testing utilities and helpers for the Busway architecture.
//!
//! This crate provides:
//! - A fluent Given-When-Then harness for reducers
//! - Assertion helpers for effect vectors
//! - A deterministic clock re-exported from `busway-core`
//!
//! ## Example
//!
//! ```ignore
//! use busway_testing::ReducerTest;
//!
//! ReducerTest::new(BookingReducer::new())
//!     .with_env(test_environment())
//!     .given_state(BookingState::default())
//!     .when_action(BookingAction::Pay)
//!     .then_state(|state| {
//!         assert_eq!(state.phase, BookingPhase::Submitting);
//!     })
//!     .run();
//! ```


pub use busway_core::environment::FixedClock;
pub use reducer_test::{ReducerTest, assertions};
