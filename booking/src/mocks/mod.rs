//! Mock providers for testing.
//!
//! Available under the `test-utils` feature (enabled by default) so
//! downstream crates can drive the booking core without a live service.

mod api;

pub use api::MockApi;
