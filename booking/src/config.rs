//! Configuration for the booking gateway.

use std::time::Duration;

/// Gateway configuration.
///
/// The base URL is fixed at construction. Pointing at a different service
/// means building a new gateway, never mutating a live one.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the booking service (e.g. `http://localhost:4000`).
    pub base_url: String,

    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl GatewayConfig {
    /// Create a configuration with the given base URL and default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}
