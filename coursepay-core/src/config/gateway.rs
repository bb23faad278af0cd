//! Payment gateway configuration.

use std::time::Duration;

/// Connection settings for the payment gateway.
///
/// The HTTP client is built from this once at startup; changing the
/// gateway section requires a restart.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Secret key for bearer authentication of outbound calls and HMAC
    /// verification of inbound webhooks.
    pub secret_key: String,
    /// API root URL. Points at the live gateway unless overridden for
    /// tests or mocks.
    pub base_url: String,
    /// Default redirect target after payment, used when the client does
    /// not supply one or supplies one outside the allowed origins.
    pub callback_url: String,
    /// ISO currency code all charges are denominated in.
    pub currency: String,
    /// Upper bound on a single client-path verify call. A timeout is
    /// reported as pending, never as a failed payment.
    pub verify_timeout_secs: u64,
}

impl GatewayConfig {
    pub fn verify_timeout(&self) -> Duration {
        Duration::from_secs(self.verify_timeout_secs)
    }
}
