//! Checkout configuration.

/// Checkout policy applied when initializing a payment.
#[derive(Debug, Clone, Default)]
pub struct CheckoutConfig {
    /// Origins a client-supplied redirect URL may point to. A redirect
    /// outside this list falls back to the configured default callback.
    pub allowed_redirect_origins: Vec<String>,
}

impl CheckoutConfig {
    /// Whether a client-supplied redirect URL is allowed.
    pub fn allows_redirect(&self, redirect_url: &str) -> bool {
        let Ok(parsed) = url::Url::parse(redirect_url) else {
            return false;
        };
        let origin = parsed.origin().unicode_serialization();
        self.allowed_redirect_origins
            .iter()
            .any(|allowed| allowed == &origin)
    }
}
