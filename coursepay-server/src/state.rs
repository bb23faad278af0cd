//! Application state shared across all request handlers.

use std::sync::Arc;
use std::time::Duration;

use coursepay_core::checkout::CheckoutPolicy;
use coursepay_core::config::SharedConfig;
use coursepay_core::gateway::PaymentGateway;
use sqlx::PgPool;

/// Application state shared across all request handlers.
///
/// Cloneable and cheap to pass around; everything mutable is behind Arc.
/// The gateway client is injected here so tests can substitute a fake.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Reloadable configuration sections (SIGHUP).
    pub config: SharedConfig,
    /// Payment gateway client, built once at startup.
    pub gateway: Arc<dyn PaymentGateway>,
    /// Currency all charges are denominated in.
    pub currency: String,
    /// Default post-payment redirect target.
    pub default_callback_url: String,
    /// Bound on client-path gateway verify calls.
    pub verify_timeout: Duration,
}

impl AppState {
    /// Resolve the checkout policy from the current configuration.
    pub async fn checkout_policy(&self) -> CheckoutPolicy {
        CheckoutPolicy {
            currency: self.currency.clone(),
            default_callback_url: self.default_callback_url.clone(),
            redirect: self.config.checkout.read().await.clone(),
        }
    }
}
