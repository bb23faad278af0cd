//! Runtime configuration types.
//!
//! These are the validated, in-memory forms consumed by the core flows and
//! the server. Parsing the TOML file, hashing the admin secret and applying
//! CLI overrides all happen in the server crate.

mod admin;
mod checkout;
mod gateway;

pub use admin::AdminConfig;
pub use checkout::CheckoutConfig;
pub use gateway::GatewayConfig;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Configuration sections that can be swapped at runtime (SIGHUP reload),
/// each behind its own lock so readers of one section never contend with
/// writers of another.
///
/// The gateway section is deliberately absent: the HTTP client is built
/// from it once at startup, so gateway changes require a restart.
#[derive(Clone)]
pub struct SharedConfig {
    /// Redirect-URL allowlist for checkout initiation.
    pub checkout: Arc<RwLock<CheckoutConfig>>,
    /// Operator authentication for the admin API.
    pub admin: Arc<RwLock<AdminConfig>>,
}
