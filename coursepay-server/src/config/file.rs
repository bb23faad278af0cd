//! TOML file configuration structures.
//!
//! These structs directly map to the `coursepay-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    pub gateway: GatewaySection,
    #[serde(default)]
    pub checkout: CheckoutSection,
    pub admin: AdminSection,
    #[serde(default)]
    pub log: LogSection,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("valid default address")
}

/// Payment gateway section. The HTTP client is built from this at
/// startup; changes here require a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySection {
    /// Gateway secret key (bearer auth + webhook HMAC).
    pub secret_key: String,
    /// Gateway API root.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Default post-payment redirect target.
    pub callback_url: String,
    /// ISO currency code all charges use.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Upper bound in seconds on a client-path verify call.
    #[serde(default = "default_verify_timeout_secs")]
    pub verify_timeout_secs: u64,
}

fn default_base_url() -> String {
    coursepay_core::gateway::paystack::LIVE_BASE_URL.to_string()
}

fn default_currency() -> String {
    "NGN".to_string()
}

fn default_verify_timeout_secs() -> u64 {
    20
}

/// Checkout policy section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutSection {
    /// Origins a client-supplied redirect URL may point to.
    #[serde(default)]
    pub allowed_redirect_origins: Vec<String>,
}

/// Admin configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSection {
    /// The admin secret. If this is plaintext (doesn't start with
    /// `$argon2`), it will be hashed and the config file rewritten.
    pub secret: String,
}

/// Logging section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogSection {
    /// Emit JSON-formatted log lines instead of human-readable ones.
    #[serde(default)]
    pub json: bool,
}

impl FileConfig {
    /// Check if the admin secret is already hashed (argon2 format).
    pub fn is_admin_secret_hashed(&self) -> bool {
        self.admin.secret.starts_with("$argon2")
    }
}
