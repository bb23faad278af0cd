//! Configuration module for coursepay-server.
//!
//! Handles loading configuration from the TOML file, CLI arguments,
//! and environment variables. Also handles admin secret hashing.

pub mod file;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use coursepay_core::config::{AdminConfig, CheckoutConfig, GatewayConfig, SharedConfig};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::file::FileConfig;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("password hashing error: {0}")]
    Hash(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub listen: SocketAddr,
    pub gateway: GatewayConfig,
    pub checkout: CheckoutConfig,
    pub admin: AdminConfig,
    pub log_json: bool,
}

impl LoadedConfig {
    /// Convert the reloadable sections into a SharedConfig.
    ///
    /// The gateway and log sections are consumed at startup and are not
    /// part of the shared state.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig {
            checkout: Arc::new(RwLock::new(self.checkout)),
            admin: Arc::new(RwLock::new(self.admin)),
        }
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Hash the admin secret if it's plaintext (and rewrite the file)
    /// 5. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        validate(&file_config)?;

        let secret_hash = if file_config.is_admin_secret_hashed() {
            file_config.admin.secret.clone()
        } else {
            let hash = hash_secret(&file_config.admin.secret)?;
            file_config.admin.secret = hash.clone();
            self.rewrite_config(&file_config)?;
            tracing::info!("Admin secret hashed and config file updated");
            hash
        };

        Ok(LoadedConfig {
            listen: file_config.server.listen,
            gateway: GatewayConfig {
                secret_key: file_config.gateway.secret_key,
                base_url: file_config.gateway.base_url,
                callback_url: file_config.gateway.callback_url,
                currency: file_config.gateway.currency,
                verify_timeout_secs: file_config.gateway.verify_timeout_secs,
            },
            checkout: CheckoutConfig {
                allowed_redirect_origins: file_config.checkout.allowed_redirect_origins,
            },
            admin: AdminConfig::new(secret_hash),
            log_json: file_config.log.json,
        })
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.gateway.secret_key.trim().is_empty() {
        return Err(ConfigError::Validation(
            "gateway.secret_key must not be empty".to_string(),
        ));
    }
    if url::Url::parse(&config.gateway.base_url).is_err() {
        return Err(ConfigError::Validation(format!(
            "gateway.base_url is not a valid URL: {}",
            config.gateway.base_url
        )));
    }
    if url::Url::parse(&config.gateway.callback_url).is_err() {
        return Err(ConfigError::Validation(format!(
            "gateway.callback_url is not a valid URL: {}",
            config.gateway.callback_url
        )));
    }
    for origin in &config.checkout.allowed_redirect_origins {
        if url::Url::parse(origin).is_err() {
            return Err(ConfigError::Validation(format!(
                "checkout.allowed_redirect_origins entry is not a valid URL: {origin}"
            )));
        }
    }
    if config.admin.secret.trim().is_empty() {
        return Err(ConfigError::Validation(
            "admin.secret must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn hash_secret(plaintext: &str) -> Result<String, ConfigError> {
    use argon2::{
        Argon2, PasswordHasher,
        password_hash::{SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ConfigError::Hash(e.to_string()))
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}
