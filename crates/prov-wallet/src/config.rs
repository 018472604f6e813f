//! # Wallet Service Configuration
//!
//! Configuration for the Wallet Service client. The base URL comes from the
//! environment or an optional `config/wallet.toml`.

use prov_core::{ProvisionError, ProvisionResult};
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Default HTTP timeout for Wallet Service calls, in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Wallet Service API configuration
#[derive(Debug, Clone)]
pub struct WalletConfig {
    /// Base URL of the Wallet Service (e.g. "https://wallet.example.com")
    pub base_url: String,

    /// Per-request HTTP timeout in seconds
    pub timeout_secs: u64,
}

/// On-disk shape of `config/wallet.toml`
#[derive(Debug, Deserialize)]
struct WalletConfigFile {
    base_url: String,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

impl WalletConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `WALLET_SERVICE_URL`
    ///
    /// Optional:
    /// - `WALLET_HTTP_TIMEOUT_SECS` (default 30)
    pub fn from_env() -> ProvisionResult<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let base_url = env::var("WALLET_SERVICE_URL").map_err(|_| {
            ProvisionError::Configuration("WALLET_SERVICE_URL not set".to_string())
        })?;

        let timeout_secs = match env::var("WALLET_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().map_err(|_| {
                ProvisionError::Configuration(format!(
                    "WALLET_HTTP_TIMEOUT_SECS is not a number: {}",
                    raw
                ))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Self::new(base_url).map(|config| WalletConfig {
            timeout_secs,
            ..config
        })
    }

    /// Load configuration from `config/wallet.toml`, falling back to the
    /// environment when no file is found.
    pub fn load() -> ProvisionResult<Self> {
        let config_paths = [
            "config/wallet.toml",
            "../config/wallet.toml",
            "../../config/wallet.toml",
        ];

        for path in config_paths {
            if let Ok(content) = std::fs::read_to_string(path) {
                let file: WalletConfigFile = toml::from_str(&content).map_err(|e| {
                    ProvisionError::Configuration(format!("Failed to parse {}: {}", path, e))
                })?;
                tracing::info!("Loaded wallet config from {}", path);
                return Self::new(file.base_url).map(|config| WalletConfig {
                    timeout_secs: file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
                    ..config
                });
            }
        }

        Self::from_env()
    }

    /// Create config with an explicit base URL (for testing)
    pub fn new(base_url: impl Into<String>) -> ProvisionResult<Self> {
        let base_url = base_url.into();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ProvisionError::Configuration(format!(
                "Wallet Service URL must start with http:// or https://: {}",
                base_url
            )));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    /// Builder: override the base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// HTTP timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full URL for an API path (path must start with '/')
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bare_host() {
        let result = WalletConfig::new("wallet.example.com");
        assert!(result.is_err());
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let config = WalletConfig::new("https://wallet.example.com/").unwrap();
        assert_eq!(config.base_url, "https://wallet.example.com");
        assert_eq!(
            config.url("/v1/balance/info"),
            "https://wallet.example.com/v1/balance/info"
        );
    }

    #[test]
    fn test_default_timeout() {
        let config = WalletConfig::new("http://localhost:8080").unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_file_shape_parses() {
        let file: WalletConfigFile =
            toml::from_str("base_url = \"https://wallet.example.com\"\ntimeout_secs = 10\n")
                .unwrap();
        assert_eq!(file.base_url, "https://wallet.example.com");
        assert_eq!(file.timeout_secs, Some(10));
    }
}
