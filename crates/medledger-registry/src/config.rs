//! # Registry Configuration
//!
//! Endpoints, fan-out limits and deadlines for the registry core.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default concurrent lookups during a fan-out.
pub const DEFAULT_FANOUT_CONCURRENCY: usize = 8;

/// Default document size limit (10 MiB).
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

/// Registry core configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// JSON-RPC endpoint of the ledger gateway.
    pub ledger_endpoint: String,

    /// Pinning service API base.
    pub blob_api_url: String,

    /// Bearer token for the pinning service.
    #[serde(skip_serializing)]
    pub blob_api_token: Option<String>,

    /// Base URL documents are served from.
    pub gateway_base: String,

    /// Maximum record lookups in flight during a fan-out.
    pub fanout_concurrency: usize,

    /// Deadline for a single ledger read.
    pub lookup_timeout_secs: u64,

    /// Deadline for a mint to reach finality.
    pub mint_timeout_secs: u64,

    /// Deadline for a blob upload.
    pub upload_timeout_secs: u64,

    /// Interval between transaction receipt polls.
    pub receipt_poll_interval_ms: u64,

    /// Where the resolved session is persisted.
    pub session_path: PathBuf,

    /// Add the legacy dashboard offsets to displayed counts.
    pub legacy_metric_offsets: bool,

    /// Largest document accepted by `stage`.
    pub max_document_bytes: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            ledger_endpoint: "http://127.0.0.1:8545".to_string(),
            blob_api_url: "https://api.pinata.cloud".to_string(),
            blob_api_token: None,
            gateway_base: "https://gateway.pinata.cloud/ipfs".to_string(),
            fanout_concurrency: DEFAULT_FANOUT_CONCURRENCY,
            lookup_timeout_secs: 10,
            mint_timeout_secs: 120,
            upload_timeout_secs: 60,
            receipt_poll_interval_ms: 1000,
            session_path: PathBuf::from(".medledger/session.json"),
            legacy_metric_offsets: false,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

impl RegistryConfig {
    /// Create a config for testing (short deadlines, small limits).
    pub fn for_testing() -> Self {
        Self {
            ledger_endpoint: "http://127.0.0.1:18545".to_string(),
            blob_api_url: "http://127.0.0.1:18080".to_string(),
            blob_api_token: Some("test-token".to_string()),
            gateway_base: "https://gateway.test/ipfs".to_string(),
            fanout_concurrency: 4,
            lookup_timeout_secs: 1,
            mint_timeout_secs: 2,
            upload_timeout_secs: 2,
            receipt_poll_interval_ms: 10,
            session_path: PathBuf::from("session.json"),
            legacy_metric_offsets: false,
            max_document_bytes: 1024,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `MEDLEDGER_LEDGER_URL`: Ledger JSON-RPC endpoint
    /// - `MEDLEDGER_BLOB_API_URL`: Pinning service API base
    /// - `MEDLEDGER_BLOB_API_TOKEN`: Pinning service bearer token
    /// - `MEDLEDGER_GATEWAY_BASE`: Document gateway base URL
    /// - `MEDLEDGER_FANOUT_CONCURRENCY`: Lookups in flight (default: 8)
    /// - `MEDLEDGER_LOOKUP_TIMEOUT_SECS`: Per-read deadline (default: 10)
    /// - `MEDLEDGER_MINT_TIMEOUT_SECS`: Mint finality deadline (default: 120)
    /// - `MEDLEDGER_UPLOAD_TIMEOUT_SECS`: Upload deadline (default: 60)
    /// - `MEDLEDGER_RECEIPT_POLL_MS`: Receipt poll interval (default: 1000)
    /// - `MEDLEDGER_SESSION_PATH`: Session file (default: .medledger/session.json)
    /// - `MEDLEDGER_LEGACY_METRIC_OFFSETS`: `1`/`true` to enable offsets
    /// - `MEDLEDGER_MAX_DOCUMENT_BYTES`: Document size limit (default: 10 MiB)
    ///
    /// Unparseable numeric values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            ledger_endpoint: env::var("MEDLEDGER_LEDGER_URL").unwrap_or(defaults.ledger_endpoint),
            blob_api_url: env::var("MEDLEDGER_BLOB_API_URL").unwrap_or(defaults.blob_api_url),
            blob_api_token: env::var("MEDLEDGER_BLOB_API_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            gateway_base: env::var("MEDLEDGER_GATEWAY_BASE").unwrap_or(defaults.gateway_base),
            fanout_concurrency: env_parse("MEDLEDGER_FANOUT_CONCURRENCY")
                .unwrap_or(defaults.fanout_concurrency),
            lookup_timeout_secs: env_parse("MEDLEDGER_LOOKUP_TIMEOUT_SECS")
                .unwrap_or(defaults.lookup_timeout_secs),
            mint_timeout_secs: env_parse("MEDLEDGER_MINT_TIMEOUT_SECS")
                .unwrap_or(defaults.mint_timeout_secs),
            upload_timeout_secs: env_parse("MEDLEDGER_UPLOAD_TIMEOUT_SECS")
                .unwrap_or(defaults.upload_timeout_secs),
            receipt_poll_interval_ms: env_parse("MEDLEDGER_RECEIPT_POLL_MS")
                .unwrap_or(defaults.receipt_poll_interval_ms),
            session_path: env::var("MEDLEDGER_SESSION_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_path),
            legacy_metric_offsets: env::var("MEDLEDGER_LEGACY_METRIC_OFFSETS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),
            max_document_bytes: env_parse("MEDLEDGER_MAX_DOCUMENT_BYTES")
                .unwrap_or(defaults.max_document_bytes),
        }
    }

    /// Reject values the services cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fanout_concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "fanout_concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        for (field, value) in [
            ("lookup_timeout_secs", self.lookup_timeout_secs),
            ("mint_timeout_secs", self.mint_timeout_secs),
            ("upload_timeout_secs", self.upload_timeout_secs),
            ("receipt_poll_interval_ms", self.receipt_poll_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        if self.max_document_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_document_bytes",
                reason: "must be greater than zero".to_string(),
            });
        }
        for (field, url) in [
            ("ledger_endpoint", &self.ledger_endpoint),
            ("blob_api_url", &self.blob_api_url),
            ("gateway_base", &self.gateway_base),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{url} is not an http(s) URL"),
                });
            }
        }
        Ok(())
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    pub fn mint_timeout(&self) -> Duration {
        Duration::from_secs(self.mint_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
