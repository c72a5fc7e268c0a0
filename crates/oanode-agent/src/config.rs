// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Agent configuration.
//!
//! Loaded once at startup from a JSON document. Required fields
//! (`account_id`, `node_id`, `polling_period_secs`) are validated
//! eagerly; a missing one is fatal and the diagnostic names the field.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default collector base URL.
pub const DEFAULT_ENDPOINT: &str = "http://localhost";

/// Default buffer directory.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default segment rotation threshold in bytes.
pub const DEFAULT_ROTATE_THRESHOLD: u64 = 50_000;

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default upload worker deadline in seconds. A worker still running
/// past this is aborted so a hung request cannot pin the dispatcher.
pub const DEFAULT_WORKER_DEADLINE_SECS: u64 = 600;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field is absent.
    #[error("{0} required")]
    MissingField(&'static str),

    /// A field is present but unusable.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    /// File I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validated agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Collector account identity.
    pub account_id: String,

    /// Node identity under the account.
    pub node_id: String,

    /// Sampling period (fractional seconds allowed in the config file).
    pub polling_period: Duration,

    /// Collector base URL.
    pub endpoint: String,

    /// Buffer directory for undelivered samples.
    pub data_dir: PathBuf,

    /// Segment rotation threshold in bytes.
    pub rotate_threshold_bytes: u64,

    /// Per-request timeout for live and batched deliveries.
    pub request_timeout: Duration,

    /// Maximum upload worker lifetime before it is aborted.
    pub worker_deadline: Duration,

    /// Treat non-2xx responses as failure in addition to empty bodies.
    /// Off by default: the collector contract only guarantees that a
    /// non-empty body means the payload was received.
    pub strict_status: bool,
}

/// Raw JSON document, before required-field validation.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    account_id: Option<String>,
    node_id: Option<String>,
    polling_period_secs: Option<f64>,
    endpoint: Option<String>,
    data_dir: Option<PathBuf>,
    rotate_threshold_bytes: Option<u64>,
    request_timeout_secs: Option<u64>,
    worker_deadline_secs: Option<u64>,
    strict_status: Option<bool>,
}

impl Config {
    /// Create a configuration with the given identities and period and
    /// defaults for everything else.
    pub fn new(
        account_id: impl Into<String>,
        node_id: impl Into<String>,
        polling_period: Duration,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            node_id: node_id.into(),
            polling_period,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            rotate_threshold_bytes: DEFAULT_ROTATE_THRESHOLD,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            worker_deadline: Duration::from_secs(DEFAULT_WORKER_DEADLINE_SECS),
            strict_status: false,
        }
    }

    /// Parse and validate configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json)?;
        raw.validate()
    }

    /// Parse and validate configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// The collector data endpoint for this node.
    pub fn collector_url(&self) -> String {
        format!(
            "{}/v1/{}/OANodes/{}/data",
            self.endpoint.trim_end_matches('/'),
            self.account_id,
            self.node_id
        )
    }

    /// Convert a period in fractional seconds into a `Duration`,
    /// rejecting zero, negative, and non-finite values.
    pub fn polling_period_from_secs(secs: f64) -> Result<Duration, ConfigError> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(ConfigError::InvalidField {
                field: "polling_period_secs",
                reason: "must be a positive number".to_string(),
            });
        }
        Ok(Duration::from_secs_f64(secs))
    }
}

impl RawConfig {
    fn validate(self) -> Result<Config, ConfigError> {
        let account_id = self.account_id.ok_or(ConfigError::MissingField("account_id"))?;
        let node_id = self.node_id.ok_or(ConfigError::MissingField("node_id"))?;
        let period_secs = self
            .polling_period_secs
            .ok_or(ConfigError::MissingField("polling_period_secs"))?;
        let polling_period = Config::polling_period_from_secs(period_secs)?;

        Ok(Config {
            account_id,
            node_id,
            polling_period,
            endpoint: self.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            data_dir: self.data_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            rotate_threshold_bytes: self.rotate_threshold_bytes.unwrap_or(DEFAULT_ROTATE_THRESHOLD),
            request_timeout: Duration::from_secs(
                self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            worker_deadline: Duration::from_secs(
                self.worker_deadline_secs.unwrap_or(DEFAULT_WORKER_DEADLINE_SECS),
            ),
            strict_status: self.strict_status.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_JSON: &str = r#"{
        "account_id": "acct1",
        "node_id": "node1",
        "polling_period_secs": 5
    }"#;

    #[test]
    fn test_config_parse_minimal() {
        let config = Config::from_json(MINIMAL_JSON).expect("parse minimal json");

        assert_eq!(config.account_id, "acct1");
        assert_eq!(config.node_id, "node1");
        assert_eq!(config.polling_period, Duration::from_secs(5));
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(config.rotate_threshold_bytes, DEFAULT_ROTATE_THRESHOLD);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.worker_deadline, Duration::from_secs(600));
        assert!(!config.strict_status);
    }

    #[test]
    fn test_config_parse_all_fields() {
        let config = Config::from_json(
            r#"{
                "account_id": "acct1",
                "node_id": "node1",
                "polling_period_secs": 0.5,
                "endpoint": "http://collector:8080/",
                "data_dir": "/var/lib/oanode/data",
                "rotate_threshold_bytes": 1024,
                "request_timeout_secs": 3,
                "worker_deadline_secs": 120,
                "strict_status": true
            }"#,
        )
        .expect("parse full json");

        assert_eq!(config.polling_period, Duration::from_millis(500));
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/oanode/data"));
        assert_eq!(config.rotate_threshold_bytes, 1024);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.worker_deadline, Duration::from_secs(120));
        assert!(config.strict_status);
    }

    #[test]
    fn test_missing_account_id() {
        let err = Config::from_json(r#"{"node_id": "n", "polling_period_secs": 1}"#)
            .expect_err("should fail");
        assert_eq!(err.to_string(), "account_id required");
    }

    #[test]
    fn test_missing_node_id() {
        let err = Config::from_json(r#"{"account_id": "a", "polling_period_secs": 1}"#)
            .expect_err("should fail");
        assert_eq!(err.to_string(), "node_id required");
    }

    #[test]
    fn test_missing_polling_period() {
        let err = Config::from_json(r#"{"account_id": "a", "node_id": "n"}"#)
            .expect_err("should fail");
        assert_eq!(err.to_string(), "polling_period_secs required");
    }

    #[test]
    fn test_invalid_polling_period() {
        for bad in ["0", "-1", "-0.5"] {
            let json = format!(
                r#"{{"account_id": "a", "node_id": "n", "polling_period_secs": {}}}"#,
                bad
            );
            let err = Config::from_json(&json).expect_err("should fail");
            assert!(
                err.to_string().contains("polling_period_secs"),
                "unexpected error for {}: {}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_collector_url() {
        let config = Config::from_json(MINIMAL_JSON).expect("parse");
        assert_eq!(
            config.collector_url(),
            "http://localhost/v1/acct1/OANodes/node1/data"
        );
    }

    #[test]
    fn test_collector_url_trailing_slash() {
        let mut config = Config::new("acct1", "node1", Duration::from_secs(5));
        config.endpoint = "http://collector/".to_string();
        assert_eq!(
            config.collector_url(),
            "http://collector/v1/acct1/OANodes/node1/data"
        );
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Config::from_json("not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
