//! Configuration for the service dialer
//!
//! JSON, with every field optional:
//!
//! ```json
//! {
//!   "default_namespace": "default",
//!   "request_id": "svcdial",
//!   "discovery_timeout_ms": 5000,
//!   "monitor_grace_ms": 1000
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::common::DEFAULT_NAMESPACE;
use crate::error::{Error, Result};

/// Request identifier sent with both tunnel streams
pub const DEFAULT_REQUEST_ID: &str = "svcdial";

/// Default time `close` waits for the error monitor to drain
const DEFAULT_MONITOR_GRACE_MS: u64 = 1000;

/// Dialer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialerConfig {
    /// Namespace for addresses that do not name one
    #[serde(default = "default_namespace")]
    pub default_namespace: String,

    /// Request identifier for the error/data stream headers
    #[serde(default = "default_request_id")]
    pub request_id: String,

    /// Upper bound on the discovery phase (no bound when absent)
    #[serde(default)]
    pub discovery_timeout_ms: Option<u64>,

    /// How long close waits for the error monitor to finish
    #[serde(default = "default_monitor_grace_ms")]
    pub monitor_grace_ms: u64,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_request_id() -> String {
    DEFAULT_REQUEST_ID.to_string()
}

fn default_monitor_grace_ms() -> u64 {
    DEFAULT_MONITOR_GRACE_MS
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            default_namespace: default_namespace(),
            request_id: default_request_id(),
            discovery_timeout_ms: None,
            monitor_grace_ms: DEFAULT_MONITOR_GRACE_MS,
        }
    }
}

impl DialerConfig {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_json(&content)
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_namespace.is_empty() {
            return Err(Error::Config("default_namespace must not be empty".into()));
        }
        if self.request_id.is_empty() {
            return Err(Error::Config("request_id must not be empty".into()));
        }
        Ok(())
    }

    pub fn discovery_timeout(&self) -> Option<Duration> {
        self.discovery_timeout_ms.map(Duration::from_millis)
    }

    pub fn monitor_grace(&self) -> Duration {
        Duration::from_millis(self.monitor_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = DialerConfig::from_json("{}").unwrap();
        assert_eq!(config, DialerConfig::default());
        assert_eq!(config.default_namespace, "default");
        assert_eq!(config.discovery_timeout(), None);
        assert_eq!(config.monitor_grace(), Duration::from_secs(1));
    }

    #[test]
    fn test_from_json_overrides() {
        let config = DialerConfig::from_json(
            r#"{"default_namespace":"prod","discovery_timeout_ms":250,"monitor_grace_ms":10}"#,
        )
        .unwrap();
        assert_eq!(config.default_namespace, "prod");
        assert_eq!(config.request_id, DEFAULT_REQUEST_ID);
        assert_eq!(config.discovery_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.monitor_grace(), Duration::from_millis(10));
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        assert!(DialerConfig::from_json(r#"{"default_namespace":""}"#).is_err());
        assert!(DialerConfig::from_json(r#"{"request_id":""}"#).is_err());
        assert!(DialerConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"request_id":"kubeconn"}}"#).unwrap();

        let config = DialerConfig::load(file.path()).unwrap();
        assert_eq!(config.request_id, "kubeconn");
    }
}
