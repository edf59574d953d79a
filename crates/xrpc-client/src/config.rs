//! Service configuration surface.
//!
//! One TOML table per logical service under `xrpc`:
//!
//! ```toml
//! [xrpc.xrtc]
//! server = "127.0.0.1:9000, 127.0.0.1:9001"
//! connectTimeout = 100
//! readTimeout = 500
//! writeTimeout = 500
//! ```
//!
//! Timeouts are milliseconds; absent or `0` means the client default.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::ClientConfig;

/// Errors loading or validating service configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A service has no `server` entries.
    #[error("no server field for service {0}")]
    NoEndpoints(String),

    /// A `--service` style spec could not be parsed.
    #[error("invalid service spec {spec:?}: expected NAME=HOST:PORT[,HOST:PORT...]")]
    InvalidServiceSpec { spec: String },

    /// An endpoint did not resolve.
    #[error("service {service}: {source}")]
    InvalidEndpoint {
        service: String,
        source: crate::selector::SelectorError,
    },
}

/// Configuration for one logical service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Comma-separated `host:port` list.
    #[serde(default)]
    pub server: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_timeout: Option<u64>,
}

impl ServiceConfig {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Self::default()
        }
    }

    /// The trimmed, non-empty endpoint strings.
    pub fn endpoints(&self) -> Vec<String> {
        parse_endpoints(&self.server)
    }

    /// Client deadlines derived from the millisecond overrides.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            connect_timeout: self.connect_timeout.map(Duration::from_millis),
            read_timeout: self.read_timeout.map(Duration::from_millis),
            write_timeout: self.write_timeout.map(Duration::from_millis),
            max_body_size: None,
        }
    }
}

/// Split a comma-separated endpoint list, trimming whitespace and dropping
/// empty entries.
pub fn parse_endpoints(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// All configured services, keyed by logical name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XrpcConfig {
    #[serde(default, rename = "xrpc")]
    pub services: BTreeMap<String, ServiceConfig>,
}

impl XrpcConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Add or replace a service from a `NAME=HOST:PORT[,HOST:PORT...]` spec.
    ///
    /// Timeout overrides already configured for the service are kept.
    pub fn apply_service_spec(&mut self, spec: &str) -> Result<(), ConfigError> {
        let (name, servers) = spec
            .split_once('=')
            .map(|(name, servers)| (name.trim(), servers.trim()))
            .filter(|(name, servers)| !name.is_empty() && !servers.is_empty())
            .ok_or_else(|| ConfigError::InvalidServiceSpec {
                spec: spec.to_string(),
            })?;

        self.services.entry(name.to_string()).or_default().server = servers.to_string();
        Ok(())
    }

    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.get(name)
    }
}
