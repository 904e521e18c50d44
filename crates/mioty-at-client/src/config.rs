//! Client configuration.
//!
//! Loaded from YAML; every key is optional.
//!
//! ```yaml
//! address: "192.168.1.20:4001"
//! read_timeout_ms: 8000
//! chunk_size: 30
//! max_command_len: 512
//! downlink_capacity: 255
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mioty_at_protocol::{DEFAULT_CHUNK_SIZE, MAX_COMMAND_LENGTH};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shortest command limit that still fits every fixed command.
const MIN_COMMAND_LEN: usize = 16;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The YAML did not match the expected shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for [`MiotyClient`](crate::MiotyClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// TCP address of the serial bridge the modem sits behind.
    pub address: String,
    /// Read timeout in milliseconds; 0 waits forever.
    pub read_timeout_ms: u64,
    /// Bytes requested from the transport per read.
    pub chunk_size: usize,
    /// Longest encoded command the modem accepts.
    pub max_command_len: usize,
    /// Largest downlink payload accepted from a bidirectional uplink.
    pub downlink_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            address: "127.0.0.1:5000".to_string(),
            read_timeout_ms: 5000,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_command_len: MAX_COMMAND_LENGTH,
            downlink_capacity: 255,
        }
    }
}

impl ClientConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<ClientConfig, ConfigError> {
        let config: ClientConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<ClientConfig, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        ClientConfig::from_yaml_str(&yaml)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be at least 1".to_string()));
        }
        if self.max_command_len < MIN_COMMAND_LEN {
            return Err(ConfigError::Invalid(format!(
                "max_command_len must be at least {}",
                MIN_COMMAND_LEN
            )));
        }
        if self.address.is_empty() {
            return Err(ConfigError::Invalid("address must not be empty".to_string()));
        }
        Ok(())
    }

    /// The read timeout, `None` when reads may block forever.
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.chunk_size, 30);
        assert_eq!(config.max_command_len, 512);
        assert_eq!(config.read_timeout(), Some(Duration::from_secs(5)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = ClientConfig::from_yaml_str("address: \"10.0.0.2:4001\"\nchunk_size: 64\n").unwrap();
        assert_eq!(config.address, "10.0.0.2:4001");
        assert_eq!(config.chunk_size, 64);
        assert_eq!(config.max_command_len, MAX_COMMAND_LENGTH);
        assert_eq!(config.downlink_capacity, 255);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = ClientConfig::from_yaml_str("baud: 115200\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let err = ClientConfig::from_yaml_str("chunk_size: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_zero_timeout_blocks() {
        let config = ClientConfig::from_yaml_str("read_timeout_ms: 0\n").unwrap();
        assert_eq!(config.read_timeout(), None);
    }
}
