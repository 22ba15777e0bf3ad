//! Configuration for an ipdslink session
//!
//! Loads configuration from a TOML file with the minimal parameters needed
//! to run one session against one printer.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Printer address, e.g. `"192.168.1.40:5001"`
    pub printer_address: String,

    /// How long `send` waits for a reply before giving up (milliseconds)
    ///
    /// The reference behavior blocks forever; a bounded wait that surfaces
    /// `Error::ReplyTimeout` is used here instead.
    pub reply_timeout_ms: u64,

    /// Reader thread poll interval (milliseconds)
    pub poll_interval_ms: u64,

    /// Whether a "normal reset" NACK during negotiation triggers the
    /// single automatic handshake retry
    pub retry_on_device_reset: bool,
}

impl SessionConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: SessionConfig = toml::from_str(&contents)
            .map_err(|e| crate::error::Error::InvalidParameter(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::error::Error::InvalidParameter(e.to_string()))?;
        fs::write(path, contents)?;
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            printer_address: "127.0.0.1:5001".to_string(),
            reply_timeout_ms: 5000,
            poll_interval_ms: 2,
            retry_on_device_reset: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.reply_timeout_ms, 5000);
        assert_eq!(config.poll_interval_ms, 2);
        assert!(config.retry_on_device_reset);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = SessionConfig::default();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        assert!(toml_string.contains("printer_address"));
        assert!(toml_string.contains("reply_timeout_ms = 5000"));

        let parsed: SessionConfig = toml::from_str(&toml_string).unwrap();
        assert_eq!(parsed.printer_address, config.printer_address);
        assert_eq!(parsed.reply_timeout_ms, config.reply_timeout_ms);
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
printer_address = "10.0.0.7:9100"
reply_timeout_ms = 250
poll_interval_ms = 5
retry_on_device_reset = false
"#;
        let config: SessionConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.printer_address, "10.0.0.7:9100");
        assert_eq!(config.reply_timeout_ms, 250);
        assert!(!config.retry_on_device_reset);
    }
}
