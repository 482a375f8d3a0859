//! TOML configuration for the button device.
//!
//! The open capacity is a configuration value, not a constant. Set it to 1
//! for an exclusive opener, or higher to admit concurrent sessions.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ButtonError, ButtonResult};

/// Default device name used for the published node and line ownership.
pub const DEFAULT_DEVICE_NAME: &str = "button";

/// Default number of concurrent open sessions.
pub const DEFAULT_OPEN_CAPACITY: u32 = 2;

/// Button device configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Name of the published device node; also the owner name on line claims.
    #[serde(default = "default_device_name")]
    pub device_name: String,

    /// Number of sessions that may hold the device open concurrently.
    #[serde(default = "default_open_capacity")]
    pub open_capacity: u32,
}

fn default_device_name() -> String {
    DEFAULT_DEVICE_NAME.to_string()
}

fn default_open_capacity() -> u32 {
    DEFAULT_OPEN_CAPACITY
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            open_capacity: default_open_capacity(),
        }
    }
}

impl DeviceConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(content: &str) -> ButtonResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> ButtonResult<Self> {
        info!("loading device configuration from {:?}", path);
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Validate parameter bounds.
    pub fn validate(&self) -> ButtonResult<()> {
        if self.device_name.is_empty() {
            return Err(ButtonError::InvalidConfig {
                reason: "device_name must not be empty".to_string(),
            });
        }
        if self.open_capacity == 0 {
            return Err(ButtonError::InvalidConfig {
                reason: format!(
                    "open_capacity must be at least 1, got {}",
                    self.open_capacity
                ),
            });
        }
        Ok(())
    }
}
