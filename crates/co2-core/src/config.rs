//! Monitor configuration
//!
//! Stored as a postcard blob (flash page or SD file). Only the few values the
//! poll loop needs are configurable; sensor parameters are not.

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::scd4x::{SCAN_FIRST_ADDRESS, SCAN_LAST_ADDRESS, SCD4X_ADDRESS};

/// Default poll cadence
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 1000;

/// Most addresses a diagnostic scan reports
pub const MAX_SCAN_CAPACITY: u8 = 8;

/// Upper bound of an encoded [`MonitorConfig`]: two bytes plus a varint u32.
pub const MAX_ENCODED_LEN: usize = 8;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config decode failed: {0}")]
    Decode(postcard::Error),

    #[error("Config encode failed: {0}")]
    Encode(postcard::Error),

    /// Address outside the scanned 7-bit range
    #[error("Invalid sensor address: 0x{0:02X}")]
    InvalidAddress(u8),

    #[error("Poll interval must be non-zero")]
    InvalidPollInterval,

    /// Scan capacity zero or above [`MAX_SCAN_CAPACITY`]
    #[error("Invalid scan capacity: {0}")]
    InvalidScanCapacity(u8),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// 7-bit address of the sensor
    pub sensor_address: u8,
    /// Time between polls
    pub poll_interval_ms: u32,
    /// Addresses kept by the diagnostic scan after a failed start
    pub scan_capacity: u8,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sensor_address: SCD4X_ADDRESS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            scan_capacity: MAX_SCAN_CAPACITY,
        }
    }
}

impl MonitorConfig {
    /// Decode and validate a stored configuration.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(ConfigError::Decode)?;
        config.validate()?;
        Ok(config)
    }

    /// Encode into `buffer`, returning the used prefix.
    pub fn to_slice<'b>(&self, buffer: &'b mut [u8]) -> Result<&'b mut [u8], ConfigError> {
        postcard::to_slice(self, buffer).map_err(ConfigError::Encode)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(SCAN_FIRST_ADDRESS..=SCAN_LAST_ADDRESS).contains(&self.sensor_address) {
            return Err(ConfigError::InvalidAddress(self.sensor_address));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }
        if self.scan_capacity == 0 || self.scan_capacity > MAX_SCAN_CAPACITY {
            return Err(ConfigError::InvalidScanCapacity(self.scan_capacity));
        }
        Ok(())
    }
}
