//! System configuration parameters
//!
//! All tunable parameters for the irrigation controller.
//! Values can be overridden via NVS (non-volatile storage).

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Largest UTC offset a [`FixedOffset`] accepts, exclusive.
const MAX_UTC_OFFSET_SECS: i32 = 86_400;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Time ---
    /// Offset of the schedule wall-clock (and the RTC) from UTC, in seconds.
    pub utc_offset_secs: i32,

    // --- Schedule storage ---
    /// Append-only schedule log, one record per line.
    pub schedule_path: String,
    /// Staging file used while rewriting the log on delete.
    pub schedule_staging_path: String,

    // --- State manager ---
    /// How long the state manager waits to publish an `AskState` answer.
    pub state_response_timeout_ms: u32,

    // --- Bus ---
    /// I2C clock for the alarm RTC.
    pub i2c_frequency_hz: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // GMT+7
            utc_offset_secs: 25_200,

            schedule_path: "/spiffs/schedule.txt".into(),
            schedule_staging_path: "/spiffs/schedule.tmp".into(),

            state_response_timeout_ms: 500,

            i2c_frequency_hz: 100_000,
        }
    }
}

impl SystemConfig {
    /// The configured offset as a chrono zone.  Falls back to UTC if the
    /// stored value is out of range (only possible when `validate` was
    /// bypassed).
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_secs).unwrap_or(Utc.fix())
    }

    /// Range-check every field.  Used by [`ConfigPort`](crate::app::ports::ConfigPort)
    /// implementations before persisting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.utc_offset_secs.abs() >= MAX_UTC_OFFSET_SECS {
            return Err(ConfigError::ValidationFailed(
                "utc_offset_secs must be within ±24h",
            ));
        }
        if self.schedule_path.is_empty() || self.schedule_staging_path.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "schedule paths must not be empty",
            ));
        }
        if self.schedule_path == self.schedule_staging_path {
            return Err(ConfigError::ValidationFailed(
                "schedule_staging_path must differ from schedule_path",
            ));
        }
        if !(1..=10_000).contains(&self.state_response_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "state_response_timeout_ms must be 1–10000",
            ));
        }
        if !(10_000..=1_000_000).contains(&self.i2c_frequency_hz) {
            return Err(ConfigError::ValidationFailed(
                "i2c_frequency_hz must be 10k–1M",
            ));
        }
        Ok(())
    }
}
