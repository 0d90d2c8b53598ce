//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ScheduleService / StateManager (domain)
//! ```
//!
//! Driven adapters (record storage, alarm RTC, relay output, event sinks,
//! config storage) implement these traits.  The domain tasks consume them via
//! generics, so the scheduling core never touches hardware directly.
//!
//! All port errors are typed; callers handle every variant explicitly.

use std::io::{Read, Write};

use crate::config::SystemConfig;

// ───────────────────────────────────────────────────────────────
// Record storage port (driven adapter: domain ↔ flash filesystem)
// ───────────────────────────────────────────────────────────────

/// Minimal file primitive the schedule store is built on.
///
/// Paths are opaque strings; on the device they live under the SPIFFS VFS
/// mount, on the host they are relative to a scratch directory or purely
/// in-memory.  None of these operations are atomic with respect to each
/// other.
pub trait RecordFs {
    type Reader: Read;
    type Writer: Write;

    /// Open an existing file for sequential reading.
    fn open_read(&self, path: &str) -> Result<Self::Reader, StorageError>;

    /// Open a file for appending, creating it if missing.
    fn open_append(&self, path: &str) -> Result<Self::Writer, StorageError>;

    /// Open a file for writing from scratch, truncating any previous content.
    fn open_write(&self, path: &str) -> Result<Self::Writer, StorageError>;

    /// Remove a file.  Missing files are not an error.
    fn remove(&self, path: &str) -> Result<(), StorageError>;

    /// Rename `from` to `to`.  `to` must not exist.
    fn rename(&self, from: &str, to: &str) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Alarm clock port (driven adapter: domain ↔ RTC peripheral)
// ───────────────────────────────────────────────────────────────

/// The two independent alarm slots of the RTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmSlot {
    /// Activation alarm.
    A,
    /// Deactivation alarm.
    B,
}

/// Real-time clock with two alarm slots and per-slot fired flags.
///
/// Instants are seconds since the Unix epoch (UTC).  The adapter converts
/// to whatever wall-clock representation the peripheral keeps.
pub trait AlarmClock {
    /// Current instant.
    fn now(&mut self) -> Result<i64, RtcError>;

    /// Program `slot` to fire at `instant`.
    fn set_alarm(&mut self, slot: AlarmSlot, instant: i64) -> Result<(), RtcError>;

    /// Clear the fired flag of `slot` (also releases the interrupt line).
    fn clear_fired(&mut self, slot: AlarmSlot) -> Result<(), RtcError>;

    /// Whether `slot` has fired since its flag was last cleared.
    fn fired(&mut self, slot: AlarmSlot) -> Result<bool, RtcError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → relay)
// ───────────────────────────────────────────────────────────────

/// Single on/off output (pump or valve relay).
///
/// Takes `&self` because both the schedule task and the state manager
/// drive it; implementations provide their own interior locking.
pub trait ActuatorPort {
    /// Energise (`true`) or release (`false`) the output.
    fn set_output(&self, on: bool);

    /// Last commanded level.
    fn is_on(&self) -> bool;
}

impl<T: ActuatorPort + ?Sized> ActuatorPort for &T {
    fn set_output(&self, on: bool) {
        (**self).set_output(on);
    }

    fn is_on(&self) -> bool {
        (**self).is_on()
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`RecordFs`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The file could not be opened (missing, filesystem not mounted, ...).
    Unavailable,
    /// A read, write or flush failed after the file was opened.
    Io,
}

/// Errors from [`AlarmClock`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtcError {
    /// The bus transaction with the RTC failed.
    Bus,
    /// The RTC returned a date/time that does not exist.
    InvalidTime,
    /// The requested alarm instant cannot be represented by the RTC.
    OutOfRange,
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "storage unavailable"),
            Self::Io => write!(f, "storage I/O error"),
        }
    }
}

impl core::fmt::Display for RtcError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bus => write!(f, "RTC bus error"),
            Self::InvalidTime => write!(f, "RTC returned an invalid time"),
            Self::OutOfRange => write!(f, "alarm instant out of RTC range"),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
