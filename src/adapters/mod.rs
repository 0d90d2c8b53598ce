//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements  | Connects to                    |
//! |------------|-------------|--------------------------------|
//! | `fs`       | RecordFs    | SPIFFS via `std::fs` / in-memory |
//! | `log_sink` | EventSink   | Serial log output              |
//! | `nvs`      | ConfigPort  | NVS / in-memory store          |
//!
//! The RTC (`AlarmClock`) and relay (`ActuatorPort`) adapters live in
//! [`crate::drivers`] because they sit directly on embedded-hal buses.

pub mod fs;
pub mod log_sink;
pub mod nvs;
