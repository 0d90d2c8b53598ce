//! Application core — scheduling logic, zero direct I/O.
//!
//! The schedule task ([`service`]) and the store editor ([`commands`]) talk
//! to the outside world only through the **port traits** in [`ports`], so
//! the whole flow runs on the host against simulated file systems, clocks
//! and relays.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
