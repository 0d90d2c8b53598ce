//! Peripheral drivers, hardware initialisation, and task helpers.

pub mod ds3231;
pub mod hw_init;
pub mod task_pin;
pub mod valve;
