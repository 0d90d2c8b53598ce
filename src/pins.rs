//! GPIO / peripheral pin assignments for the controller board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Actuator
// ---------------------------------------------------------------------------

/// Digital output driving the pump/valve relay (active HIGH).
pub const ACTUATOR_GPIO: i32 = 16;

// ---------------------------------------------------------------------------
// DS3231 real-time clock
// ---------------------------------------------------------------------------

/// INT/SQW output of the RTC.  Open-drain, active LOW, needs the pull-up.
pub const RTC_INT_GPIO: i32 = 7;
/// I2C data line.
pub const RTC_SDA_GPIO: i32 = 8;
/// I2C clock line.
pub const RTC_SCL_GPIO: i32 = 9;
/// 7-bit bus address of the DS3231.
pub const RTC_I2C_ADDR: u8 = 0x68;
