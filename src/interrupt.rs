//! RTC alarm-line interrupt hand-off.
//!
//! The DS3231 pulls INT/SQW low when an enabled alarm matches and keeps it
//! low until the fired flag is cleared over I2C.  The ISR only confirms the
//! line is actually asserted (edges can glitch on a long wire) and raises
//! [`Notification::ALARM_TRIGGERED`].  Which slot fired is read later by the
//! schedule task; no bus traffic happens in interrupt context.

use crate::events::{Notification, NotifyFlags};

/// Handle one falling edge on the alarm line.
///
/// `line_asserted` is the level re-read inside the handler.  Returns whether
/// the notification was raised.
pub fn on_alarm_edge(flags: &NotifyFlags, line_asserted: bool) -> bool {
    if !line_asserted {
        return false;
    }
    flags.notify(Notification::ALARM_TRIGGERED);
    true
}

#[cfg(target_os = "espidf")]
pub use isr::{isr_arg, alarm_gpio_isr};

#[cfg(target_os = "espidf")]
mod isr {
    use esp_idf_svc::sys::gpio_get_level;

    use super::on_alarm_edge;
    use crate::events::NotifyFlags;
    use crate::pins;

    /// Registered with `gpio_isr_handler_add`; `arg` is a `&'static NotifyFlags`.
    ///
    /// # Safety
    ///
    /// `arg` must point at a `NotifyFlags` that lives for the rest of the
    /// program.
    pub unsafe extern "C" fn alarm_gpio_isr(arg: *mut core::ffi::c_void) {
        // SAFETY: caller contract; the pointer was produced from a 'static ref.
        let flags = unsafe { &*(arg as *const NotifyFlags) };
        // Active LOW.  gpio_get_level is a register read; safe in ISR context.
        let asserted = unsafe { gpio_get_level(pins::RTC_INT_GPIO) } == 0;
        on_alarm_edge(flags, asserted);
    }

    /// Converts a flag set reference into the opaque ISR argument.
    pub fn isr_arg(flags: &'static NotifyFlags) -> *mut core::ffi::c_void {
        flags as *const NotifyFlags as *mut core::ffi::c_void
    }
}
