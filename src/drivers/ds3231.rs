//! DS3231 real-time clock as the [`AlarmClock`] port.
//!
//! Register access goes through the `ds323x` driver; this adapter only
//! decides what gets programmed:
//!
//! ```text
//!  slot A ──▶ alarm 1  date + hour + minute + second   (activate)
//!  slot B ──▶ alarm 2  date + hour + minute            (deactivate)
//!  INT/SQW ──▶ interrupt mode, A1IE | A2IE
//! ```
//!
//! The chip keeps local wall time; instants are converted with the
//! configured UTC offset.  Both alarms match on the date, so a programmed
//! instant fires once, not daily.  Alarm 2 has minute resolution: instants
//! are rounded up to the next whole minute so a deactivation never lands
//! before its activation.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, Timelike};
use ds323x::interface::I2cInterface;
use ds323x::{
    Alarm1Matching, Alarm2Matching, DateTimeAccess, DayAlarm1, DayAlarm2,
    Ds323x, Hours, ic,
};
use embedded_hal::i2c::I2c;
use log::{debug, warn};

use crate::app::ports::{AlarmClock, AlarmSlot, RtcError};

/// Years the two-digit year register can hold.
const FIRST_YEAR: i32 = 2000;
const LAST_YEAR: i32 = 2099;

fn rtc_error<E: core::fmt::Debug>(op: &str, e: ds323x::Error<E>) -> RtcError {
    warn!("ds3231: {} failed: {:?}", op, e);
    match e {
        ds323x::Error::Comm(_) => RtcError::Bus,
        ds323x::Error::InvalidInputData => RtcError::OutOfRange,
        _ => RtcError::InvalidTime,
    }
}

/// Next whole minute at or after `instant`.
fn round_up_to_minute(instant: i64) -> i64 {
    instant + (60 - instant.rem_euclid(60)) % 60
}

pub struct Ds3231<I2C> {
    rtc: Ds323x<I2cInterface<I2C>, ic::DS3231>,
    utc_offset: FixedOffset,
}

impl<I2C: I2c> Ds3231<I2C> {
    pub fn new(i2c: I2C, utc_offset: FixedOffset) -> Self {
        Self {
            rtc: Ds323x::new_ds3231(i2c),
            utc_offset,
        }
    }

    /// Switch INT/SQW to alarm-interrupt mode with both alarms enabled and
    /// clear stale fired flags.
    pub fn init(&mut self) -> Result<(), RtcError> {
        self.rtc
            .use_int_sqw_output_as_interrupt()
            .map_err(|e| rtc_error("interrupt mode", e))?;
        self.rtc
            .enable_alarm1_interrupts()
            .map_err(|e| rtc_error("alarm 1 enable", e))?;
        self.rtc
            .enable_alarm2_interrupts()
            .map_err(|e| rtc_error("alarm 2 enable", e))?;
        self.clear_fired(AlarmSlot::A)?;
        self.clear_fired(AlarmSlot::B)?;
        debug!("ds3231: interrupt mode, A1/A2 enabled");
        Ok(())
    }

    /// Set the clock (time sync).
    pub fn set_time(&mut self, instant: i64) -> Result<(), RtcError> {
        let local = self.to_local(instant)?;
        self.rtc
            .set_datetime(&local)
            .map_err(|e| rtc_error("set time", e))
    }

    pub fn release(self) -> I2C {
        self.rtc.destroy_ds3231()
    }

    fn to_local(&self, instant: i64) -> Result<NaiveDateTime, RtcError> {
        let local = DateTime::from_timestamp(instant + i64::from(self.utc_offset.local_minus_utc()), 0)
            .ok_or(RtcError::OutOfRange)?
            .naive_utc();
        if !(FIRST_YEAR..=LAST_YEAR).contains(&local.year()) {
            return Err(RtcError::OutOfRange);
        }
        Ok(local)
    }

    fn to_instant(&self, local: NaiveDateTime) -> i64 {
        local.and_utc().timestamp() - i64::from(self.utc_offset.local_minus_utc())
    }
}

impl<I2C: I2c> AlarmClock for Ds3231<I2C> {
    fn now(&mut self) -> Result<i64, RtcError> {
        let local = self.rtc.datetime().map_err(|e| rtc_error("read time", e))?;
        Ok(self.to_instant(local))
    }

    fn set_alarm(&mut self, slot: AlarmSlot, instant: i64) -> Result<(), RtcError> {
        match slot {
            AlarmSlot::A => {
                let local = self.to_local(instant)?;
                let when = DayAlarm1 {
                    day: local.day() as u8,
                    hour: Hours::H24(local.hour() as u8),
                    minute: local.minute() as u8,
                    second: local.second() as u8,
                };
                self.rtc
                    .set_alarm1_day(when, Alarm1Matching::AllMatch)
                    .map_err(|e| rtc_error("alarm 1", e))
            }
            AlarmSlot::B => {
                let local = self.to_local(round_up_to_minute(instant))?;
                let when = DayAlarm2 {
                    day: local.day() as u8,
                    hour: Hours::H24(local.hour() as u8),
                    minute: local.minute() as u8,
                };
                self.rtc
                    .set_alarm2_day(when, Alarm2Matching::AllMatch)
                    .map_err(|e| rtc_error("alarm 2", e))
            }
        }
    }

    fn clear_fired(&mut self, slot: AlarmSlot) -> Result<(), RtcError> {
        match slot {
            AlarmSlot::A => self.rtc.clear_alarm1_matched_flag(),
            AlarmSlot::B => self.rtc.clear_alarm2_matched_flag(),
        }
        .map_err(|e| rtc_error("clear flag", e))
    }

    fn fired(&mut self, slot: AlarmSlot) -> Result<bool, RtcError> {
        match slot {
            AlarmSlot::A => self.rtc.has_alarm1_matched(),
            AlarmSlot::B => self.rtc.has_alarm2_matched(),
        }
        .map_err(|e| rtc_error("read flags", e))
    }
}
