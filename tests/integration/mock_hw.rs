//! Mock hardware for integration tests.
//!
//! `MockRtc` behaves like the DS3231 as far as the planner can tell: it
//! remembers two alarm instants and raises a slot's fired flag when
//! simulated time passes it.  `MockRelay` records every output write.

use std::cell::{Cell, RefCell};

use irrigation::app::events::AppEvent;
use irrigation::app::ports::{ActuatorPort, AlarmClock, AlarmSlot, EventSink, RtcError};

fn index(slot: AlarmSlot) -> usize {
    match slot {
        AlarmSlot::A => 0,
        AlarmSlot::B => 1,
    }
}

// ── MockRtc ───────────────────────────────────────────────────

pub struct MockRtc {
    pub now: i64,
    pub alarms: [Option<i64>; 2],
    pub fired: [bool; 2],
    /// When set, every call fails with this error.
    pub fault: Option<RtcError>,
}

#[allow(dead_code)]
impl MockRtc {
    pub fn new(now: i64) -> Self {
        Self {
            now,
            alarms: [None, None],
            fired: [false, false],
            fault: None,
        }
    }

    /// Move time forward to `t`.  Alarms in `(now, t]` fire.  Returns
    /// whether the INT line is asserted afterwards.
    pub fn advance_to(&mut self, t: i64) -> bool {
        for (alarm, fired) in self.alarms.iter().zip(self.fired.iter_mut()) {
            if let Some(at) = *alarm {
                if at > self.now && at <= t {
                    *fired = true;
                }
            }
        }
        self.now = t;
        self.line_asserted()
    }

    pub fn line_asserted(&self) -> bool {
        self.fired.iter().any(|f| *f)
    }

    fn check(&self) -> Result<(), RtcError> {
        match self.fault {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl AlarmClock for MockRtc {
    fn now(&mut self) -> Result<i64, RtcError> {
        self.check()?;
        Ok(self.now)
    }

    fn set_alarm(&mut self, slot: AlarmSlot, instant: i64) -> Result<(), RtcError> {
        self.check()?;
        self.alarms[index(slot)] = Some(instant);
        Ok(())
    }

    fn clear_fired(&mut self, slot: AlarmSlot) -> Result<(), RtcError> {
        self.check()?;
        self.fired[index(slot)] = false;
        Ok(())
    }

    fn fired(&mut self, slot: AlarmSlot) -> Result<bool, RtcError> {
        self.check()?;
        Ok(self.fired[index(slot)])
    }
}

// ── MockRelay ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockRelay {
    on: Cell<bool>,
    pub writes: RefCell<Vec<bool>>,
}

#[allow(dead_code)]
impl MockRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<bool> {
        self.writes.borrow().clone()
    }
}

impl ActuatorPort for MockRelay {
    fn set_output(&self, on: bool) {
        self.on.set(on);
        self.writes.borrow_mut().push(on);
    }

    fn is_on(&self) -> bool {
        self.on.get()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn last(&self) -> Option<&AppEvent> {
        self.events.last()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
