//! Schedule task — the hexagonal core of the scheduling side.
//!
//! [`ScheduleService`] owns the store handle, the cache and the alarm
//! planner.  It sleeps on the notification flag set and, per wake, runs a
//! fixed sequence:
//!
//! ```text
//!  ALARM_TRIGGERED  ──▶ slot A fired → actuator on
//!                       slot B fired → actuator off
//!  NEEDS_RELOAD     ──▶ cache.reload(store)
//!  NEEDS_REARM or
//!  ALARM_TRIGGERED  ──▶ planner.arm(select_next(cache, now))
//! ```
//!
//! Fired flags are consumed before anything is re-programmed, so a wake
//! that carries an upload and an alarm together still sees the alarm.
//!
//! Storage and RTC failures never end the pass.  RTC failures are also
//! forwarded to the state manager as [`Event::RtcFail`].

use log::{debug, info, warn};

use crate::events::{Notification, NotifyFlags};
use crate::fsm::Event;
use crate::fsm::manager::{RequestSender, report_fault};
use crate::planner::{AlarmPlanner, ArmedPair, FiredSlots, select_next};
use crate::schedule::{ReloadOutcome, ScheduleCache, ScheduleStore};

use super::events::AppEvent;
use super::ports::{ActuatorPort, AlarmClock, EventSink, RecordFs, RtcError};

/// What one [`ScheduleService::process`] pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassReport {
    pub reloaded: Option<ReloadOutcome>,
    /// Pair armed after this pass.
    pub armed: Option<ArmedPair>,
    pub fired: FiredSlots,
}

pub struct ScheduleService<'a, F, C, A, S>
where
    F: RecordFs,
    C: AlarmClock,
    A: ActuatorPort,
    S: EventSink,
{
    store: ScheduleStore<F>,
    cache: ScheduleCache,
    planner: AlarmPlanner<C>,
    actuator: A,
    sink: S,
    faults: Option<RequestSender<'a>>,
}

impl<'a, F, C, A, S> ScheduleService<'a, F, C, A, S>
where
    F: RecordFs,
    C: AlarmClock,
    A: ActuatorPort,
    S: EventSink,
{
    pub fn new(
        store: ScheduleStore<F>,
        cache: ScheduleCache,
        planner: AlarmPlanner<C>,
        actuator: A,
        sink: S,
    ) -> Self {
        Self {
            store,
            cache,
            planner,
            actuator,
            sink,
            faults: None,
        }
    }

    /// Forward RTC failures to the state manager through `requests`.
    pub fn with_fault_reporting(mut self, requests: RequestSender<'a>) -> Self {
        self.faults = Some(requests);
        self
    }

    // ── Processing ────────────────────────────────────────────

    /// Handle one batch of pending notification bits.
    pub fn process(&mut self, pending: Notification) -> PassReport {
        let mut report = PassReport::default();

        if pending.contains(Notification::ALARM_TRIGGERED) {
            report.fired = self.handle_alarm();
        }
        if pending.contains(Notification::NEEDS_RELOAD) {
            report.reloaded = Some(self.reload());
        }
        if pending.intersects(Notification::NEEDS_REARM | Notification::ALARM_TRIGGERED) {
            report.armed = self.rearm();
        }
        report
    }

    /// Task body: wait for notifications forever.
    pub async fn run(mut self, flags: &NotifyFlags) -> ! {
        info!("schedule task: running");
        loop {
            let pending = flags.wait().await;
            debug!("schedule task: woke with 0b{:03b}", pending.bits());
            self.process(pending);
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn cache(&self) -> &ScheduleCache {
        &self.cache
    }

    pub fn planner(&self) -> &AlarmPlanner<C> {
        &self.planner
    }

    pub fn planner_mut(&mut self) -> &mut AlarmPlanner<C> {
        &mut self.planner
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // ── Internal ──────────────────────────────────────────────

    fn reload(&mut self) -> ReloadOutcome {
        let outcome = self.cache.reload(&self.store);
        match outcome.error {
            Some(e) => self.sink.emit(&AppEvent::StorageFailed(e)),
            None => self.sink.emit(&AppEvent::CacheReloaded {
                loaded: outcome.loaded,
                dropped: outcome.dropped,
            }),
        }
        outcome
    }

    fn rearm(&mut self) -> Option<ArmedPair> {
        let now = match self.planner.now() {
            Ok(now) => now,
            Err(e) => {
                self.rtc_failed(e);
                return None;
            }
        };

        let selected = select_next(&self.cache, now);
        match self.planner.arm(&self.cache, selected) {
            Ok(Some(pair)) => {
                self.sink.emit(&AppEvent::Armed(pair));
                Some(pair)
            }
            Ok(None) => {
                self.sink.emit(&AppEvent::NothingToArm);
                None
            }
            Err(e) => {
                self.rtc_failed(e);
                None
            }
        }
    }

    fn handle_alarm(&mut self) -> FiredSlots {
        let fired = match self.planner.take_fired() {
            Ok(fired) => fired,
            Err(e) => {
                self.rtc_failed(e);
                return FiredSlots::default();
            }
        };

        if !fired.any() {
            debug!("schedule task: alarm line asserted but no slot fired");
        }
        // Activation first: if both fired together the net result is off.
        if fired.activation {
            self.switch(true);
        }
        if fired.deactivation {
            self.switch(false);
        }
        fired
    }

    fn switch(&mut self, on: bool) {
        self.actuator.set_output(on);
        self.sink.emit(&AppEvent::ActuatorChanged { on });
    }

    fn rtc_failed(&mut self, e: RtcError) {
        warn!("schedule task: {}", e);
        self.sink.emit(&AppEvent::RtcFailed(e));
        if let Some(requests) = &self.faults {
            if report_fault(requests, Event::RtcFail).is_err() {
                self.sink.emit(&AppEvent::FaultDropped(Event::RtcFail));
            }
        }
    }
}
