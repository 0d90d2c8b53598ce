//! Alarm planner: picks the next schedule and mirrors it into the RTC.
//!
//! The RTC has exactly two alarm slots, so at most one start/stop pair is
//! ever outstanding:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ScheduleCache                                               │
//! │  [s0] [s1] [s2] ... [s49]                                    │
//! │          │                                                   │
//! │          ▼ select_next(now): earliest still-pending start    │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  slot A  ◀── start             (activate)              │  │
//! │  │  slot B  ◀── start + duration  (deactivate)            │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A schedule stays eligible until its deactivation instant has passed.
//! Once slot A has been seen firing the pair is *in flight*: re-arming
//! leaves both slots and their flags alone until slot B has been seen too,
//! so the actuator is always released even though slot B only resolves to
//! whole minutes.  Re-arming with the pair already programmed is a no-op.

use log::{debug, info};

use crate::app::ports::{AlarmClock, AlarmSlot, RtcError};
use crate::schedule::ScheduleCache;

// ═══════════════════════════════════════════════════════════════
//  Selection
// ═══════════════════════════════════════════════════════════════

/// Index of the populated slot with the earliest start among schedules that
/// have not finished at `now`.  Ties go to the lowest index.
pub fn select_next(cache: &ScheduleCache, now: i64) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (index, schedule) in cache.iter() {
        if schedule.end() <= now {
            continue;
        }
        match best {
            Some((_, start)) if schedule.start >= start => {}
            _ => best = Some((index, schedule.start)),
        }
    }
    best.map(|(index, _)| index)
}

// ═══════════════════════════════════════════════════════════════
//  Armed pair
// ═══════════════════════════════════════════════════════════════

/// The activation/deactivation instants currently programmed into the RTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmedPair {
    /// Cache slot the pair was taken from.
    pub slot: usize,
    pub activation: i64,
    pub deactivation: i64,
}

/// Which alarm slots have fired since they were last cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FiredSlots {
    pub activation: bool,
    pub deactivation: bool,
}

impl FiredSlots {
    pub fn any(self) -> bool {
        self.activation || self.deactivation
    }
}

// ═══════════════════════════════════════════════════════════════
//  Planner
// ═══════════════════════════════════════════════════════════════

/// Owns the RTC and remembers the pair it last programmed.
pub struct AlarmPlanner<C: AlarmClock> {
    clock: C,
    armed: Option<ArmedPair>,
    /// Slot A of `armed` was observed, slot B not yet.
    in_flight: bool,
}

impl<C: AlarmClock> AlarmPlanner<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            armed: None,
            in_flight: false,
        }
    }

    pub fn now(&mut self) -> Result<i64, RtcError> {
        self.clock.now()
    }

    /// Program the pair for `selected`.  `None` leaves whatever is armed
    /// untouched and returns `Ok(None)`.  An in-flight pair, or a selection
    /// equal to the programmed pair, is kept without touching the RTC.
    pub fn arm(
        &mut self,
        cache: &ScheduleCache,
        selected: Option<usize>,
    ) -> Result<Option<ArmedPair>, RtcError> {
        if self.in_flight {
            debug!("planner: {:?} in flight, waiting for slot B", self.armed);
            return Ok(self.armed);
        }

        let Some((slot, schedule)) = selected.and_then(|i| cache.get(i).map(|s| (i, s))) else {
            debug!("planner: nothing to arm, keeping {:?}", self.armed);
            return Ok(None);
        };

        let pair = ArmedPair {
            slot,
            activation: schedule.start,
            deactivation: schedule.end(),
        };
        if let Some(current) = self.armed {
            if (current.activation, current.deactivation) == (pair.activation, pair.deactivation) {
                self.armed = Some(pair);
                debug!("planner: slot {} already armed", pair.slot);
                return Ok(Some(pair));
            }
        }

        self.clock.set_alarm(AlarmSlot::A, pair.activation)?;
        self.clock.set_alarm(AlarmSlot::B, pair.deactivation)?;
        self.clock.clear_fired(AlarmSlot::A)?;
        self.clock.clear_fired(AlarmSlot::B)?;
        self.armed = Some(pair);

        info!(
            "planner: armed slot {} on={} off={}",
            pair.slot, pair.activation, pair.deactivation
        );
        Ok(Some(pair))
    }

    /// Read and clear the fired flags.  Only flags that were set are cleared.
    pub fn take_fired(&mut self) -> Result<FiredSlots, RtcError> {
        let fired = FiredSlots {
            activation: self.clock.fired(AlarmSlot::A)?,
            deactivation: self.clock.fired(AlarmSlot::B)?,
        };
        if fired.activation {
            self.clock.clear_fired(AlarmSlot::A)?;
            self.in_flight = self.armed.is_some();
        }
        if fired.deactivation {
            self.clock.clear_fired(AlarmSlot::B)?;
            self.in_flight = false;
        }
        Ok(fired)
    }

    pub fn armed(&self) -> Option<ArmedPair> {
        self.armed
    }

    /// Slot A of the armed pair fired and slot B has not been seen yet.
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}
