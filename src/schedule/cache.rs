//! Fixed-capacity in-memory projection of the schedule log.
//!
//! The cache only ever changes wholesale: every slot is cleared, then the
//! log is decoded in file order into consecutive slots.  Records past
//! [`CACHE_CAPACITY`] are dropped with a warning.

use chrono::FixedOffset;
use log::{info, warn};

use super::record::ScheduleMode;
use super::store::ScheduleStore;
use crate::app::ports::{RecordFs, StorageError};

/// Maximum number of schedules considered for arming.
pub const CACHE_CAPACITY: usize = 50;

/// A schedule normalised to absolute time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedSchedule {
    /// Unix seconds.
    pub start: i64,
    pub duration_secs: u32,
    pub mode: ScheduleMode,
}

impl CachedSchedule {
    /// Instant at which the actuator should be released.
    pub fn end(&self) -> i64 {
        self.start + i64::from(self.duration_secs)
    }
}

/// Result of a [`ScheduleCache::reload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadOutcome {
    pub loaded: usize,
    /// Decodable records that did not fit.
    pub dropped: usize,
    /// Why nothing was loaded, if the log could not be opened.
    pub error: Option<StorageError>,
}

pub struct ScheduleCache {
    slots: [Option<CachedSchedule>; CACHE_CAPACITY],
    utc_offset: FixedOffset,
}

impl ScheduleCache {
    pub fn new(utc_offset: FixedOffset) -> Self {
        Self {
            slots: [None; CACHE_CAPACITY],
            utc_offset,
        }
    }

    /// Rebuild from the store.  Never fails: a store that cannot be opened
    /// leaves the cache empty.
    pub fn reload<F: RecordFs>(&mut self, store: &ScheduleStore<F>) -> ReloadOutcome {
        self.clear();

        let records = match store.records() {
            Ok(records) => records,
            Err(e) => {
                warn!("cache: store unavailable ({}), cache left empty", e);
                return ReloadOutcome {
                    loaded: 0,
                    dropped: 0,
                    error: Some(e),
                };
            }
        };

        let mut loaded = 0usize;
        let mut dropped = 0usize;
        for record in records {
            let schedule = CachedSchedule {
                start: record.start_instant(self.utc_offset),
                duration_secs: record.duration_seconds,
                mode: record.mode(),
            };
            if self.push(schedule) {
                loaded += 1;
            } else {
                dropped += 1;
            }
        }

        if dropped > 0 {
            warn!(
                "cache: {} schedule(s) beyond capacity {} ignored",
                dropped, CACHE_CAPACITY
            );
        }
        info!("cache: {} schedule(s) loaded", loaded);
        ReloadOutcome {
            loaded,
            dropped,
            error: None,
        }
    }

    pub fn clear(&mut self) {
        self.slots = [None; CACHE_CAPACITY];
    }

    pub fn get(&self, index: usize) -> Option<&CachedSchedule> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Populated slots with their indices, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &CachedSchedule)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (i, s)))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Put a schedule into the first free slot.  Returns `false` when full.
    pub fn push(&mut self, schedule: CachedSchedule) -> bool {
        match self.slots.iter_mut().find(|s| s.is_none()) {
            Some(slot) => {
                *slot = Some(schedule);
                true
            }
            None => false,
        }
    }
}
