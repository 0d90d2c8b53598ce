//! Persistent watering schedules and their in-memory projection.
//!
//! ```text
//!   upload / delete ──▶ ScheduleStore (log file) ──reload──▶ ScheduleCache
//!                                                              │
//!                                                              ▼
//!                                                        AlarmPlanner
//! ```

pub mod cache;
pub mod record;
pub mod store;

pub use cache::{CACHE_CAPACITY, CachedSchedule, ReloadOutcome, ScheduleCache};
pub use record::{Decoded, RecordDecoder, ScheduleMode, ScheduleRecord, decode_str, encode_one};
pub use store::ScheduleStore;
