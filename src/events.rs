//! Notification flag set for the schedule task.
//!
//! Producers:
//! - the RTC alarm-line ISR (`ALARM_TRIGGERED`)
//! - schedule upload / delete handlers (`NEEDS_RELOAD | NEEDS_REARM`)
//! - boot (`NEEDS_RELOAD | NEEDS_REARM`)
//!
//! The schedule task is the only consumer.  It sleeps until the word is
//! non-zero, then takes and clears every pending bit in one atomic swap.
//!
//! ```text
//! ┌─────────────┐
//! │ Alarm ISR   │──┐  fetch_or     ┌──────────────┐  swap(0)  ┌───────────────┐
//! │ Upload      │──┼─────────────▶│ NotifyFlags  │─────────▶│ Schedule Task │
//! │ Delete      │──┘  + wake       │ (AtomicU32)  │           │ (consumer)    │
//! └─────────────┘                  └──────────────┘           └───────────────┘
//! ```
//!
//! Bits collapse: setting a bit that is already pending is a no-op, so the
//! consumer cannot tell one notification from several.

use core::ops::{BitOr, BitOrAssign};
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// A set of notification bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Notification(u32);

impl Notification {
    pub const NONE: Self = Self(0);
    /// The schedule store changed; rebuild the cache.
    pub const NEEDS_RELOAD: Self = Self(1 << 0);
    /// Pick the next schedule and reprogram the RTC alarms.
    pub const NEEDS_REARM: Self = Self(1 << 1);
    /// The RTC alarm line was asserted.
    pub const ALARM_TRIGGERED: Self = Self(1 << 2);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// At least one bit of `other` is set.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for Notification {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Notification {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

// ── Flag set ──────────────────────────────────────────────────

/// Lock-free notification word plus a wake signal for the consumer.
///
/// `notify` never blocks and never allocates, so it is callable from ISR
/// context.  `wait` is the single consumer.
pub struct NotifyFlags {
    pending: AtomicU32,
    wake: Signal<CriticalSectionRawMutex, ()>,
}

impl NotifyFlags {
    pub const fn new() -> Self {
        Self {
            pending: AtomicU32::new(0),
            wake: Signal::new(),
        }
    }

    /// Set `bits` and wake the consumer.  ISR-safe.
    pub fn notify(&self, bits: Notification) {
        if bits.is_empty() {
            return;
        }
        self.pending.fetch_or(bits.bits(), Ordering::AcqRel);
        self.wake.signal(());
    }

    /// Take and clear every pending bit without blocking.
    pub fn take(&self) -> Notification {
        Notification::from_bits(self.pending.swap(0, Ordering::AcqRel))
    }

    /// Block until at least one bit is pending, then take them all.
    pub async fn wait(&self) -> Notification {
        loop {
            let pending = self.take();
            if !pending.is_empty() {
                return pending;
            }
            self.wake.wait().await;
        }
    }

    /// Peek without clearing.
    pub fn pending(&self) -> Notification {
        Notification::from_bits(self.pending.load(Ordering::Acquire))
    }
}

impl Default for NotifyFlags {
    fn default() -> Self {
        Self::new()
    }
}
