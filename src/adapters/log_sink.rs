//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the ESP-IDF
//! logger (UART / USB-CDC in production, stderr on the host).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
///
/// `tag` distinguishes the schedule task's sink from the state manager's.
pub struct LogEventSink {
    tag: &'static str,
    emitted: u32,
}

impl LogEventSink {
    pub fn new(tag: &'static str) -> Self {
        Self { tag, emitted: 0 }
    }

    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted = self.emitted.wrapping_add(1);
        let tag = self.tag;
        match event {
            AppEvent::CacheReloaded { loaded, dropped } => {
                info!("{tag} | CACHE | loaded={loaded} dropped={dropped}");
            }
            AppEvent::Armed(pair) => {
                info!(
                    "{tag} | ARMED | slot={} on={} off={}",
                    pair.slot, pair.activation, pair.deactivation
                );
            }
            AppEvent::NothingToArm => info!("{tag} | ARMED | nothing pending"),
            AppEvent::ActuatorChanged { on } => {
                info!("{tag} | VALVE | {}", if *on { "OPEN" } else { "CLOSED" });
            }
            AppEvent::StorageFailed(e) => warn!("{tag} | STORE | {e}"),
            AppEvent::RtcFailed(e) => warn!("{tag} | RTC   | {e}"),
            AppEvent::FaultDropped(event) => {
                warn!("{tag} | FAULT | {:?} not delivered, request channel full", event);
            }
            AppEvent::StateChanged { from, to } => {
                info!("{tag} | STATE | {} -> {}", from.name(), to.name());
            }
            AppEvent::ResponseDropped(state) => {
                warn!("{tag} | STATE | answer {} dropped", state.name());
            }
        }
    }
}
