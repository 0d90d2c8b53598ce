//! Outbound application events.
//!
//! The schedule service and the state manager emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them.

use crate::app::ports::{RtcError, StorageError};
use crate::fsm::{Event, StateId};
use crate::planner::ArmedPair;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The schedule cache was rebuilt from the store.
    CacheReloaded { loaded: usize, dropped: usize },

    /// A new activation/deactivation pair was programmed.
    Armed(ArmedPair),

    /// No pending schedule; the previously armed pair (if any) stays.
    NothingToArm,

    /// The schedule task switched the actuator.
    ActuatorChanged { on: bool },

    /// The schedule store could not be used.
    StorageFailed(StorageError),

    /// The RTC could not be read or programmed.
    RtcFailed(RtcError),

    /// A fault could not be forwarded to the state manager (channel full).
    FaultDropped(Event),

    /// The state machine changed state.
    StateChanged { from: StateId, to: StateId },

    /// An `AskState` answer was not collected in time and was dropped.
    ResponseDropped(StateId),
}
