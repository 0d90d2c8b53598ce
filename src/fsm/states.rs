//! Transition table for the device state machine.
//!
//! One row per recognised event.  `next: None` means the state is left
//! unchanged.

use super::{Effect, Event, StateId};

/// Static row of the transition table.
#[derive(Debug, Clone, Copy)]
pub struct TransitionRule {
    pub event: Event,
    pub next: Option<StateId>,
    pub effect: Effect,
}

const fn rule(event: Event, next: Option<StateId>, effect: Effect) -> TransitionRule {
    TransitionRule {
        event,
        next,
        effect,
    }
}

/// Build the table.  Order does not matter; each event appears once.
pub fn build_transition_table() -> [TransitionRule; Event::KNOWN] {
    [
        rule(Event::DeviceOn, Some(StateId::Active), Effect::ActuatorOn),
        rule(Event::DeviceOff, Some(StateId::Idle), Effect::ActuatorOff),
        rule(Event::DeviceFail, Some(StateId::Error), Effect::None),
        rule(Event::WifiDisconnect, Some(StateId::Error), Effect::None),
        rule(Event::NtpFail, Some(StateId::Error), Effect::None),
        rule(Event::RtcFail, Some(StateId::Error), Effect::None),
        rule(Event::AskState, None, Effect::PublishState),
    ]
}
