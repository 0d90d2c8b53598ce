//! Table-driven device state machine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  TransitionTable                                             │
//! │  ┌────────────────┬──────────────┬────────────────────────┐  │
//! │  │ Event          │ next state   │ effect                 │  │
//! │  ├────────────────┼──────────────┼────────────────────────┤  │
//! │  │ DeviceOn       │ Active       │ actuator on            │  │
//! │  │ DeviceOff      │ Idle         │ actuator off           │  │
//! │  │ *Fail / Wifi…  │ Error        │ —                      │  │
//! │  │ AskState       │ (unchanged)  │ publish state          │  │
//! │  │ anything else  │ Idle         │ —                      │  │
//! │  └────────────────┴──────────────┴────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Side effects belong to the event, not to the state entered: a second
//! `DeviceOn` while already `Active` re-asserts the actuator.  The engine
//! only decides; [`manager::StateManager`] carries the effects out.

pub mod manager;
pub mod states;

use log::info;

use states::TransitionRule;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all device states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Idle = 0,
    Active = 1,
    /// Reserved for on-device configuration; no event leads here yet.
    Config = 2,
    Error = 3,
}

impl StateId {
    pub const COUNT: usize = 4;

    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Active => "Active",
            Self::Config => "Config",
            Self::Error => "Error",
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Requests accepted by the state manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    DeviceOn,
    DeviceOff,
    DeviceFail,
    WifiDisconnect,
    NtpFail,
    RtcFail,
    AskState,
    /// Any wire code outside the known set.
    Unrecognized(u8),
}

impl Event {
    /// Number of recognised events (rows in the transition table).
    pub const KNOWN: usize = 7;

    /// Decode a wire code.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::DeviceOn,
            1 => Self::DeviceOff,
            2 => Self::DeviceFail,
            3 => Self::WifiDisconnect,
            4 => Self::NtpFail,
            5 => Self::RtcFail,
            6 => Self::AskState,
            other => Self::Unrecognized(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::DeviceOn => 0,
            Self::DeviceOff => 1,
            Self::DeviceFail => 2,
            Self::WifiDisconnect => 3,
            Self::NtpFail => 4,
            Self::RtcFail => 5,
            Self::AskState => 6,
            Self::Unrecognized(code) => code,
        }
    }

    /// Whether this event reports a hardware or network failure.
    pub fn is_fault(self) -> bool {
        matches!(
            self,
            Self::DeviceFail | Self::WifiDisconnect | Self::NtpFail | Self::RtcFail
        )
    }
}

// ---------------------------------------------------------------------------
// Effects and transitions
// ---------------------------------------------------------------------------

/// Work the state manager performs after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    ActuatorOn,
    ActuatorOff,
    /// Publish the (unchanged) current state to the response channel.
    PublishState,
}

/// Result of feeding one event to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: StateId,
    pub to: StateId,
    pub effect: Effect,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The state machine engine.  Starts in `initial`, has no terminal state.
pub struct Fsm {
    table: [TransitionRule; Event::KNOWN],
    current: StateId,
    /// Number of events handled (wraps at u64::MAX).
    handled: u64,
}

impl Fsm {
    pub fn new(table: [TransitionRule; Event::KNOWN], initial: StateId) -> Self {
        Self {
            table,
            current: initial,
            handled: 0,
        }
    }

    /// Apply one event.  Unknown events fall back to `Idle` with no effect.
    pub fn handle(&mut self, event: Event) -> Transition {
        self.handled = self.handled.wrapping_add(1);

        let (next, effect) = match self.table.iter().find(|rule| rule.event == event) {
            Some(rule) => (rule.next.unwrap_or(self.current), rule.effect),
            None => (StateId::Idle, Effect::None),
        };

        let transition = Transition {
            from: self.current,
            to: next,
            effect,
        };
        if transition.changed() {
            info!(
                "FSM transition: {} -> {} ({:?})",
                self.current.name(),
                next.name(),
                event
            );
        }
        self.current = next;
        transition
    }

    pub fn current_state(&self) -> StateId {
        self.current
    }

    pub fn events_handled(&self) -> u64 {
        self.handled
    }
}
