//! State manager task and its request/response channels.
//!
//! ```text
//!  producers ──send(Event)──▶ [requests; 1] ──▶ StateManager ──▶ Fsm
//!                                                   │
//!  asker ◀──receive(StateId)── [responses; 1] ◀─────┘  (AskState, bounded wait)
//! ```
//!
//! Both channels hold a single message.  Producers block until the manager
//! has taken the previous request.  The manager waits at most the configured
//! timeout for room in the response slot and drops the answer otherwise; an
//! answer that found room stays buffered until someone reads it, so
//! [`query_state`] discards leftovers before asking.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender, TrySendError};
use embassy_time::{Duration, with_timeout};
use log::{debug, warn};

use super::{Effect, Event, Fsm, StateId, states};
use crate::app::events::AppEvent;
use crate::app::ports::{ActuatorPort, EventSink};
use crate::error::{Error, Result};

pub const REQUEST_DEPTH: usize = 1;
pub const RESPONSE_DEPTH: usize = 1;

pub type RequestChannel = Channel<CriticalSectionRawMutex, Event, REQUEST_DEPTH>;
pub type ResponseChannel = Channel<CriticalSectionRawMutex, StateId, RESPONSE_DEPTH>;
pub type RequestSender<'a> = Sender<'a, CriticalSectionRawMutex, Event, REQUEST_DEPTH>;
pub type RequestReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, Event, REQUEST_DEPTH>;
pub type ResponseSender<'a> = Sender<'a, CriticalSectionRawMutex, StateId, RESPONSE_DEPTH>;
pub type ResponseReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, StateId, RESPONSE_DEPTH>;

/// Owns the device state.  Nothing else reads it except through `AskState`.
pub struct StateManager<'a, A: ActuatorPort, S: EventSink> {
    fsm: Fsm,
    actuator: A,
    sink: S,
    requests: RequestReceiver<'a>,
    responses: ResponseSender<'a>,
    publish_timeout: Duration,
}

impl<'a, A: ActuatorPort, S: EventSink> StateManager<'a, A, S> {
    pub fn new(
        actuator: A,
        sink: S,
        requests: &'a RequestChannel,
        responses: &'a ResponseChannel,
        publish_timeout: Duration,
    ) -> Self {
        Self {
            fsm: Fsm::new(states::build_transition_table(), StateId::Idle),
            actuator,
            sink,
            requests: requests.receiver(),
            responses: responses.sender(),
            publish_timeout,
        }
    }

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Apply one event and carry out its effect.
    ///
    /// Returns the resulting state, or `Error::ChannelFull` when an
    /// `AskState` answer could not be published in time.  The state itself
    /// is updated either way.
    pub async fn handle(&mut self, event: Event) -> Result<StateId> {
        let transition = self.fsm.handle(event);
        if transition.changed() {
            self.sink.emit(&AppEvent::StateChanged {
                from: transition.from,
                to: transition.to,
            });
        }

        match transition.effect {
            Effect::None => {}
            Effect::ActuatorOn => self.actuator.set_output(true),
            Effect::ActuatorOff => self.actuator.set_output(false),
            Effect::PublishState => {
                let state = transition.to;
                if with_timeout(self.publish_timeout, self.responses.send(state))
                    .await
                    .is_err()
                {
                    warn!("state: response slot still full, answer {} dropped", state.name());
                    self.sink.emit(&AppEvent::ResponseDropped(state));
                    return Err(Error::ChannelFull);
                }
                debug!("state: published {}", state.name());
            }
        }
        Ok(transition.to)
    }

    /// Wait for the next request and handle it.
    pub async fn serve_one(&mut self) -> StateId {
        let event = self.requests.receive().await;
        match self.handle(event).await {
            Ok(state) => state,
            Err(_) => self.state(),
        }
    }

    /// Task body.  Never returns.
    pub async fn run(mut self) -> ! {
        loop {
            self.serve_one().await;
        }
    }
}

/// Hand a fault to the state manager without blocking.
///
/// For contexts that must not wait on the manager (the schedule task,
/// callbacks).  A full channel drops the fault.
pub fn report_fault(requests: &RequestSender<'_>, event: Event) -> Result<()> {
    if let Err(TrySendError::Full(dropped)) = requests.try_send(event) {
        warn!("state: request channel full, {:?} dropped", dropped);
        return Err(Error::ChannelFull);
    }
    Ok(())
}

/// Ask for the current state and wait up to `timeout` for the answer.
///
/// Answers left over from earlier queries that timed out are discarded
/// first.
pub async fn query_state(
    requests: &RequestSender<'_>,
    responses: &ResponseReceiver<'_>,
    timeout: Duration,
) -> Result<StateId> {
    while let Ok(stale) = responses.try_receive() {
        debug!("state: discarding stale answer {}", stale.name());
    }
    requests.send(Event::AskState).await;
    with_timeout(timeout, responses.receive())
        .await
        .map_err(|_| Error::ChannelFull)
}
