//! State manager wiring: faults from the schedule task, `AskState` round
//! trips, and the manager running on its own task thread.

use core::convert::Infallible;

use embassy_time::Duration;
use embedded_hal::digital::{ErrorType, OutputPin};
use futures_lite::future::{block_on, zip};

use crate::mock_hw::{MockRelay, MockRtc, RecordingSink};

use irrigation::adapters::fs::SimFs;
use irrigation::app::events::AppEvent;
use irrigation::app::ports::{ActuatorPort, RtcError};
use irrigation::app::service::ScheduleService;
use irrigation::config::SystemConfig;
use irrigation::drivers::task_pin::{STATE_TASK, spawn_on_core};
use irrigation::drivers::valve::{ValveDriver, ValveState};
use irrigation::error::Error;
use irrigation::events::Notification;
use irrigation::fsm::manager::{
    RequestChannel, ResponseChannel, StateManager, query_state, report_fault,
};
use irrigation::fsm::{Event, StateId};
use irrigation::planner::AlarmPlanner;
use irrigation::schedule::{ScheduleCache, ScheduleStore};

const PUBLISH: Duration = Duration::from_millis(50);
const ASK: Duration = Duration::from_millis(500);

#[test]
fn rtc_fault_from_schedule_task_reaches_error_state() {
    let requests = RequestChannel::new();
    let responses = ResponseChannel::new();
    let relay = MockRelay::new();

    let mut rtc = MockRtc::new(0);
    rtc.fault = Some(RtcError::Bus);
    let mut svc = ScheduleService::new(
        ScheduleStore::new(SimFs::new(), "log", "tmp"),
        ScheduleCache::new(SystemConfig::default().utc_offset()),
        AlarmPlanner::new(rtc),
        &relay,
        RecordingSink::new(),
    )
    .with_fault_reporting(requests.sender());
    svc.process(Notification::NEEDS_REARM);
    assert!(svc.sink().events.contains(&AppEvent::RtcFailed(RtcError::Bus)));

    let mut mgr = StateManager::new(&relay, RecordingSink::new(), &requests, &responses, PUBLISH);
    let tx = requests.sender();
    let rx = responses.receiver();
    let (answer, ()) = block_on(zip(query_state(&tx, &rx, ASK), async {
        mgr.serve_one().await;
        mgr.serve_one().await;
    }));

    assert_eq!(answer, Ok(StateId::Error));
    assert_eq!(
        mgr.sink().events,
        [AppEvent::StateChanged { from: StateId::Idle, to: StateId::Error }]
    );
}

#[test]
fn device_events_drive_the_relay() {
    let requests = RequestChannel::new();
    let responses = ResponseChannel::new();
    let relay = MockRelay::new();
    let mut mgr = StateManager::new(&relay, RecordingSink::new(), &requests, &responses, PUBLISH);
    let tx = requests.sender();

    block_on(tx.send(Event::DeviceOn));
    assert_eq!(block_on(mgr.serve_one()), StateId::Active);
    assert!(relay.is_on());

    block_on(tx.send(Event::DeviceOff));
    assert_eq!(block_on(mgr.serve_one()), StateId::Idle);
    assert!(!relay.is_on());
    assert_eq!(relay.history(), [true, false]);
}

#[test]
fn unrecognised_event_returns_to_idle_without_touching_relay() {
    let requests = RequestChannel::new();
    let responses = ResponseChannel::new();
    let relay = MockRelay::new();
    let mut mgr = StateManager::new(&relay, RecordingSink::new(), &requests, &responses, PUBLISH);

    block_on(async {
        mgr.handle(Event::DeviceOn).await.unwrap();
        mgr.handle(Event::from_code(42)).await.unwrap();
    });
    assert_eq!(mgr.state(), StateId::Idle);
    assert!(relay.is_on());
}

#[test]
fn query_without_a_running_manager_times_out() {
    let requests = RequestChannel::new();
    let responses = ResponseChannel::new();
    let answer = block_on(query_state(
        &requests.sender(),
        &responses.receiver(),
        Duration::from_millis(20),
    ));
    assert_eq!(answer, Err(Error::ChannelFull));
    // The request itself was delivered.
    assert_eq!(requests.try_receive().ok(), Some(Event::AskState));
}

// ── Manager on its own task ───────────────────────────────────

struct SimPin;

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

#[test]
fn manager_task_serves_queries_from_another_thread() {
    static REQUESTS: RequestChannel = RequestChannel::new();
    static RESPONSES: ResponseChannel = ResponseChannel::new();

    let valve: &'static ValveDriver<SimPin> = Box::leak(Box::new(ValveDriver::new(SimPin)));
    let mgr = StateManager::new(valve, RecordingSink::new(), &REQUESTS, &RESPONSES, PUBLISH);
    spawn_on_core(&STATE_TASK, move || block_on(mgr.run())).unwrap();

    let tx = REQUESTS.sender();
    let rx = RESPONSES.receiver();

    report_fault(&tx, Event::DeviceOn).unwrap();
    assert_eq!(block_on(query_state(&tx, &rx, ASK)), Ok(StateId::Active));
    assert_eq!(valve.state(), ValveState::Open);

    block_on(tx.send(Event::NtpFail));
    assert_eq!(block_on(query_state(&tx, &rx, ASK)), Ok(StateId::Error));
    // Faults leave the relay where it was.
    assert_eq!(valve.state(), ValveState::Open);
}
