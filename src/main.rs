//! Irrigation Controller Firmware — Main Entry Point
//!
//! Hexagonal architecture, two interrupt-driven tasks.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  StdFs (SPIFFS)   Ds3231 (I2C)   ValveDriver (GPIO16)          │
//! │  (RecordFs)       (AlarmClock)   (ActuatorPort)                │
//! │  LogEventSink     NvsAdapter                                   │
//! │  (EventSink)      (ConfigPort)                                 │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌──────────────────────────┐   ┌───────────────────────┐      │
//! │  │ ScheduleService          │   │ StateManager          │      │
//! │  │ store · cache · planner  │──▶│ FSM (RtcFail faults)  │      │
//! │  └──────────▲───────────────┘   └───────────▲───────────┘      │
//! │             │ NotifyFlags                   │ query_state      │
//! │   alarm ISR (GPIO7) · ScheduleEditor        main heartbeat     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;

use embassy_time::Duration;
use futures_lite::future::block_on;

use irrigation::adapters::fs::StdFs;
use irrigation::adapters::log_sink::LogEventSink;
use irrigation::adapters::nvs::NvsAdapter;
use irrigation::app::commands::ScheduleEditor;
use irrigation::app::ports::ConfigPort;
use irrigation::app::service::ScheduleService;
use irrigation::config::SystemConfig;
use irrigation::drivers::ds3231::Ds3231;
use irrigation::drivers::hw_init;
use irrigation::drivers::task_pin::{SCHEDULE_TASK, STATE_TASK, spawn_on_core};
use irrigation::drivers::valve::ValveDriver;
use irrigation::events::{Notification, NotifyFlags};
use irrigation::fsm::Event;
use irrigation::fsm::manager::{
    RequestChannel, ResponseChannel, StateManager, query_state, report_fault,
};
use irrigation::pins;
use irrigation::planner::AlarmPlanner;
use irrigation::schedule::{ScheduleCache, ScheduleStore};

// ── Shared statics ────────────────────────────────────────────

static NOTIFY: NotifyFlags = NotifyFlags::new();
static REQUESTS: RequestChannel = RequestChannel::new();
static RESPONSES: ResponseChannel = ResponseChannel::new();

/// Interval between state heartbeats from the main task.
const HEARTBEAT: std::time::Duration = std::time::Duration::from_secs(60);

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Irrigation v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = match NvsAdapter::new().and_then(|nvs| nvs.load()) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config unavailable ({}), using defaults", e);
            SystemConfig::default()
        }
    };
    let offset = config.utc_offset();

    // ── 3. Storage ────────────────────────────────────────────
    if let Err(e) = hw_init::mount_storage() {
        // Schedules cannot be read; the tasks still run and report it.
        error!("{}", e);
    }
    let editor = ScheduleEditor::new(
        ScheduleStore::new(StdFs::new(), &config.schedule_path, &config.schedule_staging_path),
        &NOTIFY,
    );
    match editor.list() {
        Ok(records) => info!("{} schedule(s) on flash", records.len()),
        Err(e) => warn!("schedule log unreadable: {}", e),
    }

    // ── 4. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;

    let valve: &'static ValveDriver<_> = Box::leak(Box::new(ValveDriver::new(
        PinDriver::output(peripherals.pins.gpio16)?,
    )));
    info!("valve relay on GPIO{}", pins::ACTUATOR_GPIO);

    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio8,
        peripherals.pins.gpio9,
        &I2cConfig::new().baudrate(Hertz(config.i2c_frequency_hz)),
    )?;
    info!(
        "DS3231 at 0x{:02x} (SDA GPIO{}, SCL GPIO{})",
        pins::RTC_I2C_ADDR,
        pins::RTC_SDA_GPIO,
        pins::RTC_SCL_GPIO
    );
    let mut rtc = Ds3231::new(i2c, offset);
    if let Err(e) = rtc.init() {
        error!("RTC init failed: {}", e);
        // Manager not running yet; the fault waits in the request channel.
        if report_fault(&REQUESTS.sender(), Event::RtcFail).is_err() {
            warn!("RTC fault not delivered, request channel full");
        }
    }

    hw_init::init_alarm_interrupt(&NOTIFY)?;

    // ── 5. Tasks ──────────────────────────────────────────────
    let manager = StateManager::new(
        valve,
        LogEventSink::new("state"),
        &REQUESTS,
        &RESPONSES,
        Duration::from_millis(u64::from(config.state_response_timeout_ms)),
    );
    spawn_on_core(&STATE_TASK, move || block_on(manager.run()))?;

    let service = ScheduleService::new(
        ScheduleStore::new(StdFs::new(), &config.schedule_path, &config.schedule_staging_path),
        ScheduleCache::new(offset),
        AlarmPlanner::new(rtc),
        valve,
        LogEventSink::new("sched"),
    )
    .with_fault_reporting(REQUESTS.sender());
    spawn_on_core(&SCHEDULE_TASK, move || block_on(service.run(&NOTIFY)))?;

    // First pass: load whatever is on flash and arm it.
    NOTIFY.notify(Notification::NEEDS_RELOAD | Notification::NEEDS_REARM);

    info!("System ready.");

    // ── 6. Heartbeat ──────────────────────────────────────────
    let requests = REQUESTS.sender();
    let responses = RESPONSES.receiver();
    let timeout = Duration::from_millis(u64::from(config.state_response_timeout_ms));
    loop {
        std::thread::sleep(HEARTBEAT);
        match block_on(query_state(&requests, &responses, timeout)) {
            Ok(state) => info!("heartbeat: state={} valve={:?}", state.name(), valve.state()),
            Err(e) => warn!("heartbeat: {}", e),
        }
    }
}
