//! Pump/valve relay driver.
//!
//! Wraps a single push-pull output behind a critical-section mutex so the
//! schedule task and the state manager can share one `&'static` instance.
//! The last commanded level is mirrored in an atomic for cheap reads.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::app::ports::ActuatorPort;

/// Relay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValveState {
    Closed,
    Open,
}

pub struct ValveDriver<P: OutputPin> {
    pin: Mutex<CriticalSectionRawMutex, RefCell<P>>,
    on: AtomicBool,
}

impl<P: OutputPin> ValveDriver<P> {
    /// Takes ownership of the pin and drives it low.
    pub fn new(mut pin: P) -> Self {
        if pin.set_low().is_err() {
            warn!("valve: failed to drive output low at init");
        }
        Self {
            pin: Mutex::new(RefCell::new(pin)),
            on: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> ValveState {
        if self.on.load(Ordering::Acquire) {
            ValveState::Open
        } else {
            ValveState::Closed
        }
    }
}

impl<P: OutputPin> ActuatorPort for ValveDriver<P> {
    fn set_output(&self, on: bool) {
        let ok = self.pin.lock(|pin| {
            let mut pin = pin.borrow_mut();
            let res = if on { pin.set_high() } else { pin.set_low() };
            res.is_ok()
        });
        if !ok {
            warn!("valve: output write failed (wanted {})", if on { "open" } else { "closed" });
            return;
        }
        let was = self.on.swap(on, Ordering::AcqRel);
        if was != on {
            info!("valve: {:?}", self.state());
        }
    }

    fn is_on(&self) -> bool {
        self.on.load(Ordering::Acquire)
    }
}
