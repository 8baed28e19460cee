//! Simulated clocks and reset line.
//!
//! Every call that changes hardware state is recorded in a shared
//! [`EventLog`], and any enable or deassert can be made to fail.

use crate::error::PlatformError;
use crate::power::{Clock, PowerResources, ResetLine};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    RateLocked(&'static str, u64),
    RateReleased(&'static str),
    Enabled(&'static str),
    Disabled(&'static str),
    ResetDeasserted,
    ResetAsserted,
}

/// Ordered record of platform calls, shared by every handle of a platform.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<PlatformEvent>>>);

impl EventLog {
    fn push(&self, event: PlatformEvent) {
        trace!("Platform event: {:?}", event);
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    pub fn events(&self) -> Vec<PlatformEvent> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[derive(Debug)]
pub struct SimClock {
    name: &'static str,
    log: EventLog,
    fail_enable: bool,
    fail_rate: bool,
    enabled: bool,
    locked_rate: Option<u64>,
}

impl SimClock {
    pub fn new(name: &'static str, log: EventLog) -> Self {
        Self {
            name,
            log,
            fail_enable: false,
            fail_rate: false,
            enabled: false,
            locked_rate: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn locked_rate(&self) -> Option<u64> {
        self.locked_rate
    }
}

impl Clock for SimClock {
    fn set_rate_exclusive(&mut self, hz: u64) -> Result<(), PlatformError> {
        if self.fail_rate {
            return Err(PlatformError::new(format!(
                "{} clock cannot run at {} Hz",
                self.name, hz
            )));
        }
        self.locked_rate = Some(hz);
        self.log.push(PlatformEvent::RateLocked(self.name, hz));
        Ok(())
    }

    fn release_exclusive_rate(&mut self) {
        self.locked_rate = None;
        self.log.push(PlatformEvent::RateReleased(self.name));
    }

    fn prepare_enable(&mut self) -> Result<(), PlatformError> {
        if self.fail_enable {
            return Err(PlatformError::new(format!(
                "{} clock failed to enable",
                self.name
            )));
        }
        self.enabled = true;
        self.log.push(PlatformEvent::Enabled(self.name));
        Ok(())
    }

    fn disable_unprepare(&mut self) {
        self.enabled = false;
        self.log.push(PlatformEvent::Disabled(self.name));
    }
}

#[derive(Debug)]
pub struct SimReset {
    log: EventLog,
    fail_deassert: bool,
    asserted: bool,
}

impl SimReset {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            fail_deassert: false,
            asserted: true,
        }
    }

    pub fn is_asserted(&self) -> bool {
        self.asserted
    }
}

impl ResetLine for SimReset {
    fn deassert(&mut self) -> Result<(), PlatformError> {
        if self.fail_deassert {
            return Err(PlatformError::new("reset line stuck"));
        }
        self.asserted = false;
        self.log.push(PlatformEvent::ResetDeasserted);
        Ok(())
    }

    fn assert(&mut self) {
        self.asserted = true;
        self.log.push(PlatformEvent::ResetAsserted);
    }
}

/// Bus, module and memory clocks plus the reset line, sharing one log.
#[derive(Debug)]
pub struct SimPlatform {
    log: EventLog,
    bus: SimClock,
    module: SimClock,
    ram: SimClock,
    reset: SimReset,
}

impl SimPlatform {
    #[expect(clippy::new_without_default)]
    pub fn new() -> Self {
        let log = EventLog::default();
        Self {
            bus: SimClock::new("bus", log.clone()),
            module: SimClock::new("mod", log.clone()),
            ram: SimClock::new("ram", log.clone()),
            reset: SimReset::new(log.clone()),
            log,
        }
    }

    pub fn fail_bus_enable(mut self) -> Self {
        self.bus.fail_enable = true;
        self
    }

    pub fn fail_module_enable(mut self) -> Self {
        self.module.fail_enable = true;
        self
    }

    pub fn fail_ram_enable(mut self) -> Self {
        self.ram.fail_enable = true;
        self
    }

    pub fn fail_module_rate(mut self) -> Self {
        self.module.fail_rate = true;
        self
    }

    pub fn fail_reset_deassert(mut self) -> Self {
        self.reset.fail_deassert = true;
        self
    }

    pub fn log(&self) -> EventLog {
        self.log.clone()
    }

    pub fn into_resources(self) -> PowerResources<SimClock, SimReset> {
        PowerResources {
            bus_clock: self.bus,
            module_clock: self.module,
            ram_clock: self.ram,
            reset: self.reset,
        }
    }
}
