//! Power, clock and reset sequencing.
//!
//! The block needs its reset line released, an exclusive 300 MHz module
//! clock, the bus clock, the module clock and the memory bus clock, in that
//! order, before the top level gates can be opened. A failure part way
//! through unwinds the steps already taken in reverse, so the device is never
//! left half powered.

use crate::error::{G2dError, G2dResult, PlatformError};
use crate::program::Programmer;
use crate::regs::RegisterFile;
use tracing::{debug, error, info};

/// Platform clock handle.
pub trait Clock {
    /// Lock the clock to `hz` for exclusive use.
    fn set_rate_exclusive(&mut self, hz: u64) -> Result<(), PlatformError>;

    fn release_exclusive_rate(&mut self);

    fn prepare_enable(&mut self) -> Result<(), PlatformError>;

    fn disable_unprepare(&mut self);
}

/// Platform reset line handle.
pub trait ResetLine {
    /// Take the block out of reset.
    fn deassert(&mut self) -> Result<(), PlatformError>;

    /// Hold the block in reset.
    fn assert(&mut self);
}

/// One step of the activation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerStep {
    Reset,
    ExclusiveRate,
    BusClock,
    ModuleClock,
    RamClock,
}

impl PowerStep {
    /// Activation order. Deactivation runs it backwards.
    pub const SEQUENCE: [PowerStep; 5] = [
        PowerStep::Reset,
        PowerStep::ExclusiveRate,
        PowerStep::BusClock,
        PowerStep::ModuleClock,
        PowerStep::RamClock,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Suspended,
    Active,
}

/// Clock and reset handles of the block.
pub struct PowerResources<C, L> {
    pub bus_clock: C,
    pub module_clock: C,
    pub ram_clock: C,
    pub reset: L,
}

/// Sequences the platform resources around device activation.
pub struct PowerController<C: Clock, L: ResetLine> {
    resources: PowerResources<C, L>,
    module_clock_hz: u64,
    state: PowerState,
}

impl<C: Clock, L: ResetLine> PowerController<C, L> {
    pub fn new(resources: PowerResources<C, L>, module_clock_hz: u64) -> Self {
        Self {
            resources,
            module_clock_hz,
            state: PowerState::Suspended,
        }
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == PowerState::Active
    }

    pub fn resources(&self) -> &PowerResources<C, L> {
        &self.resources
    }

    /// Bring the device up and open its gates.
    ///
    /// Does nothing if already active. On failure every completed step is
    /// undone and the first error is returned.
    pub fn activate<R: RegisterFile>(&mut self, regs: &mut R) -> G2dResult<()> {
        if self.is_active() {
            return Ok(());
        }

        let mut completed = Vec::with_capacity(PowerStep::SEQUENCE.len());
        for step in PowerStep::SEQUENCE {
            if let Err(source) = self.apply(step) {
                error!("G2D activation failed at {:?}: {}", step, source);
                for done in completed.iter().rev() {
                    self.undo(*done);
                }
                return Err(G2dError::ActivationFailure { step, source });
            }
            completed.push(step);
        }

        Programmer::new(regs, false).open_gates();
        self.state = PowerState::Active;
        info!("G2D active, module clock {} Hz", self.module_clock_hz);
        Ok(())
    }

    /// Close the gates and release every resource. Does nothing if already
    /// suspended.
    pub fn deactivate<R: RegisterFile>(&mut self, regs: &mut R) {
        if !self.is_active() {
            return;
        }

        Programmer::new(regs, false).close_gates();
        for step in PowerStep::SEQUENCE.iter().rev() {
            self.undo(*step);
        }
        self.state = PowerState::Suspended;
        info!("G2D suspended");
    }

    fn apply(&mut self, step: PowerStep) -> Result<(), PlatformError> {
        debug!("Power step {:?}", step);
        let res = &mut self.resources;
        match step {
            PowerStep::Reset => res.reset.deassert(),
            PowerStep::ExclusiveRate => res.module_clock.set_rate_exclusive(self.module_clock_hz),
            PowerStep::BusClock => res.bus_clock.prepare_enable(),
            PowerStep::ModuleClock => res.module_clock.prepare_enable(),
            PowerStep::RamClock => res.ram_clock.prepare_enable(),
        }
    }

    fn undo(&mut self, step: PowerStep) {
        debug!("Undo power step {:?}", step);
        let res = &mut self.resources;
        match step {
            PowerStep::Reset => res.reset.assert(),
            PowerStep::ExclusiveRate => res.module_clock.release_exclusive_rate(),
            PowerStep::BusClock => res.bus_clock.disable_unprepare(),
            PowerStep::ModuleClock => res.module_clock.disable_unprepare(),
            PowerStep::RamClock => res.ram_clock.disable_unprepare(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{PlatformEvent, SimG2d, SimPlatform};
    use g2d_hw::mmio::g2d::top;
    use g2d_hw::specs::clock::MODULE_CLOCK_HZ;

    #[test]
    fn activation_runs_in_order_and_opens_gates() {
        let platform = SimPlatform::new();
        let log = platform.log();
        let mut regs = SimG2d::new();
        let mut power = PowerController::new(platform.into_resources(), MODULE_CLOCK_HZ);

        power.activate(&mut regs).unwrap();

        assert_eq!(power.state(), PowerState::Active);
        assert_eq!(
            log.events(),
            vec![
                PlatformEvent::ResetDeasserted,
                PlatformEvent::RateLocked("mod", MODULE_CLOCK_HZ),
                PlatformEvent::Enabled("bus"),
                PlatformEvent::Enabled("mod"),
                PlatformEvent::Enabled("ram"),
            ]
        );
        assert_eq!(regs.register(top::SCLK_GATE), top::MIXER | top::ROT);
        assert_eq!(regs.register(top::HCLK_GATE), top::MIXER | top::ROT);
        assert_eq!(regs.register(top::AHB_RESET), top::MIXER | top::ROT);
    }

    #[test]
    fn second_activation_is_a_no_op() {
        let platform = SimPlatform::new();
        let log = platform.log();
        let mut regs = SimG2d::new();
        let mut power = PowerController::new(platform.into_resources(), MODULE_CLOCK_HZ);

        power.activate(&mut regs).unwrap();
        power.activate(&mut regs).unwrap();
        assert_eq!(log.events().len(), 5);
    }

    #[test]
    fn module_clock_failure_unwinds_in_reverse() {
        let platform = SimPlatform::new().fail_module_enable();
        let log = platform.log();
        let mut regs = SimG2d::new();
        let mut power = PowerController::new(platform.into_resources(), MODULE_CLOCK_HZ);

        let err = power.activate(&mut regs).unwrap_err();

        assert!(matches!(
            err,
            G2dError::ActivationFailure {
                step: PowerStep::ModuleClock,
                ..
            }
        ));
        assert_eq!(power.state(), PowerState::Suspended);
        assert_eq!(
            log.events(),
            vec![
                PlatformEvent::ResetDeasserted,
                PlatformEvent::RateLocked("mod", MODULE_CLOCK_HZ),
                PlatformEvent::Enabled("bus"),
                PlatformEvent::Disabled("bus"),
                PlatformEvent::RateReleased("mod"),
                PlatformEvent::ResetAsserted,
            ]
        );
        assert_eq!(regs.register(top::SCLK_GATE), 0);
    }

    #[test]
    fn reset_failure_touches_nothing_else() {
        let platform = SimPlatform::new().fail_reset_deassert();
        let log = platform.log();
        let mut regs = SimG2d::new();
        let mut power = PowerController::new(platform.into_resources(), MODULE_CLOCK_HZ);

        let err = power.activate(&mut regs).unwrap_err();
        assert!(matches!(
            err,
            G2dError::ActivationFailure {
                step: PowerStep::Reset,
                ..
            }
        ));
        assert!(log.events().is_empty());
    }

    #[test]
    fn deactivation_closes_gates_then_releases_in_reverse() {
        let platform = SimPlatform::new();
        let log = platform.log();
        let mut regs = SimG2d::new();
        let mut power = PowerController::new(platform.into_resources(), MODULE_CLOCK_HZ);

        power.activate(&mut regs).unwrap();
        log.clear();
        power.deactivate(&mut regs);

        assert_eq!(power.state(), PowerState::Suspended);
        assert_eq!(regs.register(top::AHB_RESET), 0);
        assert_eq!(
            log.events(),
            vec![
                PlatformEvent::Disabled("ram"),
                PlatformEvent::Disabled("mod"),
                PlatformEvent::Disabled("bus"),
                PlatformEvent::RateReleased("mod"),
                PlatformEvent::ResetAsserted,
            ]
        );

        power.deactivate(&mut regs);
        assert_eq!(log.events().len(), 5);
    }
}
