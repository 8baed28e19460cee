//! Job execution engine.
//!
//! The engine is the only stateful piece: it owns the register file, the
//! power controller and the job in flight, all behind one mutex. `submit`
//! arms the hardware and returns; completion arrives through
//! [`G2d::on_interrupt`], which may be called from another thread.
//!
//! ```text
//!            submit                    on_interrupt (pending)
//!   Idle ------------> Dispatched ---------------------------> Idle
//!                          |                                 (Success)
//!                          +--- force_reset ---------------> Idle
//!                                                            (Aborted)
//! ```

use crate::context::{BufferQueue, Context};
use crate::error::{G2dError, G2dResult};
use crate::frame::{FrameDescriptor, PlaneAddressSet};
use crate::job::{Completion, CompletionStatus, InterruptOutcome, Job, JobId, JobState};
use crate::layout::{check_address_reach, resolve_plane_layout};
use crate::power::{Clock, PowerController, PowerResources, ResetLine};
use crate::program::{BlendPipe, Layer, Programmer};
use crate::regs::RegisterFile;
use g2d_hw::specs::bus::ADDRESS_BITS;
use g2d_hw::specs::clock::MODULE_CLOCK_HZ;
use std::sync::mpsc;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

/// Global alpha of the source layer of a blit
const BLIT_LAYER_ALPHA: u8 = 0xFF;

/// Configuration for the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Exclusive rate requested for the module clock
    pub module_clock_hz: u64,
    /// Program the high address registers, for buses wider than 32 bits
    pub wide_addressing: bool,
}

impl EngineConfig {
    /// Address bits the layer and write-back registers can express
    pub fn address_bits(&self) -> u32 {
        if self.wide_addressing {
            ADDRESS_BITS
        } else {
            32
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            module_clock_hz: MODULE_CLOCK_HZ,
            wide_addressing: true,
        }
    }
}

#[derive(Debug)]
struct Running {
    id: JobId,
    job: Job,
}

struct Inner<R, C: Clock, L: ResetLine> {
    regs: R,
    power: PowerController<C, L>,
    /// Outstanding `power_get` calls
    power_refs: usize,
    running: Option<Running>,
    next_id: u64,
    notifier: Option<mpsc::Sender<Completion>>,
}

impl<R, C: Clock, L: ResetLine> Inner<R, C, L> {
    fn notify(&mut self, completion: Completion) {
        if let Some(tx) = &self.notifier {
            if tx.send(completion).is_err() {
                debug!("Completion receiver dropped");
                self.notifier = None;
            }
        }
    }
}

/// G2D engine over a register file `R`, clocks `C` and reset line `L`.
pub struct G2d<R, C: Clock, L: ResetLine> {
    inner: Mutex<Inner<R, C, L>>,
    config: EngineConfig,
}

impl<R: RegisterFile, C: Clock, L: ResetLine> G2d<R, C, L> {
    pub fn new(regs: R, resources: PowerResources<C, L>, config: EngineConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                regs,
                power: PowerController::new(resources, config.module_clock_hz),
                power_refs: 0,
                running: None,
                next_id: 1,
                notifier: None,
            }),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Inner<R, C, L>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Receive every completion from now on. Replaces any earlier receiver.
    pub fn subscribe(&self) -> mpsc::Receiver<Completion> {
        let (tx, rx) = mpsc::channel();
        self.lock().notifier = Some(tx);
        rx
    }

    pub fn state(&self) -> JobState {
        match &self.lock().running {
            Some(running) => JobState::Dispatched(running.id),
            None => JobState::Idle,
        }
    }

    pub fn is_powered(&self) -> bool {
        self.lock().power.is_active()
    }

    /// Run `f` with the register file while holding the engine lock.
    pub fn with_registers<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
        f(&mut self.lock().regs)
    }

    /// Take a power reference. The first one activates the device.
    #[instrument(level = "debug", skip(self))]
    pub fn power_get(&self) -> G2dResult<()> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if inner.power_refs == 0 {
            inner.power.activate(&mut inner.regs)?;
        }
        inner.power_refs += 1;
        Ok(())
    }

    /// Drop a power reference. The last one deactivates the device, which
    /// is refused with [`G2dError::Busy`] while a job is in flight.
    #[instrument(level = "debug", skip(self))]
    pub fn power_put(&self) -> G2dResult<()> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        match inner.power_refs {
            0 => {
                warn!("Unbalanced G2D power_put");
                return Ok(());
            }
            1 if inner.running.is_some() => return Err(G2dError::Busy),
            _ => {}
        }
        inner.power_refs -= 1;
        if inner.power_refs == 0 {
            inner.power.deactivate(&mut inner.regs);
        }
        Ok(())
    }

    /// Program and start `job`. Returns once the hardware is armed.
    ///
    /// A job carries its own buffer addresses, so it is dispatchable as soon
    /// as it exists. Checking the buffer queue is up to the caller, which is
    /// what [`G2d::device_run`] does.
    ///
    /// Fails with [`G2dError::Busy`] while another job is in flight. Every
    /// frame, and the address range each of its planes reaches, is checked
    /// before the device is touched. A rejected job leaves the engine as it
    /// was.
    #[instrument(level = "debug", skip_all)]
    pub fn submit(&self, job: Job) -> G2dResult<JobId> {
        let mut guard = self.lock();
        let inner = &mut *guard;

        if let Some(running) = &inner.running {
            debug!("Job {} still running", running.id);
            return Err(G2dError::Busy);
        }
        validate_job(&job, self.config.address_bits())?;

        inner.power.activate(&mut inner.regs)?;

        let wide = self.config.wide_addressing;
        if let Err(err) = dispatch(&mut inner.regs, wide, &job) {
            // Leave nothing half programmed behind
            Programmer::new(&mut inner.regs, wide).hw_reset();
            return Err(err);
        }
        let id = JobId(inner.next_id);
        inner.next_id += 1;
        info!("Job {} dispatched: {:?}", id, job.operation());
        inner.running = Some(Running { id, job });
        Ok(id)
    }

    /// Service the completion interrupt.
    ///
    /// With nothing pending the interrupt is reported as spurious and the
    /// engine is left alone. Otherwise the pending bit is acknowledged, the
    /// mixer is reset and the running job completes.
    #[instrument(level = "trace", skip(self))]
    pub fn on_interrupt(&self) -> InterruptOutcome {
        let mut guard = self.lock();
        let inner = &mut *guard;

        if !inner.power.is_active() {
            warn!("G2D interrupt while suspended");
            return InterruptOutcome::Spurious;
        }

        let mut programmer = Programmer::new(&mut inner.regs, self.config.wide_addressing);
        if !programmer.irq_query() {
            warn!("Spurious G2D interrupt");
            return InterruptOutcome::Spurious;
        }
        programmer.mixer_reset();

        let Some(running) = inner.running.take() else {
            warn!("G2D completion pending with no job dispatched");
            return InterruptOutcome::Spurious;
        };

        let completion = Completion {
            id: running.id,
            operation: running.job.operation(),
            status: CompletionStatus::Success,
        };
        info!("Job {} complete", completion.id);
        inner.notify(completion);
        InterruptOutcome::Completed(completion)
    }

    /// Reset the whole block and drop the job in flight, if any.
    ///
    /// Used when a job never signals completion. The returned completion
    /// carries [`CompletionStatus::Aborted`] so its buffers can be handed
    /// back with an error.
    #[instrument(level = "debug", skip(self))]
    pub fn force_reset(&self) -> Option<Completion> {
        let mut guard = self.lock();
        let inner = &mut *guard;

        if inner.power.is_active() {
            let mut programmer = Programmer::new(&mut inner.regs, self.config.wide_addressing);
            programmer.irq_disable();
            programmer.hw_reset();
        }

        let running = inner.running.take()?;
        let completion = Completion {
            id: running.id,
            operation: running.job.operation(),
            status: CompletionStatus::Aborted,
        };
        warn!("Job {} aborted by reset", completion.id);
        inner.notify(completion);
        Some(completion)
    }

    /// Build a job from `ctx` and the buffers in `queue`, then submit it.
    ///
    /// The buffers stay queued. Hand them back with
    /// [`BufferQueue::complete_buffers`] once the job completes.
    pub fn device_run<Q: BufferQueue + ?Sized>(
        &self,
        ctx: &Context,
        queue: &Q,
    ) -> G2dResult<JobId> {
        if !ctx.job_ready(queue) {
            return Err(G2dError::NotReady("buffers for the selected operation"));
        }
        let job = ctx.build_job(queue)?;
        self.submit(job)
    }
}

fn check_frame(
    frame: &FrameDescriptor,
    addrs: &PlaneAddressSet,
    address_bits: u32,
) -> G2dResult<()> {
    frame.validate()?;
    let layout = resolve_plane_layout(frame.format, frame, addrs)?;
    check_address_reach(frame.format, frame, &layout, address_bits)
}

fn validate_job(job: &Job, address_bits: u32) -> G2dResult<()> {
    match job {
        Job::Fill { dst, dst_addrs, .. } => check_frame(dst, dst_addrs, address_bits),
        Job::Blit {
            src,
            src_addrs,
            dst,
            dst_addrs,
        } => {
            check_frame(src, src_addrs, address_bits)?;
            check_frame(dst, dst_addrs, address_bits)?;
            let (s, d) = (src.selection, dst.selection);
            if (s.width, s.height) != (d.width, d.height) {
                return Err(G2dError::selection(format!(
                    "blit source {s} and destination {d} differ in size"
                )));
            }
            Ok(())
        }
    }
}

/// Program every block for `job` and start the mixer.
fn dispatch<R: RegisterFile>(regs: &mut R, wide_addressing: bool, job: &Job) -> G2dResult<()> {
    let mut programmer = Programmer::new(regs, wide_addressing);
    programmer.hw_reset();

    match job {
        Job::Fill {
            dst,
            dst_addrs,
            color,
            alpha,
        } => {
            programmer.configure_input_layer(dst, dst_addrs, *alpha)?;
            programmer.inject_fill_color(Layer::Video, *color);
            programmer.configure_blend_pipeline(dst, BlendPipe::Pipe0);
            programmer.configure_bypass();
            programmer.configure_write_back(dst, dst_addrs)?;
        }
        Job::Blit {
            src,
            src_addrs,
            dst,
            dst_addrs,
        } => {
            programmer.configure_input_layer(src, src_addrs, BLIT_LAYER_ALPHA)?;
            programmer.configure_blend_pipeline(src, BlendPipe::Pipe0);
            programmer.configure_bypass();
            programmer.configure_write_back(dst, dst_addrs)?;
        }
    }

    programmer.irq_enable();
    programmer.start();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{FourCc, PixelFormat};
    use crate::frame::Selection;
    use crate::job::Operation;
    use crate::sim::{PlatformEvent, SimEngine, SimG2d, SimPlatform, SimQueue};
    use g2d_hw::mmio::g2d::{mixer, top, v0};

    fn engine_with_config(config: EngineConfig) -> (SimEngine, SimG2d) {
        let hw = SimG2d::new();
        let engine = G2d::new(hw.clone(), SimPlatform::new().into_resources(), config);
        (engine, hw)
    }

    fn engine() -> (SimEngine, SimG2d) {
        engine_with_config(EngineConfig::default())
    }

    fn frame(sel: Selection) -> FrameDescriptor {
        let mut frame = FrameDescriptor::new(FourCc::XBGR32, PixelFormat::Bgrx8888, 64, 64);
        frame.selection = sel;
        frame
    }

    fn fill() -> Job {
        Job::Fill {
            dst: frame(Selection::new(8, 8, 16, 16)),
            dst_addrs: PlaneAddressSet::single(0x4000_0000),
            color: 0xFF00_FF00,
            alpha: 0xFF,
        }
    }

    #[test]
    fn submit_powers_up_and_starts() {
        let (engine, hw) = engine();
        assert!(!engine.is_powered());

        let id = engine.submit(fill()).unwrap();

        assert!(engine.is_powered());
        assert_eq!(engine.state(), JobState::Dispatched(id));
        assert!(hw.is_running());
        assert_eq!(hw.register(mixer::INT), mixer::INT_FINISH_IRQ_EN);
    }

    #[test]
    fn submit_while_dispatched_is_busy() {
        let (engine, hw) = engine();
        let first = engine.submit(fill()).unwrap();
        let fillc = hw.register(v0::FILLC);

        let mut other = fill();
        if let Job::Fill { color, .. } = &mut other {
            *color = 0x1234_5678;
        }
        assert_eq!(engine.submit(other), Err(G2dError::Busy));
        assert_eq!(engine.state(), JobState::Dispatched(first));
        assert_eq!(hw.register(v0::FILLC), fillc);
        assert_eq!(hw.jobs_started(), 1);
    }

    #[test]
    fn interrupt_without_pending_is_spurious() {
        let (engine, _hw) = engine();
        let id = engine.submit(fill()).unwrap();

        assert_eq!(engine.on_interrupt(), InterruptOutcome::Spurious);
        assert_eq!(engine.state(), JobState::Dispatched(id));
    }

    #[test]
    fn one_pending_completes_exactly_once() {
        let (engine, hw) = engine();
        let rx = engine.subscribe();
        let id = engine.submit(fill()).unwrap();

        assert!(hw.complete_pending_job());
        let outcome = engine.on_interrupt();
        let expected = Completion {
            id,
            operation: Operation::Fill,
            status: CompletionStatus::Success,
        };
        assert_eq!(outcome, InterruptOutcome::Completed(expected));
        assert_eq!(engine.state(), JobState::Idle);
        assert_eq!(engine.on_interrupt(), InterruptOutcome::Spurious);

        assert_eq!(rx.try_recv(), Ok(expected));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn pending_while_idle_is_acknowledged() {
        let (engine, mut hw) = engine();
        engine.power_get().unwrap();
        hw.write(mixer::INT, mixer::INT_IRQ_PENDING);

        assert_eq!(engine.on_interrupt(), InterruptOutcome::Spurious);
        assert_eq!(hw.register(mixer::INT), 0);
    }

    #[test]
    fn ids_increase_per_job() {
        let (engine, hw) = engine();
        let first = engine.submit(fill()).unwrap();
        hw.complete_pending_job();
        engine.on_interrupt();
        let second = engine.submit(fill()).unwrap();
        assert!(second > first);
    }

    #[test]
    fn invalid_job_leaves_engine_untouched() {
        let (engine, hw) = engine();
        let job = Job::Fill {
            dst: frame(Selection::new(60, 0, 8, 8)),
            dst_addrs: PlaneAddressSet::single(0x4000_0000),
            color: 0,
            alpha: 0,
        };
        assert!(matches!(
            engine.submit(job),
            Err(G2dError::InvalidSelection(_))
        ));
        assert_eq!(engine.state(), JobState::Idle);
        assert!(!engine.is_powered());
        assert_eq!(hw.jobs_started(), 0);
    }

    #[test]
    fn blit_sizes_must_match() {
        let (engine, _hw) = engine();
        let job = Job::Blit {
            src: frame(Selection::new(0, 0, 16, 16)),
            src_addrs: PlaneAddressSet::single(0x4000_0000),
            dst: frame(Selection::new(0, 0, 16, 8)),
            dst_addrs: PlaneAddressSet::single(0x4001_0000),
        };
        assert!(matches!(
            engine.submit(job),
            Err(G2dError::InvalidSelection(_))
        ));
    }

    #[test]
    fn blit_reads_source_through_video_layer() {
        let (engine, hw) = engine();
        let job = Job::Blit {
            src: frame(Selection::new(0, 0, 16, 16)),
            src_addrs: PlaneAddressSet::single(0x4000_0000),
            dst: frame(Selection::new(8, 8, 16, 16)),
            dst_addrs: PlaneAddressSet::single(0x4001_0000),
        };
        engine.submit(job).unwrap();

        let attr = hw.register(v0::ATTCTL);
        assert_eq!(attr & v0::ATTCTL_FILLCOLOR_EN, 0);
        assert_eq!(attr >> 24, 0xFF);
        assert_eq!(hw.register(v0::LADDR0), 0x4000_0000);
    }

    #[test]
    fn force_reset_aborts_running_job() {
        let (engine, hw) = engine();
        let rx = engine.subscribe();
        let id = engine.submit(fill()).unwrap();

        let aborted = engine.force_reset().unwrap();
        assert_eq!(aborted.id, id);
        assert_eq!(aborted.status, CompletionStatus::Aborted);
        assert_eq!(engine.state(), JobState::Idle);
        assert!(!hw.is_running());
        assert_eq!(hw.register(mixer::INT), 0);
        assert_eq!(hw.register(top::AHB_RESET), top::MIXER | top::ROT);
        assert_eq!(rx.try_recv(), Ok(aborted));

        assert_eq!(engine.force_reset(), None);
        engine.submit(fill()).unwrap();
    }

    #[test]
    fn last_power_put_suspends() {
        let hw = SimG2d::new();
        let platform = SimPlatform::new();
        let log = platform.log();
        let engine: SimEngine =
            G2d::new(hw.clone(), platform.into_resources(), EngineConfig::default());

        engine.power_get().unwrap();
        engine.power_get().unwrap();
        engine.power_put().unwrap();
        assert!(engine.is_powered());
        engine.power_put().unwrap();
        assert!(!engine.is_powered());
        assert_eq!(log.events().last(), Some(&PlatformEvent::ResetAsserted));
        assert_eq!(hw.register(top::SCLK_GATE), 0);
    }

    #[test]
    fn power_put_refused_while_dispatched() {
        let (engine, hw) = engine();
        engine.power_get().unwrap();
        engine.submit(fill()).unwrap();

        assert_eq!(engine.power_put(), Err(G2dError::Busy));
        assert!(engine.is_powered());

        hw.complete_pending_job();
        engine.on_interrupt();
        engine.power_put().unwrap();
        assert!(!engine.is_powered());
    }

    #[test]
    fn activation_failure_leaves_engine_idle() {
        let engine: SimEngine = G2d::new(
            SimG2d::new(),
            SimPlatform::new().fail_ram_enable().into_resources(),
            EngineConfig::default(),
        );
        let err = engine.submit(fill()).unwrap_err();
        assert!(matches!(err, G2dError::ActivationFailure { .. }));
        assert_eq!(engine.state(), JobState::Idle);
        assert!(!engine.is_powered());
        engine.with_registers(|regs| assert_eq!(regs.register(top::SCLK_GATE), 0));
    }

    #[test]
    fn oversized_frame_is_rejected_before_power_up() {
        let (engine, hw) = engine();
        let mut dst = frame(Selection::new(0, 0, 8, 8));
        dst.full_width = 0x4000_0000;
        let job = Job::Fill {
            dst,
            dst_addrs: PlaneAddressSet::single(0x4000_0000),
            color: 0,
            alpha: 0xFF,
        };

        assert!(matches!(
            engine.submit(job),
            Err(G2dError::InvalidFrameSize { .. })
        ));
        assert_eq!(engine.state(), JobState::Idle);
        assert!(!engine.is_powered());
        assert_eq!(hw.jobs_started(), 0);
        engine.submit(fill()).unwrap();
    }

    #[test]
    fn narrow_addressing_rejects_buffers_above_four_gigabytes() {
        let (engine, hw) = engine_with_config(EngineConfig {
            wide_addressing: false,
            ..EngineConfig::default()
        });
        let job = Job::Fill {
            dst: frame(Selection::new(8, 8, 16, 16)),
            dst_addrs: PlaneAddressSet::single(0x1_0000_0000),
            color: 0,
            alpha: 0xFF,
        };

        assert!(matches!(
            engine.submit(job.clone()),
            Err(G2dError::AddressOutOfRange { bits: 32, .. })
        ));
        assert!(!engine.is_powered());
        assert_eq!(hw.write_count(v0::LADDR0), 0);

        // The same buffer is fine once the high address registers are used
        let (wide, wide_hw) = engine_with_config(EngineConfig::default());
        wide.submit(job).unwrap();
        assert_eq!(wide_hw.register(v0::HADDR), 0x01);
    }

    #[test]
    fn wide_addressing_rejects_buffers_past_the_bus() {
        let (engine, _hw) = engine();
        let job = Job::Blit {
            src: frame(Selection::new(0, 0, 16, 16)),
            src_addrs: PlaneAddressSet::single(0x4000_0000),
            dst: frame(Selection::new(0, 0, 16, 16)),
            dst_addrs: PlaneAddressSet::single((1 << 40) - 64),
        };

        assert!(matches!(
            engine.submit(job),
            Err(G2dError::AddressOutOfRange { bits: 40, .. })
        ));
        assert_eq!(engine.state(), JobState::Idle);
        assert!(!engine.is_powered());
    }

    #[test]
    fn device_run_waits_for_destination() {
        let (engine, hw) = engine();
        let ctx = Context::new();
        let mut queue = SimQueue::new();

        assert!(matches!(
            engine.device_run(&ctx, &queue),
            Err(G2dError::NotReady(_))
        ));
        assert!(!engine.is_powered());
        assert_eq!(hw.jobs_started(), 0);

        queue.queue_destination(PlaneAddressSet::single(0x4000_0000));
        let id = engine.device_run(&ctx, &queue).unwrap();
        assert_eq!(engine.state(), JobState::Dispatched(id));
    }
}
