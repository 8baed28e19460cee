use clap::Parser;
use g2d::layout::align_up;
use g2d::sim::{SimDram, SimG2d, SimPlatform, SimQueue};
use g2d::{
    Args, BufferQueue, CompletionStatus, Context, Control, Endpoint, FourCc, G2d, PlaneAddressSet,
    Rect,
};
use std::sync::Arc;
use std::sync::mpsc::RecvTimeoutError;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Time the simulated block takes to finish a job
const JOB_LATENCY: Duration = Duration::from_millis(5);

fn main() {
    // Parse command-line arguments
    let args = Args::parse();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Configure the context
    let mut ctx = Context::new();
    let (width, height) = (args.width, args.height);
    let applied = ctx.set_format(Endpoint::Destination, FourCc::XBGR32, width, height, true);
    let rect = Rect::new(args.left, args.top, args.fill_width, args.fill_height);
    let controls = [
        (Control::OutputAlignment, args.alignment),
        (Control::FillColor, args.color),
        (Control::FillAlpha, u32::from(args.alpha)),
    ];
    let setup = ctx.set_selection(Endpoint::Destination, rect).and_then(|()| {
        controls
            .into_iter()
            .try_for_each(|(control, value)| ctx.set_control(control, value))
    });
    if let Err(e) = setup {
        eprintln!("Invalid job: {}", e);
        std::process::exit(2);
    }

    // Create the simulated block with a DRAM window holding one frame
    let Some(pitch) = align_up(applied.bytes_per_line, args.alignment) else {
        eprintln!("Error: pitch of {} bytes overflows", applied.bytes_per_line);
        std::process::exit(2);
    };
    let frame_bytes = pitch as usize * applied.height as usize;
    let hw = SimG2d::with_dram(SimDram::new(args.base, frame_bytes));
    let engine = Arc::new(G2d::new(
        hw.clone(),
        SimPlatform::new().into_resources(),
        args.to_engine_config(),
    ));

    let mut queue = SimQueue::new();
    queue.queue_destination(PlaneAddressSet::single(args.base));

    if let Err(e) = engine.power_get() {
        eprintln!("Failed to power up G2D: {}", e);
        std::process::exit(2);
    }
    let completions = engine.subscribe();

    info!("=== Submitting Fill ===");
    let id = match engine.device_run(&ctx, &queue) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Failed to submit job: {}", e);
            std::process::exit(2);
        }
    };

    // Interrupt line
    let irq = {
        let engine = Arc::clone(&engine);
        let hw = hw.clone();
        let stall = args.stall;
        thread::spawn(move || {
            thread::sleep(JOB_LATENCY);
            if !stall && hw.complete_pending_job() {
                info!("Interrupt: {:?}", engine.on_interrupt());
            }
        })
    };

    let timeout = Duration::from_millis(args.timeout_ms);
    let completion = match completions.recv_timeout(timeout) {
        Ok(completion) => completion,
        Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
            warn!("Job {} timed out after {:?}", id, timeout);
            // The interrupt may have landed between the timeout and the reset
            match engine.force_reset().or_else(|| completions.try_recv().ok()) {
                Some(completion) => completion,
                None => {
                    eprintln!("Job {} vanished without completing", id);
                    std::process::exit(2);
                }
            }
        }
    };
    if irq.join().is_err() {
        warn!("Interrupt thread panicked");
    }
    queue.complete_buffers(&completion);

    if let Err(e) = engine.power_put() {
        warn!("Failed to power down G2D: {}", e);
    }

    info!("=== Job Complete ===");
    info!("Job {}: {:?}", completion.id, completion.status);
    info!("Buffers returned: {:?}", queue.done());

    // Determine exit code from the completion and the pixels written
    let exit_code = match completion.status {
        CompletionStatus::Aborted => {
            eprintln!("Job {} aborted: no completion interrupt", completion.id);
            1
        }
        CompletionStatus::Success => {
            let sel = ctx.frame(Endpoint::Destination).selection;
            let first =
                args.base + u64::from(sel.top) * u64::from(pitch) + u64::from(sel.left) * 4;
            let last = first
                + u64::from(sel.height.saturating_sub(1)) * u64::from(pitch)
                + u64::from(sel.width.saturating_sub(1)) * 4;

            let corners = [hw.dram_read_u32(first), hw.dram_read_u32(last)];
            if corners.iter().all(|&px| px == Some(args.color)) {
                info!("PASS: {} filled with {:#010X}", sel, args.color);
                0
            } else {
                eprintln!(
                    "Fill mismatch: expected {:#010X}, corners read {:X?}",
                    args.color, corners
                );
                1
            }
        }
    };

    std::process::exit(exit_code);
}
