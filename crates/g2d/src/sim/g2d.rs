//! Register level model of the G2D mixer.
//!
//! Control bits behave like the hardware:
//! - clearing the mixer bit of `AHB_RESET` resets every mixer register
//! - `MIXER_CTL.START` only takes effect with the mixer gated on and out of
//!   reset
//! - `MIXER_INT` is a plain register, software clears pending by writing it
//!   back
//!
//! A started job runs when [`SimG2d::complete_pending_job`] is called, which
//! stands in for the time the block takes to finish.

use crate::format::{FormatFamily, PixelFormat};
use crate::regs::RegisterFile;
use g2d_hw::bits::field_get;
use g2d_hw::mmio::g2d::{WINDOW_SIZE, mixer, size, top, v0, wb};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace, warn};

/// Byte addressable memory window seen by the block's DMA.
#[derive(Debug, Clone)]
pub struct SimDram {
    base: u64,
    bytes: Vec<u8>,
}

impl SimDram {
    pub fn new(base: u64, size: usize) -> Self {
        Self {
            base,
            bytes: vec![0; size],
        }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn range(&self, addr: u64, len: usize) -> Option<Range<usize>> {
        let start = usize::try_from(addr.checked_sub(self.base)?).ok()?;
        let end = start.checked_add(len)?;
        (end <= self.bytes.len()).then_some(start..end)
    }

    pub fn read(&self, addr: u64, len: usize) -> Option<&[u8]> {
        self.range(addr, len).map(|r| &self.bytes[r])
    }

    pub fn write(&mut self, addr: u64, data: &[u8]) -> bool {
        match self.range(addr, data.len()) {
            Some(r) => {
                self.bytes[r].copy_from_slice(data);
                true
            }
            None => false,
        }
    }

    pub fn read_u32(&self, addr: u64) -> Option<u32> {
        let bytes = self.read(addr, 4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

#[derive(Debug)]
struct SimState {
    // ========================================================================
    // REGISTER STATE
    // ========================================================================
    regs: Vec<u32>,

    // ========================================================================
    // INTERNAL STATE
    // ========================================================================
    /// Number of writes seen per register offset
    writes: HashMap<u32, usize>,
    /// A started job has not finished yet
    running: bool,
    jobs_started: usize,
    jobs_finished: usize,
    dram: SimDram,
}

impl SimState {
    fn reg(&self, offset: u32) -> u32 {
        word_index(offset)
            .and_then(|i| self.regs.get(i))
            .copied()
            .unwrap_or(0)
    }

    fn store(&mut self, offset: u32, value: u32) {
        if let Some(slot) = word_index(offset).and_then(|i| self.regs.get_mut(i)) {
            *slot = value;
        }
    }

    fn gates_open(&self) -> bool {
        self.reg(top::SCLK_GATE) & top::MIXER != 0
            && self.reg(top::HCLK_GATE) & top::MIXER != 0
            && self.reg(top::AHB_RESET) & top::MIXER != 0
    }

    fn reset_mixer(&mut self) {
        debug!("Simulated mixer reset");
        let first = (mixer::BASE / 4) as usize;
        self.regs[first..].fill(0);
        self.running = false;
    }

    fn write(&mut self, offset: u32, value: u32) {
        trace!(
            "G2D register write: offset={:#X}, value={:#X}",
            offset, value
        );

        if word_index(offset).is_none() {
            warn!(
                "Unknown G2D register write: offset={:#X}, value={:#X}",
                offset, value
            );
            return;
        }
        *self.writes.entry(offset).or_default() += 1;

        match offset {
            top::AHB_RESET => {
                let old = self.reg(offset);
                self.store(offset, value);
                if old & top::MIXER != 0 && value & top::MIXER == 0 {
                    self.reset_mixer();
                }
            }
            mixer::CTL if value & mixer::CTL_START != 0 => {
                if !self.gates_open() {
                    warn!("Mixer start with gates closed, ignored");
                    self.store(offset, value & !mixer::CTL_START);
                    return;
                }
                if self.running {
                    warn!("Mixer start while a job is running, ignored");
                    return;
                }
                self.store(offset, value);
                self.running = true;
                self.jobs_started += 1;
                debug!("Mixer job {} started", self.jobs_started);
            }
            _ => self.store(offset, value),
        }
    }

    /// Run the programmed job against DRAM.
    fn execute(&mut self) {
        let wb_fmt = field_get(wb::ATT_FMT, self.reg(wb::ATT));
        let Some(format) = PixelFormat::from_hw_id(wb_fmt) else {
            warn!("Write-back format {:#X} unknown, nothing written", wb_fmt);
            return;
        };
        if format.family() != FormatFamily::PackedRgb {
            warn!("Simulated write-back only handles packed RGB, got {}", format);
            return;
        }
        let bpp = format.plane_bytes().luma as usize;

        let out_size = self.reg(wb::SIZE);
        let width = field_get(size::WIDTH, out_size) as usize + 1;
        let height = field_get(size::HEIGHT, out_size) as usize + 1;
        let dst = address(self.reg(wb::LADD0), field_get(wb::HADD, self.reg(wb::HADD0)));
        let dst_pitch = u64::from(self.reg(wb::PITCH0));

        let attr = self.reg(v0::ATTCTL);
        if attr & v0::ATTCTL_FILLCOLOR_EN != 0 {
            let color = self.reg(v0::FILLC).to_le_bytes();
            let row: Vec<u8> = color[..bpp.min(4)]
                .iter()
                .copied()
                .cycle()
                .take(width * bpp)
                .collect();
            for y in 0..height as u64 {
                if !self.dram.write(dst + y * dst_pitch, &row) {
                    warn!("Fill row {} at {:#X} outside DRAM", y, dst + y * dst_pitch);
                    return;
                }
            }
            debug!("Filled {}x{} at {:#X}", width, height, dst);
        } else {
            let src = address(self.reg(v0::LADDR0), field_get(v0::HADDR0, self.reg(v0::HADDR)));
            let src_pitch = u64::from(self.reg(v0::PITCH0));
            for y in 0..height as u64 {
                let Some(row) = self.dram.read(src + y * src_pitch, width * bpp).map(<[u8]>::to_vec)
                else {
                    warn!("Copy source row {} at {:#X} outside DRAM", y, src + y * src_pitch);
                    return;
                };
                if !self.dram.write(dst + y * dst_pitch, &row) {
                    warn!("Copy row {} at {:#X} outside DRAM", y, dst + y * dst_pitch);
                    return;
                }
            }
            debug!("Copied {}x{} from {:#X} to {:#X}", width, height, src, dst);
        }
    }
}

fn word_index(offset: u32) -> Option<usize> {
    (offset < WINDOW_SIZE && offset % 4 == 0).then_some((offset / 4) as usize)
}

fn address(low: u32, high: u32) -> u64 {
    (u64::from(high) << 32) | u64::from(low)
}

/// Simulated G2D. Clones share the same block, so a test can keep a handle
/// while the engine owns another.
#[derive(Debug, Clone)]
pub struct SimG2d {
    state: Arc<Mutex<SimState>>,
}

impl SimG2d {
    /// A block with a 1 MiB DRAM window at `0x4000_0000`
    #[expect(clippy::new_without_default)]
    pub fn new() -> Self {
        Self::with_dram(SimDram::new(0x4000_0000, 1 << 20))
    }

    pub fn with_dram(dram: SimDram) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                regs: vec![0; (WINDOW_SIZE / 4) as usize],
                writes: HashMap::new(),
                running: false,
                jobs_started: 0,
                jobs_finished: 0,
                dram,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current register value, without tracing or side effects
    pub fn register(&self, offset: u32) -> u32 {
        self.lock().reg(offset)
    }

    /// How many times `offset` has been written
    pub fn write_count(&self, offset: u32) -> usize {
        self.lock().writes.get(&offset).copied().unwrap_or(0)
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub fn jobs_started(&self) -> usize {
        self.lock().jobs_started
    }

    pub fn jobs_finished(&self) -> usize {
        self.lock().jobs_finished
    }

    /// Finish the running job: execute it, drop `START` and raise pending.
    ///
    /// Returns true if the finish interrupt is unmasked, meaning the
    /// interrupt line would now be asserted.
    pub fn complete_pending_job(&self) -> bool {
        let mut state = self.lock();
        if !state.running {
            return false;
        }
        state.execute();
        state.running = false;
        state.jobs_finished += 1;

        let ctl = state.reg(mixer::CTL);
        state.store(mixer::CTL, ctl & !mixer::CTL_START);
        let int = state.reg(mixer::INT) | mixer::INT_IRQ_PENDING;
        state.store(mixer::INT, int);
        debug!("Mixer job {} finished", state.jobs_finished);

        int & mixer::INT_FINISH_IRQ_EN != 0
    }

    pub fn dram_read(&self, addr: u64, len: usize) -> Option<Vec<u8>> {
        self.lock().dram.read(addr, len).map(<[u8]>::to_vec)
    }

    pub fn dram_read_u32(&self, addr: u64) -> Option<u32> {
        self.lock().dram.read_u32(addr)
    }

    pub fn dram_write(&self, addr: u64, data: &[u8]) -> bool {
        self.lock().dram.write(addr, data)
    }
}

impl RegisterFile for SimG2d {
    fn read(&self, offset: u32) -> u32 {
        trace!("G2D register read: offset={:#X}", offset);
        if word_index(offset).is_none() {
            warn!("Unknown G2D register read: offset={:#X}", offset);
            return 0;
        }
        self.lock().reg(offset)
    }

    fn write(&mut self, offset: u32, value: u32) {
        self.lock().write(offset, value);
    }
}
