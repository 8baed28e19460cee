//! Register programming sequences.
//!
//! Each sequence translates a frame description into the field writes the
//! mixer needs. A sequence owns every field it touches: bits are always set
//! or cleared explicitly, so nothing programmed by a previous job leaks into
//! the next one.

use crate::error::G2dResult;
use crate::format::BlendColorSpace;
use crate::frame::{FrameDescriptor, PlaneAddressSet};
use crate::layout::{PlaneLayout, pack_size, resolve_plane_layout};
use crate::regs::RegisterFile;
use g2d_hw::bits::field_prep;
use g2d_hw::mmio::g2d::{bld, mixer, top, ui, v0, wb};
use tracing::{debug, trace};

/// Mixer layer that can source a fill color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Video,
    Ui0,
    Ui1,
    Ui2,
}

impl Layer {
    /// Layer by hardware index, 0 being the video layer.
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::Video),
            1 => Some(Self::Ui0),
            2 => Some(Self::Ui1),
            3 => Some(Self::Ui2),
            _ => None,
        }
    }

    /// Attribute and fill color registers of the layer
    fn fill_registers(self) -> (u32, u32, u32) {
        match self {
            Self::Video => (v0::ATTCTL, v0::FILLC, v0::ATTCTL_FILLCOLOR_EN),
            Self::Ui0 => (ui::UI0_BASE + ui::ATTR, ui::UI0_BASE + ui::FILLC, ui::ATTR_FILLCOLOR_EN),
            Self::Ui1 => (ui::UI1_BASE + ui::ATTR, ui::UI1_BASE + ui::FILLC, ui::ATTR_FILLCOLOR_EN),
            Self::Ui2 => (ui::UI2_BASE + ui::ATTR, ui::UI2_BASE + ui::FILLC, ui::ATTR_FILLCOLOR_EN),
        }
    }
}

/// Blender input pipe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendPipe {
    Pipe0,
    Pipe1,
}

/// Writes job programming sequences into a register file.
pub struct Programmer<'a, R: RegisterFile> {
    regs: &'a mut R,
    wide_addressing: bool,
}

impl<'a, R: RegisterFile> Programmer<'a, R> {
    /// `wide_addressing` enables the high address registers for buses wider
    /// than 32 bits.
    pub fn new(regs: &'a mut R, wide_addressing: bool) -> Self {
        Self {
            regs,
            wide_addressing,
        }
    }

    /// Program video layer 0 to read the selection of `frame`.
    pub fn configure_input_layer(
        &mut self,
        frame: &FrameDescriptor,
        addrs: &PlaneAddressSet,
        layer_alpha: u8,
    ) -> G2dResult<PlaneLayout> {
        let mut attr = field_prep(v0::ATTCTL_GLBALPHA, u32::from(layer_alpha))
            | field_prep(v0::ATTCTL_FBFMT, frame.format.hw_id())
            | field_prep(v0::ATTCTL_ALPHA_MODE, frame.alpha_mode as u32)
            | field_prep(v0::ATTCTL_EN, 1);
        if frame.premultiplied {
            attr |= field_prep(v0::ATTCTL_PREMUL_CTL, v0::PREMUL_CTL_PREMULTIPLIED);
        }
        self.regs.write(v0::ATTCTL, attr);

        let size = pack_size(frame.selection.width, frame.selection.height);
        self.regs.write(v0::MBSIZE, size);
        // Overlay covers the layer exactly
        self.regs.write(v0::SIZE, size);
        self.regs.write(v0::COOR, 0);

        let layout = resolve_plane_layout(frame.format, frame, addrs)?;
        self.regs.write(v0::PITCH0, layout.pitch[0]);
        self.regs.write(v0::PITCH1, layout.pitch[1]);
        self.regs.write(v0::PITCH2, layout.pitch[2]);

        self.regs.write(v0::LADDR0, low_word(layout.origin[0]));
        self.regs.write(v0::LADDR1, low_word(layout.origin[1]));
        self.regs.write(v0::LADDR2, low_word(layout.origin[2]));

        if self.wide_addressing {
            let high = field_prep(v0::HADDR0, high_byte(layout.origin[0]))
                | field_prep(v0::HADDR1, high_byte(layout.origin[1]))
                | field_prep(v0::HADDR2, high_byte(layout.origin[2]));
            self.regs.write(v0::HADDR, high);
        }

        debug!(
            "Input layer: {} {} attr={:#X} pitch={:?}",
            frame.format, frame.selection, attr, layout.pitch
        );
        Ok(layout)
    }

    /// Route the selection of `frame` into a blender pipe.
    pub fn configure_blend_pipeline(&mut self, frame: &FrameDescriptor, pipe: BlendPipe) {
        let (enable, premul, in_size, offset) = match pipe {
            BlendPipe::Pipe0 => (
                bld::EN_CTL_PIPE0,
                bld::PREMUL_CTL_PIPE0_ALPHA_MODE,
                bld::CH_ISIZE0,
                bld::CH_OFFSET0,
            ),
            BlendPipe::Pipe1 => (
                bld::EN_CTL_PIPE1,
                bld::PREMUL_CTL_PIPE1_ALPHA_MODE,
                bld::CH_ISIZE1,
                bld::CH_OFFSET1,
            ),
        };

        self.regs.set_bits(bld::EN_CTL, enable);
        self.regs
            .assign_bits(bld::PREMUL_CTL, premul, frame.premultiplied);

        self.regs.write(
            in_size,
            pack_size(frame.selection.width, frame.selection.height),
        );
        // Blend offsets are always zero, which the offset fields encode as 0
        self.regs.write(offset, 0);

        let yuv = frame.format.blend_color_space() == BlendColorSpace::Yuv;
        self.regs
            .assign_bits(bld::OUT_COLOR, bld::OUT_COLOR_ALPHA_MODE, yuv);

        debug!(
            "Blend {:?}: {} premultiplied={} yuv={}",
            pipe, frame.selection, frame.premultiplied, yuv
        );
    }

    /// Program the write-back channel to store the blender output into the
    /// selection of `frame`.
    pub fn configure_write_back(
        &mut self,
        frame: &FrameDescriptor,
        addrs: &PlaneAddressSet,
    ) -> G2dResult<PlaneLayout> {
        self.regs
            .write(wb::ATT, field_prep(wb::ATT_FMT, frame.format.hw_id()));

        let size = pack_size(frame.selection.width, frame.selection.height);
        self.regs.write(wb::SIZE, size);
        self.regs.write(bld::OUT_SIZE, size);

        self.regs
            .assign_bits(bld::OUT_COLOR, bld::OUT_COLOR_PREMUL_EN, frame.premultiplied);

        let layout = resolve_plane_layout(frame.format, frame, addrs)?;
        self.regs.write(wb::PITCH0, layout.pitch[0]);
        self.regs.write(wb::PITCH1, layout.pitch[1]);
        self.regs.write(wb::PITCH2, layout.pitch[2]);

        let planes = [
            (wb::LADD0, wb::HADD0),
            (wb::LADD1, wb::HADD1),
            (wb::LADD2, wb::HADD2),
        ];
        for ((low, high), origin) in planes.into_iter().zip(layout.origin) {
            self.regs.write(low, low_word(origin));
            if self.wide_addressing {
                self.regs
                    .write(high, field_prep(wb::HADD, high_byte(origin)));
            }
        }

        debug!(
            "Write-back: {} {} pitch={:?} origin={:#X}",
            frame.format, frame.selection, layout.pitch, layout.origin[0]
        );
        Ok(layout)
    }

    /// Make `layer` emit a solid `argb` color instead of reading memory.
    pub fn inject_fill_color(&mut self, layer: Layer, argb: u32) {
        let (attr, fillc, enable) = layer.fill_registers();
        self.regs.set_bits(attr, enable);
        self.regs.write(fillc, argb);
        debug!("Fill color on {:?}: {:#010X}", layer, argb);
    }

    /// Pass every channel straight through the raster operation unit.
    pub fn configure_bypass(&mut self) {
        self.regs.write(bld::ROP_CTL, bld::ROP_CTL_ALL_BYPASS);
    }

    /// Open the clock gates and release the mixer and rotation blocks from
    /// reset.
    pub fn open_gates(&mut self) {
        let blocks = top::MIXER | top::ROT;
        self.regs.set_bits(top::SCLK_GATE, blocks);
        self.regs.set_bits(top::HCLK_GATE, blocks);
        self.regs.set_bits(top::AHB_RESET, blocks);
    }

    pub fn close_gates(&mut self) {
        self.regs.write(top::SCLK_GATE, 0);
        self.regs.write(top::HCLK_GATE, 0);
        self.regs.write(top::AHB_RESET, 0);
    }

    /// Pulse reset on the mixer and rotation blocks.
    pub fn hw_reset(&mut self) {
        trace!("G2D block reset");
        self.regs.write(top::AHB_RESET, 0);
        self.regs.set_bits(top::AHB_RESET, top::MIXER | top::ROT);
    }

    /// Pulse reset on the mixer only.
    pub fn mixer_reset(&mut self) {
        trace!("G2D mixer reset");
        self.regs.clear_bits(top::AHB_RESET, top::MIXER);
        self.regs.set_bits(top::AHB_RESET, top::MIXER);
    }

    /// Unmask the finish interrupt. Also drops any stale pending bit.
    pub fn irq_enable(&mut self) {
        self.regs.write(mixer::INT, mixer::INT_FINISH_IRQ_EN);
    }

    /// Mask the finish interrupt and drop any pending bit.
    pub fn irq_disable(&mut self) {
        self.regs.write(mixer::INT, 0);
    }

    /// Returns true and acknowledges the interrupt if completion is pending.
    pub fn irq_query(&mut self) -> bool {
        let status = self.regs.read(mixer::INT);
        if status & mixer::INT_IRQ_PENDING == 0 {
            return false;
        }
        self.regs.clear_bits(
            mixer::INT,
            mixer::INT_IRQ_PENDING | mixer::INT_FINISH_IRQ_EN,
        );
        true
    }

    /// Kick off the programmed job.
    pub fn start(&mut self) {
        self.regs.set_bits(mixer::CTL, mixer::CTL_START);
    }
}

fn low_word(addr: u64) -> u32 {
    (addr & 0xFFFF_FFFF) as u32
}

/// Bits 39:32 of a bus address
fn high_byte(addr: u64) -> u32 {
    ((addr >> 32) & 0xFF) as u32
}
