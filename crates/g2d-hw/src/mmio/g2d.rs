//! G2D register blocks.
//!
//! Offsets are relative to the start of the G2D MMIO window. Each hardware
//! sub-block gets its own module holding the register offsets followed by the
//! bit fields of those registers.
//!
//! # Block layout
//! - `0x0000`: top level clock gating and reset
//! - `0x0100`: mixer control and interrupt
//! - `0x0400`: blender and ROP
//! - `0x0800`: video layer (V0)
//! - `0x1000`, `0x1800`, `0x2000`: UI layers
//! - `0x3000`: write-back

use crate::bits::{bit, genmask};

/// Size of the MMIO window covering every block used by the engine
pub const WINDOW_SIZE: u32 = 0x4000;

/// Top level clock gate and reset registers
pub mod top {
    use super::{bit, genmask};

    pub const BASE: u32 = 0x0000;

    /// Module (special) clock gate
    pub const SCLK_GATE: u32 = BASE + 0x00;
    /// AHB bus clock gate
    pub const HCLK_GATE: u32 = BASE + 0x04;
    /// AHB reset, a set bit releases the block from reset
    pub const AHB_RESET: u32 = BASE + 0x08;
    /// Module clock divider
    pub const SCLK_DIV: u32 = BASE + 0x0C;

    /// Mixer bit, shared by the gate and reset registers
    pub const MIXER: u32 = bit(0);
    /// Rotation bit, shared by the gate and reset registers
    pub const ROT: u32 = bit(1);

    /// Mixer clock divider field of `SCLK_DIV`
    pub const SCLK_DIV_MIXER: u32 = genmask(3, 0);
}

/// Mixer control and interrupt registers
pub mod mixer {
    use super::bit;

    pub const BASE: u32 = 0x0100;

    /// Mixer control
    pub const CTL: u32 = BASE + 0x00;
    /// Mixer interrupt enable and status
    pub const INT: u32 = BASE + 0x04;
    /// Mixer clock control
    pub const CLK: u32 = BASE + 0x08;

    /// Writing one kicks off the programmed job. Self clears when done.
    pub const CTL_START: u32 = bit(31);

    /// Completion pending, cleared by software
    pub const INT_IRQ_PENDING: u32 = bit(0);
    /// Finish interrupt enable
    pub const INT_FINISH_IRQ_EN: u32 = bit(4);
}

/// Blender and raster-operation registers
pub mod bld {
    use super::bit;

    pub const BASE: u32 = 0x0400;

    /// Pipe enable control
    pub const EN_CTL: u32 = BASE + 0x000;
    /// Pipe 0 fill color
    pub const FILLC0: u32 = BASE + 0x010;
    /// Pipe 1 fill color
    pub const FILLC1: u32 = BASE + 0x014;
    /// Pipe 0 input size
    pub const CH_ISIZE0: u32 = BASE + 0x020;
    /// Pipe 1 input size
    pub const CH_ISIZE1: u32 = BASE + 0x024;
    /// Pipe 0 input offset
    pub const CH_OFFSET0: u32 = BASE + 0x030;
    /// Pipe 1 input offset
    pub const CH_OFFSET1: u32 = BASE + 0x034;
    /// Premultiplied alpha control
    pub const PREMUL_CTL: u32 = BASE + 0x040;
    /// Background color
    pub const BK_COLOR: u32 = BASE + 0x044;
    /// Blender output size
    pub const OUT_SIZE: u32 = BASE + 0x048;
    /// Blend mode control
    pub const CTL: u32 = BASE + 0x04C;
    /// Blender output color control
    pub const OUT_COLOR: u32 = BASE + 0x060;

    /// Raster operation control
    pub const ROP_CTL: u32 = BASE + 0x080;

    pub const EN_CTL_PIPE0: u32 = bit(8);
    pub const EN_CTL_PIPE1: u32 = bit(9);

    pub const PREMUL_CTL_PIPE0_ALPHA_MODE: u32 = bit(0);
    pub const PREMUL_CTL_PIPE1_ALPHA_MODE: u32 = bit(1);

    /// Output premultiply enable
    pub const OUT_COLOR_PREMUL_EN: u32 = bit(0);
    /// Blend in YUV space when set, RGB when clear
    pub const OUT_COLOR_ALPHA_MODE: u32 = bit(1);

    pub const ROP_CTL_BLUE_BYPASS_EN: u32 = bit(4);
    pub const ROP_CTL_GREEN_BYPASS_EN: u32 = bit(5);
    pub const ROP_CTL_RED_BYPASS_EN: u32 = bit(6);
    pub const ROP_CTL_ALPHA_BYPASS_EN: u32 = bit(7);
    pub const ROP_CTL_ALL_BYPASS: u32 = ROP_CTL_BLUE_BYPASS_EN
        | ROP_CTL_GREEN_BYPASS_EN
        | ROP_CTL_RED_BYPASS_EN
        | ROP_CTL_ALPHA_BYPASS_EN;
}

/// Size register fields, shared by every `*SIZE` register in the block
pub mod size {
    use super::genmask;

    pub const WIDTH: u32 = genmask(12, 0);
    pub const HEIGHT: u32 = genmask(28, 16);
}

/// Video layer 0
pub mod v0 {
    use super::{bit, genmask};

    pub const BASE: u32 = 0x0800;

    /// Attribute control
    pub const ATTCTL: u32 = BASE + 0x00;
    /// Memory block size
    pub const MBSIZE: u32 = BASE + 0x04;
    /// Overlay coordinate
    pub const COOR: u32 = BASE + 0x08;
    pub const PITCH0: u32 = BASE + 0x0C;
    pub const PITCH1: u32 = BASE + 0x10;
    pub const PITCH2: u32 = BASE + 0x14;
    pub const LADDR0: u32 = BASE + 0x18;
    pub const LADDR1: u32 = BASE + 0x1C;
    pub const LADDR2: u32 = BASE + 0x20;
    /// Fill color
    pub const FILLC: u32 = BASE + 0x24;
    /// High address bytes of all three planes
    pub const HADDR: u32 = BASE + 0x28;
    /// Overlay size
    pub const SIZE: u32 = BASE + 0x2C;

    pub const ATTCTL_EN: u32 = bit(0);
    pub const ATTCTL_ALPHA_MODE: u32 = genmask(2, 1);
    pub const ATTCTL_FILLCOLOR_EN: u32 = bit(4);
    pub const ATTCTL_FBFMT: u32 = genmask(13, 8);
    pub const ATTCTL_PREMUL_CTL: u32 = genmask(17, 16);
    pub const ATTCTL_GLBALPHA: u32 = genmask(31, 24);

    /// `ATTCTL_PREMUL_CTL` value selecting premultiplied input
    pub const PREMUL_CTL_PREMULTIPLIED: u32 = 0x2;

    pub const HADDR0: u32 = genmask(7, 0);
    pub const HADDR1: u32 = genmask(15, 8);
    pub const HADDR2: u32 = genmask(23, 16);
}

/// UI layers 0-2. They share one register layout at different bases.
pub mod ui {
    use super::bit;

    pub const UI0_BASE: u32 = 0x1000;
    pub const UI1_BASE: u32 = 0x1800;
    pub const UI2_BASE: u32 = 0x2000;

    /// Attribute control (relative to a UI base)
    pub const ATTR: u32 = 0x00;
    pub const MBSIZE: u32 = 0x04;
    pub const COOR: u32 = 0x08;
    pub const PITCH: u32 = 0x0C;
    pub const LADDR: u32 = 0x10;
    /// Fill color (relative to a UI base)
    pub const FILLC: u32 = 0x14;
    pub const HADDR: u32 = 0x18;
    pub const SIZE: u32 = 0x1C;

    pub const ATTR_FILLCOLOR_EN: u32 = bit(4);
}

/// Write-back channel
pub mod wb {
    use super::genmask;

    pub const BASE: u32 = 0x3000;

    /// Output attribute, holds the output pixel format
    pub const ATT: u32 = BASE + 0x00;
    pub const SIZE: u32 = BASE + 0x04;
    pub const PITCH0: u32 = BASE + 0x08;
    pub const PITCH1: u32 = BASE + 0x0C;
    pub const PITCH2: u32 = BASE + 0x10;
    pub const LADD0: u32 = BASE + 0x14;
    pub const HADD0: u32 = BASE + 0x18;
    pub const LADD1: u32 = BASE + 0x1C;
    pub const HADD1: u32 = BASE + 0x20;
    pub const LADD2: u32 = BASE + 0x24;
    pub const HADD2: u32 = BASE + 0x28;

    pub const ATT_FMT: u32 = genmask(5, 0);
    /// High address registers only carry the top byte of a 40-bit address
    pub const HADD: u32 = genmask(7, 0);
}

/// Hardware pixel format ids, as written to `V0_ATTCTL.FBFMT` and `WB_ATT`
///
/// Ids are grouped in ranges: everything up to `BGRA1010102` is RGB, the
/// `0x20..=0x2E` range is 8-bit YUV with sub-sampling implied by the id, and
/// `0x30..=0x39` covers the Y-only and 10-bit YUV layouts.
pub mod pixel_format {
    pub const ARGB8888: u32 = 0x00;
    pub const ABGR8888: u32 = 0x01;
    pub const RGBA8888: u32 = 0x02;
    pub const BGRA8888: u32 = 0x03;
    pub const XRGB8888: u32 = 0x04;
    pub const XBGR8888: u32 = 0x05;
    pub const RGBX8888: u32 = 0x06;
    pub const BGRX8888: u32 = 0x07;
    pub const RGB888: u32 = 0x08;
    pub const BGR888: u32 = 0x09;
    pub const RGB565: u32 = 0x0A;
    pub const BGR565: u32 = 0x0B;
    pub const ARGB4444: u32 = 0x0C;
    pub const ABGR4444: u32 = 0x0D;
    pub const RGBA4444: u32 = 0x0E;
    pub const BGRA4444: u32 = 0x0F;
    pub const ARGB1555: u32 = 0x10;
    pub const ABGR1555: u32 = 0x11;
    pub const RGBA5551: u32 = 0x12;
    pub const BGRA5551: u32 = 0x13;
    pub const ARGB2101010: u32 = 0x14;
    pub const ABGR2101010: u32 = 0x15;
    pub const RGBA1010102: u32 = 0x16;
    pub const BGRA1010102: u32 = 0x17;

    // Not valid for the UI layers
    pub const IYUV422_V0Y1U0Y0: u32 = 0x20;
    pub const IYUV422_Y1V0Y0U0: u32 = 0x21;
    pub const IYUV422_U0Y1V0Y0: u32 = 0x22;
    pub const IYUV422_Y1U0Y0V0: u32 = 0x23;

    pub const YUV422UVC_V1U1V0U0: u32 = 0x24;
    pub const YUV422UVC_U1V1U0V0: u32 = 0x25;
    pub const YUV422_PLANAR: u32 = 0x26;

    pub const YUV420UVC_V1U1V0U0: u32 = 0x28;
    pub const YUV420UVC_U1V1U0V0: u32 = 0x29;
    pub const YUV420_PLANAR: u32 = 0x2A;

    pub const YUV411UVC_V1U1V0U0: u32 = 0x2C;
    pub const YUV411UVC_U1V1U0V0: u32 = 0x2D;
    pub const YUV411_PLANAR: u32 = 0x2E;

    pub const Y8: u32 = 0x30;

    pub const YVU10_P010: u32 = 0x34;
    pub const YVU10_P210: u32 = 0x36;
    pub const YVU10_444: u32 = 0x38;
    pub const YUV10_444: u32 = 0x39;

    /// Last id blended in RGB space
    pub const LAST_RGB: u32 = BGRA1010102;
    /// Last id blended in YUV space
    pub const LAST_YUV: u32 = YUV411_PLANAR;
}
