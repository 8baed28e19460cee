//! Frame descriptors: geometry, selection and alpha semantics of one buffer.

use crate::error::{G2dError, G2dResult};
use crate::format::{FourCc, PixelFormat};
use g2d_hw::specs::frame::{MAX_ALIGNMENT, MAX_HEIGHT, MAX_WIDTH, MIN_HEIGHT, MIN_WIDTH};
use std::fmt;

/// Rectangle inside a frame the engine reads from or writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Selection {
    pub const fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}@({},{})",
            self.width, self.height, self.left, self.top
        )
    }
}

/// Selection as requested by a caller. Offsets are signed so that negative
/// requests can be rejected instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Where the blender takes alpha from.
///
/// Discriminants are the values of the layer `ALPHA_MODE` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum AlphaBlendMode {
    /// Each pixel carries its own alpha
    #[default]
    PerPixel = 0,
    /// One alpha value for the whole layer
    PerLayer = 1,
    /// One alpha value shared by every layer of the mixer
    PerMixer = 2,
}

impl AlphaBlendMode {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::PerPixel),
            1 => Some(Self::PerLayer),
            2 => Some(Self::PerMixer),
            _ => None,
        }
    }
}

/// Everything the register programmer needs to know about one buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDescriptor {
    pub fourcc: FourCc,
    pub format: PixelFormat,
    pub full_width: u32,
    pub full_height: u32,
    pub selection: Selection,
    /// Pitch alignment in bytes, a power of two
    pub alignment: u32,
    pub premultiplied: bool,
    pub alpha_mode: AlphaBlendMode,
}

impl FrameDescriptor {
    /// A premultiplied, per-pixel alpha frame with an empty selection and
    /// byte aligned pitches.
    pub fn new(fourcc: FourCc, format: PixelFormat, full_width: u32, full_height: u32) -> Self {
        Self {
            fourcc,
            format,
            full_width,
            full_height,
            selection: Selection::default(),
            alignment: 1,
            premultiplied: true,
            alpha_mode: AlphaBlendMode::PerPixel,
        }
    }

    /// The whole frame as a selection
    pub fn bounds(&self) -> Selection {
        Selection::new(0, 0, self.full_width, self.full_height)
    }

    /// Check a requested selection against the frame geometry.
    ///
    /// The right and bottom edges must stay strictly inside the frame, so a
    /// selection can never cover the last column or row.
    pub fn check_selection(&self, rect: Rect) -> G2dResult<Selection> {
        let (Ok(left), Ok(top)) = (u32::try_from(rect.left), u32::try_from(rect.top)) else {
            return Err(G2dError::selection(format!(
                "negative offset ({}, {}) not supported",
                rect.left, rect.top
            )));
        };

        let selection = Selection::new(left, top, rect.width, rect.height);
        self.check_bounds(&selection)?;
        Ok(selection)
    }

    fn check_bounds(&self, sel: &Selection) -> G2dResult<()> {
        let max_x = u64::from(self.full_width.saturating_sub(1));
        let max_y = u64::from(self.full_height.saturating_sub(1));
        let (left, top) = (u64::from(sel.left), u64::from(sel.top));

        if left > max_x || top > max_y {
            return Err(G2dError::selection(format!(
                "offset ({left}, {top}) outside {}x{} frame",
                self.full_width, self.full_height
            )));
        }
        if left + u64::from(sel.width) > max_x {
            return Err(G2dError::selection(format!(
                "left {left} + width {} exceeds {max_x}",
                sel.width
            )));
        }
        if top + u64::from(sel.height) > max_y {
            return Err(G2dError::selection(format!(
                "top {top} + height {} exceeds {max_y}",
                sel.height
            )));
        }
        Ok(())
    }

    /// Check the frame size, alignment and stored selection, for descriptors
    /// that were built directly rather than through a context.
    pub fn validate(&self) -> G2dResult<()> {
        if !(MIN_WIDTH..=MAX_WIDTH).contains(&self.full_width)
            || !(MIN_HEIGHT..=MAX_HEIGHT).contains(&self.full_height)
        {
            return Err(G2dError::InvalidFrameSize {
                width: self.full_width,
                height: self.full_height,
            });
        }
        if !self.alignment.is_power_of_two() || self.alignment > MAX_ALIGNMENT {
            return Err(G2dError::InvalidAlignment(self.alignment));
        }
        self.check_bounds(&self.selection)
    }

    /// Validate and store a selection. The frame is untouched on error.
    pub fn set_selection(&mut self, rect: Rect) -> G2dResult<()> {
        self.selection = self.check_selection(rect)?;
        Ok(())
    }
}

/// Physical base address of each plane. Unused planes are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaneAddressSet(pub [u64; 3]);

impl PlaneAddressSet {
    /// Single plane buffer
    pub const fn single(addr: u64) -> Self {
        Self([addr, 0, 0])
    }

    pub const fn new(addrs: [u64; 3]) -> Self {
        Self(addrs)
    }

    pub fn plane(&self, index: usize) -> u64 {
        self.0.get(index).copied().unwrap_or(0)
    }
}

impl fmt::Display for PlaneAddressSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#X}, {:#X}, {:#X}]", self.0[0], self.0[1], self.0[2])
    }
}
