//! Register file access.
//!
//! Everything that touches the G2D goes through [`RegisterFile`], so the
//! engine can drive either a mapped MMIO window or the simulated block in
//! [`crate::sim`].

use tracing::trace;

/// 32-bit register window of the G2D, addressed by byte offset.
pub trait RegisterFile {
    fn read(&self, offset: u32) -> u32;

    fn write(&mut self, offset: u32, value: u32);

    /// Read-modify-write setting `bits`
    fn set_bits(&mut self, offset: u32, bits: u32) {
        let value = self.read(offset);
        trace!("set_bits: offset={:#X}, bits={:#X}", offset, bits);
        self.write(offset, value | bits);
    }

    /// Read-modify-write clearing `bits`
    fn clear_bits(&mut self, offset: u32, bits: u32) {
        let value = self.read(offset);
        trace!("clear_bits: offset={:#X}, bits={:#X}", offset, bits);
        self.write(offset, value & !bits);
    }

    /// Replace the bits under `mask` with `value`, leaving the rest alone.
    fn modify(&mut self, offset: u32, mask: u32, value: u32) {
        let old = self.read(offset);
        self.write(offset, (old & !mask) | (value & mask));
    }

    /// Set `bits` when `on`, clear them otherwise.
    fn assign_bits(&mut self, offset: u32, bits: u32, on: bool) {
        if on {
            self.set_bits(offset, bits);
        } else {
            self.clear_bits(offset, bits);
        }
    }
}

impl<R: RegisterFile + ?Sized> RegisterFile for &mut R {
    fn read(&self, offset: u32) -> u32 {
        (**self).read(offset)
    }

    fn write(&mut self, offset: u32, value: u32) {
        (**self).write(offset, value)
    }
}
