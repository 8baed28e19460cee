//! Bit and field helpers for 32-bit registers.

/// Single bit mask
pub const fn bit(n: u32) -> u32 {
    1 << n
}

/// Contiguous mask covering bits `low..=high`
pub const fn genmask(high: u32, low: u32) -> u32 {
    (u32::MAX >> (31 - high)) & (u32::MAX << low)
}

/// Shift `value` into the position described by `mask`, dropping bits that
/// do not fit.
pub const fn field_prep(mask: u32, value: u32) -> u32 {
    (value << mask.trailing_zeros()) & mask
}

/// Extract the field described by `mask` from a register value.
pub const fn field_get(mask: u32, reg: u32) -> u32 {
    (reg & mask) >> mask.trailing_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genmask_covers_inclusive_range() {
        assert_eq!(genmask(31, 0), 0xFFFF_FFFF);
        assert_eq!(genmask(12, 0), 0x1FFF);
        assert_eq!(genmask(28, 16), 0x1FFF_0000);
        assert_eq!(genmask(31, 24), 0xFF00_0000);
    }

    #[test]
    fn field_prep_truncates_to_mask() {
        let mask = genmask(13, 8);
        assert_eq!(field_prep(mask, 0x07), 0x0700);
        assert_eq!(field_prep(mask, 0xFF), 0x3F00);
        assert_eq!(field_get(mask, 0x3F00 | 0x1), 0x3F);
    }
}
