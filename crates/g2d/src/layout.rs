//! Plane layout resolution.
//!
//! Turns a frame descriptor plus the base address of each plane into the
//! per-plane pitch and the address of the first selected pixel, which is what
//! both the input layer and the write-back channel are programmed with.
//!
//! Chroma planes are laid out at `full_width >> h_shift` samples per line and
//! the selection origin is shifted by the format's sub-sampling:
//!
//! | sub-sampling | h_shift | v_shift |
//! |--------------|---------|---------|
//! | none         | 0       | 0       |
//! | 4:2:2        | 1       | 0       |
//! | 4:2:0        | 1       | 1       |
//! | 4:1:1        | 2       | 0       |

use crate::error::{G2dError, G2dResult};
use crate::format::PixelFormat;
use crate::frame::{FrameDescriptor, PlaneAddressSet};
use g2d_hw::bits::field_prep;
use g2d_hw::mmio::g2d::size;
use tracing::debug;

/// Pitch and first-pixel address of each plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaneLayout {
    pub pitch: [u32; 3],
    pub origin: [u64; 3],
}

/// Round `value` up to a multiple of `alignment`, which must be a power of two.
///
/// An alignment of zero is treated as one. Returns `None` on overflow.
pub fn align_up(value: u32, alignment: u32) -> Option<u32> {
    let mask = alignment.max(1) - 1;
    Some(value.checked_add(mask)? & !mask)
}

/// Hardware size fields hold `count - 1`. Zero saturates to zero.
pub fn size_field(count: u32) -> u32 {
    count.saturating_sub(1)
}

/// Pack a width and height into a `*SIZE` register value.
pub fn pack_size(width: u32, height: u32) -> u32 {
    field_prep(size::WIDTH, size_field(width)) | field_prep(size::HEIGHT, size_field(height))
}

/// Compute the plane layout of `frame` stored at `addrs`, interpreted as
/// `format`.
///
/// Planes whose byte count is zero for the format get pitch 0 and origin 0.
/// Fails instead of wrapping when a pitch or origin does not fit its type.
pub fn resolve_plane_layout(
    format: PixelFormat,
    frame: &FrameDescriptor,
    addrs: &PlaneAddressSet,
) -> G2dResult<PlaneLayout> {
    let bytes = format.plane_bytes();
    let sub = format.subsampling();
    let sel = frame.selection;

    let chroma_width = frame.full_width >> sub.h_shift;
    let cx = u64::from(sel.left >> sub.h_shift);
    let cy = u64::from(sel.top >> sub.v_shift);

    let counts = [bytes.luma, bytes.chroma_u, bytes.chroma_v];
    let mut layout = PlaneLayout::default();

    for (plane, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let (width, x, y) = if plane == 0 {
            (frame.full_width, u64::from(sel.left), u64::from(sel.top))
        } else {
            (chroma_width, cx, cy)
        };
        let pitch = count
            .checked_mul(width)
            .and_then(|line| align_up(line, frame.alignment))
            .ok_or(G2dError::InvalidFrameSize {
                width: frame.full_width,
                height: frame.full_height,
            })?;
        let base = addrs.plane(plane);
        // Both products are u32 * u32 and cannot overflow u64
        let offset = u64::from(pitch) * y + u64::from(count) * x;
        let origin = base
            .checked_add(offset)
            .ok_or(G2dError::AddressOutOfRange {
                address: base,
                bits: u64::BITS,
            })?;
        layout.pitch[plane] = pitch;
        layout.origin[plane] = origin;
    }

    debug!(
        "Layout for {} {}: pitch={:?} origin=[{:#X}, {:#X}, {:#X}]",
        format, sel, layout.pitch, layout.origin[0], layout.origin[1], layout.origin[2]
    );

    Ok(layout)
}

/// Lines or samples covered by `len` units starting at `start`, after
/// sub-sampling by `shift`.
fn span(start: u32, len: u32, shift: u32) -> u64 {
    if len == 0 {
        return 0;
    }
    let first = u64::from(start) >> shift;
    let last = (u64::from(start) + u64::from(len) - 1) >> shift;
    last - first + 1
}

/// Check that every byte the selection touches, in every plane, can be
/// addressed with `address_bits` bits.
pub fn check_address_reach(
    format: PixelFormat,
    frame: &FrameDescriptor,
    layout: &PlaneLayout,
    address_bits: u32,
) -> G2dResult<()> {
    let bytes = format.plane_bytes();
    let sub = format.subsampling();
    let sel = frame.selection;
    let limit = 1u64.checked_shl(address_bits).unwrap_or(u64::MAX);
    let out_of_range = |address| G2dError::AddressOutOfRange {
        address,
        bits: address_bits,
    };

    let counts = [bytes.luma, bytes.chroma_u, bytes.chroma_v];
    for (plane, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let (h_shift, v_shift) = if plane == 0 {
            (0, 0)
        } else {
            (sub.h_shift, sub.v_shift)
        };
        let rows = span(sel.top, sel.height, v_shift);
        let cols = span(sel.left, sel.width, h_shift);
        let origin = layout.origin[plane];

        // One past the last byte read or written
        let end = u64::from(layout.pitch[plane])
            .checked_mul(rows.saturating_sub(1))
            .and_then(|rows| rows.checked_add(u64::from(count) * cols))
            .and_then(|len| origin.checked_add(len))
            .ok_or(out_of_range(origin))?;
        if origin >= limit || end > limit {
            return Err(out_of_range(end));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FourCc;
    use crate::frame::Selection;

    fn frame(format: PixelFormat, width: u32, height: u32, sel: Selection) -> FrameDescriptor {
        let mut frame = FrameDescriptor::new(FourCc::XBGR32, format, width, height);
        frame.selection = sel;
        frame
    }

    #[test]
    fn align_up_rounds_to_power_of_two() {
        assert_eq!(align_up(3200, 1), Some(3200));
        assert_eq!(align_up(3201, 64), Some(3264));
        assert_eq!(align_up(3264, 64), Some(3264));
        assert_eq!(align_up(5, 0), Some(5));
        assert_eq!(align_up(u32::MAX - 2, 64), None);
    }

    #[test]
    fn size_field_saturates() {
        assert_eq!(size_field(0), 0);
        assert_eq!(size_field(1), 0);
        assert_eq!(size_field(400), 399);
        assert_eq!(pack_size(400, 240), (239 << 16) | 399);
        assert_eq!(pack_size(0, 0), 0);
    }

    #[test]
    fn packed_rgb_uses_one_plane() {
        let frame = frame(
            PixelFormat::Bgrx8888,
            800,
            480,
            Selection::new(200, 120, 400, 240),
        );
        let base = 0x4000_0000;
        let addrs = PlaneAddressSet::single(base);
        let layout = resolve_plane_layout(frame.format, &frame, &addrs).unwrap();

        assert_eq!(layout.pitch, [3200, 0, 0]);
        assert_eq!(layout.origin, [base + 3200 * 120 + 4 * 200, 0, 0]);
    }

    #[test]
    fn pitches_are_aligned_and_never_shrink() {
        for alignment in [1, 2, 4, 8, 16, 32, 64] {
            for format in PixelFormat::ALL {
                let mut frame = frame(format, 333, 100, Selection::new(3, 5, 10, 10));
                frame.alignment = alignment;
                let addrs = PlaneAddressSet::new([0x1000; 3]);
                let layout = resolve_plane_layout(format, &frame, &addrs).unwrap();
                let bytes = format.plane_bytes();
                let chroma_width = 333 >> format.subsampling().h_shift;
                let minimum = [
                    bytes.luma * 333,
                    bytes.chroma_u * chroma_width,
                    bytes.chroma_v * chroma_width,
                ];
                for plane in 0..3 {
                    assert_eq!(layout.pitch[plane] % alignment, 0, "{format} plane {plane}");
                    assert!(layout.pitch[plane] >= minimum[plane], "{format} plane {plane}");
                }
            }
        }
    }

    #[test]
    fn zero_chroma_formats_leave_chroma_planes_empty() {
        for format in PixelFormat::ALL {
            let bytes = format.plane_bytes();
            if bytes.chroma_u != 0 || bytes.chroma_v != 0 {
                continue;
            }
            let frame = frame(format, 64, 64, Selection::new(8, 8, 16, 16));
            let addrs = PlaneAddressSet::new([0x10; 3]);
            let layout = resolve_plane_layout(format, &frame, &addrs).unwrap();
            assert_eq!(layout.pitch[1..], [0, 0], "{format}");
            assert_eq!(layout.origin[1..], [0, 0], "{format}");
        }
    }

    #[test]
    fn semi_planar_420_halves_chroma_origin() {
        let frame = frame(
            PixelFormat::Yuv420UvcU1V1U0V0,
            640,
            480,
            Selection::new(64, 32, 128, 64),
        );
        let addrs = PlaneAddressSet::new([0x1000_0000, 0x2000_0000, 0]);
        let layout = resolve_plane_layout(frame.format, &frame, &addrs).unwrap();

        assert_eq!(layout.pitch, [640, 640, 0]);
        assert_eq!(layout.origin[0], 0x1000_0000 + 640 * 32 + 64);
        assert_eq!(layout.origin[1], 0x2000_0000 + 640 * 16 + 2 * 32);
        assert_eq!(layout.origin[2], 0);
    }

    #[test]
    fn semi_planar_422_keeps_chroma_row() {
        let frame = frame(
            PixelFormat::Yuv422UvcU1V1U0V0,
            640,
            480,
            Selection::new(64, 32, 128, 64),
        );
        let addrs = PlaneAddressSet::new([0x1000_0000, 0x2000_0000, 0]);
        let layout = resolve_plane_layout(frame.format, &frame, &addrs).unwrap();

        // 320 UV pairs of 2 bytes per line, chroma row not halved
        assert_eq!(layout.pitch, [640, 640, 0]);
        assert_eq!(layout.origin[0], 0x1000_0000 + 640 * 32 + 64);
        assert_eq!(layout.origin[1], 0x2000_0000 + 640 * 32 + 2 * 32);
        assert_eq!(layout.origin[2], 0);
    }

    #[test]
    fn p010_is_420_with_wide_samples() {
        let frame = frame(
            PixelFormat::Yvu10P010,
            640,
            480,
            Selection::new(64, 32, 128, 64),
        );
        let addrs = PlaneAddressSet::new([0x1000_0000, 0x2000_0000, 0]);
        let layout = resolve_plane_layout(frame.format, &frame, &addrs).unwrap();

        assert_eq!(layout.pitch, [1280, 1280, 0]);
        assert_eq!(layout.origin[0], 0x1000_0000 + 1280 * 32 + 2 * 64);
        assert_eq!(layout.origin[1], 0x2000_0000 + 1280 * 16 + 4 * 32);
    }

    #[test]
    fn p210_is_422_with_wide_samples() {
        let frame = frame(
            PixelFormat::Yvu10P210,
            640,
            480,
            Selection::new(64, 32, 128, 64),
        );
        let addrs = PlaneAddressSet::new([0x1000_0000, 0x2000_0000, 0]);
        let layout = resolve_plane_layout(frame.format, &frame, &addrs).unwrap();

        assert_eq!(layout.pitch, [1280, 1280, 0]);
        assert_eq!(layout.origin[1], 0x2000_0000 + 1280 * 32 + 4 * 32);
    }

    #[test]
    fn planar_411_quarters_chroma_width() {
        let frame = frame(
            PixelFormat::Yuv411Planar,
            640,
            480,
            Selection::new(64, 32, 128, 64),
        );
        let addrs = PlaneAddressSet::new([0x1000, 0x2000, 0x3000]);
        let layout = resolve_plane_layout(frame.format, &frame, &addrs).unwrap();

        assert_eq!(layout.pitch, [640, 160, 160]);
        assert_eq!(layout.origin[1], 0x2000 + 160 * 32 + 16);
        assert_eq!(layout.origin[2], 0x3000 + 160 * 32 + 16);
    }

    #[test]
    fn origins_above_four_gigabytes_keep_high_bits() {
        let frame = frame(
            PixelFormat::Bgrx8888,
            800,
            480,
            Selection::new(0, 1, 8, 8),
        );
        let base = 0x12_8000_0000;
        let addrs = PlaneAddressSet::single(base);
        let layout = resolve_plane_layout(frame.format, &frame, &addrs).unwrap();
        assert_eq!(layout.origin[0], base + 3200);
        assert_eq!(layout.origin[0] >> 32, 0x12);
    }

    #[test]
    fn oversized_frame_is_rejected_instead_of_wrapping() {
        let frame = frame(
            PixelFormat::Bgrx8888,
            0x4000_0000,
            480,
            Selection::new(0, 0, 8, 8),
        );
        let addrs = PlaneAddressSet::single(0x1000);
        let err = resolve_plane_layout(frame.format, &frame, &addrs).unwrap_err();
        assert!(matches!(err, G2dError::InvalidFrameSize { .. }));
    }

    #[test]
    fn origin_past_u64_is_rejected() {
        let frame = frame(
            PixelFormat::Bgrx8888,
            800,
            480,
            Selection::new(0, 1, 8, 8),
        );
        let addrs = PlaneAddressSet::single(u64::MAX - 100);
        assert!(resolve_plane_layout(frame.format, &frame, &addrs).is_err());
    }

    #[test]
    fn reach_covers_last_byte_of_selection() {
        let frame = frame(
            PixelFormat::Bgrx8888,
            800,
            480,
            Selection::new(0, 0, 8, 2),
        );
        // Last line ends exactly at 4 GiB
        let base = (1u64 << 32) - 3200 - 32;
        let addrs = PlaneAddressSet::single(base);
        let layout = resolve_plane_layout(frame.format, &frame, &addrs).unwrap();
        assert!(check_address_reach(frame.format, &frame, &layout, 32).is_ok());

        let addrs = PlaneAddressSet::single(base + 4);
        let layout = resolve_plane_layout(frame.format, &frame, &addrs).unwrap();
        assert!(matches!(
            check_address_reach(frame.format, &frame, &layout, 32),
            Err(G2dError::AddressOutOfRange { bits: 32, .. })
        ));
        assert!(check_address_reach(frame.format, &frame, &layout, 40).is_ok());
    }

    #[test]
    fn reach_checks_chroma_planes() {
        let frame = frame(
            PixelFormat::Yuv420Planar,
            64,
            64,
            Selection::new(0, 0, 16, 16),
        );
        let addrs = PlaneAddressSet::new([0x1000, 0x2000, 1 << 40]);
        let layout = resolve_plane_layout(frame.format, &frame, &addrs).unwrap();
        assert!(check_address_reach(frame.format, &frame, &layout, 40).is_err());
        assert!(check_address_reach(frame.format, &frame, &layout, 41).is_ok());
    }
}
