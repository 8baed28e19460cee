//! Pixel format table.
//!
//! Maps the hardware format ids onto per-plane byte counts and the chroma
//! sub-sampling implied by the id range. The classification is a fixed table
//! taken from the hardware documentation, not something derived at runtime.

use g2d_hw::mmio::g2d::pixel_format as hw;
use std::fmt;

/// Bytes per pixel (luma) and per chroma sample for each plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneBytes {
    pub luma: u32,
    pub chroma_u: u32,
    pub chroma_v: u32,
}

impl PlaneBytes {
    const fn new(luma: u32, chroma_u: u32, chroma_v: u32) -> Self {
        Self {
            luma,
            chroma_u,
            chroma_v,
        }
    }
}

/// How the planes of a format are arranged in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatFamily {
    /// Single plane RGB
    PackedRgb,
    /// Single plane with Y and chroma samples interleaved
    InterleavedYuv,
    /// Luma plane plus one combined UV plane
    SemiPlanarYuv,
    /// Separate Y, U and V planes
    PlanarYuv,
    /// Single plane luma only, or 4:4:4 packed
    PackedYuv,
}

/// Chroma sub-sampling expressed as right shifts of the luma coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subsampling {
    pub h_shift: u32,
    pub v_shift: u32,
}

impl Subsampling {
    pub const NONE: Self = Self {
        h_shift: 0,
        v_shift: 0,
    };
    pub const YUV422: Self = Self {
        h_shift: 1,
        v_shift: 0,
    };
    pub const YUV420: Self = Self {
        h_shift: 1,
        v_shift: 1,
    };
    pub const YUV411: Self = Self {
        h_shift: 2,
        v_shift: 0,
    };
}

/// Color space the blender works in for a given format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendColorSpace {
    Rgb,
    Yuv,
}

/// Pixel formats understood by the mixer.
///
/// Discriminants are the hardware ids written to the format fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PixelFormat {
    Argb8888 = hw::ARGB8888,
    Abgr8888 = hw::ABGR8888,
    Rgba8888 = hw::RGBA8888,
    Bgra8888 = hw::BGRA8888,
    Xrgb8888 = hw::XRGB8888,
    Xbgr8888 = hw::XBGR8888,
    Rgbx8888 = hw::RGBX8888,
    Bgrx8888 = hw::BGRX8888,
    Rgb888 = hw::RGB888,
    Bgr888 = hw::BGR888,
    Rgb565 = hw::RGB565,
    Bgr565 = hw::BGR565,
    Argb4444 = hw::ARGB4444,
    Abgr4444 = hw::ABGR4444,
    Rgba4444 = hw::RGBA4444,
    Bgra4444 = hw::BGRA4444,
    Argb1555 = hw::ARGB1555,
    Abgr1555 = hw::ABGR1555,
    Rgba5551 = hw::RGBA5551,
    Bgra5551 = hw::BGRA5551,
    Argb2101010 = hw::ARGB2101010,
    Abgr2101010 = hw::ABGR2101010,
    Rgba1010102 = hw::RGBA1010102,
    Bgra1010102 = hw::BGRA1010102,
    Iyuv422V0Y1U0Y0 = hw::IYUV422_V0Y1U0Y0,
    Iyuv422Y1V0Y0U0 = hw::IYUV422_Y1V0Y0U0,
    Iyuv422U0Y1V0Y0 = hw::IYUV422_U0Y1V0Y0,
    Iyuv422Y1U0Y0V0 = hw::IYUV422_Y1U0Y0V0,
    Yuv422UvcV1U1V0U0 = hw::YUV422UVC_V1U1V0U0,
    Yuv422UvcU1V1U0V0 = hw::YUV422UVC_U1V1U0V0,
    Yuv422Planar = hw::YUV422_PLANAR,
    Yuv420UvcV1U1V0U0 = hw::YUV420UVC_V1U1V0U0,
    Yuv420UvcU1V1U0V0 = hw::YUV420UVC_U1V1U0V0,
    Yuv420Planar = hw::YUV420_PLANAR,
    Yuv411UvcV1U1V0U0 = hw::YUV411UVC_V1U1V0U0,
    Yuv411UvcU1V1U0V0 = hw::YUV411UVC_U1V1U0V0,
    Yuv411Planar = hw::YUV411_PLANAR,
    Y8 = hw::Y8,
    Yvu10P010 = hw::YVU10_P010,
    Yvu10P210 = hw::YVU10_P210,
    Yvu10Packed444 = hw::YVU10_444,
    Yuv10Packed444 = hw::YUV10_444,
}

impl PixelFormat {
    /// Every format in hardware id order.
    pub const ALL: [PixelFormat; 42] = [
        Self::Argb8888,
        Self::Abgr8888,
        Self::Rgba8888,
        Self::Bgra8888,
        Self::Xrgb8888,
        Self::Xbgr8888,
        Self::Rgbx8888,
        Self::Bgrx8888,
        Self::Rgb888,
        Self::Bgr888,
        Self::Rgb565,
        Self::Bgr565,
        Self::Argb4444,
        Self::Abgr4444,
        Self::Rgba4444,
        Self::Bgra4444,
        Self::Argb1555,
        Self::Abgr1555,
        Self::Rgba5551,
        Self::Bgra5551,
        Self::Argb2101010,
        Self::Abgr2101010,
        Self::Rgba1010102,
        Self::Bgra1010102,
        Self::Iyuv422V0Y1U0Y0,
        Self::Iyuv422Y1V0Y0U0,
        Self::Iyuv422U0Y1V0Y0,
        Self::Iyuv422Y1U0Y0V0,
        Self::Yuv422UvcV1U1V0U0,
        Self::Yuv422UvcU1V1U0V0,
        Self::Yuv422Planar,
        Self::Yuv420UvcV1U1V0U0,
        Self::Yuv420UvcU1V1U0V0,
        Self::Yuv420Planar,
        Self::Yuv411UvcV1U1V0U0,
        Self::Yuv411UvcU1V1U0V0,
        Self::Yuv411Planar,
        Self::Y8,
        Self::Yvu10P010,
        Self::Yvu10P210,
        Self::Yvu10Packed444,
        Self::Yuv10Packed444,
    ];

    /// Look a format up by hardware id.
    pub fn from_hw_id(id: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.hw_id() == id)
    }

    /// Value written to the layer and write-back format fields
    pub const fn hw_id(self) -> u32 {
        self as u32
    }

    pub fn family(self) -> FormatFamily {
        use PixelFormat::*;
        match self {
            Iyuv422V0Y1U0Y0 | Iyuv422Y1V0Y0U0 | Iyuv422U0Y1V0Y0 | Iyuv422Y1U0Y0V0 => {
                FormatFamily::InterleavedYuv
            }
            Yuv422UvcV1U1V0U0 | Yuv422UvcU1V1U0V0 | Yuv420UvcV1U1V0U0 | Yuv420UvcU1V1U0V0
            | Yuv411UvcV1U1V0U0 | Yuv411UvcU1V1U0V0 | Yvu10P010 | Yvu10P210 => {
                FormatFamily::SemiPlanarYuv
            }
            Yuv422Planar | Yuv420Planar | Yuv411Planar => FormatFamily::PlanarYuv,
            Y8 | Yvu10Packed444 | Yuv10Packed444 => FormatFamily::PackedYuv,
            _ => FormatFamily::PackedRgb,
        }
    }

    /// Bytes per luma pixel and per chroma sample, by plane.
    pub fn plane_bytes(self) -> PlaneBytes {
        let id = self.hw_id();
        match self.family() {
            FormatFamily::PackedRgb => match id {
                hw::ARGB8888..=hw::BGRX8888 => PlaneBytes::new(4, 0, 0),
                hw::RGB888..=hw::BGR888 => PlaneBytes::new(3, 0, 0),
                hw::RGB565..=hw::BGRA5551 => PlaneBytes::new(2, 0, 0),
                _ => PlaneBytes::new(4, 0, 0),
            },
            FormatFamily::InterleavedYuv => PlaneBytes::new(2, 0, 0),
            FormatFamily::SemiPlanarYuv if id >= hw::YVU10_P010 => PlaneBytes::new(2, 4, 0),
            FormatFamily::SemiPlanarYuv => PlaneBytes::new(1, 2, 0),
            FormatFamily::PlanarYuv => PlaneBytes::new(1, 1, 1),
            FormatFamily::PackedYuv if self == Self::Y8 => PlaneBytes::new(1, 0, 0),
            FormatFamily::PackedYuv => PlaneBytes::new(6, 0, 0),
        }
    }

    /// Chroma sub-sampling implied by the id range.
    pub fn subsampling(self) -> Subsampling {
        match self.hw_id() {
            hw::YUV422UVC_V1U1V0U0..=hw::YUV422_PLANAR | hw::YVU10_P210 => Subsampling::YUV422,
            hw::YUV420UVC_V1U1V0U0..=hw::YUV420_PLANAR | hw::YVU10_P010 => Subsampling::YUV420,
            hw::YUV411UVC_V1U1V0U0..=hw::YUV411_PLANAR => Subsampling::YUV411,
            _ => Subsampling::NONE,
        }
    }

    /// Color space the blender must be switched to for this format.
    ///
    /// Y-only and 10-bit YUV ids sit past `LAST_YUV` but still blend in YUV.
    pub fn blend_color_space(self) -> BlendColorSpace {
        if self.hw_id() <= hw::LAST_RGB {
            BlendColorSpace::Rgb
        } else {
            BlendColorSpace::Yuv
        }
    }

    /// Human readable name
    pub fn name(self) -> &'static str {
        use PixelFormat::*;
        match self {
            Argb8888 => "ARGB8888",
            Abgr8888 => "ABGR8888",
            Rgba8888 => "RGBA8888",
            Bgra8888 => "BGRA8888",
            Xrgb8888 => "XRGB8888",
            Xbgr8888 => "XBGR8888",
            Rgbx8888 => "RGBX8888",
            Bgrx8888 => "BGRX8888",
            Rgb888 => "RGB888",
            Bgr888 => "BGR888",
            Rgb565 => "RGB565",
            Bgr565 => "BGR565",
            Argb4444 => "ARGB4444",
            Abgr4444 => "ABGR4444",
            Rgba4444 => "RGBA4444",
            Bgra4444 => "BGRA4444",
            Argb1555 => "ARGB1555",
            Abgr1555 => "ABGR1555",
            Rgba5551 => "RGBA5551",
            Bgra5551 => "BGRA5551",
            Argb2101010 => "ARGB2101010",
            Abgr2101010 => "ABGR2101010",
            Rgba1010102 => "RGBA1010102",
            Bgra1010102 => "BGRA1010102",
            Iyuv422V0Y1U0Y0 => "IYUV422 V0Y1U0Y0",
            Iyuv422Y1V0Y0U0 => "IYUV422 Y1V0Y0U0",
            Iyuv422U0Y1V0Y0 => "IYUV422 U0Y1V0Y0",
            Iyuv422Y1U0Y0V0 => "IYUV422 Y1U0Y0V0",
            Yuv422UvcV1U1V0U0 => "YUV422 UVC V1U1V0U0",
            Yuv422UvcU1V1U0V0 => "YUV422 UVC U1V1U0V0",
            Yuv422Planar => "YUV422 planar",
            Yuv420UvcV1U1V0U0 => "YUV420 UVC V1U1V0U0",
            Yuv420UvcU1V1U0V0 => "YUV420 UVC U1V1U0V0",
            Yuv420Planar => "YUV420 planar",
            Yuv411UvcV1U1V0U0 => "YUV411 UVC V1U1V0U0",
            Yuv411UvcU1V1U0V0 => "YUV411 UVC U1V1U0V0",
            Yuv411Planar => "YUV411 planar",
            Y8 => "Y8",
            Yvu10P010 => "YVU10 P010",
            Yvu10P210 => "YVU10 P210",
            Yvu10Packed444 => "YVU10 444",
            Yuv10Packed444 => "YUV10 444",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#04x})", self.name(), self.hw_id())
    }
}

/// Four character code identifying a pixel format to buffer producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    /// 32-bit BGRX, alpha byte ignored (`XR24`)
    pub const XBGR32: FourCc = FourCc(*b"XR24");
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// A buffer format the engine accepts at its boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDesc {
    pub fourcc: FourCc,
    /// Bits per pixel of the first plane
    pub depth: u32,
    pub format: PixelFormat,
}

/// Formats wired end to end, both as input and output.
pub const SUPPORTED_FORMATS: &[FormatDesc] = &[FormatDesc {
    fourcc: FourCc::XBGR32,
    depth: 32,
    format: PixelFormat::Bgrx8888,
}];

/// Find the supported format for a fourcc.
pub fn find_format(fourcc: FourCc) -> Option<&'static FormatDesc> {
    SUPPORTED_FORMATS.iter().find(|desc| desc.fourcc == fourcc)
}
