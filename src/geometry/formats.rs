//! Per-format layout rules.
//!
//! Every supported [`PixelFormat`] has exactly one [`FormatInfo`] entry in
//! [`FORMATS`]. The geometry calculator, the padding advisor and the plane
//! layout code all read their rules from here rather than branching on the
//! format themselves.

use super::PixelFormat;

/// How the row stride (aligned width) is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrideRule {
    /// 32-aligned, optionally replaced by the GPU padding routine.
    Rgb { bpp: usize },
    Align(usize),
    /// Deferred to the configured video layout.
    Video,
    /// The width itself, no alignment.
    Unaligned,
}

/// How the aligned height (scanline count) is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightRule {
    Align(usize),
    Exact,
    Video,
}

/// Byte-size formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeRule {
    Packed { bpp: usize },
    /// Adreno NV21: luma and interleaved chroma planes each 4K-aligned.
    AdrenoSemiPlanar,
    /// Tiled NV12: both planes 8K-aligned plus the extradata region.
    TiledSemiPlanar,
    /// Linear NV12 sized with a 128-byte pitch.
    Nv12,
    /// Fully planar 4:2:0 with the luma plane rounded to `luma_align`.
    Planar420 { luma_align: usize },
    /// Semiplanar 4:2:0, `pad` extra bytes before page rounding.
    SemiPlanar420 { pad: usize },
    Packed422,
    Video,
    Blob,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    None,
    EvenWidth,
    EvenDimensions,
    SingleRow,
}

/// Which chroma component comes first in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaOrder {
    CbCr,
    CrCb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneRule {
    /// Packed or tiled, no separately addressable planes.
    None,
    /// One interleaved chroma plane after luma.
    SemiPlanar {
        order: ChromaOrder,
        /// Luma stride is re-derived as `align(width, 16)` instead of the stored width.
        realign_stride: bool,
        /// Alignment of the chroma plane offset.
        chroma_offset_align: usize,
        /// Vertical chroma subsampling (2 for 4:2:0, 1 for 4:2:2).
        chroma_vsub: usize,
    },
    /// Separate Cr and Cb planes after luma.
    Planar { order: ChromaOrder },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    pub format: PixelFormat,
    pub stride: StrideRule,
    pub height: HeightRule,
    pub size: SizeRule,
    pub constraint: Constraint,
    pub planes: PlaneRule,
}

const fn packed(format: PixelFormat, bpp: usize) -> FormatInfo {
    FormatInfo {
        format,
        stride: StrideRule::Rgb { bpp },
        height: HeightRule::Align(32),
        size: SizeRule::Packed { bpp },
        constraint: Constraint::None,
        planes: PlaneRule::None,
    }
}

const fn semiplanar(order: ChromaOrder, chroma_vsub: usize) -> PlaneRule {
    PlaneRule::SemiPlanar {
        order,
        realign_stride: false,
        chroma_offset_align: 1,
        chroma_vsub,
    }
}

pub static FORMATS: [FormatInfo; 20] = [
    packed(PixelFormat::Rgba8888, 4),
    packed(PixelFormat::Rgbx8888, 4),
    packed(PixelFormat::Bgra8888, 4),
    packed(PixelFormat::Rgb888, 3),
    packed(PixelFormat::Rgb565, 2),
    FormatInfo {
        format: PixelFormat::Raw16,
        stride: StrideRule::Align(32),
        height: HeightRule::Align(32),
        size: SizeRule::Packed { bpp: 2 },
        constraint: Constraint::None,
        planes: semiplanar(ChromaOrder::CrCb, 2),
    },
    FormatInfo {
        format: PixelFormat::YCrCb420SpAdreno,
        stride: StrideRule::Align(32),
        height: HeightRule::Align(32),
        size: SizeRule::AdrenoSemiPlanar,
        constraint: Constraint::None,
        planes: semiplanar(ChromaOrder::CrCb, 2),
    },
    FormatInfo {
        format: PixelFormat::YCbCr420SpTiled,
        stride: StrideRule::Align(128),
        height: HeightRule::Align(32),
        size: SizeRule::TiledSemiPlanar,
        constraint: Constraint::None,
        planes: PlaneRule::None,
    },
    FormatInfo {
        format: PixelFormat::Nv12,
        stride: StrideRule::Align(16),
        height: HeightRule::Exact,
        size: SizeRule::Nv12,
        constraint: Constraint::None,
        planes: PlaneRule::SemiPlanar {
            order: ChromaOrder::CbCr,
            realign_stride: true,
            chroma_offset_align: 1,
            chroma_vsub: 2,
        },
    },
    FormatInfo {
        format: PixelFormat::Yv12,
        stride: StrideRule::Align(16),
        height: HeightRule::Exact,
        size: SizeRule::Planar420 { luma_align: 1 },
        constraint: Constraint::EvenDimensions,
        planes: PlaneRule::Planar {
            order: ChromaOrder::CrCb,
        },
    },
    FormatInfo {
        format: PixelFormat::Nv12Encodeable,
        stride: StrideRule::Align(16),
        height: HeightRule::Exact,
        // The encoder requires a 2K aligned chroma offset.
        size: SizeRule::Planar420 { luma_align: 2048 },
        constraint: Constraint::None,
        planes: PlaneRule::SemiPlanar {
            order: ChromaOrder::CbCr,
            realign_stride: false,
            chroma_offset_align: 2048,
            chroma_vsub: 2,
        },
    },
    FormatInfo {
        format: PixelFormat::YCbCr420Sp,
        stride: StrideRule::Align(16),
        height: HeightRule::Exact,
        size: SizeRule::SemiPlanar420 { pad: 1 },
        constraint: Constraint::None,
        planes: semiplanar(ChromaOrder::CbCr, 2),
    },
    FormatInfo {
        format: PixelFormat::YCrCb420Sp,
        stride: StrideRule::Align(16),
        height: HeightRule::Exact,
        size: SizeRule::SemiPlanar420 { pad: 1 },
        constraint: Constraint::None,
        planes: semiplanar(ChromaOrder::CrCb, 2),
    },
    FormatInfo {
        format: PixelFormat::YCbCr422Sp,
        stride: StrideRule::Align(16),
        height: HeightRule::Exact,
        size: SizeRule::Packed422,
        constraint: Constraint::EvenWidth,
        planes: semiplanar(ChromaOrder::CbCr, 1),
    },
    FormatInfo {
        format: PixelFormat::YCrCb422Sp,
        stride: StrideRule::Align(16),
        height: HeightRule::Exact,
        size: SizeRule::Packed422,
        constraint: Constraint::EvenWidth,
        planes: semiplanar(ChromaOrder::CrCb, 1),
    },
    FormatInfo {
        format: PixelFormat::YCbCr422I,
        stride: StrideRule::Align(16),
        height: HeightRule::Exact,
        size: SizeRule::Packed422,
        constraint: Constraint::EvenWidth,
        planes: PlaneRule::None,
    },
    FormatInfo {
        format: PixelFormat::YCrCb422I,
        stride: StrideRule::Align(16),
        height: HeightRule::Exact,
        size: SizeRule::Packed422,
        constraint: Constraint::EvenWidth,
        planes: PlaneRule::None,
    },
    FormatInfo {
        format: PixelFormat::YCbCr420SpVenus,
        stride: StrideRule::Video,
        height: HeightRule::Video,
        size: SizeRule::Video,
        constraint: Constraint::None,
        planes: semiplanar(ChromaOrder::CbCr, 2),
    },
    FormatInfo {
        format: PixelFormat::Blob,
        stride: StrideRule::Unaligned,
        height: HeightRule::Exact,
        size: SizeRule::Blob,
        constraint: Constraint::SingleRow,
        planes: PlaneRule::None,
    },
    FormatInfo {
        format: PixelFormat::Nv21Zsl,
        stride: StrideRule::Align(64),
        height: HeightRule::Align(64),
        size: SizeRule::SemiPlanar420 { pad: 0 },
        constraint: Constraint::None,
        planes: semiplanar(ChromaOrder::CrCb, 2),
    },
];

#[must_use]
pub fn lookup(format: PixelFormat) -> Option<&'static FormatInfo> {
    FORMATS.iter().find(|info| info.format == format)
}
