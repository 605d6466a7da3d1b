pub mod formats;
pub mod planes;
pub mod venus;

use crate::error::{GrallocError, GrallocResult};
use crate::padding::PaddingAdvisor;
use crate::utils::align_up;
use formats::{Constraint, HeightRule, SizeRule};

pub use formats::{FORMATS, FormatInfo};
pub use planes::{PlaneInfo, plane_layout, plane_offsets};
pub use venus::{VenusNv12, VideoLayout};

/// Extra region appended to codec-native buffers for decoder side data.
pub const EXTRADATA_SIZE: usize = 8 * 1024;

/// Pixel formats understood by the allocator, with their HAL format codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PixelFormat {
    Rgba8888 = 0x1,
    Rgbx8888 = 0x2,
    Rgb888 = 0x3,
    Rgb565 = 0x4,
    Bgra8888 = 0x5,
    YCbCr422Sp = 0x10,
    YCrCb420Sp = 0x11,
    YCbCr422I = 0x14,
    Raw16 = 0x20,
    Blob = 0x21,
    Nv12Encodeable = 0x102,
    YCbCr420Sp = 0x109,
    YCrCb422Sp = 0x10B,
    YCrCb422I = 0x111,
    Nv21Zsl = 0x113,
    Yv12 = 0x3231_5659,
    Nv12 = 0x7FA3_0C00,
    YCrCb420SpAdreno = 0x7FA3_0C01,
    YCbCr420SpTiled = 0x7FA3_0C03,
    YCbCr420SpVenus = 0x7FA3_0C04,
}

impl PixelFormat {
    /// Parses a raw HAL format code.
    ///
    /// # Errors
    /// Returns `UnsupportedFormat` for codes outside the supported set.
    pub fn from_code(code: u32) -> GrallocResult<Self> {
        FORMATS
            .iter()
            .map(|info| info.format)
            .find(|f| f.code() == code)
            .ok_or(GrallocError::UnsupportedFormat(code))
    }

    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// True for the packed RGB family, the only formats the GPU padding
    /// routine is consulted for.
    #[must_use]
    pub const fn is_rgb(self) -> bool {
        self.code() <= Self::Bgra8888.code()
    }

    /// Bytes per pixel of the RGB family, `None` for everything else.
    #[must_use]
    pub const fn rgb_bpp(self) -> Option<usize> {
        match self {
            Self::Rgba8888 | Self::Rgbx8888 | Self::Bgra8888 => Some(4),
            Self::Rgb888 => Some(3),
            Self::Rgb565 => Some(2),
            _ => None,
        }
    }
}

/// Dimensions and size of a buffer after every alignment rule has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub aligned_width: usize,
    pub aligned_height: usize,
    pub size: usize,
}

/// Maps (width, height, format) to the aligned buffer geometry.
///
/// The calculator is a pure function of its inputs and the (immutable)
/// padding advisor it was built with, so it is freely shareable.
#[derive(Debug, Clone, Default)]
pub struct GeometryCalculator {
    advisor: PaddingAdvisor,
}

impl GeometryCalculator {
    #[must_use]
    pub const fn new(advisor: PaddingAdvisor) -> Self {
        Self { advisor }
    }

    #[must_use]
    pub const fn advisor(&self) -> &PaddingAdvisor {
        &self.advisor
    }

    /// Computes aligned width, aligned height and total byte size.
    ///
    /// # Errors
    /// `UnsupportedFormat` if the format has no table entry (or needs a video
    /// layout that is not configured), `InvalidDimensions` if the format's
    /// shape constraint is violated or the size does not fit in `usize`.
    pub fn compute_geometry(
        &self,
        width: usize,
        height: usize,
        format: PixelFormat,
    ) -> GrallocResult<Geometry> {
        let info = formats::lookup(format).ok_or(GrallocError::UnsupportedFormat(format.code()))?;

        check_constraint(width, height, format, info.constraint)?;

        let overflow = || GrallocError::InvalidDimensions {
            width,
            height,
            format,
            reason: "buffer size overflows",
        };

        let aligned_width = self.advisor.row_stride(width, format)?;

        let aligned_height = match info.height {
            HeightRule::Align(a) => align_up(height, a),
            HeightRule::Exact => Some(height),
            HeightRule::Video => self.video()?.y_scanlines(height),
        }
        .ok_or_else(overflow)?;

        let video = match info.size {
            SizeRule::Video => Some(self.video()?),
            _ => None,
        };
        let size = byte_size(info.size, video, width, height, aligned_width, aligned_height)
            .ok_or_else(overflow)?;

        Ok(Geometry {
            aligned_width,
            aligned_height,
            size,
        })
    }

    fn video(&self) -> GrallocResult<&dyn VideoLayout> {
        self.advisor
            .video_layout()
            .ok_or(GrallocError::UnsupportedFormat(PixelFormat::YCbCr420SpVenus.code()))
    }
}

/// Byte size under `rule`, `None` on overflow.
///
/// `width`/`height` are the requested dimensions, `aw`/`ah` the aligned ones.
/// 4:2:0 chroma row counts round up so odd heights keep their last row.
fn byte_size(
    rule: SizeRule,
    video: Option<&dyn VideoLayout>,
    width: usize,
    height: usize,
    aw: usize,
    ah: usize,
) -> Option<usize> {
    let luma = aw.checked_mul(ah)?;
    let size = match rule {
        SizeRule::Packed { bpp } => luma.checked_mul(bpp)?,
        SizeRule::AdrenoSemiPlanar => {
            let chroma = align_up(width / 2, 32)?
                .checked_mul(align_up(height / 2, 32)?)?
                .checked_mul(2)?;
            align_up(luma, 4096)?.checked_add(align_up(chroma, 4096)?)?
        }
        SizeRule::TiledSemiPlanar => {
            // The GPU needs 4K alignment, but the video decoder needs 8K
            let chroma = aw.checked_mul(align_up(height / 2, 32)?)?;
            align_up(luma, 8192)?
                .checked_add(align_up(chroma, 8192)?)?
                .checked_add(EXTRADATA_SIZE)?
        }
        SizeRule::Nv12 => {
            let pitch = align_up(width, 128)?;
            let luma = pitch.checked_mul(align_up(height, 32)?)?;
            let chroma = pitch.checked_mul(align_up(height.div_ceil(2), 32)?)?;
            align_up(luma, 8192)?.checked_add(align_up(chroma, 8192)?)?
        }
        SizeRule::Planar420 { luma_align } => {
            let chroma = align_up(aw / 2, 16)?.checked_mul(ah.div_ceil(2))?;
            align_up(align_up(luma, luma_align)?.checked_add(chroma.checked_mul(2)?)?, 4096)?
        }
        SizeRule::SemiPlanar420 { pad } => {
            let chroma = aw.checked_mul(ah.div_ceil(2))?;
            align_up(luma.checked_add(chroma)?.checked_add(pad)?, 4096)?
        }
        SizeRule::Packed422 => align_up(luma.checked_mul(2)?, 4096)?,
        SizeRule::Video => video?.buffer_size(width, height)?,
        SizeRule::Blob => width,
    };
    Some(size)
}

fn check_constraint(
    width: usize,
    height: usize,
    format: PixelFormat,
    constraint: Constraint,
) -> GrallocResult<()> {
    let invalid = |reason| GrallocError::InvalidDimensions {
        width,
        height,
        format,
        reason,
    };

    if width == 0 || height == 0 {
        return Err(invalid("zero-sized buffer"));
    }

    match constraint {
        Constraint::None => Ok(()),
        Constraint::EvenWidth if width & 1 != 0 => Err(invalid("width must be even")),
        Constraint::EvenDimensions if (width | height) & 1 != 0 => {
            log::error!("w or h is odd for the {format:?} format");
            Err(invalid("width and height must be even"))
        }
        Constraint::SingleRow if height != 1 => {
            log::error!("Buffers with format {format:?} must have height==1");
            Err(invalid("height must be 1"))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> GeometryCalculator {
        GeometryCalculator::default()
    }

    #[test]
    fn rgba_without_padding_routine() {
        let g = calc().compute_geometry(100, 100, PixelFormat::Rgba8888).unwrap();
        assert_eq!(g.aligned_width, 128);
        assert_eq!(g.aligned_height, 128);
        assert_eq!(g.size, 65536);
    }

    #[test]
    fn rgb_family_bytes_per_pixel() {
        let g = calc().compute_geometry(64, 32, PixelFormat::Rgb888).unwrap();
        assert_eq!(g.size, 64 * 32 * 3);
        let g = calc().compute_geometry(64, 32, PixelFormat::Rgb565).unwrap();
        assert_eq!(g.size, 64 * 32 * 2);
    }

    #[test]
    fn yv12_qcif() {
        let g = calc().compute_geometry(176, 144, PixelFormat::Yv12).unwrap();
        assert_eq!(g.aligned_width, 176);
        assert_eq!(g.aligned_height, 144);
        // 176*144 + 2*(96*72) = 39168, rounded to 4K
        assert_eq!(g.size, 40960);
    }

    #[test]
    fn yv12_rejects_odd_dimensions() {
        for (w, h) in [(175, 144), (176, 143), (3, 3)] {
            let err = calc().compute_geometry(w, h, PixelFormat::Yv12).unwrap_err();
            assert!(matches!(err, GrallocError::InvalidDimensions { .. }));
        }
    }

    #[test]
    fn blob_is_a_single_unaligned_row() {
        let g = calc().compute_geometry(4096, 1, PixelFormat::Blob).unwrap();
        assert_eq!(g, Geometry { aligned_width: 4096, aligned_height: 1, size: 4096 });

        let g = calc().compute_geometry(1000, 1, PixelFormat::Blob).unwrap();
        assert_eq!(g.size, 1000);

        let err = calc().compute_geometry(4096, 2, PixelFormat::Blob).unwrap_err();
        assert!(matches!(err, GrallocError::InvalidDimensions { .. }));
    }

    #[test]
    fn yuv422_requires_even_width() {
        for format in [
            PixelFormat::YCbCr422Sp,
            PixelFormat::YCrCb422Sp,
            PixelFormat::YCbCr422I,
            PixelFormat::YCrCb422I,
        ] {
            assert!(calc().compute_geometry(33, 10, format).is_err());
            let g = calc().compute_geometry(34, 11, format).unwrap();
            assert_eq!(g.aligned_width, 48);
            assert_eq!(g.aligned_height, 11);
            assert_eq!(g.size, 4096);
        }
    }

    #[test]
    fn tiled_nv12_pads_to_codec_boundaries() {
        let g = calc().compute_geometry(1280, 720, PixelFormat::YCbCr420SpTiled).unwrap();
        assert_eq!(g.aligned_width, 1280);
        assert_eq!(g.aligned_height, 736);
        let luma = align_up(1280 * 736, 8192).unwrap();
        let chroma = align_up(1280 * 384, 8192).unwrap();
        assert_eq!(g.size, luma + chroma + EXTRADATA_SIZE);
        assert_eq!(g.size % 4096, 0);
    }

    #[test]
    fn nv12_uses_128_pitch_for_size_only() {
        let g = calc().compute_geometry(100, 50, PixelFormat::Nv12).unwrap();
        assert_eq!(g.aligned_width, 112);
        assert_eq!(g.aligned_height, 50);
        assert_eq!(g.size, 8192 + 8192);
    }

    #[test]
    fn nv12_encodeable_aligns_chroma_offset() {
        let g = calc().compute_geometry(176, 144, PixelFormat::Nv12Encodeable).unwrap();
        let expected = align_up(align_up(176 * 144, 2048).unwrap() + 2 * (96 * 72), 4096);
        assert_eq!(Some(g.size), expected);
    }

    #[test]
    fn odd_heights_keep_the_last_chroma_row() {
        // 3 luma rows need 2 chroma rows after the 2K aligned luma plane.
        let g = calc().compute_geometry(4096, 3, PixelFormat::Nv12Encodeable).unwrap();
        assert!(g.size >= 12288 + 2 * 4096, "size {}", g.size);

        let g = calc().compute_geometry(4096, 3, PixelFormat::YCbCr420Sp).unwrap();
        assert!(g.size > 4096 * 3 + 4096 * 2, "size {}", g.size);
    }

    #[test]
    fn huge_dimensions_are_rejected_instead_of_wrapping() {
        let err = calc().compute_geometry(1 << 62, 4, PixelFormat::Rgba8888).unwrap_err();
        assert!(matches!(
            err,
            GrallocError::InvalidDimensions { width, height: 4, format: PixelFormat::Rgba8888, .. }
                if width == 1 << 62
        ));

        let with_video = GeometryCalculator::new(
            PaddingAdvisor::new(None).with_video_layout(std::sync::Arc::new(VenusNv12)),
        );
        for info in &FORMATS {
            let (w, h) = if info.format == PixelFormat::Blob { (1 << 62, 1) } else { (1 << 32, 1 << 32) };
            let Err(err) = with_video.compute_geometry(w, h, info.format) else {
                // A single row is just its width.
                assert_eq!(info.format, PixelFormat::Blob);
                continue;
            };
            assert!(
                matches!(err, GrallocError::InvalidDimensions { .. }),
                "{:?}: {err}",
                info.format
            );
        }

        let err = calc().compute_geometry(usize::MAX, 32, PixelFormat::Nv12).unwrap_err();
        assert!(matches!(err, GrallocError::StrideOverflow { .. }));
    }

    #[test]
    fn semiplanar_420_adds_guard_byte() {
        let g = calc().compute_geometry(64, 64, PixelFormat::YCbCr420Sp).unwrap();
        // 64*64*1.5 = 6144, +1 pushes it to the next page
        assert_eq!(g.size, 8192);
        let g = calc().compute_geometry(64, 64, PixelFormat::Nv21Zsl).unwrap();
        assert_eq!(g.aligned_height, 64);
        assert_eq!(g.size, 8192);
    }

    #[test]
    fn zsl_aligns_height_to_64() {
        let g = calc().compute_geometry(100, 100, PixelFormat::Nv21Zsl).unwrap();
        assert_eq!(g.aligned_width, 128);
        assert_eq!(g.aligned_height, 128);
    }

    #[test]
    fn venus_requires_video_layout() {
        let err = calc().compute_geometry(1920, 1080, PixelFormat::YCbCr420SpVenus).unwrap_err();
        assert!(matches!(err, GrallocError::UnsupportedFormat(_)));

        let with_video = GeometryCalculator::new(PaddingAdvisor::new(None).with_video_layout(
            std::sync::Arc::new(VenusNv12),
        ));
        let g = with_video.compute_geometry(1920, 1080, PixelFormat::YCbCr420SpVenus).unwrap();
        assert_eq!(g.aligned_width, 1920);
        assert_eq!(g.aligned_height, 1088);
        assert_eq!(g.size % 4096, 0);
    }

    #[test]
    fn unknown_code_is_unsupported() {
        assert!(matches!(
            PixelFormat::from_code(0xdead),
            Err(GrallocError::UnsupportedFormat(0xdead))
        ));
        assert_eq!(PixelFormat::from_code(0x3231_5659).unwrap(), PixelFormat::Yv12);
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(calc().compute_geometry(0, 16, PixelFormat::Rgba8888).is_err());
        assert!(calc().compute_geometry(16, 0, PixelFormat::Nv12).is_err());
    }

    #[test]
    fn aligned_dimensions_never_shrink() {
        let calc = GeometryCalculator::new(
            PaddingAdvisor::new(None).with_video_layout(std::sync::Arc::new(VenusNv12)),
        );
        for info in &FORMATS {
            for (w, h) in [(2, 2), (176, 144), (640, 480), (1918, 1080), (4096, 2160)] {
                let h = if info.format == PixelFormat::Blob { 1 } else { h };
                let g = calc.compute_geometry(w, h, info.format).unwrap();
                assert!(g.aligned_width >= w, "{:?} {w}x{h}", info.format);
                assert!(g.aligned_height >= h, "{:?} {w}x{h}", info.format);
                assert!(g.size > 0);
            }
        }
    }

    #[test]
    fn geometry_is_deterministic() {
        let calc = calc();
        let a = calc.compute_geometry(333, 222, PixelFormat::YCrCb420SpAdreno).unwrap();
        let b = calc.compute_geometry(333, 222, PixelFormat::YCrCb420SpAdreno).unwrap();
        assert_eq!(a, b);
    }
}
