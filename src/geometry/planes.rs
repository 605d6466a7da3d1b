use super::PixelFormat;
use super::formats::{self, ChromaOrder, PlaneRule};
use crate::error::{GrallocError, GrallocResult};
use crate::handle::BufferHandle;
use crate::utils::align_up;

/// Addresses and strides of the luma and chroma planes of a YUV buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneInfo {
    pub y: usize,
    pub cb: usize,
    pub cr: usize,
    pub y_stride: usize,
    pub c_stride: usize,
    /// Distance in bytes between consecutive samples of one chroma component.
    pub chroma_step: usize,
    pub luma_rows: usize,
    pub chroma_rows: usize,
}

impl PlaneInfo {
    /// Bytes spanned by every plane, from `y` to the end of the last chroma row.
    #[must_use]
    pub const fn span(&self) -> usize {
        let chroma_start = if self.cb < self.cr { self.cb } else { self.cr };
        let chroma_end = chroma_start + self.c_stride * self.chroma_rows;
        let chroma_end = match self.chroma_step {
            // Planar: the second chroma plane follows the first.
            1 => chroma_end + self.c_stride * self.chroma_rows,
            _ => chroma_end,
        };
        chroma_end - self.y
    }
}

/// Plane layout of an allocated buffer.
///
/// The handle's width and height are the aligned dimensions, so the stored
/// width doubles as the luma stride.
///
/// # Errors
/// `UnsupportedPlaneLayout` for packed and tiled formats.
pub fn plane_layout(handle: &BufferHandle) -> GrallocResult<PlaneInfo> {
    let mut info = plane_offsets(handle.format, handle.width, handle.height)?;
    info.y += handle.base;
    info.cb += handle.base;
    info.cr += handle.base;
    Ok(info)
}

/// Plane layout relative to the start of the buffer.
///
/// 4:2:0 chroma row counts round up, so an odd height keeps its last row.
///
/// # Errors
/// `UnsupportedPlaneLayout` for packed and tiled formats, `InvalidDimensions`
/// when an offset does not fit in `usize`.
pub fn plane_offsets(format: PixelFormat, width: usize, height: usize) -> GrallocResult<PlaneInfo> {
    let rule = formats::lookup(format).map_or(PlaneRule::None, |info| info.planes);

    let info = match rule {
        PlaneRule::SemiPlanar {
            order,
            realign_stride,
            chroma_offset_align,
            chroma_vsub,
        } => semiplanar(width, height, order, realign_stride, chroma_offset_align, chroma_vsub),
        PlaneRule::Planar { order } => planar(width, height, order),
        PlaneRule::None => {
            log::debug!("plane_layout: invalid format passed: 0x{:x}", format.code());
            return Err(GrallocError::UnsupportedPlaneLayout(format));
        }
    };

    info.ok_or(GrallocError::InvalidDimensions {
        width,
        height,
        format,
        reason: "plane offsets overflow",
    })
}

fn semiplanar(
    width: usize,
    height: usize,
    order: ChromaOrder,
    realign_stride: bool,
    chroma_offset_align: usize,
    chroma_vsub: usize,
) -> Option<PlaneInfo> {
    let y_stride = if realign_stride { align_up(width, 16)? } else { width };
    let chroma = align_up(y_stride.checked_mul(height)?, chroma_offset_align)?;
    let second = chroma.checked_add(1)?;
    let (cb, cr) = match order {
        ChromaOrder::CbCr => (chroma, second),
        ChromaOrder::CrCb => (second, chroma),
    };
    Some(PlaneInfo {
        y: 0,
        cb,
        cr,
        y_stride,
        c_stride: y_stride,
        chroma_step: 2,
        luma_rows: height,
        chroma_rows: height.div_ceil(chroma_vsub),
    })
}

fn planar(width: usize, height: usize, order: ChromaOrder) -> Option<PlaneInfo> {
    let y_stride = width;
    let c_stride = align_up(width / 2, 16)?;
    let chroma_rows = height.div_ceil(2);
    let first = y_stride.checked_mul(height)?;
    let second = first.checked_add(c_stride.checked_mul(chroma_rows)?)?;
    let (cb, cr) = match order {
        ChromaOrder::CbCr => (first, second),
        ChromaOrder::CrCb => (second, first),
    };
    Some(PlaneInfo {
        y: 0,
        cb,
        cr,
        y_stride,
        c_stride,
        chroma_step: 1,
        luma_rows: height,
        chroma_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{FORMATS, GeometryCalculator, VenusNv12};
    use crate::padding::PaddingAdvisor;
    use std::sync::Arc;

    #[test]
    fn yv12_places_cr_before_cb() {
        let p = plane_offsets(PixelFormat::Yv12, 176, 144).unwrap();
        assert_eq!(p.y_stride, 176);
        assert_eq!(p.c_stride, 96);
        assert_eq!(p.cr, 176 * 144);
        assert_eq!(p.cb, 176 * 144 + 96 * 72);
        assert_eq!(p.chroma_step, 1);
    }

    #[test]
    fn semiplanar_chroma_order_follows_family() {
        let cbcr = plane_offsets(PixelFormat::YCbCr420Sp, 64, 32).unwrap();
        assert_eq!((cbcr.cb, cbcr.cr), (2048, 2049));
        assert_eq!(cbcr.chroma_step, 2);

        let crcb = plane_offsets(PixelFormat::YCrCb420Sp, 64, 32).unwrap();
        assert_eq!((crcb.cr, crcb.cb), (2048, 2049));
    }

    #[test]
    fn encodeable_chroma_is_2k_aligned() {
        let p = plane_offsets(PixelFormat::Nv12Encodeable, 176, 144).unwrap();
        assert_eq!(p.cb % 2048, 0);
        assert!(p.cb >= 176 * 144);
    }

    #[test]
    fn odd_height_reports_rounded_up_chroma_rows() {
        let p = plane_offsets(PixelFormat::Nv12Encodeable, 4096, 3).unwrap();
        assert_eq!(p.cb, 12288);
        assert_eq!(p.chroma_rows, 2);
        assert_eq!(p.span(), 12288 + 2 * 4096);

        let p = plane_offsets(PixelFormat::YCbCr422Sp, 64, 3).unwrap();
        assert_eq!(p.chroma_rows, 3);
    }

    #[test]
    fn overflowing_offsets_are_rejected() {
        assert!(matches!(
            plane_offsets(PixelFormat::YCrCb420Sp, usize::MAX, 2),
            Err(GrallocError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            plane_offsets(PixelFormat::Yv12, 1 << 40, 1 << 40),
            Err(GrallocError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn packed_formats_have_no_planes() {
        for format in [
            PixelFormat::Rgba8888,
            PixelFormat::YCbCr422I,
            PixelFormat::YCrCb422I,
            PixelFormat::YCbCr420SpTiled,
            PixelFormat::Blob,
        ] {
            assert!(matches!(
                plane_offsets(format, 64, 64),
                Err(GrallocError::UnsupportedPlaneLayout(f)) if f == format
            ));
        }
    }

    #[test]
    fn planes_fit_inside_computed_size() {
        let calc = GeometryCalculator::new(
            PaddingAdvisor::new(None).with_video_layout(Arc::new(VenusNv12)),
        );
        let sizes = [
            (2, 2),
            (176, 144),
            (320, 240),
            (1280, 720),
            (1920, 1080),
            (4096, 3),
            (175, 143),
            (2, 1),
        ];
        for info in &FORMATS {
            for (w, h) in sizes {
                let h = if info.format == PixelFormat::Blob { 1 } else { h };
                let g = match calc.compute_geometry(w, h, info.format) {
                    Ok(g) => g,
                    // Parity constraints reject some of the odd sizes.
                    Err(GrallocError::InvalidDimensions { .. }) if w % 2 == 1 || h % 2 == 1 => continue,
                    Err(e) => panic!("{:?} {w}x{h}: {e}", info.format),
                };
                let Ok(p) = plane_offsets(info.format, g.aligned_width, g.aligned_height) else {
                    continue;
                };
                assert!(
                    p.span() <= g.size,
                    "{:?} {w}x{h}: span {} > size {}",
                    info.format,
                    p.span(),
                    g.size
                );
            }
        }
    }
}
