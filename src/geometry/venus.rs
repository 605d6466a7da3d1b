use crate::utils::align_up;
use std::fmt::Debug;

/// Layout of the video core's native NV12 buffer.
///
/// The allocator has no say in this layout: the video firmware dictates the
/// stride, scanline count and total size, so the platform supplies them.
/// Every method returns `None` when the result does not fit in `usize`.
pub trait VideoLayout: Debug + Send + Sync {
    /// Luma row stride in bytes.
    fn y_stride(&self, width: usize) -> Option<usize>;

    /// Number of luma scanlines.
    fn y_scanlines(&self, height: usize) -> Option<usize>;

    /// Total buffer size, including chroma and side data.
    fn buffer_size(&self, width: usize, height: usize) -> Option<usize>;
}

/// Venus NV12: 128-byte aligned rows, 32-line aligned luma, 16-line aligned
/// chroma, a 4K guard after the chroma plane and an extradata tail.
#[derive(Debug, Clone, Copy, Default)]
pub struct VenusNv12;

const VENUS_EXTRADATA_SIZE: usize = 8 * 1024;
const VENUS_UV_ALIGNMENT: usize = 4096;

impl VenusNv12 {
    fn uv_scanlines(height: usize) -> Option<usize> {
        align_up(height.div_ceil(2), 16)
    }
}

impl VideoLayout for VenusNv12 {
    fn y_stride(&self, width: usize) -> Option<usize> {
        align_up(width, 128)
    }

    fn y_scanlines(&self, height: usize) -> Option<usize> {
        align_up(height, 32)
    }

    fn buffer_size(&self, width: usize, height: usize) -> Option<usize> {
        let y_stride = self.y_stride(width)?;
        let uv_stride = y_stride;
        let y_plane = y_stride.checked_mul(self.y_scanlines(height)?)?;
        let uv_plane = uv_stride
            .checked_mul(Self::uv_scanlines(height)?)?
            .checked_add(VENUS_UV_ALIGNMENT)?;
        let extra = VENUS_EXTRADATA_SIZE.max(y_stride.checked_mul(8)?);
        align_up(y_plane.checked_add(uv_plane)?.checked_add(extra)?, 4096)
    }
}
