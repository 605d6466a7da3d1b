use crate::error::GrallocResult;
use crate::geometry::{PixelFormat, PlaneInfo, plane_layout};
use crate::heap::AllocType;
use std::os::fd::RawFd;

/// An allocated graphics buffer.
///
/// `width` and `height` are the aligned dimensions, so `width` is also the
/// row stride in pixels. The handle is deliberately not `Clone`: it is given
/// back to `AllocController::free` by value, exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct BufferHandle {
    pub fd: RawFd,
    pub size: usize,
    pub flags: AllocType,
    pub format: PixelFormat,
    pub width: usize,
    pub height: usize,
    pub base: usize,
    pub offset: usize,
    /// GPU virtual address, filled in by the GPU driver when it maps the buffer.
    pub gpu_addr: Option<u64>,
}

impl BufferHandle {
    /// Luma/chroma plane addresses for YUV buffers.
    ///
    /// # Errors
    /// `UnsupportedPlaneLayout` for packed and tiled formats.
    pub fn plane_layout(&self) -> GrallocResult<PlaneInfo> {
        plane_layout(self)
    }

    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.flags.contains(AllocType::SECURE_BUFFER)
    }

    #[must_use]
    pub fn is_contiguous(&self) -> bool {
        !self.flags.contains(AllocType::NONCONTIGUOUS_MEM)
    }
}
