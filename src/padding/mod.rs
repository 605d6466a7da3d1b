pub mod adreno;

use crate::error::{GrallocError, GrallocResult};
use crate::geometry::formats::{self, StrideRule};
use crate::geometry::{PixelFormat, VideoLayout};
use crate::utils::align_up;
use std::fmt::Debug;
use std::sync::Arc;

pub use adreno::AdrenoUtils;

/// Linear surface.
pub const SURFACE_TILE_HEIGHT: i32 = 1;
/// Unknown raster mode.
pub const RASTER_MODE: i32 = 0;
/// Threshold for padding surfaces.
pub const PADDING_THRESHOLD: i32 = 512;

/// A GPU vendor routine computing the padded row stride of an RGB surface.
pub trait SurfacePadding: Debug + Send + Sync {
    /// `width` is already a multiple of 32 pixels. Returns the stride in pixels.
    fn compute_padding(
        &self,
        width: i32,
        bpp: i32,
        surface_tile_height: i32,
        raster_mode: i32,
        padding_threshold: i32,
    ) -> i32;
}

/// Computes row strides, consulting the GPU padding routine for RGB formats
/// and the video layout for the codec-native format when either is present.
///
/// Both capabilities are resolved once at startup and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct PaddingAdvisor {
    padding: Option<Arc<dyn SurfacePadding>>,
    video: Option<Arc<dyn VideoLayout>>,
}

impl PaddingAdvisor {
    #[must_use]
    pub fn new(padding: Option<Arc<dyn SurfacePadding>>) -> Self {
        Self {
            padding,
            video: None,
        }
    }

    #[must_use]
    pub fn with_video_layout(mut self, video: Arc<dyn VideoLayout>) -> Self {
        self.video = Some(video);
        self
    }

    #[must_use]
    pub fn has_padding_routine(&self) -> bool {
        self.padding.is_some()
    }

    #[must_use]
    pub fn video_layout(&self) -> Option<&dyn VideoLayout> {
        self.video.as_deref()
    }

    /// Row stride in pixels for `width` pixels of `format`.
    ///
    /// # Errors
    /// `UnsupportedFormat` for an unknown format, or for the codec-native
    /// format when no video layout was configured. `StrideOverflow` when the
    /// aligned stride does not fit in `usize`.
    pub fn row_stride(&self, width: usize, format: PixelFormat) -> GrallocResult<usize> {
        let info = formats::lookup(format).ok_or(GrallocError::UnsupportedFormat(format.code()))?;

        let stride = match info.stride {
            StrideRule::Rgb { bpp } => self.rgb_stride(width, bpp),
            StrideRule::Align(a) => align_up(width, a),
            StrideRule::Video => self
                .video_layout()
                .ok_or(GrallocError::UnsupportedFormat(format.code()))?
                .y_stride(width),
            StrideRule::Unaligned => Some(width),
        };
        stride.ok_or(GrallocError::StrideOverflow { width, format })
    }

    fn rgb_stride(&self, width: usize, bpp: usize) -> Option<usize> {
        let stride = align_up(width, 32)?;
        let Some(padding) = &self.padding else {
            return Some(stride);
        };

        let (Ok(w), Ok(bpp)) = (i32::try_from(stride), i32::try_from(bpp)) else {
            return Some(stride);
        };
        let padded = padding.compute_padding(w, bpp, SURFACE_TILE_HEIGHT, RASTER_MODE, PADDING_THRESHOLD);

        // A routine returning less than the aligned width would undersize the buffer.
        match usize::try_from(padded) {
            Ok(p) if p >= stride => Some(p),
            _ => {
                log::warn!("surface padding returned {padded} for stride {stride}, ignoring");
                Some(stride)
            }
        }
    }
}
