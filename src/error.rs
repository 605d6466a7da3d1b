use crate::geometry::PixelFormat;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GrallocError {
    #[error("Invalid dimensions {width}x{height} for {format:?}: {reason}")]
    InvalidDimensions {
        width: usize,
        height: usize,
        format: PixelFormat,
        reason: &'static str,
    },

    #[error("Row stride of a {width} pixel wide {format:?} buffer overflows")]
    StrideOverflow { width: usize, format: PixelFormat },

    #[error("Unsupported pixel format: 0x{0:x}")]
    UnsupportedFormat(u32),

    #[error("Format {0:?} has no addressable planes")]
    UnsupportedPlaneLayout(PixelFormat),

    #[error("Out of buffer memory")]
    OutOfMemory,

    #[error("No allocator registered for flags 0x{0:x}")]
    UnknownAllocator(u32),

    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ION Driver Error: {0}")]
    Driver(String),
}

// A convenient alias
pub type GrallocResult<T> = Result<T, GrallocError>;
