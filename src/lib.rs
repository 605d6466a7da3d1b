//! Graphics buffer allocation for display, GPU and video hardware.
//!
//! A request (width, height, pixel format, usage hints) is turned into an
//! ION allocation whose layout satisfies the GPU, the video codec and the
//! display controller at once:
//!
//! - [`geometry`] computes aligned dimensions, byte size and plane offsets
//!   from a per-format rule table.
//! - [`padding`] computes row strides, optionally through the GPU vendor's
//!   padding routine.
//! - [`heap`] maps usage hints to ION heaps and decides when a failed
//!   allocation may fall back to the system heap.
//! - [`alloc`] ties them together behind [`AllocController`].
//!
//! ```no_run
//! use gralloc_rs::{AllocController, AllocRequest, PixelFormat, PlatformConfig, UsageFlags};
//!
//! let controller = AllocController::from_platform(PlatformConfig::default())?;
//! let handle = controller.allocate(&AllocRequest::new(
//!     1280,
//!     720,
//!     PixelFormat::YCbCr420Sp,
//!     UsageFlags::new().iommu_heap(),
//! ))?;
//! let planes = handle.plane_layout()?;
//! println!("luma stride {}", planes.y_stride);
//! controller.free(handle);
//! # Ok::<(), gralloc_rs::GrallocError>(())
//! ```

pub mod alloc;
pub mod error;
pub mod geometry;
pub mod handle;
pub mod heap;
pub mod ion;
pub mod padding;
pub mod platform;
pub mod utils;

pub use alloc::{AllocController, AllocData, AllocRequest, IonAlloc, MemAlloc};
pub use error::{GrallocError, GrallocResult};
pub use geometry::{Geometry, GeometryCalculator, PixelFormat, PlaneInfo, plane_layout};
pub use handle::BufferHandle;
pub use heap::{AllocType, CachePolicy, HeapMask, HeapPolicy, HeapSelection, SwAccess, UsageFlags};
pub use padding::{PaddingAdvisor, SurfacePadding};
pub use platform::{CompositionMode, CompositionSource, PlatformConfig, PropertySource};
