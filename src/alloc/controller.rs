use super::{AllocData, IonAlloc, MemAlloc};
use crate::error::{GrallocError, GrallocResult};
use crate::geometry::{GeometryCalculator, PixelFormat, VenusNv12};
use crate::handle::BufferHandle;
use crate::heap::{AllocType, HeapMask, HeapPolicy, UsageFlags};
use crate::padding::{AdrenoUtils, PaddingAdvisor, SurfacePadding};
use crate::platform::{CompositionSource, EnvProperties, PlatformConfig, PropertyComposition};
use crate::utils::{align_up, page_size};
use std::sync::Arc;

/// A buffer request: dimensions, format and usage hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocRequest {
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
    pub usage: UsageFlags,
}

impl AllocRequest {
    #[must_use]
    pub const fn new(width: usize, height: usize, format: PixelFormat, usage: UsageFlags) -> Self {
        Self {
            width,
            height,
            format,
            usage,
        }
    }
}

/// Turns buffer requests into ION allocations and releases them again.
///
/// Construct one per process at startup and share it (`Arc<AllocController>`);
/// every collaborator is immutable after construction, so concurrent
/// `allocate`/`free` calls need no locking.
#[derive(Debug)]
pub struct AllocController {
    ion: Arc<dyn MemAlloc>,
    geometry: GeometryCalculator,
    policy: HeapPolicy,
    composition: Arc<dyn CompositionSource>,
    page_size: usize,
}

impl AllocController {
    #[must_use]
    pub fn new(
        ion: Arc<dyn MemAlloc>,
        geometry: GeometryCalculator,
        policy: HeapPolicy,
        composition: Arc<dyn CompositionSource>,
    ) -> Self {
        Self {
            ion,
            geometry,
            policy,
            composition,
            page_size: page_size(),
        }
    }

    /// Builds a controller for the running device: opens `/dev/ion`, loads
    /// the Adreno padding routine if present, and reads the protection level
    /// and composition type from the environment.
    ///
    /// # Errors
    /// Returns an error if the ION device cannot be opened.
    pub fn from_platform(platform: PlatformConfig) -> GrallocResult<Self> {
        let ion = IonAlloc::open()?;

        let padding = AdrenoUtils::load().map(|lib| Arc::new(lib) as Arc<dyn SurfacePadding>);
        let advisor = PaddingAdvisor::new(padding).with_video_layout(Arc::new(VenusNv12));

        let policy = HeapPolicy::from_properties(platform, &EnvProperties);
        log::info!(
            "gralloc: TZ protection {}, padding routine {}",
            if policy.uses_tz_protection() { "on" } else { "off" },
            if advisor.has_padding_routine() { "loaded" } else { "absent" }
        );

        Ok(Self::new(
            Arc::new(ion),
            GeometryCalculator::new(advisor),
            policy,
            Arc::new(PropertyComposition::new(EnvProperties)),
        ))
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub const fn geometry(&self) -> &GeometryCalculator {
        &self.geometry
    }

    #[must_use]
    pub const fn policy(&self) -> &HeapPolicy {
        &self.policy
    }

    /// Allocates a buffer for `req`.
    ///
    /// The caller owns the returned handle and must give it back through
    /// [`AllocController::free`].
    ///
    /// # Errors
    /// `UnsupportedFormat`/`InvalidDimensions` before anything is allocated,
    /// `OutOfMemory` when the heaps (and the fallback, if allowed) are exhausted.
    pub fn allocate(&self, req: &AllocRequest) -> GrallocResult<BufferHandle> {
        let geometry = self
            .geometry
            .compute_geometry(req.width, req.height, req.format)?;

        let size = align_up(geometry.size, self.page_size).ok_or(GrallocError::InvalidDimensions {
            width: req.width,
            height: req.height,
            format: req.format,
            reason: "buffer size overflows",
        })?;
        let mut data = AllocData::new(size, self.page_size);

        if let Err(e) = self.allocate_data(&mut data, &req.usage) {
            log::error!(
                "allocate failed for {}x{} {:?}: {e}",
                req.width,
                req.height,
                req.format
            );
            return Err(GrallocError::OutOfMemory);
        }

        Ok(BufferHandle {
            fd: data.fd,
            size: data.size,
            flags: data.alloc_type,
            format: req.format,
            width: geometry.aligned_width,
            height: geometry.aligned_height,
            base: data.base,
            offset: data.offset,
            gpu_addr: None,
        })
    }

    /// Heap selection plus the low-level call, with at most one retry on the
    /// system heap.
    fn allocate_data(&self, data: &mut AllocData, usage: &UsageFlags) -> GrallocResult<()> {
        let selection = self.policy.select_heap(usage);
        let mut non_contiguous = selection.non_contiguous;

        data.cache_policy = selection.cache_policy;
        data.alloc_type = selection.alloc_type;
        data.heap_mask = selection.heap_mask;

        let mut ret = self.ion.alloc_buffer(data);

        if ret.is_err()
            && HeapPolicy::can_fallback(
                usage,
                selection.heap_mask.contains(HeapMask::SYSTEM),
                self.composition.composition_mode(),
            )
        {
            log::warn!("Falling back to system heap");
            data.heap_mask = HeapMask::SYSTEM;
            non_contiguous = true;
            ret = self.ion.alloc_buffer(data);
        }

        ret?;

        data.alloc_type |= AllocType::USES_ION;
        if non_contiguous {
            data.alloc_type |= AllocType::NONCONTIGUOUS_MEM;
        }
        if selection.heap_mask.contains(HeapMask::SECURE) {
            data.alloc_type |= AllocType::SECURE_BUFFER;
        }
        Ok(())
    }

    /// The allocator that owns buffers tagged with `flags`.
    ///
    /// # Errors
    /// `UnknownAllocator` if the flags name no known allocator.
    pub fn get_allocator(&self, flags: AllocType) -> GrallocResult<&dyn MemAlloc> {
        if flags.contains(AllocType::USES_ION) {
            Ok(self.ion.as_ref())
        } else {
            log::error!("get_allocator: Invalid flags passed: 0x{:x}", flags.bits());
            Err(GrallocError::UnknownAllocator(flags.bits()))
        }
    }

    /// Releases a buffer and consumes its handle.
    ///
    /// Handles without a valid fd are dropped without touching any allocator.
    pub fn free(&self, handle: BufferHandle) {
        if handle.fd <= 0 {
            return;
        }

        let Ok(memalloc) = self.get_allocator(handle.flags) else {
            return;
        };

        if let Err(e) = memalloc.free_buffer(handle.base, handle.size, handle.offset, handle.fd) {
            log::error!("free_buffer failed for fd {}: {e}", handle.fd);
        }
    }
}
