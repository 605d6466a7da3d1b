pub mod policy;

use crate::ion::ioctl::{
    ION_ADSP_HEAP_ID, ION_CAMERA_HEAP_ID, ION_CP_MM_HEAP_ID, ION_IOMMU_HEAP_ID, ION_SECURE,
    ION_SF_HEAP_ID, ION_SYSTEM_HEAP_ID, ion_heap,
};
use bitflags::bitflags;

pub use policy::{HeapPolicy, HeapSelection};

bitflags! {
    /// ION heap-selection mask, as passed to the allocation ioctl.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HeapMask: u32 {
        const CP_MM = ion_heap(ION_CP_MM_HEAP_ID);
        const CAMERA = ion_heap(ION_CAMERA_HEAP_ID);
        const ADSP = ion_heap(ION_ADSP_HEAP_ID);
        const SF = ion_heap(ION_SF_HEAP_ID);
        const IOMMU = ion_heap(ION_IOMMU_HEAP_ID);
        const SYSTEM = ion_heap(ION_SYSTEM_HEAP_ID);
        /// Not a heap: asks the kernel for a secure allocation.
        const SECURE = ION_SECURE;
    }
}

impl HeapMask {
    /// The heap bits without the secure request flag.
    #[must_use]
    pub const fn heaps(self) -> Self {
        self.difference(Self::SECURE)
    }
}

bitflags! {
    /// Allocation-type flags stored in a buffer handle.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AllocType: u32 {
        const USES_ION = 0x0000_0008;
        const NONCONTIGUOUS_MEM = 0x0000_0100;
        const SECURE_BUFFER = 0x0000_0400;
        /// Protected content without hardware backing.
        const PROTECTED_BUFFER = 0x0000_4000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    #[default]
    Cached,
    Uncached,
}

/// Expected CPU access frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwAccess {
    #[default]
    Never,
    Rarely,
    Often,
}

/// Usage hints attached to a buffer request.
///
/// Each hint is independent; the heap policy evaluates them additively.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageFlags {
    pub ui_contig_heap: bool,
    pub system_heap: bool,
    pub iommu_heap: bool,
    pub mm_heap: bool,
    pub camera_heap: bool,
    pub adsp_heap: bool,
    pub protected: bool,
    pub uncached: bool,
    pub external_only: bool,
    pub sw_read: SwAccess,
    pub sw_write: SwAccess,
}

impl UsageFlags {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn ui_contig_heap(mut self) -> Self {
        self.ui_contig_heap = true;
        self
    }

    #[must_use]
    pub const fn system_heap(mut self) -> Self {
        self.system_heap = true;
        self
    }

    #[must_use]
    pub const fn iommu_heap(mut self) -> Self {
        self.iommu_heap = true;
        self
    }

    #[must_use]
    pub const fn mm_heap(mut self) -> Self {
        self.mm_heap = true;
        self
    }

    #[must_use]
    pub const fn camera_heap(mut self) -> Self {
        self.camera_heap = true;
        self
    }

    #[must_use]
    pub const fn adsp_heap(mut self) -> Self {
        self.adsp_heap = true;
        self
    }

    #[must_use]
    pub const fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    #[must_use]
    pub const fn uncached(mut self) -> Self {
        self.uncached = true;
        self
    }

    #[must_use]
    pub const fn external_only(mut self) -> Self {
        self.external_only = true;
        self
    }

    #[must_use]
    pub const fn sw_read(mut self, access: SwAccess) -> Self {
        self.sw_read = access;
        self
    }

    #[must_use]
    pub const fn sw_write(mut self, access: SwAccess) -> Self {
        self.sw_write = access;
        self
    }

    /// True when the request names a heap explicitly.
    #[must_use]
    pub const fn pins_heap(&self) -> bool {
        self.ui_contig_heap
            || self.system_heap
            || self.iommu_heap
            || self.mm_heap
            || self.camera_heap
            || self.adsp_heap
    }

    #[must_use]
    pub const fn cache_policy(&self) -> CachePolicy {
        let rarely_touched =
            matches!(self.sw_read, SwAccess::Rarely) && matches!(self.sw_write, SwAccess::Rarely);
        if self.uncached || rarely_touched {
            CachePolicy::Uncached
        } else {
            CachePolicy::Cached
        }
    }
}
