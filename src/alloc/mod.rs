pub mod controller;
pub mod ion;

use crate::error::GrallocResult;
use crate::heap::{AllocType, CachePolicy, HeapMask};
use std::fmt::Debug;
use std::os::fd::RawFd;

pub use controller::{AllocController, AllocRequest};
pub use ion::IonAlloc;

/// Per-request allocation record handed to a [`MemAlloc`].
///
/// The controller fills in the request half; the allocator fills in `fd`,
/// `base`, `offset` and may round `size` up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocData {
    pub size: usize,
    pub align: usize,
    pub cache_policy: CachePolicy,
    pub heap_mask: HeapMask,
    pub alloc_type: AllocType,

    pub fd: RawFd,
    pub base: usize,
    pub offset: usize,
}

impl AllocData {
    #[must_use]
    pub fn new(size: usize, align: usize) -> Self {
        Self {
            size,
            align,
            cache_policy: CachePolicy::Cached,
            heap_mask: HeapMask::empty(),
            alloc_type: AllocType::empty(),
            fd: -1,
            base: 0,
            offset: 0,
        }
    }
}

/// Low-level buffer allocator (ION, ashmem, ...).
pub trait MemAlloc: Debug + Send + Sync {
    /// Allocate `data.size` bytes from the heaps in `data.heap_mask`.
    ///
    /// # Errors
    /// Any error means no memory was allocated.
    fn alloc_buffer(&self, data: &mut AllocData) -> GrallocResult<()>;

    /// Release a buffer previously returned by `alloc_buffer`.
    ///
    /// # Errors
    /// Returns an error if the mapping or descriptor could not be released.
    fn free_buffer(&self, base: usize, size: usize, offset: usize, fd: RawFd) -> GrallocResult<()>;
}
