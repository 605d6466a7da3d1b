use crate::utils::iowr;

// ===============================================================================================
// Constants
// ===============================================================================================

pub const ION_IOC_MAGIC: u32 = 0x49; // 'I'

/// Opaque per-client handle returned by `ION_IOC_ALLOC`.
pub type IonUserHandle = i32;

// Heap IDs (MSM layout). A heap is selected by setting bit `1 << id` in the mask.
pub const ION_CP_MM_HEAP_ID: u32 = 8;
pub const ION_CAMERA_HEAP_ID: u32 = 20;
pub const ION_ADSP_HEAP_ID: u32 = 22;
pub const ION_SF_HEAP_ID: u32 = 24;
pub const ION_IOMMU_HEAP_ID: u32 = 25;
pub const ION_SYSTEM_HEAP_ID: u32 = 30;

/// Secure allocation request; shares the mask with the heap bits.
pub const ION_SECURE: u32 = 1 << 31;

// Allocation flags
pub const ION_FLAG_CACHED: u32 = 1 << 0;

#[must_use]
pub const fn ion_heap(id: u32) -> u32 {
    1 << id
}

// ===============================================================================================
// Argument Structures
// ===============================================================================================

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct AllocationData {
    pub len: usize,
    pub align: usize,
    pub heap_id_mask: u32,
    pub flags: u32,
    pub handle: IonUserHandle,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct FdData {
    pub handle: IonUserHandle,
    pub fd: i32,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct HandleData {
    pub handle: IonUserHandle,
}

// ===============================================================================================
// IOCTL Definitions
// ===============================================================================================

pub const ION_IOC_ALLOC: u32 = iowr::<AllocationData>(ION_IOC_MAGIC, 0);
pub const ION_IOC_FREE: u32 = iowr::<HandleData>(ION_IOC_MAGIC, 1);
pub const ION_IOC_MAP: u32 = iowr::<FdData>(ION_IOC_MAGIC, 2);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_numbers_are_distinct() {
        let cmds = [ION_IOC_ALLOC, ION_IOC_FREE, ION_IOC_MAP];
        for (i, a) in cmds.iter().enumerate() {
            for b in &cmds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn alloc_request_carries_struct_size() {
        let size = (ION_IOC_ALLOC >> 16) & 0x3fff;
        assert_eq!(size as usize, std::mem::size_of::<AllocationData>());
    }
}
